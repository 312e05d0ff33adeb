//! Whole-collection export and import, used to move data between backends.

use lumina_shared::{Record, RecordKind};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::store::RecordStore;

/// Every record of one collection at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// RFC 3339 timestamp of when the snapshot was taken.
    pub created_at: String,
    /// Crate version that produced the snapshot.
    pub version: String,
    pub kind: RecordKind,
    pub records: Vec<Record>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

pub fn export_snapshot(store: &dyn RecordStore, kind: RecordKind) -> Result<Snapshot> {
    let records = store.list_all()?;
    tracing::info!(source = %store.describe(), count = records.len(), "exporting snapshot");

    Ok(Snapshot {
        created_at: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        kind,
        records,
    })
}

/// Insert every record of `snapshot` into `store`. Ids already present are
/// left alone and counted as skipped.
pub fn import_snapshot(store: &dyn RecordStore, snapshot: &Snapshot) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for record in &snapshot.records {
        match store.insert(record.clone()) {
            Ok(_) => stats.imported += 1,
            Err(StoreError::DuplicateId(id)) => {
                tracing::debug!(id = %id, "already present, skipping");
                stats.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        target_store = %store.describe(),
        imported = stats.imported,
        skipped = stats.skipped,
        "snapshot imported"
    );
    Ok(stats)
}
