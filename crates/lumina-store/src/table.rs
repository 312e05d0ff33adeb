//! Hosted-table style storage backed by SQLite.

use std::path::Path;

use lumina_shared::{Actor, Record, RecordId, RecordKind, RecordPatch};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::store::{ensure_id, RecordStore};

/// One SQLite table per collection, filtered by the `user_id` column.
pub struct TableStore {
    db: Database,
    kind: RecordKind,
}

impl TableStore {
    pub fn new(db: Database, kind: RecordKind) -> Self {
        Self { db, kind }
    }

    /// Open `path` (creating and migrating it if needed) for `kind`.
    pub fn open(path: &Path, kind: RecordKind) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?, kind))
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }
}

impl RecordStore for TableStore {
    fn describe(&self) -> String {
        match self.db.path() {
            Some(path) => format!("table:{}#{}", path.display(), self.kind.table()),
            None => format!("table:memory#{}", self.kind.table()),
        }
    }

    fn insert(&self, mut record: Record) -> Result<RecordId> {
        let id = ensure_id(&mut record);
        self.db.insert_record(self.kind, &id, &record)?;
        tracing::debug!(table = self.kind.table(), id = %id, "row inserted");
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<Record>> {
        self.db.list_records(self.kind)
    }

    fn list_by_owner(&self, owner: &Actor) -> Result<Vec<Record>> {
        self.db.list_records_by_owner(self.kind, owner)
    }

    fn get(&self, id: &RecordId) -> Result<Record> {
        self.db.get_record(self.kind, id)
    }

    fn update_by_id(&self, id: &RecordId, patch: &RecordPatch) -> Result<Record> {
        let updated = self.db.update_record(self.kind, id, patch)?;
        tracing::debug!(table = self.kind.table(), id = %id, "row updated");
        Ok(updated)
    }

    fn delete_by_id(&self, id: &RecordId) -> Result<()> {
        if !self.db.delete_record(self.kind, id)? {
            return Err(StoreError::NotFound(id.clone()));
        }
        tracing::debug!(table = self.kind.table(), id = %id, "row deleted");
        Ok(())
    }
}
