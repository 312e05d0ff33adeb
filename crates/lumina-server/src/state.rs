//! Opening the configured stores and wiring them into directories.

use std::sync::Arc;

use lumina_directory::Directory;
use lumina_shared::RecordKind;
use lumina_store::{export_snapshot, import_snapshot, LocalStore, RecordStore, StoreError, TableStore};
use tokio::sync::Mutex;

use crate::config::{ServerConfig, StoreBackend};

const DATABASE_FILE: &str = "lumina.db";

fn open_primary(config: &ServerConfig, kind: RecordKind) -> Result<Box<dyn RecordStore>, StoreError> {
    Ok(match config.store_backend {
        StoreBackend::Local => Box::new(LocalStore::for_kind(&config.data_dir, kind)?),
        StoreBackend::Table => {
            std::fs::create_dir_all(&config.data_dir)?;
            Box::new(TableStore::open(&config.data_dir.join(DATABASE_FILE), kind)?)
        }
    })
}

/// A directory over the configured primary store. Older local keys (and, on
/// the table backend, the current local key) are attached as read-only
/// sources when `read_legacy_keys` is set.
pub fn open_directory(config: &ServerConfig, kind: RecordKind) -> Result<Directory, StoreError> {
    let primary = open_primary(config, kind)?;
    tracing::info!(%kind, store = %primary.describe(), "opening directory");

    let mut directory = Directory::new(kind, primary)
        .with_policy(config.validation_policy)
        .with_max_photo_dimension(config.max_photo_dimension);

    if config.read_legacy_keys {
        if config.store_backend == StoreBackend::Table {
            directory = directory
                .with_legacy_source(Box::new(LocalStore::for_kind(&config.data_dir, kind)?));
        }
        for source in LocalStore::legacy_for_kind(&config.data_dir, kind)? {
            tracing::debug!(%kind, key = source.key(), "attaching legacy source");
            directory = directory.with_legacy_source(Box::new(source));
        }
    }

    Ok(directory)
}

/// Copy every local record into the table backend, leaving ids that already
/// exist alone.
pub fn import_local_data(config: &ServerConfig) -> Result<(), StoreError> {
    let db_path = config.data_dir.join(DATABASE_FILE);
    std::fs::create_dir_all(&config.data_dir)?;

    for kind in [RecordKind::Artist, RecordKind::Venue] {
        let table = TableStore::open(&db_path, kind)?;
        let mut sources = vec![LocalStore::for_kind(&config.data_dir, kind)?];
        sources.extend(LocalStore::legacy_for_kind(&config.data_dir, kind)?);

        for source in sources {
            let snapshot = export_snapshot(&source, kind)?;
            let stats = import_snapshot(&table, &snapshot)?;
            tracing::info!(
                %kind,
                key = source.key(),
                imported = stats.imported,
                skipped = stats.skipped,
                "local data imported"
            );
        }
    }

    Ok(())
}

/// One lock per collection.
#[derive(Clone)]
pub struct Directories {
    pub artists: Arc<Mutex<Directory>>,
    pub venues: Arc<Mutex<Directory>>,
}

impl Directories {
    pub fn open(config: &ServerConfig) -> Result<Self, StoreError> {
        Ok(Self {
            artists: Arc::new(Mutex::new(open_directory(config, RecordKind::Artist)?)),
            venues: Arc::new(Mutex::new(open_directory(config, RecordKind::Venue)?)),
        })
    }

    pub fn get(&self, kind: RecordKind) -> &Arc<Mutex<Directory>> {
        match kind {
            RecordKind::Artist => &self.artists,
            RecordKind::Venue => &self.venues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_shared::Record;

    fn config(dir: &std::path::Path, backend: StoreBackend) -> ServerConfig {
        ServerConfig {
            data_dir: dir.to_path_buf(),
            store_backend: backend,
            ..ServerConfig::default()
        }
    }

    #[test]
    fn legacy_artist_key_is_read() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("artists.json"),
            r#"[{"id": 5, "name": "Almendra"}]"#,
        )
        .unwrap();

        let directory = open_directory(&config(tmp.path(), StoreBackend::Local), RecordKind::Artist).unwrap();
        assert_eq!(directory.browse().unwrap().len(), 1);

        let mut no_legacy = config(tmp.path(), StoreBackend::Local);
        no_legacy.read_legacy_keys = false;
        let directory = open_directory(&no_legacy, RecordKind::Artist).unwrap();
        assert!(directory.browse().unwrap().is_empty());
    }

    #[test]
    fn import_moves_local_records_into_tables() {
        let tmp = tempfile::tempdir().unwrap();
        let local = LocalStore::for_kind(tmp.path(), RecordKind::Venue).unwrap();
        local.insert(Record::named("Niceto").with_id("v1")).unwrap();

        let cfg = config(tmp.path(), StoreBackend::Table);
        import_local_data(&cfg).unwrap();
        import_local_data(&cfg).unwrap();

        let table = TableStore::open(&tmp.path().join(DATABASE_FILE), RecordKind::Venue).unwrap();
        assert_eq!(table.list_all().unwrap().len(), 1);
    }
}
