//! Durable key-value storage: one JSON array per collection key.
//!
//! Each key maps to `<dir>/<key>.json`. A missing file is an empty
//! collection. A file that is not a JSON array is also read as empty, and
//! is moved aside to `<key>.json.bak` before the next write replaces it.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use lumina_shared::{Actor, Record, RecordId, RecordKind, RecordPatch};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::normalize::decode_record;
use crate::store::{ensure_id, RecordStore};

/// A collection stored as a JSON array under a fixed key.
#[derive(Debug, Clone)]
pub struct LocalStore {
    key: String,
    path: PathBuf,
}

/// Raw contents of a collection file.
struct RawCollection {
    items: Vec<Value>,
    corrupt: bool,
}

impl LocalStore {
    /// Platform data directory used when none is configured:
    /// - Linux:   `~/.local/share/lumina`
    /// - macOS:   `~/Library/Application Support/com.lumina.lumina`
    /// - Windows: `{FOLDERID_RoamingAppData}\lumina\lumina\data`
    pub fn default_dir() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", "lumina", "lumina").ok_or(StoreError::NoDataDir)?;
        Ok(project_dirs.data_dir().to_path_buf())
    }

    /// Open the collection stored under `key` inside `dir`.
    pub fn open(dir: &Path, key: &str) -> Result<Self> {
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        std::fs::create_dir_all(dir)?;

        let path = dir.join(format!("{key}.json"));
        tracing::debug!(path = %path.display(), "opening local collection");

        Ok(Self {
            key: key.to_string(),
            path,
        })
    }

    /// The current collection for `kind`.
    pub fn for_kind(dir: &Path, kind: RecordKind) -> Result<Self> {
        Self::open(dir, kind.storage_key())
    }

    /// A per-actor collection (`<key>_<actor>`).
    pub fn for_actor(dir: &Path, kind: RecordKind, actor: &Actor) -> Result<Self> {
        let suffix: String = actor
            .storage_suffix()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '@' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let suffix = suffix.replace("..", "_");
        Self::open(dir, &format!("{}_{suffix}", kind.table()))
    }

    /// Collections older builds wrote for `kind`.
    pub fn legacy_for_kind(dir: &Path, kind: RecordKind) -> Result<Vec<Self>> {
        kind.legacy_keys()
            .iter()
            .map(|key| Self::open(dir, key))
            .collect()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<RawCollection> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RawCollection {
                    items: Vec::new(),
                    corrupt: false,
                })
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(items)) => Ok(RawCollection {
                items,
                corrupt: false,
            }),
            Ok(_) | Err(_) => {
                tracing::warn!(key = %self.key, "collection is not a JSON array, reading as empty");
                Ok(RawCollection {
                    items: Vec::new(),
                    corrupt: true,
                })
            }
        }
    }

    fn write_raw(&self, raw: &RawCollection) -> Result<()> {
        if raw.corrupt && self.path.exists() {
            let backup = self.path.with_extension("json.bak");
            tracing::warn!(backup = %backup.display(), "moving unreadable collection aside");
            std::fs::rename(&self.path, &backup)?;
        }

        let json = serde_json::to_string(&raw.items)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Id of a raw entry, read the same way normalization would.
fn raw_id(value: &Value) -> Option<RecordId> {
    let id = value.get("id")?;
    serde_json::from_value::<RecordId>(id.clone())
        .ok()
        .filter(|id| !id.is_blank())
}

impl RecordStore for LocalStore {
    fn describe(&self) -> String {
        format!("local:{}", self.path.display())
    }

    fn insert(&self, mut record: Record) -> Result<RecordId> {
        let mut raw = self.read_raw()?;
        let id = ensure_id(&mut record);

        if raw.items.iter().any(|item| raw_id(item).as_ref() == Some(&id)) {
            return Err(StoreError::DuplicateId(id));
        }

        raw.items.push(serde_json::to_value(&record)?);
        self.write_raw(&raw)?;

        tracing::debug!(key = %self.key, id = %id, "record inserted");
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<Record>> {
        let raw = self.read_raw()?;
        let mut records = Vec::with_capacity(raw.items.len());
        for item in raw.items {
            match decode_record(item) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(key = %self.key, error = %e, "skipping undecodable record"),
            }
        }
        Ok(records)
    }

    fn update_by_id(&self, id: &RecordId, patch: &RecordPatch) -> Result<Record> {
        let mut raw = self.read_raw()?;
        let index = raw
            .items
            .iter()
            .position(|item| raw_id(item).as_ref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let current = decode_record(raw.items[index].clone())?;
        let updated = patch.apply_to(&current)?;

        raw.items[index] = serde_json::to_value(&updated)?;
        self.write_raw(&raw)?;

        tracing::debug!(key = %self.key, id = %id, "record updated");
        Ok(updated)
    }

    fn delete_by_id(&self, id: &RecordId) -> Result<()> {
        let mut raw = self.read_raw()?;
        let before = raw.items.len();
        raw.items.retain(|item| raw_id(item).as_ref() != Some(id));

        if raw.items.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }

        self.write_raw(&raw)?;
        tracing::debug!(key = %self.key, id = %id, removed = before - raw.items.len(), "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (LocalStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::for_kind(dir.path(), RecordKind::Venue).unwrap();
        (store, dir)
    }

    #[test]
    fn missing_file_is_empty() {
        let (store, _dir) = store();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn insert_assigns_id_and_persists() {
        let (store, dir) = store();
        let id = store.insert(Record::named("Bar X")).unwrap();

        let reopened = LocalStore::for_kind(dir.path(), RecordKind::Venue).unwrap();
        let records = reopened.list_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_ref(), Some(&id));
    }

    #[test]
    fn duplicate_id_rejected() {
        let (store, _dir) = store();
        store.insert(Record::named("A").with_id("1")).unwrap();
        let err = store.insert(Record::named("B").with_id("1")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));
    }

    #[test]
    fn update_and_delete() {
        let (store, _dir) = store();
        let id = store.insert(Record::named("Bar X").with_city("BA")).unwrap();

        let updated = store
            .update_by_id(&id, &RecordPatch::new().set("name", "Bar Y"))
            .unwrap();
        assert_eq!(updated.name, "Bar Y");
        assert_eq!(store.get(&id).unwrap().name, "Bar Y");

        store.delete_by_id(&id).unwrap();
        assert!(matches!(store.delete_by_id(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update_by_id(&id, &RecordPatch::new()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn legacy_entries_untouched_by_unrelated_writes() {
        let (store, _dir) = store();
        let legacy = json!([{"id": 7, "name": "Old", "aforo": "90", "localidad": "Palermo"}]);
        std::fs::write(store.path(), legacy.to_string()).unwrap();

        store.insert(Record::named("New")).unwrap();

        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk[0], legacy[0]);

        let old = store.get(&RecordId::from("7")).unwrap();
        assert_eq!(old.capacity.map(|c| c.get()), Some(90));
        assert_eq!(old.city.as_deref(), Some("Palermo"));
    }

    #[test]
    fn corrupt_file_reads_empty_and_is_backed_up() {
        let (store, _dir) = store();
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.list_all().unwrap().is_empty());

        store.insert(Record::named("Fresh")).unwrap();
        assert!(store.path().with_extension("json.bak").exists());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn non_utf8_file_reads_empty_and_is_backed_up() {
        let (store, _dir) = store();
        std::fs::write(store.path(), [0xff, 0xfe, 0x00, 0x5b]).unwrap();
        assert!(store.list_all().unwrap().is_empty());

        store.insert(Record::named("Fresh")).unwrap();
        let backup = std::fs::read(store.path().with_extension("json.bak")).unwrap();
        assert_eq!(backup, vec![0xff, 0xfe, 0x00, 0x5b]);
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn per_actor_keys_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let actor = Actor::new("").with_email("ana/../x@example.com");
        let store = LocalStore::for_actor(dir.path(), RecordKind::Artist, &actor).unwrap();
        assert!(!store.key().contains('/'));
        assert!(store.path().starts_with(dir.path()));
    }

    #[test]
    fn bad_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalStore::open(dir.path(), "../escape").is_err());
        assert!(LocalStore::open(dir.path(), "").is_err());
    }
}
