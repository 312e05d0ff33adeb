//! The persistence contract every backend implements.

use lumina_shared::{Actor, Record, RecordId, RecordPatch};

use crate::error::{Result, StoreError};

/// A dumb per-collection record store.
///
/// Stores never check ownership; that is the directory's job. Every mutation
/// is durable by the time it returns, so the next [`RecordStore::list_all`]
/// observes it.
pub trait RecordStore: Send {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// Persist `record`, assigning an id when it has none.
    fn insert(&self, record: Record) -> Result<RecordId>;

    /// Full scan. Records are normalized to the canonical shape; order is
    /// not guaranteed.
    fn list_all(&self) -> Result<Vec<Record>>;

    /// Records owned by `owner`.
    fn list_by_owner(&self, owner: &Actor) -> Result<Vec<Record>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|record| record.is_owned_by(owner))
            .collect())
    }

    fn get(&self, id: &RecordId) -> Result<Record> {
        self.list_all()?
            .into_iter()
            .find(|record| record.id.as_ref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Merge `patch` over the stored record and persist the result.
    fn update_by_id(&self, id: &RecordId, patch: &RecordPatch) -> Result<Record>;

    fn delete_by_id(&self, id: &RecordId) -> Result<()>;
}

/// Use `record`'s id, or mint one when it is missing or blank.
pub(crate) fn ensure_id(record: &mut Record) -> RecordId {
    match record.id.as_ref().filter(|id| !id.is_blank()) {
        Some(id) => id.clone(),
        None => {
            let id = RecordId::generate();
            record.id = Some(id.clone());
            id
        }
    }
}
