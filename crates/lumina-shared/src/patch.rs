//! Partial updates applied over a stored [`Record`].
//!
//! A patch is a map of canonical top-level keys. Applying it replaces each
//! key wholesale: nested objects such as `contact` or `links` are not
//! deep-merged. A `null` value clears the field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PatchError;
use crate::record::Record;

/// Keys that identify a record or its owner and may never change.
const IMMUTABLE_KEYS: &[&str] = &["id", "ownerId", "ownerEmail"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RecordPatch(Map<String, Value>);

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Builder-style setter.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Produce the merged record without touching `base`.
    pub fn apply_to(&self, base: &Record) -> Result<Record, PatchError> {
        let mut merged = match serde_json::to_value(base)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for (key, value) in &self.0 {
            if let Some(&immutable) = IMMUTABLE_KEYS.iter().find(|k| **k == key.as_str()) {
                if merged.get(key).unwrap_or(&Value::Null) != value {
                    return Err(PatchError::Immutable(immutable));
                }
                continue;
            }

            check_value(key, value)?;

            if value.is_null() {
                merged.remove(key);
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }

        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}

// A lone key decoded into an otherwise empty record pins type errors to the
// offending field.
fn check_value(key: &str, value: &Value) -> Result<(), PatchError> {
    if value.is_null() {
        return Ok(());
    }
    let mut single = Map::new();
    single.insert(key.to_string(), value.clone());
    serde_json::from_value::<Record>(Value::Object(single))
        .map(|_| ())
        .map_err(|e| PatchError::InvalidValue {
            field: key.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Links;
    use crate::types::ActorId;
    use serde_json::json;

    fn base() -> Record {
        let mut record = Record::named("Bar X").with_id("1").with_city("BA");
        record.owner_id = Some(ActorId::new("u1"));
        record.contact.email = Some("bar@example.com".into());
        record.contact.phone = Some("123".into());
        let mut links = Links::new();
        links.set("instagram", "https://instagram.com/barx");
        record.links = links;
        record
    }

    #[test]
    fn top_level_keys_replace() {
        let patch = RecordPatch::new().set("name", "Bar Y").set("capacity", 250);
        let merged = patch.apply_to(&base()).unwrap();
        assert_eq!(merged.name, "Bar Y");
        assert_eq!(merged.capacity.map(|c| c.get()), Some(250));
        assert_eq!(merged.city.as_deref(), Some("BA"));
    }

    #[test]
    fn nested_objects_are_replaced_wholesale() {
        let patch = RecordPatch::new().set("contact", json!({"email": "new@example.com"}));
        let merged = patch.apply_to(&base()).unwrap();
        assert_eq!(merged.contact.email.as_deref(), Some("new@example.com"));
        assert_eq!(merged.contact.phone, None);
    }

    #[test]
    fn null_clears_field() {
        let patch = RecordPatch::new().set("city", Value::Null);
        let merged = patch.apply_to(&base()).unwrap();
        assert!(merged.city.is_none());
    }

    #[test]
    fn identity_keys_are_immutable() {
        let patch = RecordPatch::new().set("id", "2");
        assert!(matches!(patch.apply_to(&base()), Err(PatchError::Immutable("id"))));

        let patch = RecordPatch::new().set("ownerId", "u2");
        assert!(matches!(patch.apply_to(&base()), Err(PatchError::Immutable("ownerId"))));

        // Restating the current value is harmless.
        let patch = RecordPatch::new().set("id", "1");
        assert!(patch.apply_to(&base()).is_ok());
    }

    #[test]
    fn bad_value_names_field() {
        let patch = RecordPatch::new().set("capacity", 0);
        match patch.apply_to(&base()) {
            Err(PatchError::InvalidValue { field, .. }) => assert_eq!(field, "capacity"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
