//! Collapsing the same listing read from several sources.

use std::collections::HashSet;

use lumina_shared::Record;

/// Identity used to recognise two copies of one listing. Variants never
/// compare equal to each other, so a name that happens to look like an id
/// cannot collide with one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalKey {
    Id(String),
    Legacy(String),
    NameCity(String, String),
    NameAddress(String, String),
    Structural(String),
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// First usable of: `id`, `legacyId`, `name|city`, `name|address`, the full
/// serialized record.
pub fn logical_key(record: &Record) -> LogicalKey {
    if let Some(id) = record.id.as_ref().filter(|id| !id.is_blank()) {
        return LogicalKey::Id(id.as_str().to_string());
    }
    if let Some(legacy) = present(record.legacy_id.as_deref()) {
        return LogicalKey::Legacy(legacy.to_string());
    }
    if let Some(name) = present(Some(record.name.as_str())) {
        if let Some(city) = present(record.city.as_deref()) {
            return LogicalKey::NameCity(name.to_string(), city.to_string());
        }
        if let Some(address) = present(record.address.as_deref()) {
            return LogicalKey::NameAddress(name.to_string(), address.to_string());
        }
    }
    // serde_json::Map keeps keys sorted, so equal records serialize equally.
    LogicalKey::Structural(serde_json::to_string(record).unwrap_or_default())
}

/// Drop later records whose [`logical_key`] was already seen. Order of the
/// survivors is preserved.
pub fn unique_by_logical_id(records: impl IntoIterator<Item = Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(logical_key(record)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_store::decode_record;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_collapse_first_wins() {
        let records = vec![
            decode_record(json!({"id": 1, "name": "A"})).unwrap(),
            decode_record(json!({"id": "1", "name": "B"})).unwrap(),
        ];
        let unique = unique_by_logical_id(records);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].name, "A");
    }

    #[test]
    fn idempotent() {
        let records = vec![
            Record::named("Niceto").with_city("Palermo"),
            Record::named("Niceto").with_city("Palermo"),
            Record::named("Niceto").with_city("Rosario"),
            Record::named("Los Gatos").with_id("7"),
            Record::named("Otro").with_id("7"),
        ];
        let once = unique_by_logical_id(records);
        let twice = unique_by_logical_id(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn key_precedence() {
        let mut record = Record::named("Niceto").with_city("Palermo");
        assert_eq!(
            logical_key(&record),
            LogicalKey::NameCity("Niceto".into(), "Palermo".into())
        );

        record.legacy_id = Some("niceto-club".into());
        assert_eq!(logical_key(&record), LogicalKey::Legacy("niceto-club".into()));

        record.id = Some("42".into());
        assert_eq!(logical_key(&record), LogicalKey::Id("42".into()));

        let mut by_address = Record::named("Niceto");
        by_address.address = Some("Niceto Vega 5510".into());
        assert!(matches!(logical_key(&by_address), LogicalKey::NameAddress(..)));
    }

    #[test]
    fn id_and_name_keys_do_not_collide() {
        let records = vec![
            Record::named("x").with_id("Niceto|Palermo"),
            Record::named("Niceto").with_city("Palermo"),
        ];
        assert_eq!(unique_by_logical_id(records).len(), 2);
    }

    #[test]
    fn anonymous_records_dedup_structurally() {
        let records = vec![Record::named(""), Record::named(""), Record::named("").with_genres(["Rock"])];
        assert_eq!(unique_by_logical_id(records).len(), 2);
    }
}
