use chrono::Utc;
use lumina_shared::{Actor, Record, RecordId, RecordKind, RecordPatch};
use rusqlite::{params, ErrorCode};
use serde_json::{Map, Value};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::normalize::decode_record;

const COLUMNS: &str = "id, legacy_id, user_id, owner_email, name, genres, predominant_genre, \
    city, country, address, capacity, members, lat, lng, contact_email, contact_phone, \
    hide_phone, links, photo, bio, venues_played, extra";

/// Column values of one row, in [`COLUMNS`] order (minus `id`).
struct RowValues {
    legacy_id: Option<String>,
    user_id: Option<String>,
    owner_email: Option<String>,
    name: String,
    genres: Option<String>,
    predominant_genre: Option<String>,
    city: Option<String>,
    country: Option<String>,
    address: Option<String>,
    capacity: Option<u32>,
    members: Option<u32>,
    lat: Option<f64>,
    lng: Option<f64>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    hide_phone: bool,
    links: Option<String>,
    photo: Option<String>,
    bio: Option<String>,
    venues_played: Option<String>,
    extra: Option<String>,
}

impl RowValues {
    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            legacy_id: record.legacy_id.clone(),
            user_id: record.owner_id.as_ref().map(|id| id.as_str().to_string()),
            owner_email: record.owner_email.clone(),
            name: record.name.clone(),
            genres: (!record.genres.is_empty())
                .then(|| serde_json::to_string(&record.genres))
                .transpose()?,
            predominant_genre: record.predominant_genre.clone(),
            city: record.city.clone(),
            country: record.country.clone(),
            address: record.address.clone(),
            capacity: record.capacity.map(|c| c.get()),
            members: record.members.map(|m| m.get()),
            lat: record.lat,
            lng: record.lng,
            contact_email: record.contact.email.clone(),
            contact_phone: record.contact.phone.clone(),
            hide_phone: record.contact.hide_phone,
            links: (!record.links.is_empty())
                .then(|| serde_json::to_string(&record.links))
                .transpose()?,
            photo: record.photo.clone(),
            bio: record.bio.clone(),
            venues_played: (!record.venues_played.is_empty())
                .then(|| serde_json::to_string(&record.venues_played))
                .transpose()?,
            extra: (!record.extra.is_empty())
                .then(|| serde_json::to_string(&record.extra))
                .transpose()?,
        })
    }
}

impl Database {
    pub fn insert_record(&self, kind: RecordKind, id: &RecordId, record: &Record) -> Result<()> {
        let v = RowValues::from_record(record)?;
        let now = Utc::now().to_rfc3339();

        let sql = format!(
            "INSERT INTO {table} ({COLUMNS}, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?23)",
            table = kind.table()
        );
        self.conn()
            .execute(
                &sql,
                params![
                    id.as_str(),
                    v.legacy_id,
                    v.user_id,
                    v.owner_email,
                    v.name,
                    v.genres,
                    v.predominant_genre,
                    v.city,
                    v.country,
                    v.address,
                    v.capacity,
                    v.members,
                    v.lat,
                    v.lng,
                    v.contact_email,
                    v.contact_phone,
                    v.hide_phone,
                    v.links,
                    v.photo,
                    v.bio,
                    v.venues_played,
                    v.extra,
                    now,
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::DuplicateId(id.clone())
                }
                other => StoreError::Sqlite(other),
            })?;
        Ok(())
    }

    pub fn list_records(&self, kind: RecordKind) -> Result<Vec<Record>> {
        let sql = format!("SELECT {COLUMNS} FROM {} ORDER BY seq ASC", kind.table());
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map([], row_to_value)?;
        let values = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        Ok(decode_rows(kind, values))
    }

    /// Rows whose `user_id` matches the actor, plus rows without a `user_id`
    /// whose `owner_email` matches it case-insensitively.
    pub fn list_records_by_owner(&self, kind: RecordKind, owner: &Actor) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} \
             WHERE (?1 <> '' AND user_id = ?1) \
                OR ((user_id IS NULL OR user_id = '') AND trim(?2) <> '' \
                    AND lower(trim(owner_email)) = lower(trim(?2))) \
             ORDER BY seq ASC",
            kind.table()
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![owner.id.as_str(), owner.email], row_to_value)?;
        let values = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        Ok(decode_rows(kind, values))
    }

    pub fn get_record(&self, kind: RecordKind, id: &RecordId) -> Result<Record> {
        let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = ?1", kind.table());
        let value = self
            .conn()
            .query_row(&sql, params![id.as_str()], row_to_value)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id.clone()),
                other => StoreError::Sqlite(other),
            })?;
        Ok(decode_record(value)?)
    }

    /// Merge `patch` over the stored row inside one transaction.
    pub fn update_record(
        &self,
        kind: RecordKind,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<Record> {
        let tx = self.conn().unchecked_transaction()?;

        let current = self.get_record(kind, id)?;
        let updated = patch.apply_to(&current)?;
        let v = RowValues::from_record(&updated)?;

        let sql = format!(
            "UPDATE {} SET legacy_id = ?2, user_id = ?3, owner_email = ?4, name = ?5,
                 genres = ?6, predominant_genre = ?7, city = ?8, country = ?9, address = ?10,
                 capacity = ?11, members = ?12, lat = ?13, lng = ?14, contact_email = ?15,
                 contact_phone = ?16, hide_phone = ?17, links = ?18, photo = ?19, bio = ?20,
                 venues_played = ?21, extra = ?22, updated_at = ?23
             WHERE id = ?1",
            kind.table()
        );
        self.conn().execute(
            &sql,
            params![
                id.as_str(),
                v.legacy_id,
                v.user_id,
                v.owner_email,
                v.name,
                v.genres,
                v.predominant_genre,
                v.city,
                v.country,
                v.address,
                v.capacity,
                v.members,
                v.lat,
                v.lng,
                v.contact_email,
                v.contact_phone,
                v.hide_phone,
                v.links,
                v.photo,
                v.bio,
                v.venues_played,
                v.extra,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(updated)
    }

    pub fn delete_record(&self, kind: RecordKind, id: &RecordId) -> Result<bool> {
        let affected = self.conn().execute(
            &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
            params![id.as_str()],
        )?;
        Ok(affected > 0)
    }
}

fn decode_rows(kind: RecordKind, values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .filter_map(|value| match decode_record(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(table = kind.table(), error = %e, "skipping undecodable row");
                None
            }
        })
        .collect()
}

/// JSON text column; text that is not JSON is kept as a plain string and
/// left to normalization.
fn json_column(text: Option<String>) -> Option<Value> {
    text.map(|t| serde_json::from_str(&t).unwrap_or(Value::String(t)))
}

/// A row in its snake_case column shape. Normalization maps it onto the
/// canonical record.
fn row_to_value(row: &rusqlite::Row<'_>) -> rusqlite::Result<Value> {
    let mut obj = Map::new();

    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            obj.insert(key.to_string(), value);
        }
    };

    put("id", Some(Value::String(row.get(0)?)));
    put("legacy_id", row.get::<_, Option<String>>(1)?.map(Value::String));
    put("user_id", row.get::<_, Option<String>>(2)?.map(Value::String));
    put("owner_email", row.get::<_, Option<String>>(3)?.map(Value::String));
    put("name", Some(Value::String(row.get(4)?)));
    put("genres", json_column(row.get(5)?));
    put("predominant_genre", row.get::<_, Option<String>>(6)?.map(Value::String));
    put("city", row.get::<_, Option<String>>(7)?.map(Value::String));
    put("country", row.get::<_, Option<String>>(8)?.map(Value::String));
    put("address", row.get::<_, Option<String>>(9)?.map(Value::String));
    put("capacity", row.get::<_, Option<i64>>(10)?.map(Value::from));
    put("members", row.get::<_, Option<i64>>(11)?.map(Value::from));
    put("lat", row.get::<_, Option<f64>>(12)?.map(Value::from));
    put("lng", row.get::<_, Option<f64>>(13)?.map(Value::from));
    put("contact_email", row.get::<_, Option<String>>(14)?.map(Value::String));
    put("contact_phone", row.get::<_, Option<String>>(15)?.map(Value::String));
    put("hide_phone", Some(Value::Bool(row.get(16)?)));
    put("links", json_column(row.get(17)?));
    put("photo", row.get::<_, Option<String>>(18)?.map(Value::String));
    put("bio", row.get::<_, Option<String>>(19)?.map(Value::String));
    put("venues_played", json_column(row.get(20)?));

    if let Some(Value::Object(extra)) = json_column(row.get(21)?) {
        for (key, value) in extra {
            if !obj.contains_key(&key) {
                obj.insert(key, value);
            }
        }
    }

    Ok(Value::Object(obj))
}
