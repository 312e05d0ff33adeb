//! Read-time normalization of heterogeneous record shapes.
//!
//! Older builds wrote the same logical entity under different key names
//! (`photoDataUrl`, `whatsapp`, `aforo`, snake_case table columns, ...).
//! Raw JSON read from any backend goes through [`normalize`] before it is
//! decoded into a [`Record`]. Nothing here ever runs on the write path, so
//! stored history is left untouched.

use lumina_shared::Record;
use serde_json::{Map, Number, Value};

/// Where a legacy key lands in the canonical shape.
#[derive(Debug, Clone, Copy)]
enum Target {
    Field(&'static str),
    Nested(&'static str, &'static str),
}

use Target::{Field, Nested};

/// Legacy key -> canonical location. When several aliases map to the same
/// place the first one present wins; an existing canonical value always wins.
const FIELD_ALIASES: &[(&str, Target)] = &[
    // photo
    ("photoDataUrl", Field("photo")),
    ("imageUrl", Field("photo")),
    ("image", Field("photo")),
    ("photoUrl", Field("photo")),
    ("thumbnail", Field("photo")),
    ("avatar", Field("photo")),
    ("logo", Field("photo")),
    // links
    ("instagram", Nested("links", "instagram")),
    ("spotify", Nested("links", "spotify")),
    ("youtube", Nested("links", "youtube")),
    ("tiktok", Nested("links", "tiktok")),
    ("website", Nested("links", "website")),
    // contact
    ("email", Nested("contact", "email")),
    ("contact_email", Nested("contact", "email")),
    ("whatsapp", Nested("contact", "phone")),
    ("phone", Nested("contact", "phone")),
    ("contact_phone", Nested("contact", "phone")),
    ("hideWhatsapp", Nested("contact", "hidePhone")),
    ("hide_whatsapp", Nested("contact", "hidePhone")),
    ("hide_phone", Nested("contact", "hidePhone")),
    // place
    ("genre", Field("genres")),
    ("localidad", Field("city")),
    ("ciudad", Field("city")),
    ("barrio", Field("city")),
    ("aforo", Field("capacity")),
    ("capacidad", Field("capacity")),
    ("latitude", Field("lat")),
    ("Lat", Field("lat")),
    ("Latitude", Field("lat")),
    ("lon", Field("lng")),
    ("long", Field("lng")),
    ("longitude", Field("lng")),
    ("Lng", Field("lng")),
    ("Longitude", Field("lng")),
    // ownership / identity
    ("user_id", Field("ownerId")),
    ("owner_id", Field("ownerId")),
    ("owner_email", Field("ownerEmail")),
    ("legacy_id", Field("legacyId")),
    ("_id", Field("legacyId")),
    ("slug", Field("legacyId")),
    // misc snake_case columns
    ("predominant_genre", Field("predominantGenre")),
    ("venues_played", Field("venuesPlayed")),
];

/// Aliases found inside a nested `contact` object.
const CONTACT_ALIASES: &[(&str, &str)] = &[("whatsapp", "phone"), ("hideWhatsapp", "hidePhone")];

/// Canonical fields holding a single string.
const TEXT_FIELDS: &[&str] = &[
    "name",
    "legacyId",
    "ownerEmail",
    "predominantGenre",
    "city",
    "country",
    "address",
    "photo",
    "bio",
];

/// Canonical fields holding an identifier (string or number).
const ID_FIELDS: &[&str] = &["id", "ownerId"];

/// Canonical fields holding a positive count.
const COUNT_FIELDS: &[&str] = &["capacity", "members"];

/// Canonical fields holding a coordinate.
const COORD_FIELDS: &[&str] = &["lat", "lng"];

/// Rewrite `raw` into the canonical camelCase shape. Non-object values are
/// returned unchanged (decoding will reject them).
pub fn normalize(raw: Value) -> Value {
    let Value::Object(mut obj) = raw else {
        return raw;
    };

    apply_aliases(&mut obj);
    coerce_ids(&mut obj);
    coerce_text(&mut obj);
    coerce_counts(&mut obj);
    coerce_coordinates(&mut obj);
    coerce_genres(&mut obj);
    coerce_contact(&mut obj);
    coerce_links(&mut obj);
    coerce_venues_played(&mut obj);

    Value::Object(obj)
}

/// Normalize then decode.
pub fn decode_record(raw: Value) -> Result<Record, serde_json::Error> {
    serde_json::from_value(normalize(raw))
}

/// Count and coordinate fields in `raw` that [`normalize`] would drop as
/// unreadable, under their canonical names. Read paths tolerate these;
/// submissions should not.
pub fn unreadable_numbers(raw: &Value) -> Vec<(&'static str, Value)> {
    let Value::Object(obj) = raw else {
        return Vec::new();
    };
    let mut obj = obj.clone();
    apply_aliases(&mut obj);

    let counts = COUNT_FIELDS
        .iter()
        .filter(|field| obj.get(**field).is_some_and(|v| !is_blank(v) && parse_count(v).is_none()));
    let coords = COORD_FIELDS.iter().filter(|field| {
        obj.get(**field).is_some_and(|v| {
            !is_blank(v) && parse_coordinate(v).and_then(Number::from_f64).is_none()
        })
    });

    counts
        .chain(coords)
        .filter_map(|field| obj.get(*field).map(|v| (*field, v.clone())))
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn apply_aliases(obj: &mut Map<String, Value>) {
    for (alias, target) in FIELD_ALIASES {
        let Some(value) = obj.remove(*alias) else {
            continue;
        };
        if is_blank(&value) {
            continue;
        }
        match target {
            Field(field) => {
                if obj.get(*field).map_or(true, is_blank) {
                    obj.insert((*field).to_string(), value);
                }
            }
            Nested(parent, child) => {
                let entry = obj
                    .entry((*parent).to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(nested) = entry {
                    if nested.get(*child).map_or(true, is_blank) {
                        nested.insert((*child).to_string(), value);
                    }
                }
            }
        }
    }
}

fn coerce_ids(obj: &mut Map<String, Value>) {
    for &field in ID_FIELDS {
        let keep = match obj.get(field) {
            None => continue,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(_)) => true,
            Some(_) => false,
        };
        if !keep {
            obj.remove(field);
        }
    }
}

fn coerce_text(obj: &mut Map<String, Value>) {
    for &field in TEXT_FIELDS {
        let replacement = match obj.get(field) {
            None => continue,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(_)) => continue,
            Some(Value::Number(n)) => Some(Value::String(n.to_string())),
            Some(Value::Bool(b)) => Some(Value::String(b.to_string())),
            Some(Value::Null) => None,
            Some(other) => {
                tracing::warn!(field, value = %other, "dropping non-text value");
                None
            }
        };
        match replacement {
            Some(value) => {
                obj.insert(field.to_string(), value);
            }
            None => {
                obj.remove(field);
            }
        }
    }
}

fn parse_count(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (n > 0 && n <= u64::from(u32::MAX)).then_some(n)
}

fn coerce_counts(obj: &mut Map<String, Value>) {
    for &field in COUNT_FIELDS {
        let Some(value) = obj.remove(field) else {
            continue;
        };
        if is_blank(&value) {
            continue;
        }
        match parse_count(&value) {
            Some(n) => {
                obj.insert(field.to_string(), Value::Number(n.into()));
            }
            None => tracing::warn!(field, value = %value, "dropping invalid count"),
        }
    }
}

fn parse_coordinate(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

fn coerce_coordinates(obj: &mut Map<String, Value>) {
    for &field in COORD_FIELDS {
        let Some(value) = obj.remove(field) else {
            continue;
        };
        if is_blank(&value) {
            continue;
        }
        match parse_coordinate(&value).and_then(Number::from_f64) {
            Some(n) => {
                obj.insert(field.to_string(), Value::Number(n));
            }
            None => tracing::warn!(field, value = %value, "dropping invalid coordinate"),
        }
    }
}

fn text_items(values: Vec<Value>) -> Vec<Value> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(Value::String(s.trim().to_string())),
            Value::Number(n) => Some(Value::String(n.to_string())),
            _ => None,
        })
        .collect()
}

fn coerce_genres(obj: &mut Map<String, Value>) {
    let Some(value) = obj.remove("genres") else {
        return;
    };
    let items = match value {
        Value::Array(values) => text_items(values),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(|g| Value::String(g.to_string()))
            .collect(),
        _ => Vec::new(),
    };
    if !items.is_empty() {
        obj.insert("genres".to_string(), Value::Array(items));
    }
}

fn coerce_venues_played(obj: &mut Map<String, Value>) {
    let Some(value) = obj.remove("venuesPlayed") else {
        return;
    };
    if let Value::Array(values) = value {
        let items = text_items(values);
        if !items.is_empty() {
            obj.insert("venuesPlayed".to_string(), Value::Array(items));
        }
    }
}

fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.trim(), "true" | "1" | "yes"),
        _ => false,
    }
}

fn coerce_contact(obj: &mut Map<String, Value>) {
    let Some(value) = obj.remove("contact") else {
        return;
    };
    let Value::Object(mut contact) = value else {
        return;
    };

    for (alias, field) in CONTACT_ALIASES {
        if let Some(v) = contact.remove(*alias) {
            if contact.get(*field).map_or(true, is_blank) {
                contact.insert((*field).to_string(), v);
            }
        }
    }

    let mut clean = Map::new();
    for field in ["email", "phone"] {
        match contact.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                clean.insert(field.to_string(), Value::String(s.trim().to_string()));
            }
            Some(Value::Number(n)) => {
                clean.insert(field.to_string(), Value::String(n.to_string()));
            }
            _ => {}
        }
    }
    if let Some(flag) = contact.get("hidePhone") {
        clean.insert("hidePhone".to_string(), Value::Bool(parse_flag(flag)));
    }

    if !clean.is_empty() {
        obj.insert("contact".to_string(), Value::Object(clean));
    }
}

fn coerce_links(obj: &mut Map<String, Value>) {
    let Some(value) = obj.remove("links") else {
        return;
    };
    let Value::Object(links) = value else {
        return;
    };
    let clean: Map<String, Value> = links
        .into_iter()
        .filter(|(_, url)| matches!(url, Value::String(s) if !s.trim().is_empty()))
        .collect();
    if !clean.is_empty() {
        obj.insert("links".to_string(), Value::Object(clean));
    }
}
