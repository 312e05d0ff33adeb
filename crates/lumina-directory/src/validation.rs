//! Shape checks applied before a record is written.

use std::str::FromStr;

use lumina_shared::{Record, RecordKind, RecordPatch};
use lumina_store::{decode_record, unreadable_numbers};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FieldIssue, ValidationError};

/// How much a submission must contain beyond its name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Artists need a contact email, a phone and an Instagram or Spotify
    /// link. Venues need a map position.
    #[default]
    Strict,
    /// Name only.
    Lenient,
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown validation policy '{other}'")),
        }
    }
}

/// Decode a submitted draft. Legacy key names are accepted; counts and
/// coordinates that cannot be read are reported instead of dropped.
pub fn decode_draft(raw: Value) -> Result<Record, ValidationError> {
    if !raw.is_object() {
        return Err(ValidationError::single(FieldIssue::invalid(
            "record",
            "expected a JSON object",
        )));
    }

    let issues: Vec<FieldIssue> = unreadable_numbers(&raw)
        .into_iter()
        .map(|(field, value)| {
            let expected = match field {
                "lat" | "lng" => "a number",
                _ => "a positive integer",
            };
            FieldIssue::invalid(field, format!("{value} is not {expected}"))
        })
        .collect();
    if !issues.is_empty() {
        return Err(ValidationError { issues });
    }

    decode_record(raw).map_err(|e| ValidationError::single(FieldIssue::invalid("record", e.to_string())))
}

/// A patch body must be a JSON object; its values are checked when applied.
pub fn decode_patch(raw: Value) -> Result<RecordPatch, ValidationError> {
    match raw {
        Value::Object(map) => Ok(RecordPatch::from_map(map)),
        _ => Err(ValidationError::single(FieldIssue::invalid(
            "patch",
            "expected a JSON object",
        ))),
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl ValidationPolicy {
    /// Collect every issue with `record` as a `kind` listing.
    pub fn check(&self, kind: RecordKind, record: &Record) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if record.name.trim().is_empty() {
            issues.push(FieldIssue::missing("name"));
        }

        if let Some(email) = record.contact.email.as_deref() {
            if !email.trim().is_empty() && !email.contains('@') {
                issues.push(FieldIssue::invalid("contact.email", "must contain '@'"));
            }
        }

        if let Some(lat) = record.lat {
            if !(-90.0..=90.0).contains(&lat) {
                issues.push(FieldIssue::invalid("lat", "must be between -90 and 90"));
            }
        }
        if let Some(lng) = record.lng {
            if !(-180.0..=180.0).contains(&lng) {
                issues.push(FieldIssue::invalid("lng", "must be between -180 and 180"));
            }
        }

        if *self == Self::Strict {
            match kind {
                RecordKind::Artist => {
                    if record.links.get("instagram").is_none()
                        && record.links.get("spotify").is_none()
                    {
                        issues.push(FieldIssue::invalid(
                            "links",
                            "an Instagram or Spotify link is required",
                        ));
                    }
                    if blank(record.contact.email.as_deref()) {
                        issues.push(FieldIssue::missing("contact.email"));
                    }
                    if blank(record.contact.phone.as_deref()) {
                        issues.push(FieldIssue::missing("contact.phone"));
                    }
                }
                RecordKind::Venue => {
                    if record.lat.is_none() {
                        issues.push(FieldIssue::missing("lat"));
                    }
                    if record.lng.is_none() {
                        issues.push(FieldIssue::missing("lng"));
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}
