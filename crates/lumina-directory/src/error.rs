use std::fmt;

use lumina_shared::{ActorId, ImageError, PatchError, RecordId, RecordKind};
use lumina_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// What is wrong with one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", content = "detail", rename_all = "lowercase")]
pub enum Problem {
    Missing,
    Invalid(String),
    Immutable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    #[serde(flatten)]
    pub problem: Problem,
}

impl FieldIssue {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: Problem::Missing,
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: Problem::Invalid(reason.into()),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Problem::Missing => write!(f, "{} is required", self.field),
            Problem::Invalid(reason) => write!(f, "{}: {reason}", self.field),
            Problem::Immutable => write!(f, "{} cannot be changed", self.field),
        }
    }
}

/// Every field that failed validation, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn single(issue: FieldIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.field.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid record: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<PatchError> for ValidationError {
    fn from(e: PatchError) -> Self {
        let issue = match e {
            PatchError::Immutable(field) => FieldIssue {
                field: field.to_string(),
                problem: Problem::Immutable,
            },
            PatchError::InvalidValue { field, reason } => FieldIssue::invalid(field, reason),
            PatchError::Serialization(e) => FieldIssue::invalid("record", e.to_string()),
        };
        Self::single(issue)
    }
}

/// Errors produced by the directory engine.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{kind} {id} is not owned by {actor}")]
    Ownership {
        kind: RecordKind,
        id: RecordId,
        actor: ActorId,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: RecordId },

    #[error("Could not read image: {0}")]
    ImageDecode(#[from] ImageError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl DirectoryError {
    /// Translate a store failure for a `kind` collection.
    pub(crate) fn from_store(kind: RecordKind, e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound { kind, id },
            StoreError::DuplicateId(id) => Self::Validation(ValidationError::single(
                FieldIssue::invalid("id", format!("{id} is already taken")),
            )),
            StoreError::Patch(e) => Self::Validation(e.into()),
            other => {
                if other.is_unavailable() {
                    tracing::error!(%kind, error = %other, "record store failed");
                } else {
                    tracing::warn!(%kind, error = %other, "record store rejected request");
                }
                Self::StoreUnavailable(other)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_directory_errors() {
        let id = RecordId::from("v-1");
        assert!(matches!(
            DirectoryError::from_store(RecordKind::Venue, StoreError::NotFound(id.clone())),
            DirectoryError::NotFound { .. }
        ));

        match DirectoryError::from_store(RecordKind::Venue, StoreError::DuplicateId(id)) {
            DirectoryError::Validation(v) => assert_eq!(v.fields().collect::<Vec<_>>(), vec!["id"]),
            other => panic!("unexpected error: {other}"),
        }

        let io = StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        assert!(io.is_unavailable());
        assert!(matches!(
            DirectoryError::from_store(RecordKind::Venue, io),
            DirectoryError::StoreUnavailable(_)
        ));
    }
}
