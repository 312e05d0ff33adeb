use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::constants::{ARTISTS_KEY, LEGACY_ARTISTS_KEY, VENUES_KEY};

// Record identity. Legacy data stored numeric ids, so both JSON numbers and
// strings decode into the same textual form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Timestamp-based token: milliseconds since epoch plus a short random
    /// suffix so ids minted within the same millisecond stay distinct.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{millis}-{}", &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
            RawId::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
            RawId::Float(f) => f.to_string(),
        };
        Ok(Self(text))
    }
}

// Actor identity as handed out by the identity provider.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
            RawId::Float(f) => f.to_string(),
        };
        Ok(Self(text))
    }
}

/// The signed-in user on whose behalf an operation runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            email: None,
            name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Suffix used for per-actor storage keys: id first, then email.
    pub fn storage_suffix(&self) -> &str {
        if !self.id.as_str().is_empty() {
            self.id.as_str()
        } else {
            self.email.as_deref().unwrap_or("anon")
        }
    }
}

/// The two collections the directory manages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Artist,
    Venue,
}

impl RecordKind {
    /// Current local storage key.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Artist => ARTISTS_KEY,
            Self::Venue => VENUES_KEY,
        }
    }

    /// Keys older builds wrote the same collection under.
    pub fn legacy_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Artist => &[LEGACY_ARTISTS_KEY],
            Self::Venue => &[],
        }
    }

    /// Table name in the hosted backend.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Artist => "artists",
            Self::Venue => "venues",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Venue => "venue",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
