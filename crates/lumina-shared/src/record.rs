//! The generic directory record shared by artists and venues.
//!
//! Every struct serializes with camelCase keys, which is the canonical shape
//! written by the local store and returned over the HTTP API.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::types::{Actor, ActorId, RecordId};

// ---------------------------------------------------------------------------
// OrderedSet
// ---------------------------------------------------------------------------

/// A small set that keeps insertion order for display. Duplicates are
/// dropped both on insert and on deserialization (first occurrence wins).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSet<T>(Vec<T>);

impl<T: PartialEq> OrderedSet<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns `false` when the value was already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.0.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    pub fn remove(&mut self, value: &T) -> bool {
        let before = self.0.len();
        self.0.retain(|v| v != value);
        self.0.len() != before
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
}

impl<T: PartialEq> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: Serialize> Serialize for OrderedSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + PartialEq> Deserialize<'de> for OrderedSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Contact / Links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Hide the phone number from the public listing.
    #[serde(default)]
    pub hide_phone: bool,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && !self.hide_phone
    }

    /// Phone number as shown to someone other than the owner.
    pub fn public_phone(&self) -> Option<&str> {
        if self.hide_phone {
            None
        } else {
            self.phone.as_deref()
        }
    }
}

/// Platform name -> URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, String>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blank URL for `platform`, if any.
    pub fn get(&self, platform: &str) -> Option<&str> {
        self.0
            .get(platform)
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }

    pub fn set(&mut self, platform: impl Into<String>, url: impl Into<String>) {
        self.0.insert(platform.into(), url.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|url| url.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A directory listing (artist or venue).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Alternate identifier carried over from older storage layouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "OrderedSet::is_empty")]
    pub genres: OrderedSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predominant_genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<NonZeroU32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<NonZeroU32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Contact::is_empty")]
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    /// Inline `data:` URI produced by the image encoder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "OrderedSet::is_empty")]
    pub venues_played: OrderedSet<RecordId>,
    /// Free-form attributes the directory does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether any owner reference is set.
    pub fn has_owner(&self) -> bool {
        self.owner_id.as_ref().is_some_and(|id| !id.as_str().is_empty())
            || self
                .owner_email
                .as_deref()
                .is_some_and(|email| !email.trim().is_empty())
    }

    /// Ownership check. `ownerId` is authoritative when present; records
    /// that only carry `ownerEmail` match the actor's email
    /// (case-insensitive). Unowned records match nobody.
    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        if let Some(owner_id) = self.owner_id.as_ref().filter(|id| !id.as_str().is_empty()) {
            return owner_id == &actor.id;
        }
        match (self.owner_email.as_deref(), actor.email.as_deref()) {
            (Some(owner), Some(email)) if !owner.trim().is_empty() => {
                owner.trim().eq_ignore_ascii_case(email.trim())
            }
            _ => false,
        }
    }

    /// Stamp the actor as owner.
    pub fn stamp_owner(&mut self, actor: &Actor) {
        self.owner_id = Some(actor.id.clone());
        self.owner_email = actor.email.clone();
    }

    /// Finite (lat, lng) pair, if both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }

    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }
}
