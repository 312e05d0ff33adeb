//! Venue map markers.

use lumina_shared::constants::{CAPACITY_BAND_THRESHOLD, DEFAULT_MAP_CENTER};
use lumina_shared::{Record, RecordId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityBand {
    #[default]
    Any,
    /// More than 100 people.
    Over100,
    /// Up to 100 people.
    UpTo100,
}

impl CapacityBand {
    /// Records without a capacity only pass [`CapacityBand::Any`].
    pub fn admits(&self, capacity: Option<u32>) -> bool {
        match (self, capacity) {
            (Self::Any, _) => true,
            (Self::Over100, Some(c)) => c > CAPACITY_BAND_THRESHOLD,
            (Self::UpTo100, Some(c)) => c <= CAPACITY_BAND_THRESHOLD,
            (_, None) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFilter {
    /// Case-insensitive substring of the city.
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub capacity: CapacityBand,
}

impl MapFilter {
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(locality) = self.locality.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            let city = record.city.as_deref().unwrap_or_default().to_lowercase();
            if !city.contains(&locality.to_lowercase()) {
                return false;
            }
        }
        self.capacity.admits(record.capacity.map(|c| c.get()))
    }
}

/// What a map pin needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: Option<RecordId>,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predominant_genre: Option<String>,
}

/// Markers for records with a finite position that pass `filter`.
pub fn map_markers(records: &[Record], filter: &MapFilter) -> Vec<Marker> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .filter_map(|r| {
            let (lat, lng) = r.coordinates()?;
            Some(Marker {
                id: r.id.clone(),
                name: r.name.clone(),
                lat,
                lng,
                city: r.city.clone(),
                address: r.address.clone(),
                capacity: r.capacity.map(|c| c.get()),
                predominant_genre: r.predominant_genre.clone(),
            })
        })
        .collect()
}

/// Where to center the map: the mean marker position, or the default center
/// when there are none.
pub fn center(markers: &[Marker]) -> (f64, f64) {
    if markers.is_empty() {
        return DEFAULT_MAP_CENTER;
    }
    let n = markers.len() as f64;
    let (lat, lng) = markers
        .iter()
        .fold((0.0, 0.0), |(lat, lng), m| (lat + m.lat, lng + m.lng));
    (lat / n, lng / n)
}
