//! Browse filters and facet lists.

use std::collections::BTreeSet;

use lumina_shared::{Record, RecordId};
use serde::{Deserialize, Serialize};

/// Conjunctive record filter. An empty or absent criterion matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Case-insensitive substring of the name.
    #[serde(default, alias = "q")]
    pub text: Option<String>,
    /// Exact genre membership.
    #[serde(default)]
    pub genre: Option<String>,
    /// Exact city.
    #[serde(default)]
    pub city: Option<String>,
    /// Listed among the venues an artist has played.
    #[serde(default, alias = "fromVenue")]
    pub venue: Option<RecordId>,
}

fn criterion(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl SearchFilter {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn venue(mut self, venue: impl Into<RecordId>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(text) = criterion(self.text.as_deref()) {
            if !record.name.to_lowercase().contains(&text.to_lowercase()) {
                return false;
            }
        }
        if let Some(genre) = criterion(self.genre.as_deref()) {
            if !record.genres.iter().any(|g| g == genre) {
                return false;
            }
        }
        if let Some(city) = criterion(self.city.as_deref()) {
            if record.city.as_deref() != Some(city) {
                return false;
            }
        }
        if let Some(venue) = self.venue.as_ref().filter(|v| !v.is_blank()) {
            if !record.venues_played.contains(venue) {
                return false;
            }
        }
        true
    }
}

/// Records passing `filter`, order preserved.
pub fn search(records: Vec<Record>, filter: &SearchFilter) -> Vec<Record> {
    records.into_iter().filter(|r| filter.matches(r)).collect()
}

/// Distinct values offered as filter choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub genres: Vec<String>,
    pub cities: Vec<String>,
}

pub fn facets(records: &[Record]) -> Facets {
    let mut genres = BTreeSet::new();
    let mut cities = BTreeSet::new();

    for record in records {
        genres.extend(record.genres.iter().filter(|g| !g.trim().is_empty()).cloned());
        if let Some(city) = criterion(record.city.as_deref()) {
            cities.insert(city.to_string());
        }
    }

    Facets {
        genres: genres.into_iter().collect(),
        cities: cities.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Record> {
        let mut gatos = Record::named("Los Gatos")
            .with_city("Rosario")
            .with_genres(["Rock", "Beat"]);
        gatos.venues_played.insert("v1".into());

        vec![
            gatos,
            Record::named("Gata Flora").with_city("Córdoba").with_genres(["Pop"]),
            Record::named("Almendra").with_city("Rosario").with_genres(["Rock"]),
        ]
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn empty_filter_matches_all() {
        let filter = SearchFilter::default().text("  ").genre("");
        assert_eq!(search(catalog(), &filter).len(), 3);
    }

    #[test]
    fn text_is_case_insensitive_substring() {
        let found = search(catalog(), &SearchFilter::default().text("GAT"));
        assert_eq!(names(&found), vec!["Los Gatos", "Gata Flora"]);
    }

    #[test]
    fn criteria_compose_with_and() {
        let text = SearchFilter::default().text("a");
        let genre = SearchFilter::default().genre("Rock");
        let city = SearchFilter::default().city("Rosario");
        let all = SearchFilter::default().text("a").genre("Rock").city("Rosario");

        let expected: Vec<Record> = catalog()
            .into_iter()
            .filter(|r| text.matches(r) && genre.matches(r) && city.matches(r))
            .collect();
        assert_eq!(search(catalog(), &all), expected);
        assert_eq!(names(&expected), vec!["Los Gatos", "Almendra"]);
    }

    #[test]
    fn genre_and_city_are_exact() {
        assert!(search(catalog(), &SearchFilter::default().genre("rock")).is_empty());
        assert!(search(catalog(), &SearchFilter::default().city("rosario")).is_empty());
    }

    #[test]
    fn venue_filter_uses_venues_played() {
        let found = search(catalog(), &SearchFilter::default().venue("v1"));
        assert_eq!(names(&found), vec!["Los Gatos"]);
    }

    #[test]
    fn facets_are_sorted_and_distinct() {
        let f = facets(&catalog());
        assert_eq!(f.genres, vec!["Beat", "Pop", "Rock"]);
        assert_eq!(f.cities, vec!["Córdoba", "Rosario"]);
    }
}
