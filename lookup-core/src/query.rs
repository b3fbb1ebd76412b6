use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};

use crate::error::{INVALID_CITY_MESSAGE, LookupError};

/// Letters, whitespace, commas, periods and hyphens.
static CITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s,.-]+$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What a single lookup is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    City(String),
    Coordinates(Coordinates),
}

impl SearchQuery {
    /// Validated city query. See [`validate_city`].
    pub fn city(input: &str) -> Result<Self, LookupError> {
        validate_city(input).map(SearchQuery::City)
    }

    /// Coordinates come from the geolocation provider and are not pattern-checked.
    pub fn coordinates(coords: Coordinates) -> Self {
        SearchQuery::Coordinates(coords)
    }

    /// Location part of the API query string.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            SearchQuery::City(city) => vec![("q", city.clone())],
            SearchQuery::Coordinates(coords) => vec![
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ],
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchQuery::City(city) => f.write_str(city),
            SearchQuery::Coordinates(coords) => write!(f, "{coords}"),
        }
    }
}

/// Trim and validate a free-text city name.
pub fn validate_city(input: &str) -> Result<String, LookupError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(LookupError::EmptyQuery);
    }
    if !CITY_PATTERN.is_match(trimmed) {
        return Err(LookupError::InvalidCity(trimmed.to_string()));
    }

    Ok(trimmed.to_string())
}

/// As-you-type check: `None` while the input is empty or acceptable.
pub fn input_hint(partial: &str) -> Option<&'static str> {
    if !partial.is_empty() && !CITY_PATTERN.is_match(partial) {
        Some(INVALID_CITY_MESSAGE)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_city_names() {
        for city in ["London", "New York", "Washington, D.C.", "Stratford-upon-Avon"] {
            assert_eq!(validate_city(city).expect("valid city"), city);
        }
    }

    #[test]
    fn trims_before_validating() {
        assert_eq!(validate_city("  Paris \n").unwrap(), "Paris");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(validate_city(""), Err(LookupError::EmptyQuery)));
        assert!(matches!(validate_city("   "), Err(LookupError::EmptyQuery)));
    }

    #[test]
    fn rejects_disallowed_characters() {
        for input in ["London1", "Paris; DROP", "São Paulo", "a/b", "Zürich", "'quoted'"] {
            assert!(
                matches!(validate_city(input), Err(LookupError::InvalidCity(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn input_hint_ignores_empty_input() {
        assert_eq!(input_hint(""), None);
        assert_eq!(input_hint("Ber"), None);
        assert_eq!(input_hint("Ber1"), Some(INVALID_CITY_MESSAGE));
    }

    #[test]
    fn query_pairs_for_city_and_coordinates() {
        let city = SearchQuery::city("Oslo").unwrap();
        assert_eq!(city.query_pairs(), vec![("q", "Oslo".to_string())]);

        let coords = SearchQuery::coordinates(Coordinates::new(51.5074, -0.1278));
        assert_eq!(
            coords.query_pairs(),
            vec![("lat", "51.5074".to_string()), ("lon", "-0.1278".to_string())]
        );
    }
}
