//! Typed access to the persisted preferences, snapshot and search history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::{
    error::LookupError,
    model::CurrentPayload,
    session::is_plausible_api_key,
    store::{KeyValueStore, StoreError},
    units::UnitSystem,
};

pub const API_KEY_KEY: &str = "openweathermap_api_key";
pub const UNITS_KEY: &str = "weatherUnits";
pub const THEME_KEY: &str = "darkMode";
pub const LAST_SEARCH_KEY: &str = "lastWeatherSearch";
pub const HISTORY_KEY: &str = "searchHistory";

pub const HISTORY_LIMIT: usize = 5;
/// Snapshots older than this are not shown again on load.
pub const SNAPSHOT_MAX_AGE_MS: i64 = 10 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }
}

/// Last successful lookup, kept so a restart can show it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastSearchSnapshot {
    pub location: String,
    pub data: CurrentPayload,
    pub units: UnitSystem,
    /// Unix milliseconds at capture.
    pub timestamp: i64,
}

impl LastSearchSnapshot {
    pub fn new(
        location: impl Into<String>,
        data: CurrentPayload,
        units: UnitSystem,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            location: location.into(),
            data,
            units,
            timestamp: captured_at.timestamp_millis(),
        }
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Younger than [`SNAPSHOT_MAX_AGE_MS`] and captured in the same unit system.
    pub fn is_fresh(&self, now: DateTime<Utc>, units: UnitSystem) -> bool {
        self.timestamp > now.timestamp_millis() - SNAPSHOT_MAX_AGE_MS && self.units == units
    }
}

#[derive(Debug)]
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn api_key(&self) -> Option<String> {
        self.store
            .get(API_KEY_KEY)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    pub fn save_api_key(&mut self, key: &str) -> Result<(), LookupError> {
        let key = key.trim();
        if !is_plausible_api_key(key) {
            return Err(LookupError::InvalidApiKeyFormat);
        }
        self.store.set(API_KEY_KEY, key.to_string())?;
        Ok(())
    }

    pub fn units(&self) -> UnitSystem {
        match self.store.get(UNITS_KEY) {
            None => UnitSystem::default(),
            Some(raw) => UnitSystem::try_from(raw.as_str()).unwrap_or_else(|err| {
                warn!(error = %err, "ignoring stored unit preference");
                UnitSystem::default()
            }),
        }
    }

    pub fn save_units(&mut self, units: UnitSystem) -> Result<(), StoreError> {
        self.store.set(UNITS_KEY, units.as_str().to_string())
    }

    pub fn theme(&self) -> Theme {
        match self.store.get(THEME_KEY).as_deref() {
            Some("true") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn save_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.store.set(THEME_KEY, theme.is_dark().to_string())
    }

    /// The stored snapshot, if any. A corrupt entry is removed and reported as absent.
    pub fn last_search(&mut self) -> Option<LastSearchSnapshot> {
        self.read_json(LAST_SEARCH_KEY)
    }

    pub fn save_last_search(&mut self, snapshot: &LastSearchSnapshot) -> Result<(), StoreError> {
        self.write_json(LAST_SEARCH_KEY, snapshot)
    }

    /// Most recent first. A corrupt entry is removed and reported as empty.
    pub fn search_history(&mut self) -> Vec<String> {
        self.read_json(HISTORY_KEY).unwrap_or_default()
    }

    /// Move `location` to the front, dropping case-insensitive duplicates and
    /// anything past [`HISTORY_LIMIT`].
    pub fn add_to_history(&mut self, location: &str) -> Result<Vec<String>, StoreError> {
        let needle = location.to_lowercase();
        let mut history = self.search_history();

        history.retain(|item| item.to_lowercase() != needle);
        history.insert(0, location.to_string());
        history.truncate(HISTORY_LIMIT);

        self.write_json(HISTORY_KEY, &history)?;
        Ok(history)
    }

    fn read_json<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "removing corrupt persisted entry");
                if let Err(err) = self.store.remove(key) {
                    warn!(key, error = %err, "failed to remove corrupt persisted entry");
                }
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, json)
    }
}
