use crate::{error::LookupError, units::UnitSystem};

/// Shortest key accepted as plausibly valid.
pub const MIN_API_KEY_LEN: usize = 10;

/// Credentials and unit preference captured for one user action.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    api_key: String,
    units: UnitSystem,
}

impl Session {
    pub fn new(api_key: &str, units: UnitSystem) -> Result<Self, LookupError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(LookupError::MissingApiKey);
        }
        if !is_plausible_api_key(api_key) {
            return Err(LookupError::InvalidApiKeyFormat);
        }

        Ok(Self {
            api_key: api_key.to_string(),
            units,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &"<redacted>")
            .field("units", &self.units)
            .finish()
    }
}

pub fn is_plausible_api_key(key: &str) -> bool {
    key.trim().chars().count() >= MIN_API_KEY_LEN
}
