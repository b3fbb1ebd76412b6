//! Error taxonomy for lookups and the fixed messages shown to the user.

use thiserror::Error;

use crate::store::StoreError;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a city name.";
pub const INVALID_CITY_MESSAGE: &str = "Please enter a valid city name (letters only).";
pub const MISSING_API_KEY_MESSAGE: &str =
    "🔑 Please enter your OpenWeatherMap API key to start using the weather app. \
     Get your free key at openweathermap.org/api";
pub const INVALID_API_KEY_FORMAT_MESSAGE: &str =
    "Please enter a valid API key (should be at least 10 characters)";
pub const UNAUTHORIZED_MESSAGE: &str =
    "❌ Invalid API key. Please check your OpenWeatherMap API key and try again.";
pub const NOT_FOUND_MESSAGE: &str =
    "🏙️ City not found. Please check the spelling and try again.";
pub const RATE_LIMITED_MESSAGE: &str = "⏳ Too many requests. Please wait a moment and try again.";
pub const CONNECTIVITY_MESSAGE: &str =
    "🌐 Network error. Please check your internet connection and try again.";
pub const STORAGE_MESSAGE: &str =
    "💾 Unable to save your settings. Please check that the data directory is writable.";
pub const GENERIC_MESSAGE: &str = "⚠️ Unable to fetch weather data. Please try again later.";

/// Coarse classification of a failure, decided where the failure is first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    MissingCredentials,
    Unauthorized,
    NotFound,
    RateLimited,
    Connectivity,
    Geolocation,
    Storage,
    Other,
}

impl ErrorKind {
    /// Classify an HTTP status returned by the weather API.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Unauthorized,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimited,
            _ => ErrorKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location information unavailable: {0}")]
    PositionUnavailable(String),
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("location error: {0}")]
    Unknown(String),
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Location access denied. Please enable location services and try again."
            }
            Self::PositionUnavailable(_) => {
                "Location information unavailable. Please search manually."
            }
            Self::Timeout => "Location request timed out. Please try again.",
            Self::Unsupported => "Geolocation is not supported on this system.",
            Self::Unknown(_) => "Unable to retrieve your location. Please search manually.",
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error("invalid city name '{0}'")]
    InvalidCity(String),

    #[error("no API key configured")]
    MissingApiKey,

    #[error("API key is too short")]
    InvalidApiKeyFormat,

    #[error("{endpoint} request failed with status {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: u16,
        kind: ErrorKind,
        body: String,
    },

    #[error("failed to send {endpoint} request: {source}")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl LookupError {
    pub fn from_status(endpoint: &'static str, status: u16, body: String) -> Self {
        Self::Api {
            endpoint,
            status,
            kind: ErrorKind::from_status(status),
            body,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyQuery | Self::InvalidCity(_) | Self::InvalidApiKeyFormat => {
                ErrorKind::Validation
            }
            Self::MissingApiKey => ErrorKind::MissingCredentials,
            Self::Api { kind, .. } => *kind,
            Self::Network { source, .. } => {
                if source.is_connect() || source.is_timeout() || source.is_request() {
                    ErrorKind::Connectivity
                } else {
                    ErrorKind::Other
                }
            }
            Self::Decode { .. } | Self::Client(_) => ErrorKind::Other,
            Self::Geolocation(_) => ErrorKind::Geolocation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Message shown in the notice slot for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyQuery => EMPTY_QUERY_MESSAGE.to_string(),
            Self::InvalidCity(_) => INVALID_CITY_MESSAGE.to_string(),
            Self::MissingApiKey => MISSING_API_KEY_MESSAGE.to_string(),
            Self::InvalidApiKeyFormat => INVALID_API_KEY_FORMAT_MESSAGE.to_string(),
            Self::Geolocation(err) => err.user_message().to_string(),
            other => match other.kind() {
                ErrorKind::Unauthorized => UNAUTHORIZED_MESSAGE,
                ErrorKind::NotFound => NOT_FOUND_MESSAGE,
                ErrorKind::RateLimited => RATE_LIMITED_MESSAGE,
                ErrorKind::Connectivity => CONNECTIVITY_MESSAGE,
                ErrorKind::Storage => STORAGE_MESSAGE,
                _ => GENERIC_MESSAGE,
            }
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_fixed_messages() {
        let cases = [
            (401, ErrorKind::Unauthorized, UNAUTHORIZED_MESSAGE),
            (404, ErrorKind::NotFound, NOT_FOUND_MESSAGE),
            (429, ErrorKind::RateLimited, RATE_LIMITED_MESSAGE),
            (500, ErrorKind::Other, GENERIC_MESSAGE),
            (503, ErrorKind::Other, GENERIC_MESSAGE),
        ];

        for (status, kind, message) in cases {
            let err = LookupError::from_status("weather", status, String::new());
            assert_eq!(err.kind(), kind, "status {status}");
            assert_eq!(err.user_message(), message, "status {status}");
        }
    }

    #[test]
    fn decode_failure_falls_back_to_generic_message() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LookupError::Decode {
            endpoint: "forecast",
            source,
        };

        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
    }

    #[test]
    fn storage_failure_has_its_own_message() {
        let err = LookupError::from(StoreError::Write {
            path: "/nowhere/storage.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.user_message(), STORAGE_MESSAGE);
    }

    #[test]
    fn validation_errors_use_input_messages() {
        assert_eq!(LookupError::EmptyQuery.user_message(), EMPTY_QUERY_MESSAGE);
        assert_eq!(
            LookupError::InvalidCity("123".into()).user_message(),
            INVALID_CITY_MESSAGE
        );
        assert_eq!(LookupError::EmptyQuery.kind(), ErrorKind::Validation);
    }

    #[test]
    fn geolocation_errors_have_reason_specific_messages() {
        let denied = LookupError::from(GeolocationError::PermissionDenied);
        assert_eq!(denied.kind(), ErrorKind::Geolocation);
        assert!(denied.user_message().contains("denied"));

        let timeout = LookupError::from(GeolocationError::Timeout);
        assert!(timeout.user_message().contains("timed out"));

        let unavailable =
            LookupError::from(GeolocationError::PositionUnavailable("no fix".into()));
        assert!(unavailable.user_message().contains("unavailable"));

        let unknown = LookupError::from(GeolocationError::Unknown("boom".into()));
        assert!(unknown.user_message().contains("Unable to retrieve"));
    }

    #[test]
    fn error_display_includes_status_and_body() {
        let err = LookupError::from_status("weather", 404, "city not found".into());
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("city not found"));
    }
}
