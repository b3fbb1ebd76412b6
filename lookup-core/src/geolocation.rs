//! One-shot position lookup with a timeout and a short-lived cached position.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::{debug, instrument};

use crate::{error::GeolocationError, query::Coordinates};

pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub timeout: Duration,
    /// A previously resolved position younger than this is reused.
    pub maximum_age: Duration,
    pub high_accuracy: bool,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
            high_accuracy: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coords: Coordinates,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn now(coords: Coordinates) -> Self {
        Self {
            coords,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GeolocationState {
    #[default]
    Idle,
    Requesting,
    Resolved(Coordinates),
    Failed(GeolocationError),
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Position, GeolocationError>;
}

/// Drives a provider through one request at a time. Failures are final for
/// the request that produced them; nothing is retried.
#[derive(Debug)]
pub struct GeolocationResolver<P> {
    provider: P,
    options: GeolocationOptions,
    state: GeolocationState,
    last_position: Option<Position>,
}

impl<P: GeolocationProvider> GeolocationResolver<P> {
    pub fn new(provider: P, options: GeolocationOptions) -> Self {
        Self {
            provider,
            options,
            state: GeolocationState::Idle,
            last_position: None,
        }
    }

    pub fn state(&self) -> &GeolocationState {
        &self.state
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn resolve(&mut self) -> Result<Coordinates, GeolocationError> {
        if let Some(position) = self.cached_position() {
            debug!("reusing cached position");
            self.state = GeolocationState::Resolved(position.coords);
            return Ok(position.coords);
        }

        self.state = GeolocationState::Requesting;

        let request = self.provider.current_position(&self.options);
        let outcome = match tokio::time::timeout(self.options.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(GeolocationError::Timeout),
        };

        match outcome {
            Ok(position) => {
                self.last_position = Some(position);
                self.state = GeolocationState::Resolved(position.coords);
                Ok(position.coords)
            }
            Err(err) => {
                self.state = GeolocationState::Failed(err.clone());
                Err(err)
            }
        }
    }

    fn cached_position(&self) -> Option<Position> {
        let position = self.last_position?;
        let age = (Utc::now() - position.timestamp).to_std().ok()?;
        (age <= self.options.maximum_age).then_some(position)
    }
}

/// Where the position comes from.
#[derive(Debug, Clone)]
pub enum Locator {
    /// Location access turned off by the user.
    Disabled,
    Fixed(Coordinates),
    Ip(IpGeolocation),
    /// Nothing configured that can produce a position.
    Unsupported,
}

#[async_trait]
impl GeolocationProvider for Locator {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Position, GeolocationError> {
        match self {
            Locator::Disabled => Err(GeolocationError::PermissionDenied),
            Locator::Fixed(coords) => Ok(Position::now(*coords)),
            Locator::Ip(lookup) => lookup.current_position(options).await,
            Locator::Unsupported => Err(GeolocationError::Unsupported),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Coarse position from an ip-api compatible endpoint.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    http: Client,
    url: String,
}

impl IpGeolocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }
}

impl Default for IpGeolocation {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL)
    }
}

#[async_trait]
impl GeolocationProvider for IpGeolocation {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Position, GeolocationError> {
        if options.high_accuracy {
            debug!("IP lookup is city-level; high accuracy is not available");
        }

        let res = self
            .http
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GeolocationError::Timeout
                } else {
                    GeolocationError::PositionUnavailable(err.to_string())
                }
            })?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GeolocationError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(GeolocationError::Unknown(format!(
                "lookup returned status {status}"
            )));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|err| GeolocationError::Unknown(err.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Position::now(Coordinates::new(lat, lon))),
            _ => Err(GeolocationError::PositionUnavailable(
                body.message.unwrap_or_else(|| "no position in response".to_string()),
            )),
        }
    }
}
