//! Core library for the `weather-lookup` tool.
//!
//! This crate defines:
//! - Input validation and the per-action session (credentials, units)
//! - The OpenWeatherMap client and the sequential current+forecast fetch
//! - Geolocation providers with timeout and cached-position handling
//! - Rendering of payloads into display-ready view models
//! - The notice slot, persisted preferences and last-search snapshot
//! - [`WeatherLookupController`], which ties the workflow together
//!
//! It is used by `lookup-cli`, but can also be reused by other front ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod notice;
pub mod preferences;
pub mod provider;
pub mod query;
pub mod render;
pub mod session;
pub mod store;
pub mod units;

pub use config::{Config, GeolocationConfig};
pub use controller::{WeatherDisplay, WeatherLookupController};
pub use error::{ErrorKind, GeolocationError, LookupError};
pub use geolocation::{GeolocationOptions, GeolocationResolver, Locator};
pub use model::{CurrentPayload, ForecastPayload};
pub use notice::{Notice, NoticeLevel};
pub use preferences::{LastSearchSnapshot, Theme};
pub use provider::{OpenWeatherClient, WeatherApi};
pub use query::{Coordinates, SearchQuery};
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use units::UnitSystem;
