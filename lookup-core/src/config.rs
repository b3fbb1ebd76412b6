use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    geolocation::{DEFAULT_LOOKUP_URL, GeolocationOptions, IpGeolocation, Locator},
    provider::openweather::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, OpenWeatherClient},
    query::Coordinates,
};

/// Where the position for "use my location" comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// When false, location requests are refused as if permission was denied.
    pub enabled: bool,
    /// Fixed coordinates; both must be set to take effect.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub lookup_url: String,
    pub timeout_secs: u64,
    pub maximum_age_secs: u64,
    pub high_accuracy: bool,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        let options = GeolocationOptions::default();
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            timeout_secs: options.timeout.as_secs(),
            maximum_age_secs: options.maximum_age.as_secs(),
            high_accuracy: options.high_accuracy,
        }
    }
}

impl GeolocationConfig {
    pub fn options(&self) -> GeolocationOptions {
        GeolocationOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            maximum_age: Duration::from_secs(self.maximum_age_secs),
            high_accuracy: self.high_accuracy,
        }
    }

    pub fn locator(&self) -> Locator {
        if !self.enabled {
            return Locator::Disabled;
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Locator::Fixed(Coordinates::new(lat, lon)),
            _ if self.lookup_url.trim().is_empty() => Locator::Unsupported,
            _ => Locator::Ip(IpGeolocation::new(self.lookup_url.trim())),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// request_timeout_secs = 10
///
/// [geolocation]
/// latitude = 51.5074
/// longitude = -0.1278
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the key saved with `configure`.
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Directory for the preferences store; platform data dir when unset.
    pub data_dir: Option<PathBuf>,
    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            data_dir: None,
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the JSON preferences store.
    pub fn store_file_path(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => Self::project_dirs()?.data_dir().to_path_buf(),
        };
        Ok(dir.join("storage.json"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured key, if it is non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn weather_client(&self) -> Result<OpenWeatherClient> {
        OpenWeatherClient::with_base_url(&self.base_url, self.request_timeout())
            .context("Failed to create OpenWeather client")
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-lookup", "weather-lookup")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.api_key(), None);
        assert!(cfg.geolocation.enabled);
        assert_eq!(cfg.geolocation.options(), GeolocationOptions::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_key = \"0123456789abcdef\"\n\n[geolocation]\nlatitude = 1.5\nlongitude = 2.5\n",
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();

        assert_eq!(cfg.api_key(), Some("0123456789abcdef"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert!(matches!(
            cfg.geolocation.locator(),
            Locator::Fixed(c) if c == Coordinates::new(1.5, 2.5)
        ));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.request_timeout_secs = 3;
        cfg.geolocation.enabled = false;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.request_timeout_secs, 3);
        assert!(matches!(loaded.geolocation.locator(), Locator::Disabled));
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn blank_lookup_url_without_coordinates_is_unsupported() {
        let mut cfg = Config::default();
        cfg.geolocation.lookup_url = "  ".into();
        assert!(matches!(cfg.geolocation.locator(), Locator::Unsupported));

        cfg.geolocation.latitude = Some(10.0);
        cfg.geolocation.longitude = Some(20.0);
        assert!(matches!(cfg.geolocation.locator(), Locator::Fixed(_)));
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let cfg = Config {
            api_key: Some("   ".into()),
            ..Config::default()
        };
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn explicit_data_dir_is_used_for_store() {
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/weather-lookup-test")),
            ..Config::default()
        };
        assert_eq!(
            cfg.store_file_path().unwrap(),
            PathBuf::from("/tmp/weather-lookup-test/storage.json")
        );
    }
}
