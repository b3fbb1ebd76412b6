//! The search-and-render workflow.
//!
//! Every public action catches its own failure, puts the user-facing message
//! into the notice slot and leaves the previous display untouched. The typed
//! error is still returned so callers can branch on it.

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, warn};

use crate::{
    error::LookupError,
    geolocation::{GeolocationProvider, GeolocationResolver, GeolocationState},
    model::CurrentPayload,
    notice::{Notice, NoticeSlot},
    preferences::{LastSearchSnapshot, Preferences, Theme},
    provider::{WeatherApi, WeatherBundle, fetch_bundle},
    query::{SearchQuery, validate_city},
    render::{CurrentView, ForecastCard, render_current, render_forecast},
    session::Session,
    store::KeyValueStore,
    units::UnitSystem,
};

pub const API_KEY_SAVED_MESSAGE: &str =
    "API key saved successfully! You can now search for weather.";

/// What is currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherDisplay {
    pub current: CurrentView,
    /// Empty when restored from a snapshot, which holds current conditions only.
    pub forecast: Vec<ForecastCard>,
}

#[derive(Debug)]
pub struct WeatherLookupController<A, G, S> {
    api: A,
    geolocation: GeolocationResolver<G>,
    prefs: Preferences<S>,
    /// Key from configuration; shadows the stored key.
    configured_key: Option<String>,
    units: UnitSystem,
    theme: Theme,
    /// Location the current display was produced for.
    location_input: String,
    display: Option<WeatherDisplay>,
    notices: NoticeSlot,
}

impl<A, G, S> WeatherLookupController<A, G, S>
where
    A: WeatherApi,
    G: GeolocationProvider,
    S: KeyValueStore,
{
    pub fn new(api: A, geolocation: GeolocationResolver<G>, store: S) -> Self {
        let prefs = Preferences::new(store);
        let units = prefs.units();
        let theme = prefs.theme();

        Self {
            api,
            geolocation,
            prefs,
            configured_key: None,
            units,
            theme,
            location_input: String::new(),
            display: None,
            notices: NoticeSlot::new(),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.configured_key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }

    /// Prompt for a key if none is usable, then restore a fresh last search.
    pub fn init(&mut self) {
        self.init_at(Utc::now());
    }

    pub fn init_at(&mut self, now: DateTime<Utc>) {
        if let Err(err) = self.session() {
            self.notices.display_error(err.user_message());
        }
        self.load_previous_search(now);
    }

    /// Show the stored snapshot if it is fresh and in the current unit system.
    /// Returns whether anything was displayed.
    pub fn load_previous_search(&mut self, now: DateTime<Utc>) -> bool {
        let Some(snapshot) = self.prefs.last_search() else {
            return false;
        };

        if !snapshot.is_fresh(now, self.units) {
            debug!(location = %snapshot.location, "last search is stale; not restoring");
            return false;
        }

        let today = now.with_timezone(&Local);
        self.location_input = snapshot.location.clone();
        self.display = Some(WeatherDisplay {
            current: render_current(&snapshot.data, snapshot.units, &today),
            forecast: Vec::new(),
        });
        true
    }

    /// Immutable credentials and units for one action. A key too short to be
    /// usable counts as no key, so the user is sent back to key entry.
    pub fn session(&self) -> Result<Session, LookupError> {
        let key = self
            .configured_key
            .clone()
            .or_else(|| self.prefs.api_key())
            .ok_or(LookupError::MissingApiKey)?;
        Session::new(&key, self.units).map_err(|err| match err {
            LookupError::InvalidApiKeyFormat => LookupError::MissingApiKey,
            other => other,
        })
    }

    pub async fn search_city(&mut self, input: &str) -> Result<(), LookupError> {
        let result = self.try_search_city(input).await;
        self.surface(result)
    }

    pub async fn search_current_location(&mut self) -> Result<(), LookupError> {
        let result = self.try_search_current_location().await;
        self.surface(result)
    }

    pub async fn toggle_units(&mut self) -> Result<(), LookupError> {
        self.set_units(self.units.toggled()).await
    }

    /// Persist the new unit system and, if something is displayed, search that
    /// location again in the new units.
    pub async fn set_units(&mut self, units: UnitSystem) -> Result<(), LookupError> {
        if units == self.units {
            return Ok(());
        }

        self.units = units;
        if let Err(err) = self.prefs.save_units(units) {
            warn!(error = %err, "failed to persist unit preference");
        }

        if self.display.is_some() && !self.location_input.is_empty() {
            let location = self.location_input.clone();
            return self.search_city(&location).await;
        }
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Theme {
        self.theme = theme;
        if let Err(err) = self.prefs.save_theme(theme) {
            warn!(error = %err, "failed to persist theme preference");
        }
        theme
    }

    pub fn save_api_key(&mut self, key: &str) -> Result<(), LookupError> {
        let result = self.prefs.save_api_key(key);
        if result.is_ok() {
            if self.configured_key.is_some() {
                warn!("a configured API key takes precedence over the saved one");
            }
            self.notices.display_success(API_KEY_SAVED_MESSAGE);
        }
        self.surface(result)
    }

    pub fn display(&self) -> Option<&WeatherDisplay> {
        self.display.as_ref()
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn location_input(&self) -> &str {
        &self.location_input
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.visible()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.take_visible()
    }

    pub fn hide_error(&mut self) {
        self.notices.hide_error();
    }

    pub fn search_history(&mut self) -> Vec<String> {
        self.prefs.search_history()
    }

    pub fn last_search(&mut self) -> Option<LastSearchSnapshot> {
        self.prefs.last_search()
    }

    pub fn geolocation_state(&self) -> &GeolocationState {
        self.geolocation.state()
    }

    async fn try_search_city(&mut self, input: &str) -> Result<(), LookupError> {
        let session = self.session()?;
        let city = validate_city(input)?;

        self.notices.hide_error();

        let bundle = fetch_bundle(&self.api, &session, &SearchQuery::City(city.clone())).await?;
        self.show(&bundle, session.units());
        self.location_input = city.clone();
        info!(location = %city, units = %session.units(), "weather search completed");

        self.remember(&city, bundle.current, session.units());
        if let Err(err) = self.prefs.add_to_history(&city) {
            warn!(error = %err, "failed to update search history");
        }
        Ok(())
    }

    async fn try_search_current_location(&mut self) -> Result<(), LookupError> {
        let session = self.session()?;

        self.notices.hide_error();

        let coords = self.geolocation.resolve().await?;
        let bundle = fetch_bundle(&self.api, &session, &SearchQuery::Coordinates(coords)).await?;
        self.show(&bundle, session.units());

        let name = bundle.current.name.clone();
        self.location_input = name.clone();
        info!(location = %name, %coords, "location weather completed");

        self.remember(&name, bundle.current, session.units());
        Ok(())
    }

    fn show(&mut self, bundle: &WeatherBundle, units: UnitSystem) {
        let today = Local::now();
        self.display = Some(WeatherDisplay {
            current: render_current(&bundle.current, units, &today),
            forecast: render_forecast(&bundle.forecast, units, &Local),
        });
    }

    fn remember(&mut self, location: &str, current: CurrentPayload, units: UnitSystem) {
        let snapshot = LastSearchSnapshot::new(location, current, units, Utc::now());
        if let Err(err) = self.prefs.save_last_search(&snapshot) {
            warn!(error = %err, "failed to persist last search");
        }
    }

    fn surface(&mut self, result: Result<(), LookupError>) -> Result<(), LookupError> {
        if let Err(err) = &result {
            debug!(error = %err, kind = ?err.kind(), "lookup action failed");
            self.notices.display_error(err.user_message());
        }
        result
    }
}
