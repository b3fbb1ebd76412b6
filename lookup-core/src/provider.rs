use crate::{
    error::LookupError,
    model::{CurrentPayload, ForecastPayload},
    query::{Coordinates, SearchQuery},
    session::Session,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Current-conditions and forecast lookups against a weather service.
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn fetch_current_by_city(
        &self,
        session: &Session,
        city: &str,
    ) -> Result<CurrentPayload, LookupError>;

    async fn fetch_forecast_by_city(
        &self,
        session: &Session,
        city: &str,
    ) -> Result<ForecastPayload, LookupError>;

    async fn fetch_current_by_coords(
        &self,
        session: &Session,
        coords: Coordinates,
    ) -> Result<CurrentPayload, LookupError>;

    async fn fetch_forecast_by_coords(
        &self,
        session: &Session,
        coords: Coordinates,
    ) -> Result<ForecastPayload, LookupError>;

    async fn fetch_current(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<CurrentPayload, LookupError> {
        match query {
            SearchQuery::City(city) => self.fetch_current_by_city(session, city).await,
            SearchQuery::Coordinates(coords) => {
                self.fetch_current_by_coords(session, *coords).await
            }
        }
    }

    async fn fetch_forecast(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<ForecastPayload, LookupError> {
        match query {
            SearchQuery::City(city) => self.fetch_forecast_by_city(session, city).await,
            SearchQuery::Coordinates(coords) => {
                self.fetch_forecast_by_coords(session, *coords).await
            }
        }
    }
}

/// Current conditions and forecast for one resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherBundle {
    pub current: CurrentPayload,
    pub forecast: ForecastPayload,
}

/// Fetch current conditions, then the forecast. Both must succeed.
pub async fn fetch_bundle<A: WeatherApi + ?Sized>(
    api: &A,
    session: &Session,
    query: &SearchQuery,
) -> Result<WeatherBundle, LookupError> {
    let current = api.fetch_current(session, query).await?;
    let forecast = api.fetch_forecast(session, query).await?;

    Ok(WeatherBundle { current, forecast })
}


#[cfg(test)]
mod tests {
    use super::fake::{Endpoint, FakeApi};
    use super::*;
    use crate::{error::ErrorKind, units::UnitSystem};

    fn session() -> Session {
        Session::new("0123456789abcdef", UnitSystem::Metric).unwrap()
    }

    #[tokio::test]
    async fn bundle_fetches_current_then_forecast() {
        let api = FakeApi::default();
        let query = SearchQuery::city("London").unwrap();

        let bundle = fetch_bundle(&api, &session(), &query).await.unwrap();

        assert_eq!(bundle.current.name, "London");
        let endpoints: Vec<_> = api.calls().iter().map(|c| c.endpoint).collect();
        assert_eq!(endpoints, vec![Endpoint::Current, Endpoint::Forecast]);
    }

    #[tokio::test]
    async fn bundle_stops_after_current_failure() {
        let api = FakeApi::failing_current(404);
        let query = SearchQuery::city("Atlantis").unwrap();

        let err = fetch_bundle(&api, &session(), &query).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn bundle_fails_when_forecast_fails() {
        let api = FakeApi::failing_forecast(500);
        let query = SearchQuery::coordinates(Coordinates::new(51.48, 0.0));

        let err = fetch_bundle(&api, &session(), &query).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(api.calls().len(), 2);
    }
}
