use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    error::LookupError,
    model::{CurrentPayload, ForecastPayload},
    query::{Coordinates, SearchQuery},
    session::Session,
};

use super::WeatherApi;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LookupError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip(self, session), fields(units = %session.units()), level = "debug")]
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<T, LookupError> {
        let name = endpoint.as_str();
        let url = format!("{}/{}", self.base_url, name);

        let res = self
            .http
            .get(&url)
            .query(&query.query_pairs())
            .query(&[("appid", session.api_key()), ("units", session.units().as_str())])
            .send()
            .await
            .map_err(|source| LookupError::Network {
                endpoint: name,
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| LookupError::Network {
            endpoint: name,
            source,
        })?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "OpenWeather {name} request rejected");
            return Err(LookupError::from_status(
                name,
                status.as_u16(),
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).map_err(|source| LookupError::Decode {
            endpoint: name,
            source,
        })
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn fetch_current_by_city(
        &self,
        session: &Session,
        city: &str,
    ) -> Result<CurrentPayload, LookupError> {
        self.get(Endpoint::Current, session, &SearchQuery::City(city.to_string()))
            .await
    }

    async fn fetch_forecast_by_city(
        &self,
        session: &Session,
        city: &str,
    ) -> Result<ForecastPayload, LookupError> {
        self.get(Endpoint::Forecast, session, &SearchQuery::City(city.to_string()))
            .await
    }

    async fn fetch_current_by_coords(
        &self,
        session: &Session,
        coords: Coordinates,
    ) -> Result<CurrentPayload, LookupError> {
        self.get(Endpoint::Current, session, &SearchQuery::Coordinates(coords))
            .await
    }

    async fn fetch_forecast_by_coords(
        &self,
        session: &Session,
        coords: Coordinates,
    ) -> Result<ForecastPayload, LookupError> {
        self.get(Endpoint::Forecast, session, &SearchQuery::Coordinates(coords))
            .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, model::fixtures, units::UnitSystem};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "0123456789abcdef";

    fn client(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn current_by_city_sends_expected_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", KEY))
            .and(query_param("units", "imperial"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(fixtures::current_json("London", 52.9)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::new(KEY, UnitSystem::Imperial).unwrap();
        let payload = client(&server)
            .fetch_current_by_city(&session, "London")
            .await
            .unwrap();

        assert_eq!(payload.name, "London");
        assert_eq!(payload.main.temp, 52.9);
    }

    #[tokio::test]
    async fn forecast_by_coords_sends_lat_lon() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "51.5074"))
            .and(query_param("lon", "-0.1278"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::forecast_json(16)))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::new(KEY, UnitSystem::Metric).unwrap();
        let payload = client(&server)
            .fetch_forecast_by_coords(&session, Coordinates::new(51.5074, -0.1278))
            .await
            .unwrap();

        assert_eq!(payload.list.len(), 16);
    }

    #[tokio::test]
    async fn non_success_status_is_classified() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
            )
            .mount(&server)
            .await;

        let session = Session::new(KEY, UnitSystem::Metric).unwrap();
        let err = client(&server)
            .fetch_current_by_city(&session, "London")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        match err {
            LookupError::Api { status, body, .. } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let session = Session::new(KEY, UnitSystem::Metric).unwrap();
        let err = client(&server)
            .fetch_forecast_by_city(&session, "London")
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::Decode { endpoint: "forecast", .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_connectivity_error() {
        let session = Session::new(KEY, UnitSystem::Metric).unwrap();
        let client =
            OpenWeatherClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let err = client
            .fetch_current_by_city(&session, "London")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
