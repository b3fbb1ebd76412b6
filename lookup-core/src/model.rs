//! Response payloads of the OpenWeatherMap `/weather` and `/forecast` endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: f64,
    pub temp_max: f64,
    pub temp_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: Option<String>,
}

/// Current conditions for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPayload {
    pub name: String,
    #[serde(default)]
    pub dt: Option<i64>,
    #[serde(default)]
    pub sys: Sys,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub wind: Wind,
}

impl CurrentPayload {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

/// One 3-hour sample of the forecast series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub wind: Wind,
}

impl ForecastSample {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.dt)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub city: Option<City>,
    pub list: Vec<ForecastSample>,
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub fn current_json(name: &str, temp: f64) -> Value {
        json!({
            "name": name,
            "dt": 1_700_000_000,
            "sys": { "country": "GB" },
            "main": {
                "temp": temp,
                "feels_like": temp - 1.2,
                "humidity": 81,
                "pressure": 1012,
                "temp_max": temp + 2.0,
                "temp_min": temp - 2.0
            },
            "weather": [{ "description": "light rain", "icon": "10d" }],
            "wind": { "speed": 4.1 }
        })
    }

    pub fn forecast_json(samples: usize) -> Value {
        let list: Vec<Value> = (0..samples)
            .map(|i| {
                json!({
                    "dt": 1_700_000_000 + (i as i64) * 3 * 3600,
                    "main": {
                        "temp": i as f64,
                        "feels_like": i as f64,
                        "humidity": 70,
                        "pressure": 1010,
                        "temp_max": i as f64 + 1.0,
                        "temp_min": i as f64 - 1.0
                    },
                    "weather": [{ "description": format!("sample {i}"), "icon": "04d" }],
                    "wind": { "speed": 2.5 }
                })
            })
            .collect();

        json!({ "city": { "name": "London", "country": "GB" }, "list": list })
    }
}
