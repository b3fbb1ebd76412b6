//! Pure mapping from API payloads to display-ready text.
//!
//! Nothing here converts between unit systems. A unit change is handled by
//! fetching again in the new system and rendering the fresh payload.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::{
    model::{Condition, CurrentPayload, ForecastPayload, ForecastSample},
    units::UnitSystem,
};

pub const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Samples per day in the 3-hourly forecast series.
pub const SAMPLES_PER_DAY: usize = 8;
pub const FORECAST_DAYS: usize = 5;

const UNKNOWN_CONDITION: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    /// Current-conditions hero icon.
    Large,
    /// Forecast card icon.
    Card,
}

impl IconSize {
    fn scale(&self) -> &'static str {
        match self {
            IconSize::Large => "@4x",
            IconSize::Card => "@2x",
        }
    }
}

pub fn icon_url(code: &str, size: IconSize) -> Option<String> {
    if code.is_empty() {
        return None;
    }
    Some(format!("{ICON_BASE_URL}/{code}{}.png", size.scale()))
}

/// Half-way values round toward positive infinity (`-2.5` becomes `-2`).
pub fn round_temperature(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn format_temperature(value: f64, units: UnitSystem) -> String {
    format!("{}{}", round_temperature(value), units.temperature_suffix())
}

pub fn format_wind_speed(value: f64, units: UnitSystem) -> String {
    format!("{} {}", value, units.wind_speed_suffix())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentView {
    pub location: String,
    pub date: String,
    pub temperature: String,
    pub description: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind_speed: String,
    pub pressure: String,
    pub icon_url: Option<String>,
    pub icon_alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastCard {
    pub day_name: String,
    pub month_day: String,
    pub icon_url: Option<String>,
    pub icon_alt: String,
    pub temperature: String,
    pub description: String,
    pub high: String,
    pub low: String,
    /// Full multi-line breakdown for this day.
    pub details: String,
}

/// `today` is the wall-clock date shown on the card, not the observation time.
pub fn render_current<Tz>(
    payload: &CurrentPayload,
    units: UnitSystem,
    today: &DateTime<Tz>,
) -> CurrentView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (description, icon) = condition_parts(payload.condition());
    let location = match payload.sys.country.as_deref() {
        Some(country) if !country.is_empty() => format!("{}, {}", payload.name, country),
        _ => payload.name.clone(),
    };

    CurrentView {
        location,
        date: today.format("%A, %B %-d, %Y").to_string(),
        temperature: format_temperature(payload.main.temp, units),
        description: description.clone(),
        feels_like: format_temperature(payload.main.feels_like, units),
        humidity: format!("{}%", payload.main.humidity),
        wind_speed: format_wind_speed(payload.wind.speed, units),
        pressure: format!("{} hPa", payload.main.pressure),
        icon_url: icon_url(&icon, IconSize::Large),
        icon_alt: description,
    }
}

/// One sample per day: positions 0, 8, 16, 24 and 32 of the series, fewer if it is short.
pub fn daily_samples(list: &[ForecastSample]) -> Vec<&ForecastSample> {
    list.iter()
        .step_by(SAMPLES_PER_DAY)
        .take(FORECAST_DAYS)
        .collect()
}

pub fn render_forecast<Tz>(
    payload: &ForecastPayload,
    units: UnitSystem,
    tz: &Tz,
) -> Vec<ForecastCard>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    daily_samples(&payload.list)
        .into_iter()
        .map(|sample| render_forecast_card(sample, units, tz))
        .collect()
}

fn render_forecast_card<Tz>(sample: &ForecastSample, units: UnitSystem, tz: &Tz) -> ForecastCard
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (description, icon) = condition_parts(sample.condition());
    let (day_name, month_day) = match sample.time() {
        Some(time) => {
            let local = time.with_timezone(tz);
            (
                local.format("%a").to_string(),
                local.format("%b %-d").to_string(),
            )
        }
        None => (String::new(), String::new()),
    };

    ForecastCard {
        day_name,
        month_day,
        icon_url: icon_url(&icon, IconSize::Card),
        icon_alt: description.clone(),
        temperature: format_temperature(sample.main.temp, units),
        high: format!("H: {}", format_temperature(sample.main.temp_max, units)),
        low: format!("L: {}", format_temperature(sample.main.temp_min, units)),
        details: detailed_forecast(sample, units, tz),
        description,
    }
}

pub fn detailed_forecast<Tz>(sample: &ForecastSample, units: UnitSystem, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = sample
        .time()
        .map(|time| time.with_timezone(tz).format("%A, %B %-d").to_string())
        .unwrap_or_default();
    let (description, _) = condition_parts(sample.condition());
    let main = &sample.main;

    format!(
        "Detailed Forecast for {date}:\n\n\
         Temperature: {}\n\
         Feels like: {}\n\
         High: {}\n\
         Low: {}\n\
         Humidity: {}%\n\
         Wind: {}\n\
         Pressure: {} hPa\n\
         Conditions: {description}",
        format_temperature(main.temp, units),
        format_temperature(main.feels_like, units),
        format_temperature(main.temp_max, units),
        format_temperature(main.temp_min, units),
        main.humidity,
        format_wind_speed(sample.wind.speed, units),
        main.pressure,
    )
}

fn condition_parts(condition: Option<&Condition>) -> (String, String) {
    match condition {
        Some(c) => (c.description.clone(), c.icon.clone()),
        None => (UNKNOWN_CONDITION.to_string(), String::new()),
    }
}
