use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, PasswordDisplayMode};
use lookup_core::{
    Config, FileStore, GeolocationResolver, Locator, OpenWeatherClient, Theme, UnitSystem,
    WeatherLookupController,
};
use std::{path::PathBuf, process::ExitCode};

use crate::{interactive, output::Printer};

pub type Controller = WeatherLookupController<OpenWeatherClient, Locator, FileStore>;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-lookup",
    version,
    about = "Current conditions and 5-day forecast from OpenWeatherMap"
)]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitChoice {
    Metric,
    Imperial,
    Toggle,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeChoice {
    Light,
    Dark,
    Toggle,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save your OpenWeatherMap API key.
    Configure,

    /// Show weather for a city.
    Search {
        /// City name, e.g. "London" or "Portland, US".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,

        /// Switch (and remember) the unit system before searching.
        #[arg(long)]
        units: Option<UnitSystem>,

        /// Print the full breakdown for every forecast day.
        #[arg(long)]
        details: bool,
    },

    /// Show weather for your current location.
    Locate {
        #[arg(long)]
        details: bool,
    },

    /// Show or change the unit system. Changing it refreshes a recent search.
    Units {
        #[arg(value_enum)]
        choice: Option<UnitChoice>,
    },

    /// Show or change the output theme.
    Theme {
        #[arg(value_enum)]
        choice: Option<ThemeChoice>,
    },

    /// List recent searches, most recent first.
    History,

    /// Show the last search if it is still fresh.
    Last,

    /// Keep a session open and pick actions from a menu.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        let mut controller = build_controller(&config)?;
        let mut printer = Printer::new(controller.theme());

        let ok = match self.command {
            Command::Configure => configure(&mut controller, &printer)?,
            Command::Search {
                city,
                units,
                details,
            } => {
                let mut ok = true;
                if let Some(units) = units {
                    ok = controller.set_units(units).await.is_ok();
                }
                if ok {
                    ok = controller.search_city(&city.join(" ")).await.is_ok();
                }
                finish(&mut controller, &printer, ok, details)
            }
            Command::Locate { details } => {
                let ok = controller.search_current_location().await.is_ok();
                finish(&mut controller, &printer, ok, details)
            }
            Command::Units { choice } => {
                controller.init();
                controller.take_notice();
                let had_display = controller.display().is_some();

                let ok = match choice {
                    None => true,
                    Some(UnitChoice::Toggle) => controller.toggle_units().await.is_ok(),
                    Some(UnitChoice::Metric) => {
                        controller.set_units(UnitSystem::Metric).await.is_ok()
                    }
                    Some(UnitChoice::Imperial) => {
                        controller.set_units(UnitSystem::Imperial).await.is_ok()
                    }
                };

                printer.info(&format!(
                    "Units: {} ({})",
                    controller.units(),
                    controller.units().temperature_suffix()
                ));
                if had_display && choice.is_some() {
                    finish(&mut controller, &printer, ok, false)
                } else {
                    flush_notice(&mut controller, &printer);
                    ok
                }
            }
            Command::Theme { choice } => {
                let theme = match choice {
                    None => controller.theme(),
                    Some(ThemeChoice::Toggle) => controller.toggle_theme(),
                    Some(ThemeChoice::Light) => controller.set_theme(Theme::Light),
                    Some(ThemeChoice::Dark) => controller.set_theme(Theme::Dark),
                };
                printer.set_theme(theme);
                printer.info(&format!(
                    "Theme: {}",
                    if theme.is_dark() { "dark" } else { "light" }
                ));
                true
            }
            Command::History => {
                printer.history(&controller.search_history());
                if let Some(snapshot) = controller.last_search() {
                    printer.last_search(&snapshot, Utc::now());
                }
                true
            }
            Command::Last => {
                controller.init();
                match controller.display() {
                    Some(display) => printer.display(display, false),
                    None => printer.info("No recent search to show."),
                }
                flush_notice(&mut controller, &printer);
                true
            }
            Command::Interactive => {
                interactive::run(&mut controller, &mut printer).await?;
                true
            }
        };

        Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}

pub fn build_controller(config: &Config) -> anyhow::Result<Controller> {
    let store_path = config.store_file_path()?;
    let store = FileStore::open(&store_path).with_context(|| {
        format!("Failed to open preferences store: {}", store_path.display())
    })?;

    let geolocation =
        GeolocationResolver::new(config.geolocation.locator(), config.geolocation.options());

    Ok(
        WeatherLookupController::new(config.weather_client()?, geolocation, store)
            .with_api_key(config.api_key().map(str::to_owned)),
    )
}

/// Prompt for the API key and store it. Returns whether it was accepted.
pub fn configure(controller: &mut Controller, printer: &Printer) -> anyhow::Result<bool> {
    let key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message(
            "Get a free key at https://openweathermap.org/api \
             (new keys can take ~10 minutes to activate)",
        )
        .prompt()
        .context("Failed to read API key")?;

    let ok = controller.save_api_key(&key).is_ok();
    flush_notice(controller, printer);
    Ok(ok)
}

fn finish(controller: &mut Controller, printer: &Printer, ok: bool, details: bool) -> bool {
    if ok {
        if let Some(display) = controller.display() {
            printer.display(display, details);
        }
    }
    flush_notice(controller, printer);
    ok
}

pub fn flush_notice(controller: &mut Controller, printer: &Printer) {
    if let Some(notice) = controller.take_notice() {
        printer.notice(&notice);
    }
}
