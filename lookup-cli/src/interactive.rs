use anyhow::Context;
use chrono::Utc;
use inquire::{InquireError, Select, Text, validator::Validation};
use lookup_core::query::input_hint;
use std::fmt;

use crate::{
    cli::{Controller, configure, flush_notice},
    output::Printer,
};

#[derive(Debug, Clone, Copy)]
enum Action {
    SearchCity,
    UseLocation,
    ToggleUnits,
    ToggleTheme,
    ForecastDetails,
    RecentSearches,
    SetApiKey,
    Quit,
}

impl Action {
    const ALL: [Action; 8] = [
        Action::SearchCity,
        Action::UseLocation,
        Action::ToggleUnits,
        Action::ToggleTheme,
        Action::ForecastDetails,
        Action::RecentSearches,
        Action::SetApiKey,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::SearchCity => "Search city",
            Action::UseLocation => "Use my location",
            Action::ToggleUnits => "Toggle units",
            Action::ToggleTheme => "Toggle theme",
            Action::ForecastDetails => "Show forecast details",
            Action::RecentSearches => "Recent searches",
            Action::SetApiKey => "Set API key",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

fn is_cancel(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Menu loop over one long-lived controller. Esc or Ctrl-C leaves the loop.
pub async fn run(controller: &mut Controller, printer: &mut Printer) -> anyhow::Result<()> {
    controller.init();
    if let Some(display) = controller.display() {
        printer.display(display, false);
    }
    flush_notice(controller, printer);

    loop {
        println!();
        let action = match Select::new(
            &format!("Weather ({})", controller.units().temperature_suffix()),
            Action::ALL.to_vec(),
        )
        .prompt()
        {
            Ok(action) => action,
            Err(e) if is_cancel(&e) => break,
            Err(e) => return Err(e).context("Failed to read menu choice"),
        };
        tracing::debug!(%action, "interactive action");

        match action {
            Action::SearchCity => {
                let input = Text::new("City:")
                    .with_initial_value(controller.location_input())
                    .with_validator(|input: &str| {
                        Ok(match input_hint(input) {
                            Some(message) => Validation::Invalid(message.into()),
                            None => Validation::Valid,
                        })
                    })
                    .prompt();
                let city = match input {
                    Ok(city) => city,
                    Err(e) if is_cancel(&e) => continue,
                    Err(e) => return Err(e).context("Failed to read city"),
                };
                if controller.search_city(&city).await.is_ok() {
                    show(controller, printer);
                }
            }
            Action::UseLocation => {
                printer.info("Locating...");
                if controller.search_current_location().await.is_ok() {
                    show(controller, printer);
                }
            }
            Action::ToggleUnits => {
                let had_display = controller.display().is_some();
                let refreshed = controller.toggle_units().await.is_ok();
                printer.info(&format!("Units: {}", controller.units()));
                if had_display && refreshed {
                    show(controller, printer);
                }
            }
            Action::ToggleTheme => {
                let theme = controller.toggle_theme();
                printer.set_theme(theme);
                printer.info(if theme.is_dark() {
                    "Dark mode on"
                } else {
                    "Dark mode off"
                });
            }
            Action::ForecastDetails => {
                let Some(display) = controller.display() else {
                    printer.info("Search for a location first.");
                    continue;
                };
                if display.forecast.is_empty() {
                    printer.info("No forecast loaded. Search again to fetch one.");
                    continue;
                }
                let days: Vec<String> = display
                    .forecast
                    .iter()
                    .map(|card| format!("{} {}", card.day_name, card.month_day))
                    .collect();
                match Select::new("Day:", days).raw_prompt() {
                    Ok(choice) => {
                        if let Some(card) = display.forecast.get(choice.index) {
                            printer.details(card);
                        }
                    }
                    Err(e) if is_cancel(&e) => continue,
                    Err(e) => return Err(e).context("Failed to read day choice"),
                }
            }
            Action::RecentSearches => {
                let history = controller.search_history();
                printer.history(&history);
                if let Some(snapshot) = controller.last_search() {
                    printer.last_search(&snapshot, Utc::now());
                }
            }
            Action::SetApiKey => match configure(controller, printer) {
                Ok(_) => {}
                Err(e) if e.downcast_ref::<InquireError>().is_some_and(is_cancel) => {}
                Err(e) => return Err(e),
            },
            Action::Quit => break,
        }

        flush_notice(controller, printer);
    }

    Ok(())
}

fn show(controller: &Controller, printer: &Printer) {
    if let Some(display) = controller.display() {
        printer.display(display, false);
    }
}
