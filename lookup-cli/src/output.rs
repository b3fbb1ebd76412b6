use chrono::{DateTime, Utc};
use console::Style;
use lookup_core::{
    LastSearchSnapshot, Notice, NoticeLevel, Theme, WeatherDisplay,
    render::{CurrentView, ForecastCard},
};

/// Terminal rendering of the view models, styled for the selected theme.
#[derive(Debug, Clone)]
pub struct Printer {
    heading: Style,
    accent: Style,
    muted: Style,
    error: Style,
    success: Style,
}

impl Printer {
    pub fn new(theme: Theme) -> Self {
        let mut printer = Self {
            heading: Style::new(),
            accent: Style::new(),
            muted: Style::new(),
            error: Style::new(),
            success: Style::new(),
        };
        printer.set_theme(theme);
        printer
    }

    pub fn set_theme(&mut self, theme: Theme) {
        match theme {
            Theme::Dark => {
                self.heading = Style::new().bold().white().bright();
                self.accent = Style::new().yellow().bright();
                self.muted = Style::new().white().dim();
                self.error = Style::new().red().bright();
                self.success = Style::new().green().bright();
            }
            Theme::Light => {
                self.heading = Style::new().bold().black();
                self.accent = Style::new().blue();
                self.muted = Style::new().dim();
                self.error = Style::new().red();
                self.success = Style::new().green();
            }
        }
    }

    pub fn display(&self, display: &WeatherDisplay, details: bool) {
        self.current(&display.current);
        if !display.forecast.is_empty() {
            println!();
            self.forecast(&display.forecast, details);
        }
    }

    pub fn current(&self, view: &CurrentView) {
        println!("{}", self.heading.apply_to(&view.location));
        println!("{}", self.muted.apply_to(&view.date));
        println!(
            "{}  {}",
            self.accent.apply_to(&view.temperature),
            view.description
        );
        println!(
            "{} {}   {} {}   {} {}   {} {}",
            self.muted.apply_to("Feels like"),
            view.feels_like,
            self.muted.apply_to("Humidity"),
            view.humidity,
            self.muted.apply_to("Wind"),
            view.wind_speed,
            self.muted.apply_to("Pressure"),
            view.pressure,
        );
        if let Some(url) = &view.icon_url {
            println!("{}", self.muted.apply_to(url));
        }
    }

    pub fn forecast(&self, cards: &[ForecastCard], details: bool) {
        println!("{}", self.heading.apply_to("5-Day Forecast"));
        for card in cards {
            if details {
                println!();
                println!("{}", card.details);
                continue;
            }
            println!(
                "{:<4} {:<7} {:>6}  {} / {}  {}",
                card.day_name,
                card.month_day,
                self.accent.apply_to(&card.temperature),
                card.high,
                card.low,
                card.description,
            );
        }
    }

    pub fn details(&self, card: &ForecastCard) {
        println!("{}", card.details);
    }

    pub fn notice(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Error => eprintln!("{}", self.error.apply_to(&notice.message)),
            NoticeLevel::Success => println!("{}", self.success.apply_to(&notice.message)),
        }
    }

    pub fn history(&self, items: &[String]) {
        if items.is_empty() {
            println!("{}", self.muted.apply_to("No recent searches."));
            return;
        }
        for (i, item) in items.iter().enumerate() {
            println!("{} {}", self.muted.apply_to(format!("{}.", i + 1)), item);
        }
    }

    pub fn last_search(&self, snapshot: &LastSearchSnapshot, now: DateTime<Utc>) {
        let Some(captured) = snapshot.captured_at() else {
            return;
        };
        let minutes = (now - captured).num_minutes().max(0);
        println!(
            "{} {} ({}, {} min ago)",
            self.muted.apply_to("Last search:"),
            snapshot.location,
            snapshot.units,
            minutes
        );
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.muted.apply_to(message));
    }
}
