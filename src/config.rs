use anyhow::Context;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub pregnancy_start_date: Date,
    pub due_date: Date,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub profile: ProfileConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/materna.db".into());
        let profile = ProfileConfig {
            pregnancy_start_date: date_from_env(
                "PREGNANCY_START_DATE",
                time::macros::date!(2025 - 12 - 02),
            )?,
            due_date: date_from_env("DUE_DATE", time::macros::date!(2026 - 09 - 07))?,
        };
        Ok(Self {
            database_url,
            profile,
        })
    }
}

fn date_from_env(var: &str, default: Date) -> anyhow::Result<Date> {
    match std::env::var(var) {
        Ok(raw) => Date::parse(&raw, DATE_FORMAT)
            .with_context(|| format!("{var} must be a YYYY-MM-DD date, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_format_parses_iso_dates() {
        let date = Date::parse("2026-01-06", DATE_FORMAT).expect("parse");
        assert_eq!(date, time::macros::date!(2026 - 01 - 06));
        assert!(Date::parse("06.01.2026", DATE_FORMAT).is_err());
    }
}
