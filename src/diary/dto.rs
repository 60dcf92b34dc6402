use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::config::DATE_FORMAT;
use crate::diary::repo::{FoodItem, Window};
use crate::diary::services::AnalysisReport;
use crate::nutrition::nutrients::NutrientVector;

#[derive(Debug, Deserialize)]
pub struct LogMealRequest {
    pub food_items: Vec<FoodItem>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub eaten_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct LoggedMealResponse {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub eaten_at: OffsetDateTime,
    pub nutrients: NutrientVector,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    #[serde(default = "default_window")]
    pub window: Window,
    /// Reference date as YYYY-MM-DD; defaults to today (UTC).
    pub date: Option<String>,
}

fn default_window() -> Window {
    Window::Daily
}

impl WindowQuery {
    pub fn reference(&self) -> Result<Date, time::error::Parse> {
        match &self.date {
            Some(raw) => Date::parse(raw, DATE_FORMAT),
            None => Ok(OffsetDateTime::now_utc().date()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    pub window: Window,
    pub date: String,
    pub meal_count: u64,
    pub totals: NutrientVector,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub window: Window,
    pub date: String,
    #[serde(flatten)]
    pub report: AnalysisReport,
    /// Foods from the static table covering the largest deficits.
    pub suggested_foods: Vec<String>,
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}
