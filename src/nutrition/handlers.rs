use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing::{instrument, warn};

use crate::config::DATE_FORMAT;
use crate::diary::repo::Window;
use crate::diary::services;
use crate::nutrition::nutrients::NutrientVector;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/requirements", get(get_requirements))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub week: u8,
    pub trimester: u8,
    pub trimester_name: &'static str,
    pub start_date: String,
    pub due_date: String,
}

#[derive(Debug, Deserialize)]
pub struct RequirementsQuery {
    #[serde(default = "default_window")]
    pub window: Window,
    pub date: Option<String>,
    /// Subtract the daily supplement regimen from the targets.
    #[serde(default)]
    pub food_only: bool,
}

fn default_window() -> Window {
    Window::Daily
}

#[derive(Debug, Serialize)]
pub struct RequirementsResponse {
    pub window: Window,
    pub date: String,
    pub food_only: bool,
    pub requirements: NutrientVector,
}

#[instrument(skip(state))]
pub async fn get_profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    let profile = &state.profile;
    let trimester = profile.current_trimester();
    Json(ProfileResponse {
        week: profile.current_week(),
        trimester: trimester.number(),
        trimester_name: trimester.name(),
        start_date: format_date(profile.start_date()),
        due_date: format_date(profile.due_date()),
    })
}

#[instrument(skip(state))]
pub async fn get_requirements(
    State(state): State<AppState>,
    Query(query): Query<RequirementsQuery>,
) -> Result<Json<RequirementsResponse>, (StatusCode, String)> {
    let reference = match &query.date {
        Some(raw) => Date::parse(raw, DATE_FORMAT).map_err(|_| {
            warn!(date = %raw, "invalid reference date");
            (
                StatusCode::BAD_REQUEST,
                "date must be formatted YYYY-MM-DD".to_string(),
            )
        })?,
        None => OffsetDateTime::now_utc().date(),
    };

    let requirements =
        services::requirements_for(&state.profile, query.window, reference, query.food_only);

    Ok(Json(RequirementsResponse {
        window: query.window,
        date: format_date(reference),
        food_only: query.food_only,
        requirements,
    }))
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}
