use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::diary::dto::{
    format_date, AnalysisResponse, LogMealRequest, LoggedMealResponse, TotalsResponse, WindowQuery,
};
use crate::diary::repo::{DiaryError, MealRecord};
use crate::diary::services;
use crate::nutrition::foods;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/consumers/:consumer_id/meals", get(list_meals))
        .route("/consumers/:consumer_id/totals", get(get_totals))
        .route("/consumers/:consumer_id/analysis", get(get_analysis))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/consumers/:consumer_id/meals", post(log_meal))
}

#[instrument(skip(state, body))]
pub async fn log_meal(
    State(state): State<AppState>,
    Path(consumer_id): Path<i64>,
    Json(body): Json<LogMealRequest>,
) -> Result<(StatusCode, Json<LoggedMealResponse>), (StatusCode, String)> {
    let logged = services::log_meal(&state.db, consumer_id, &body.food_items, body.eaten_at)
        .await
        .map_err(|e| diary_error(e, consumer_id, "log_meal"))?;

    Ok((
        StatusCode::CREATED,
        Json(LoggedMealResponse {
            id: logged.id,
            eaten_at: logged.eaten_at,
            nutrients: logged.nutrients,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Path(consumer_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<MealRecord>>, (StatusCode, String)> {
    let reference = parse_reference(&query)?;
    let meals = MealRecord::in_window(&state.db, consumer_id, query.window, reference)
        .await
        .map_err(|e| diary_error(e, consumer_id, "list_meals"))?;
    Ok(Json(meals))
}

#[instrument(skip(state))]
pub async fn get_totals(
    State(state): State<AppState>,
    Path(consumer_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<TotalsResponse>, (StatusCode, String)> {
    let reference = parse_reference(&query)?;
    let totals = services::sum_window(&state.db, consumer_id, query.window, reference)
        .await
        .map_err(|e| diary_error(e, consumer_id, "get_totals"))?;
    let meal_count = services::meal_count(&state.db, consumer_id, query.window, reference)
        .await
        .map_err(|e| diary_error(e, consumer_id, "get_totals"))?;

    Ok(Json(TotalsResponse {
        window: query.window,
        date: format_date(reference),
        meal_count,
        totals,
    }))
}

#[instrument(skip(state))]
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(consumer_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<AnalysisResponse>, (StatusCode, String)> {
    let reference = parse_reference(&query)?;
    let report = services::analyze(
        &state.db,
        &state.profile,
        consumer_id,
        query.window,
        reference,
    )
    .await
    .map_err(|e| diary_error(e, consumer_id, "get_analysis"))?;

    let suggested_foods = foods::suggestions_for(&report.missing_nutrients);

    Ok(Json(AnalysisResponse {
        window: query.window,
        date: format_date(reference),
        report,
        suggested_foods,
    }))
}

fn parse_reference(query: &WindowQuery) -> Result<time::Date, (StatusCode, String)> {
    query.reference().map_err(|_| {
        warn!(date = ?query.date, "invalid reference date");
        (
            StatusCode::BAD_REQUEST,
            "date must be formatted YYYY-MM-DD".into(),
        )
    })
}

fn diary_error(e: DiaryError, consumer_id: i64, op: &str) -> (StatusCode, String) {
    match e {
        DiaryError::InvalidInput(reason) => {
            warn!(%consumer_id, %reason, "rejected meal input");
            (StatusCode::BAD_REQUEST, reason)
        }
        other => {
            error!(error = %other, %consumer_id, op, "diary operation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}
