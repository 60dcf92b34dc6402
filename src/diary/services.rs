use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::SqlitePool;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::diary::repo::{DiaryError, FoodItem, MealRecord, Window};
use crate::nutrition::foods;
use crate::nutrition::nutrients::{Nutrient, NutrientVector};
use crate::nutrition::profile::PregnancyProfile;

/// A freshly appended meal echoed back to the caller.
#[derive(Debug, Clone)]
pub struct LoggedMeal {
    pub id: i64,
    pub eaten_at: OffsetDateTime,
    pub nutrients: NutrientVector,
}

/// Per-nutrient comparison of intake against targets.
#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub gaps: BTreeMap<Nutrient, f64>,
    pub percentages: BTreeMap<Nutrient, f64>,
    pub missing_nutrients: BTreeMap<Nutrient, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub requirements: NutrientVector,
    pub totals: NutrientVector,
    pub gaps: BTreeMap<Nutrient, f64>,
    pub percentages: BTreeMap<Nutrient, f64>,
    pub missing_nutrients: BTreeMap<Nutrient, f64>,
    pub meal_count: u64,
}

/// Sums the absolute contribution of each item: a supplied vector wins, an
/// item without one goes through the static food table, and an unmatched
/// name contributes zero without failing the meal.
pub fn resolve_items(items: &[FoodItem]) -> NutrientVector {
    let mut total = NutrientVector::zero();
    for item in items {
        match &item.nutrients {
            Some(vector) => total.accumulate(vector),
            None => {
                let estimated = foods::estimate(&item.name, item.quantity_g);
                if estimated.is_zero() {
                    debug!(name = %item.name, "no nutrient estimate for item");
                }
                total.accumulate(&estimated);
            }
        }
    }
    total
}

/// Resolves nutrients and appends the meal. The vector is fixed at this
/// point; the stored record never changes afterwards.
pub async fn log_meal(
    db: &SqlitePool,
    consumer_id: i64,
    food_items: &[FoodItem],
    eaten_at: Option<OffsetDateTime>,
) -> Result<LoggedMeal, DiaryError> {
    let eaten_at = eaten_at
        .unwrap_or_else(OffsetDateTime::now_utc)
        .to_offset(UtcOffset::UTC);
    let nutrients = resolve_items(food_items);
    let id = MealRecord::append(db, consumer_id, food_items, &nutrients, Some(eaten_at)).await?;
    Ok(LoggedMeal {
        id,
        eaten_at,
        nutrients,
    })
}

/// Elementwise sum over the window, starting from the zero vector so every
/// nutrient key is present even when nothing was logged.
pub async fn sum_window(
    db: &SqlitePool,
    consumer_id: i64,
    window: Window,
    reference: Date,
) -> Result<NutrientVector, DiaryError> {
    let meals = MealRecord::in_window(db, consumer_id, window, reference).await?;
    let mut totals = NutrientVector::zero();
    for meal in &meals {
        totals.accumulate(&meal.nutrients);
    }
    Ok(totals)
}

pub async fn meal_count(
    db: &SqlitePool,
    consumer_id: i64,
    window: Window,
    reference: Date,
) -> Result<u64, DiaryError> {
    MealRecord::count_in_window(db, consumer_id, window, reference).await
}

/// Target vector for the window anchored on the reference date.
pub fn requirements_for(
    profile: &PregnancyProfile,
    window: Window,
    reference: Date,
    food_only: bool,
) -> NutrientVector {
    let daily = if food_only {
        profile.food_only_requirements_on(reference)
    } else {
        profile.daily_requirements_on(reference)
    };
    match window {
        Window::Daily => daily,
        Window::Weekly => daily.scaled(7.0),
    }
}

/// Compares totals against requirements. Percentages are exact and uncapped;
/// a zero requirement reads as 0% rather than dividing by zero. A nutrient
/// is missing only while its gap is strictly positive.
pub fn compare(requirements: &NutrientVector, totals: &NutrientVector) -> GapReport {
    let mut gaps = BTreeMap::new();
    let mut percentages = BTreeMap::new();
    let mut missing_nutrients = BTreeMap::new();

    for (nutrient, required) in requirements.iter() {
        let consumed = totals.get(nutrient);
        let gap = required - consumed;
        gaps.insert(nutrient, gap);
        let percentage = if required > 0.0 {
            consumed / required * 100.0
        } else {
            0.0
        };
        percentages.insert(nutrient, percentage);
        if gap > 0.0 {
            missing_nutrients.insert(nutrient, gap);
        }
    }

    GapReport {
        gaps,
        percentages,
        missing_nutrients,
    }
}

/// The composite seam the chat and dashboard layers build summaries from.
/// One fetch feeds both the totals and the meal count, so the report is a
/// consistent snapshot.
pub async fn analyze(
    db: &SqlitePool,
    profile: &PregnancyProfile,
    consumer_id: i64,
    window: Window,
    reference: Date,
) -> Result<AnalysisReport, DiaryError> {
    let requirements = requirements_for(profile, window, reference, false);
    let meals = MealRecord::in_window(db, consumer_id, window, reference).await?;

    let mut totals = NutrientVector::zero();
    for meal in &meals {
        totals.accumulate(&meal.nutrients);
    }
    let report = compare(&requirements, &totals);

    Ok(AnalysisReport {
        requirements,
        totals,
        gaps: report.gaps,
        percentages: report.percentages,
        missing_nutrients: report.missing_nutrients,
        meal_count: meals.len() as u64,
    })
}
