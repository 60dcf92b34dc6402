use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::nutrition::nutrients::NutrientVector;

#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("invalid meal input: {0}")]
    InvalidInput(String),
    #[error("meal store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("encode meal payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("corrupt meal record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// One identified food within a meal. Kept inside its meal for audit and
/// display; never persisted standalone. `nutrients`, when present, is the
/// absolute contribution already scaled to `quantity_g`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    #[serde(default = "default_quantity_g")]
    pub quantity_g: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrients: Option<NutrientVector>,
}

fn default_quantity_g() -> u32 {
    100
}

/// A logged eating event. Append-only: the nutrient vector is summed once at
/// creation and never recomputed, so later changes to any estimation source
/// leave history untouched.
#[derive(Debug, Clone, Serialize)]
pub struct MealRecord {
    pub id: i64,
    pub consumer_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub eaten_at: OffsetDateTime,
    pub food_items: Vec<FoodItem>,
    pub nutrients: NutrientVector,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct MealRow {
    id: i64,
    consumer_id: i64,
    eaten_at: i64,
    food_items: String,
    nutrients: String,
    created_at: OffsetDateTime,
}

impl TryFrom<MealRow> for MealRecord {
    type Error = DiaryError;

    fn try_from(row: MealRow) -> Result<Self, Self::Error> {
        let food_items = serde_json::from_str(&row.food_items).map_err(|e| DiaryError::Corrupt {
            id: row.id,
            reason: e.to_string(),
        })?;
        let nutrients = serde_json::from_str(&row.nutrients).map_err(|e| DiaryError::Corrupt {
            id: row.id,
            reason: e.to_string(),
        })?;
        let eaten_at =
            OffsetDateTime::from_unix_timestamp(row.eaten_at).map_err(|e| DiaryError::Corrupt {
                id: row.id,
                reason: e.to_string(),
            })?;
        Ok(MealRecord {
            id: row.id,
            consumer_id: row.consumer_id,
            eaten_at,
            food_items,
            nutrients,
            created_at: row.created_at,
        })
    }
}

/// Aggregation window, anchored on a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Daily,
    Weekly,
}

impl Window {
    /// Half-open `[start, end)` UTC bounds. Daily covers the reference date;
    /// weekly covers the seven calendar days ending on it.
    pub fn bounds(self, reference: Date) -> (OffsetDateTime, OffsetDateTime) {
        let end = (reference + Duration::days(1)).midnight().assume_utc();
        let start = match self {
            Window::Daily => reference.midnight().assume_utc(),
            Window::Weekly => (reference - Duration::days(6)).midnight().assume_utc(),
        };
        (start, end)
    }
}

impl MealRecord {
    /// Appends a meal to the diary. Validation happens before any write; a
    /// rejected meal leaves no trace. Returns the strictly increasing id.
    pub async fn append(
        db: &SqlitePool,
        consumer_id: i64,
        food_items: &[FoodItem],
        nutrients: &NutrientVector,
        eaten_at: Option<OffsetDateTime>,
    ) -> Result<i64, DiaryError> {
        if consumer_id <= 0 {
            return Err(DiaryError::InvalidInput(
                "consumer id must be positive".into(),
            ));
        }
        for item in food_items {
            if item.name.trim().is_empty() {
                return Err(DiaryError::InvalidInput(
                    "food item name must not be empty".into(),
                ));
            }
            if item.quantity_g == 0 {
                return Err(DiaryError::InvalidInput(format!(
                    "quantity for {:?} must be positive",
                    item.name
                )));
            }
        }

        let eaten_at = eaten_at
            .unwrap_or_else(OffsetDateTime::now_utc)
            .to_offset(UtcOffset::UTC);
        let food_items_json = serde_json::to_string(food_items)?;
        let nutrients_json = serde_json::to_string(nutrients)?;

        let result = sqlx::query(
            r#"
            INSERT INTO meals (consumer_id, eaten_at, food_items, nutrients)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(consumer_id)
        .bind(eaten_at.unix_timestamp())
        .bind(food_items_json)
        .bind(nutrients_json)
        .execute(db)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Records for one consumer within `[start, end)`, ascending by time.
    /// An empty range is an empty vec, not an error.
    pub async fn in_range(
        db: &SqlitePool,
        consumer_id: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<MealRecord>, DiaryError> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT id, consumer_id, eaten_at, food_items, nutrients, created_at
            FROM meals
            WHERE consumer_id = ?1 AND eaten_at >= ?2 AND eaten_at < ?3
            ORDER BY eaten_at ASC, id ASC
            "#,
        )
        .bind(consumer_id)
        .bind(start.unix_timestamp())
        .bind(end.unix_timestamp())
        .fetch_all(db)
        .await?;

        rows.into_iter().map(MealRecord::try_from).collect()
    }

    pub async fn in_window(
        db: &SqlitePool,
        consumer_id: i64,
        window: Window,
        reference: Date,
    ) -> Result<Vec<MealRecord>, DiaryError> {
        let (start, end) = window.bounds(reference);
        Self::in_range(db, consumer_id, start, end).await
    }

    pub async fn count_in_window(
        db: &SqlitePool,
        consumer_id: i64,
        window: Window,
        reference: Date,
    ) -> Result<u64, DiaryError> {
        let (start, end) = window.bounds(reference);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM meals
            WHERE consumer_id = ?1 AND eaten_at >= ?2 AND eaten_at < ?3
            "#,
        )
        .bind(consumer_id)
        .bind(start.unix_timestamp())
        .bind(end.unix_timestamp())
        .fetch_one(db)
        .await?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::nutrients::Nutrient;
    use crate::state::AppState;
    use time::macros::datetime;

    fn item(name: &str) -> FoodItem {
        FoodItem {
            name: name.into(),
            quantity_g: 100,
            nutrients: None,
        }
    }

    #[test]
    fn daily_window_is_half_open_over_one_day() {
        let (start, end) = Window::Daily.bounds(time::macros::date!(2026 - 01 - 06));
        assert_eq!(start, datetime!(2026 - 01 - 06 00:00 UTC));
        assert_eq!(end, datetime!(2026 - 01 - 07 00:00 UTC));
    }

    #[test]
    fn weekly_window_covers_seven_days_ending_on_reference() {
        let (start, end) = Window::Weekly.bounds(time::macros::date!(2026 - 01 - 06));
        assert_eq!(start, datetime!(2025 - 12 - 31 00:00 UTC));
        assert_eq!(end, datetime!(2026 - 01 - 07 00:00 UTC));
    }

    #[tokio::test]
    async fn append_returns_strictly_increasing_ids() {
        let state = AppState::fake().await;
        let nutrients = NutrientVector::zero().with(Nutrient::Calories, 100.0);
        let mut last = 0;
        for _ in 0..3 {
            let id = MealRecord::append(&state.db, 7, &[item("toast")], &nutrients, None)
                .await
                .expect("append");
            assert!(id > last);
            last = id;
        }
    }

    #[tokio::test]
    async fn append_rejects_malformed_input_without_writing() {
        let state = AppState::fake().await;
        let nutrients = NutrientVector::zero();

        let err = MealRecord::append(&state.db, 0, &[item("toast")], &nutrients, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DiaryError::InvalidInput(_)));

        let err = MealRecord::append(&state.db, 7, &[item("  ")], &nutrients, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DiaryError::InvalidInput(_)));

        let bad_quantity = FoodItem {
            name: "toast".into(),
            quantity_g: 0,
            nutrients: None,
        };
        let err = MealRecord::append(&state.db, 7, &[bad_quantity], &nutrients, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DiaryError::InvalidInput(_)));

        let count = MealRecord::count_in_window(
            &state.db,
            7,
            Window::Weekly,
            OffsetDateTime::now_utc().date(),
        )
        .await
        .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn in_range_is_ascending_and_respects_half_open_bounds() {
        let state = AppState::fake().await;
        let nutrients = NutrientVector::zero();
        let day = time::macros::date!(2026 - 01 - 06);
        let (start, end) = Window::Daily.bounds(day);

        // Logged out of order; the boundary cases sit exactly on the edges.
        for at in [
            datetime!(2026 - 01 - 06 19:00 UTC),
            datetime!(2026 - 01 - 06 08:00 UTC),
            start,
            end,
        ] {
            MealRecord::append(&state.db, 7, &[item("snack")], &nutrients, Some(at))
                .await
                .expect("append");
        }

        let meals = MealRecord::in_range(&state.db, 7, start, end)
            .await
            .expect("query");
        let times: Vec<_> = meals.iter().map(|m| m.eaten_at).collect();
        assert_eq!(
            times,
            vec![
                start,
                datetime!(2026 - 01 - 06 08:00 UTC),
                datetime!(2026 - 01 - 06 19:00 UTC),
            ]
        );
    }

    #[tokio::test]
    async fn empty_range_is_empty_not_an_error() {
        let state = AppState::fake().await;
        let meals = MealRecord::in_window(
            &state.db,
            7,
            Window::Daily,
            time::macros::date!(2026 - 01 - 06),
        )
        .await
        .expect("query");
        assert!(meals.is_empty());
    }

    #[tokio::test]
    async fn consumers_never_observe_each_others_records() {
        let state = AppState::fake().await;
        let nutrients = NutrientVector::zero().with(Nutrient::Calories, 500.0);
        let at = datetime!(2026 - 01 - 06 12:00 UTC);
        MealRecord::append(&state.db, 1, &[item("lunch")], &nutrients, Some(at))
            .await
            .expect("append");

        let other = MealRecord::in_window(
            &state.db,
            2,
            Window::Daily,
            time::macros::date!(2026 - 01 - 06),
        )
        .await
        .expect("query");
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn backdated_meal_lands_in_its_window() {
        let state = AppState::fake().await;
        let nutrients = NutrientVector::zero();
        let yesterday = datetime!(2026 - 01 - 05 09:30 UTC);
        MealRecord::append(&state.db, 7, &[item("breakfast")], &nutrients, Some(yesterday))
            .await
            .expect("append");

        let on_the_5th = MealRecord::in_window(
            &state.db,
            7,
            Window::Daily,
            time::macros::date!(2026 - 01 - 05),
        )
        .await
        .expect("query");
        assert_eq!(on_the_5th.len(), 1);
        assert_eq!(on_the_5th[0].eaten_at, yesterday);

        let on_the_6th = MealRecord::in_window(
            &state.db,
            7,
            Window::Daily,
            time::macros::date!(2026 - 01 - 06),
        )
        .await
        .expect("query");
        assert!(on_the_6th.is_empty());
    }

    #[tokio::test]
    async fn stored_record_preserves_items_and_vector() {
        let state = AppState::fake().await;
        let logged = FoodItem {
            name: "grilled chicken".into(),
            quantity_g: 150,
            nutrients: Some(NutrientVector::zero().with(Nutrient::ProteinG, 46.5)),
        };
        let nutrients = NutrientVector::zero().with(Nutrient::ProteinG, 46.5);
        let at = datetime!(2026 - 01 - 06 12:00 UTC);
        let id = MealRecord::append(&state.db, 7, &[logged], &nutrients, Some(at))
            .await
            .expect("append");

        let meals = MealRecord::in_window(
            &state.db,
            7,
            Window::Daily,
            time::macros::date!(2026 - 01 - 06),
        )
        .await
        .expect("query");
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, id);
        assert_eq!(meals[0].food_items.len(), 1);
        assert_eq!(meals[0].food_items[0].name, "grilled chicken");
        assert_eq!(meals[0].nutrients.get(Nutrient::ProteinG), 46.5);
    }
}
