use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::config::ProfileConfig;
use crate::nutrition::nutrients::{Nutrient, NutrientVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trimester {
    First,
    Second,
    Third,
}

impl Trimester {
    pub fn number(self) -> u8 {
        match self {
            Trimester::First => 1,
            Trimester::Second => 2,
            Trimester::Third => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Trimester::First => "First",
            Trimester::Second => "Second",
            Trimester::Third => "Third",
        }
    }
}

/// Pregnancy-stage state derived from a fixed start date. Requirements are
/// recomputed per call; callers must tolerate targets changing across a
/// trimester-week boundary at midnight.
#[derive(Debug, Clone)]
pub struct PregnancyProfile {
    start_date: Date,
    due_date: Date,
    supplement: NutrientVector,
}

/// Daily contribution of the prenatal vitamin regimen.
fn daily_supplement() -> NutrientVector {
    NutrientVector::zero()
        .with(Nutrient::FolateMcg, 400.0)
        .with(Nutrient::IronMg, 27.0)
        .with(Nutrient::CalciumMg, 200.0)
        .with(Nutrient::VitaminDIu, 400.0)
        .with(Nutrient::VitaminCMg, 85.0)
        .with(Nutrient::VitaminB12Mcg, 2.6)
        .with(Nutrient::ZincMg, 11.0)
        .with(Nutrient::Omega3G, 0.2)
}

fn base_requirements() -> NutrientVector {
    NutrientVector::zero()
        .with(Nutrient::Calories, 2200.0)
        .with(Nutrient::ProteinG, 71.0)
        .with(Nutrient::CarbohydratesG, 175.0)
        .with(Nutrient::FiberG, 28.0)
        .with(Nutrient::FatG, 73.0)
        .with(Nutrient::FolateMcg, 600.0)
        .with(Nutrient::IronMg, 27.0)
        .with(Nutrient::CalciumMg, 1000.0)
        .with(Nutrient::VitaminDIu, 600.0)
        .with(Nutrient::VitaminCMg, 85.0)
        .with(Nutrient::VitaminAMcg, 770.0)
        .with(Nutrient::VitaminB12Mcg, 2.6)
        .with(Nutrient::ZincMg, 11.0)
        .with(Nutrient::Omega3G, 1.4)
}

impl PregnancyProfile {
    pub fn new(config: &ProfileConfig) -> Self {
        Self {
            start_date: config.pregnancy_start_date,
            due_date: config.due_date,
            supplement: daily_supplement(),
        }
    }

    pub fn start_date(&self) -> Date {
        self.start_date
    }

    pub fn due_date(&self) -> Date {
        self.due_date
    }

    /// Gestational week on the given date: floor of elapsed days / 7,
    /// clamped to 1..=42.
    pub fn week_on(&self, date: Date) -> u8 {
        let days = (date - self.start_date).whole_days();
        days.div_euclid(7).clamp(1, 42) as u8
    }

    pub fn trimester_on(&self, date: Date) -> Trimester {
        let week = self.week_on(date);
        if week <= 12 {
            Trimester::First
        } else if week <= 27 {
            Trimester::Second
        } else {
            Trimester::Third
        }
    }

    pub fn current_week(&self) -> u8 {
        self.week_on(OffsetDateTime::now_utc().date())
    }

    pub fn current_trimester(&self) -> Trimester {
        self.trimester_on(OffsetDateTime::now_utc().date())
    }

    pub fn daily_requirements_on(&self, date: Date) -> NutrientVector {
        let mut req = base_requirements();
        match self.trimester_on(date) {
            Trimester::First => {
                // Nausea usually lowers early intake; folate stays at 600.
                req.set(Nutrient::Calories, 1800.0);
            }
            Trimester::Second => {
                req.set(Nutrient::Calories, 2200.0);
                req.set(Nutrient::ProteinG, 75.0);
                req.set(Nutrient::CalciumMg, 1000.0);
            }
            Trimester::Third => {
                req.set(Nutrient::Calories, 2400.0);
                req.set(Nutrient::ProteinG, 80.0);
                req.set(Nutrient::IronMg, 30.0);
                req.set(Nutrient::CalciumMg, 1200.0);
            }
        }
        req
    }

    /// Always derived from the daily vector so the two views cannot drift.
    pub fn weekly_requirements_on(&self, date: Date) -> NutrientVector {
        self.daily_requirements_on(date).scaled(7.0)
    }

    /// What still has to come from food after the supplement regimen,
    /// floored at zero per nutrient.
    pub fn food_only_requirements_on(&self, date: Date) -> NutrientVector {
        self.daily_requirements_on(date).minus_floor(&self.supplement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::Duration;

    fn profile() -> PregnancyProfile {
        PregnancyProfile::new(&ProfileConfig {
            pregnancy_start_date: date!(2025 - 12 - 02),
            due_date: date!(2026 - 09 - 07),
        })
    }

    fn date_at_week(week: i64) -> Date {
        date!(2025 - 12 - 02) + Duration::days(week * 7)
    }

    #[test]
    fn week_is_clamped_into_gestational_range() {
        let p = profile();
        // Before and right at the start date the week floors to 1.
        assert_eq!(p.week_on(date!(2025 - 11 - 01)), 1);
        assert_eq!(p.week_on(date!(2025 - 12 - 02)), 1);
        assert_eq!(p.week_on(date_at_week(12)), 12);
        // Far past term clamps to 42.
        assert_eq!(p.week_on(date_at_week(50)), 42);
    }

    #[test]
    fn trimester_boundaries_fall_on_weeks_12_and_27() {
        let p = profile();
        assert_eq!(p.trimester_on(date_at_week(12)), Trimester::First);
        assert_eq!(p.trimester_on(date_at_week(13)), Trimester::Second);
        assert_eq!(p.trimester_on(date_at_week(27)), Trimester::Second);
        assert_eq!(p.trimester_on(date_at_week(28)), Trimester::Third);
        assert_eq!(p.trimester_on(date_at_week(50)), Trimester::Third);
    }

    #[test]
    fn daily_requirements_track_the_trimester() {
        let p = profile();

        let first = p.daily_requirements_on(date_at_week(5));
        assert_eq!(first.get(Nutrient::Calories), 1800.0);
        assert_eq!(first.get(Nutrient::ProteinG), 71.0);
        assert_eq!(first.get(Nutrient::FolateMcg), 600.0);

        let second = p.daily_requirements_on(date_at_week(20));
        assert_eq!(second.get(Nutrient::Calories), 2200.0);
        assert_eq!(second.get(Nutrient::ProteinG), 75.0);
        assert_eq!(second.get(Nutrient::CalciumMg), 1000.0);

        let third = p.daily_requirements_on(date_at_week(30));
        assert_eq!(third.get(Nutrient::Calories), 2400.0);
        assert_eq!(third.get(Nutrient::ProteinG), 80.0);
        assert_eq!(third.get(Nutrient::IronMg), 30.0);
        assert_eq!(third.get(Nutrient::CalciumMg), 1200.0);
    }

    #[test]
    fn weekly_requirements_are_seven_times_daily_in_every_trimester() {
        let p = profile();
        for week in [5, 20, 30] {
            let date = date_at_week(week);
            let daily = p.daily_requirements_on(date);
            let weekly = p.weekly_requirements_on(date);
            for (nutrient, amount) in daily.iter() {
                assert_eq!(weekly.get(nutrient), amount * 7.0, "{nutrient}");
            }
        }
    }

    #[test]
    fn food_only_requirements_subtract_the_supplement_floored_at_zero() {
        let p = profile();
        let date = date_at_week(5);
        let residual = p.food_only_requirements_on(date);
        assert_eq!(residual.get(Nutrient::FolateMcg), 200.0);
        // The supplement fully covers vitamin C; the residual floors at zero.
        assert_eq!(residual.get(Nutrient::VitaminCMg), 0.0);
        // Calories are untouched by the regimen.
        assert_eq!(residual.get(Nutrient::Calories), 1800.0);
    }
}
