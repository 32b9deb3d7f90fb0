//! The per-user tracking record and its day-boundary rollover.
//!
//! [`UserRecord`] is the authoritative profile + goals + today's-totals
//! structure. The running totals (`logged_water`, `logged_calories`,
//! `burned_calories`) are only valid for `current_date`; [`rollover`]
//! zeroes them when the wall-clock date has moved on. Rollover is a pure
//! function so tests can inject "today" instead of reading the clock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A user's gender, as captured during profile setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Not captured yet (fresh profile).
    #[default]
    Unset,
}

impl Gender {
    /// Convert from a database string representation.
    pub fn from_str(s: &str) -> StoreResult<Self> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "unset" => Ok(Self::Unset),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown gender: {other}"
            ))),
        }
    }

    /// Convert to a database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unset => "unset",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authoritative per-user profile, goals, and today's running totals.
///
/// A `water_goal`/`calorie_goal` of `0.0` is the "profile not yet
/// completed" sentinel; callers must not confuse it with "on track".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Body weight in kilograms.
    pub weight: f64,
    /// Height in centimeters.
    pub height: f64,
    /// Age in years.
    pub age: f64,
    pub gender: Gender,
    /// Daily activity in minutes.
    pub activity: f64,
    /// Free-text city name, as entered by the user.
    pub city: String,
    /// Daily water goal in milliliters (0.0 until setup completes).
    pub water_goal: f64,
    /// Daily calorie goal in kcal (0.0 until setup completes).
    pub calorie_goal: f64,
    /// Water logged today, in milliliters.
    pub logged_water: f64,
    /// Calories consumed today, in kcal.
    pub logged_calories: f64,
    /// Calories burned by workouts today, in kcal.
    pub burned_calories: f64,
    /// The calendar date the running totals apply to. `None` until the
    /// first update touches the record.
    pub current_date: Option<NaiveDate>,
    /// Most recent touch; drives cache eviction. Never persisted.
    #[serde(skip)]
    pub last_active: DateTime<Utc>,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            weight: 0.0,
            height: 0.0,
            age: 0.0,
            gender: Gender::Unset,
            activity: 0.0,
            city: String::new(),
            water_goal: 0.0,
            calorie_goal: 0.0,
            logged_water: 0.0,
            logged_calories: 0.0,
            burned_calories: 0.0,
            current_date: None,
            last_active: Utc::now(),
        }
    }
}

impl UserRecord {
    /// True once goal computation has run (the zero-goal sentinel cleared).
    pub fn profile_complete(&self) -> bool {
        self.water_goal > 0.0 && self.calorie_goal > 0.0
    }
}

/// A partial update to a [`UserRecord`].
///
/// Only `Some` fields are merged; everything else is left untouched.
/// Replaces the loosely-typed field bag the update path would otherwise
/// need.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    pub activity: Option<f64>,
    pub city: Option<String>,
    pub water_goal: Option<f64>,
    pub calorie_goal: Option<f64>,
    pub logged_water: Option<f64>,
    pub logged_calories: Option<f64>,
    pub burned_calories: Option<f64>,
}

impl RecordPatch {
    /// Merge this patch into `record`, field by field.
    pub fn apply(self, record: &mut UserRecord) {
        if let Some(v) = self.weight {
            record.weight = v;
        }
        if let Some(v) = self.height {
            record.height = v;
        }
        if let Some(v) = self.age {
            record.age = v;
        }
        if let Some(v) = self.gender {
            record.gender = v;
        }
        if let Some(v) = self.activity {
            record.activity = v;
        }
        if let Some(v) = self.city {
            record.city = v;
        }
        if let Some(v) = self.water_goal {
            record.water_goal = v;
        }
        if let Some(v) = self.calorie_goal {
            record.calorie_goal = v;
        }
        if let Some(v) = self.logged_water {
            record.logged_water = v;
        }
        if let Some(v) = self.logged_calories {
            record.logged_calories = v;
        }
        if let Some(v) = self.burned_calories {
            record.burned_calories = v;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Rollover
// ═══════════════════════════════════════════════════════════════════════

/// Zero the day's running totals if the record's date is behind `today`.
///
/// Returns `true` if a rollover happened. Idempotent: a second call with
/// the same `today` is a no-op. A record whose `current_date` is `None`
/// has never been written to and is left untouched.
pub fn rollover(record: &mut UserRecord, today: NaiveDate) -> bool {
    match record.current_date {
        Some(date) if date != today => {
            record.logged_water = 0.0;
            record.logged_calories = 0.0;
            record.burned_calories = 0.0;
            record.current_date = Some(today);
            true
        }
        _ => false,
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rollover_zeroes_stale_totals() {
        let mut record = UserRecord {
            logged_water: 1200.0,
            logged_calories: 900.0,
            burned_calories: 300.0,
            current_date: Some(date(2025, 3, 1)),
            ..UserRecord::default()
        };

        let rolled = rollover(&mut record, date(2025, 3, 2));
        assert!(rolled);
        assert_eq!(record.logged_water, 0.0);
        assert_eq!(record.logged_calories, 0.0);
        assert_eq!(record.burned_calories, 0.0);
        assert_eq!(record.current_date, Some(date(2025, 3, 2)));
    }

    #[test]
    fn rollover_is_idempotent() {
        let mut record = UserRecord {
            logged_water: 500.0,
            current_date: Some(date(2025, 3, 1)),
            ..UserRecord::default()
        };

        assert!(rollover(&mut record, date(2025, 3, 2)));
        record.logged_water = 250.0;
        assert!(!rollover(&mut record, date(2025, 3, 2)));
        assert_eq!(record.logged_water, 250.0);
    }

    #[test]
    fn rollover_skips_unset_date() {
        let mut record = UserRecord {
            logged_water: 500.0,
            ..UserRecord::default()
        };

        assert!(!rollover(&mut record, date(2025, 3, 2)));
        assert_eq!(record.logged_water, 500.0);
        assert_eq!(record.current_date, None);
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let mut record = UserRecord {
            weight: 70.0,
            height: 175.0,
            ..UserRecord::default()
        };

        let patch = RecordPatch {
            weight: Some(72.5),
            city: Some("Lisbon".to_string()),
            ..RecordPatch::default()
        };
        patch.apply(&mut record);

        assert_eq!(record.weight, 72.5);
        assert_eq!(record.height, 175.0);
        assert_eq!(record.city, "Lisbon");
    }

    #[test]
    fn sentinel_goal_means_incomplete_profile() {
        let mut record = UserRecord::default();
        assert!(!record.profile_complete());

        record.water_goal = 2600.0;
        assert!(!record.profile_complete());

        record.calorie_goal = 2189.0;
        assert!(record.profile_complete());
    }

    #[test]
    fn gender_round_trips_through_strings() {
        for g in [Gender::Male, Gender::Female, Gender::Unset] {
            assert_eq!(Gender::from_str(g.as_str()).unwrap(), g);
        }
        assert!(Gender::from_str("other").is_err());
    }
}
