//! Daily goal calculation.
//!
//! Pure functions only. The calorie goal follows the Mifflin-St Jeor
//! equation with an activity multiplier and a flat training bonus; the
//! water goal scales with body weight, activity, and hot weather. The
//! weather lookup happens elsewhere; this module just takes an optional
//! temperature.

use hydrocal_store::Gender;

/// Mifflin-St Jeor basal metabolic rate, kcal/day.
fn basal_rate(weight: f64, height: f64, age: f64, gender: Gender) -> f64 {
    let offset = match gender {
        Gender::Male => 5.0,
        _ => -161.0,
    };
    10.0 * weight + 6.25 * height - 5.0 * age + offset
}

/// Multiplier selected by daily activity minutes.
fn activity_factor(activity: f64) -> f64 {
    if activity < 30.0 {
        1.2
    } else if activity < 60.0 {
        1.375
    } else if activity < 120.0 {
        1.55
    } else if activity < 180.0 {
        1.725
    } else {
        1.9
    }
}

/// Daily calorie goal in whole kcal.
///
/// Basal rate times the activity multiplier, plus a flat training bonus
/// of 200 kcal and another 50 kcal per full 30 minutes of activity.
pub fn calorie_goal(weight: f64, height: f64, age: f64, gender: Gender, activity: f64) -> f64 {
    let daily = basal_rate(weight, height, age, gender) * activity_factor(activity);
    let training = 200.0 + (activity / 30.0).floor() * 50.0;
    (daily + training).round()
}

/// Daily water goal in whole milliliters.
///
/// 30 ml per kg of body weight plus 500 ml per full 30 minutes of
/// activity. Above 25 °C a heat bonus kicks in: 50 ml per degree over
/// 25 plus a flat 500 ml, capped at 1000 ml total. An unknown
/// temperature means no bonus rather than an error.
pub fn water_goal(weight: f64, activity: f64, temperature: Option<f64>) -> f64 {
    let mut goal = weight * 30.0 + (activity / 30.0).floor() * 500.0;
    if let Some(temp) = temperature
        && temp > 25.0
    {
        let extra = (temp - 25.0) * 50.0 + 500.0;
        goal += extra.min(1000.0);
    }
    goal.round()
}

/// Extra water (ml) earned by a workout: 200 ml per full 30 minutes.
pub fn workout_water_bonus(minutes: f64) -> f64 {
    (minutes / 30.0).floor() * 200.0
}

// ── tests ────────────────────────────────────────────────────────────
