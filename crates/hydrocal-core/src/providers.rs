//! External data provider traits.
//!
//! The engine only ever talks to these traits; the HTTP clients live in
//! `hydrocal-providers` and tests substitute stubs. Every method returns
//! `Option` rather than an error: a provider outage degrades a reply, it
//! never fails a conversation turn.

use async_trait::async_trait;

/// A food item resolved by name.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodInfo {
    pub name: String,
    /// Energy density, kcal per 100 g.
    pub calories_per_100: f64,
}

/// A low-calorie food offered as a suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodSample {
    pub name: String,
    /// kcal per 100 g.
    pub calories: f64,
}

/// Current temperature lookup by city name.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current temperature in °C, or `None` if the lookup failed.
    async fn temperature(&self, city: &str) -> Option<f64>;
}

/// Food database lookups.
#[async_trait]
pub trait NutritionProvider: Send + Sync {
    /// Resolve a food name to its energy density.
    async fn lookup(&self, food: &str) -> Option<FoodInfo>;

    /// Up to `max` random foods under 100 kcal per 100 g.
    async fn low_calorie_samples(&self, max: usize) -> Vec<FoodSample>;
}

/// Best-effort text translation between two languages.
#[async_trait]
pub trait TextTranslator: Send + Sync {
    /// Translate `text` from `src` to `dest` (ISO 639-1 codes), or
    /// `None` if the service is unavailable.
    async fn translate(&self, text: &str, src: &str, dest: &str) -> Option<String>;
}
