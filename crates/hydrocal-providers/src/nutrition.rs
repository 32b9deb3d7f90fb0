//! Food database clients.
//!
//! Lookups go to Nutritionix (natural-language nutrient queries);
//! low-calorie suggestions come from the Edamam food database. Both
//! degrade to empty results on failure so a flaky food API never breaks
//! a logging turn.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::{Value, json};
use tracing::{debug, warn};

use hydrocal_core::{FoodInfo, FoodSample, NutritionProvider};

use crate::error::{ProviderError, Result};

const NUTRITIONIX_URL: &str = "https://trackapi.nutritionix.com/v2/natural/nutrients";
const EDAMAM_URL: &str = "https://api.edamam.com/api/food-database/v2/parser";

/// Foods at or above this density are not suggested.
const LOW_CALORIE_CUTOFF: f64 = 100.0;

/// Combined Nutritionix + Edamam client.
pub struct NutritionClient {
    nutritionix_app_id: String,
    nutritionix_app_key: String,
    edamam_app_id: String,
    edamam_app_key: String,
    http: reqwest::Client,
}

impl NutritionClient {
    pub fn new(
        nutritionix_app_id: impl Into<String>,
        nutritionix_app_key: impl Into<String>,
        edamam_app_id: impl Into<String>,
        edamam_app_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            nutritionix_app_id: nutritionix_app_id.into(),
            nutritionix_app_key: nutritionix_app_key.into(),
            edamam_app_id: edamam_app_id.into(),
            edamam_app_key: edamam_app_key.into(),
            http,
        }
    }

    /// Query Nutritionix for the first food matching `query`.
    async fn fetch_food(&self, query: &str) -> Result<Option<FoodInfo>> {
        debug!(query, "looking up food");

        let response = self
            .http
            .post(NUTRITIONIX_URL)
            .header("x-app-id", &self.nutritionix_app_id)
            .header("x-app-key", &self.nutritionix_app_key)
            .json(&json!({ "query": query }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Api {
                service: "nutritionix",
                reason: format!("status {}", response.status()),
            });
        }

        let body: Value = response.json().await?;
        let Some(food) = body
            .get("foods")
            .and_then(|v| v.as_array())
            .and_then(|foods| foods.first())
        else {
            return Ok(None);
        };

        let calories = food
            .get("nf_calories")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        Ok(Some(FoodInfo {
            name: capitalize(query),
            calories_per_100: (calories * 100.0).round() / 100.0,
        }))
    }

    /// Fetch Edamam parser hints and keep the light ones.
    async fn fetch_low_calorie(&self) -> Result<Vec<FoodSample>> {
        let response: Value = self
            .http
            .get(EDAMAM_URL)
            .query(&[
                ("app_id", self.edamam_app_id.as_str()),
                ("app_key", self.edamam_app_key.as_str()),
                ("ingr", "apple"),
            ])
            .send()
            .await?
            .json()
            .await?;

        let hints = response
            .get("hints")
            .and_then(|v| v.as_array())
            .ok_or(ProviderError::BadResponse {
                service: "edamam",
                reason: "missing hints array".to_string(),
            })?;

        let samples = hints
            .iter()
            .filter_map(|hint| {
                let food = hint.get("food")?;
                let name = food.get("label")?.as_str()?.to_string();
                let calories = food
                    .pointer("/nutrients/ENERC_KCAL")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0);
                (calories < LOW_CALORIE_CUTOFF).then_some(FoodSample { name, calories })
            })
            .collect();
        Ok(samples)
    }
}

#[async_trait]
impl NutritionProvider for NutritionClient {
    async fn lookup(&self, food: &str) -> Option<FoodInfo> {
        match self.fetch_food(food).await {
            Ok(info) => info,
            Err(err) => {
                warn!(food, %err, "food lookup failed");
                None
            }
        }
    }

    async fn low_calorie_samples(&self, max: usize) -> Vec<FoodSample> {
        let mut samples = match self.fetch_low_calorie().await {
            Ok(samples) => samples,
            Err(err) => {
                warn!(%err, "food suggestions unavailable");
                return Vec::new();
            }
        };
        let mut rng = rand::thread_rng();
        samples.shuffle(&mut rng);
        samples.truncate(max);
        samples
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_handles_unicode_and_empty() {
        assert_eq!(capitalize("banana"), "Banana");
        assert_eq!(capitalize("яблоко"), "Яблоко");
        assert_eq!(capitalize(""), "");
    }
}
