//! Nutrition lookup: food label to macro and micronutrient facts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

mod mock;
mod usda;

pub use mock::MockNutrition;
pub use usda::UsdaNutrition;

/// Per-100 g facts in the simplified response schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NutritionFacts {
    pub calories: f64,
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    /// Nutrient name to a display value such as `"4.6 mg"`.
    pub vitamins_minerals: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NutritionError {
    #[error("no nutrition data found for {0}")]
    NotFound(String),
    #[error("nutrition service error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for NutritionError {
    fn from(e: reqwest::Error) -> Self {
        NutritionError::Upstream(e.to_string())
    }
}

#[async_trait]
pub trait NutritionProvider: Send + Sync {
    async fn lookup(&self, food: &str) -> Result<NutritionFacts, NutritionError>;
}
