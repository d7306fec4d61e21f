use serde::Serialize;

use crate::nutrition::NutritionFacts;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub food: String,
    pub confidence: f64,
    pub nutrition: NutritionFacts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
