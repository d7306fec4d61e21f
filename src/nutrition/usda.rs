use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{NutritionError, NutritionFacts, NutritionProvider};
use crate::{config::NutritionConfig, round2};

const MINERALS: &[&str] = &[
    "Calcium", "Iron", "Magnesium", "Phosphorus", "Potassium", "Sodium", "Zinc",
];

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub foods: Vec<Food>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Food {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FoodNutrient {
    #[serde(default)]
    pub nutrient_name: String,
    #[serde(default)]
    pub unit_name: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// USDA FoodData Central search client.
pub struct UsdaNutrition {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl UsdaNutrition {
    pub fn new(cfg: &NutritionConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fruitscan/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.usda_base_url.clone(),
            api_key: cfg.usda_api_key.clone(),
        })
    }
}

/// `"Vitamin C, total ascorbic acid"` -> `"Vitamin C"`, `"Potassium, K"` -> `"Potassium"`.
fn short_name(name: &str) -> &str {
    name.split(',').next().unwrap_or(name).trim()
}

fn is_micronutrient(short: &str) -> bool {
    short.starts_with("Vitamin") || MINERALS.contains(&short)
}

/// Shapes one FoodData Central food into the simplified schema.
pub(crate) fn shape(food: &Food) -> NutritionFacts {
    let mut facts = NutritionFacts::default();
    let mut micros = BTreeMap::new();

    for n in &food.food_nutrients {
        let Some(value) = n.value else { continue };
        let unit = n.unit_name.to_lowercase();
        match n.nutrient_name.as_str() {
            "Energy" if unit == "kcal" => facts.calories = round2(value),
            "Carbohydrate, by difference" => facts.carbs_g = round2(value),
            "Protein" => facts.protein_g = round2(value),
            "Total lipid (fat)" => facts.fat_g = round2(value),
            "Fiber, total dietary" => facts.fiber_g = round2(value),
            name => {
                let short = short_name(name);
                if is_micronutrient(short) {
                    micros
                        .entry(short.to_string())
                        .or_insert_with(|| format!("{} {}", round2(value), unit));
                }
            }
        }
    }

    facts.vitamins_minerals = micros;
    facts
}

#[async_trait]
impl NutritionProvider for UsdaNutrition {
    #[instrument(skip(self))]
    async fn lookup(&self, food: &str) -> Result<NutritionFacts, NutritionError> {
        let res = self
            .http
            .get(format!("{}/foods/search", self.base_url))
            .query(&[
                ("query", food),
                ("pageSize", "1"),
                ("dataType", "Foundation,SR Legacy"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            warn!(%status, "USDA search failed");
            return Err(NutritionError::Upstream(format!("USDA returned {status}")));
        }

        let body: SearchResponse = res.json().await?;
        let first = body
            .foods
            .first()
            .ok_or_else(|| NutritionError::NotFound(food.to_string()))?;
        debug!(description = %first.description, "USDA match");
        Ok(shape(first))
    }
}
