use async_trait::async_trait;

use super::{NutritionError, NutritionFacts, NutritionProvider};

struct Row {
    name: &'static str,
    calories: f64,
    carbs_g: f64,
    protein_g: f64,
    fat_g: f64,
    fiber_g: f64,
    micros: &'static [(&'static str, &'static str)],
}

const TABLE: &[Row] = &[
    Row { name: "Apple", calories: 52.0, carbs_g: 14.0, protein_g: 0.3, fat_g: 0.2, fiber_g: 2.4,
          micros: &[("Vitamin C", "4.6 mg"), ("Potassium", "107 mg")] },
    Row { name: "Banana", calories: 89.0, carbs_g: 23.0, protein_g: 1.1, fat_g: 0.3, fiber_g: 2.6,
          micros: &[("Vitamin B6", "0.4 mg"), ("Potassium", "358 mg")] },
    Row { name: "Orange", calories: 47.0, carbs_g: 12.0, protein_g: 0.9, fat_g: 0.1, fiber_g: 2.4,
          micros: &[("Vitamin C", "53.2 mg"), ("Calcium", "40 mg")] },
    Row { name: "Lemon", calories: 29.0, carbs_g: 9.3, protein_g: 1.1, fat_g: 0.3, fiber_g: 2.8,
          micros: &[("Vitamin C", "53 mg"), ("Potassium", "138 mg")] },
    Row { name: "Pineapple", calories: 50.0, carbs_g: 13.1, protein_g: 0.5, fat_g: 0.1, fiber_g: 1.4,
          micros: &[("Vitamin C", "47.8 mg"), ("Manganese", "0.9 mg")] },
    Row { name: "Strawberry", calories: 32.0, carbs_g: 7.7, protein_g: 0.7, fat_g: 0.3, fiber_g: 2.0,
          micros: &[("Vitamin C", "58.8 mg"), ("Potassium", "153 mg")] },
    Row { name: "Fig", calories: 74.0, carbs_g: 19.2, protein_g: 0.8, fat_g: 0.3, fiber_g: 2.9,
          micros: &[("Potassium", "232 mg"), ("Calcium", "35 mg")] },
    Row { name: "Pomegranate", calories: 83.0, carbs_g: 18.7, protein_g: 1.7, fat_g: 1.2, fiber_g: 4.0,
          micros: &[("Vitamin K", "16.4 ug"), ("Potassium", "236 mg")] },
    Row { name: "Jackfruit", calories: 95.0, carbs_g: 23.2, protein_g: 1.7, fat_g: 0.6, fiber_g: 1.5,
          micros: &[("Vitamin C", "13.7 mg"), ("Potassium", "448 mg")] },
    Row { name: "Custard Apple", calories: 101.0, carbs_g: 25.2, protein_g: 1.7, fat_g: 0.6, fiber_g: 2.4,
          micros: &[("Vitamin C", "19.2 mg"), ("Potassium", "382 mg")] },
];

/// Static per-100 g table; no network.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockNutrition;

impl MockNutrition {
    pub fn facts_for(food: &str) -> Option<NutritionFacts> {
        let food = food.trim();
        TABLE
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(food))
            .map(|r| NutritionFacts {
                calories: r.calories,
                carbs_g: r.carbs_g,
                protein_g: r.protein_g,
                fat_g: r.fat_g,
                fiber_g: r.fiber_g,
                vitamins_minerals: r
                    .micros
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
    }
}

#[async_trait]
impl NutritionProvider for MockNutrition {
    async fn lookup(&self, food: &str) -> Result<NutritionFacts, NutritionError> {
        Self::facts_for(food).ok_or_else(|| NutritionError::NotFound(food.to_string()))
    }
}
