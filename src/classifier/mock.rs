use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;

use super::{ClassifyError, Classifier, ImageUpload, Prediction};
use crate::round2;

pub const MOCK_FOODS: [&str; 3] = ["Apple", "Banana", "Orange"];

/// Stand-in classifier. Picks one of [`MOCK_FOODS`] from the filename and clock.
pub struct MockClassifier {
    delay: Duration,
}

impl MockClassifier {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn pick_index(filename_len: usize, unix_secs: u64) -> usize {
        ((filename_len as u64 + unix_secs) % MOCK_FOODS.len() as u64) as usize
    }

    pub fn predict_at(filename: Option<&str>, unix_secs: u64) -> Prediction {
        let len = filename.map(|f| f.chars().count()).unwrap_or(0);
        let idx = Self::pick_index(len, unix_secs);
        Prediction {
            label: MOCK_FOODS[idx].to_string(),
            confidence: round2(0.86 + idx as f64 * 0.03),
            note: Some("Mocked prediction.".to_string()),
        }
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, image: &ImageUpload) -> Result<Prediction, ClassifyError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
        let prediction = Self::predict_at(image.filename.as_deref(), now);
        debug!(label = %prediction.label, "mock prediction");
        Ok(prediction)
    }
}
