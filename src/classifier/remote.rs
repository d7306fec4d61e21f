use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{canonical_fruit, ClassifyError, Classifier, ImageUpload, Prediction};
use crate::round2;

#[derive(Debug, Deserialize)]
pub(crate) struct RawPrediction {
    pub label: String,
    /// Percent, as reported by the model server.
    pub probability: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassifyResponse {
    pub predictions: Vec<RawPrediction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_bytes: Option<u64>,
}

/// Talks to an inference server hosting the pretrained image model.
pub struct RemoteClassifier {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClassifier {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub(crate) fn http_client() -> Result<reqwest::Client, ClassifyError> {
        Ok(reqwest::Client::builder()
            .user_agent(concat!("fruitscan/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?)
    }

    pub(crate) async fn health(&self) -> Result<HealthResponse, ClassifyError> {
        let res = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json::<HealthResponse>().await?)
    }
}

/// Highest-probability prediction whose label is a known fruit.
pub(crate) fn best_fruit(predictions: &[RawPrediction]) -> Option<Prediction> {
    predictions
        .iter()
        .filter_map(|p| canonical_fruit(&p.label).map(|name| (name, p.probability)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, pct)| Prediction {
            label: name.to_string(),
            confidence: round2((pct / 100.0).clamp(0.0, 1.0)),
            note: None,
        })
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, image: &ImageUpload) -> Result<Prediction, ClassifyError> {
        let res = self
            .http
            .post(format!("{}/classify", self.base_url))
            .header(CONTENT_TYPE, image.content_type.as_str())
            .body(image.data.clone())
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            warn!(%status, "inference server returned an error");
            return Err(ClassifyError::Unavailable(format!(
                "inference server returned {status}"
            )));
        }

        let body: ClassifyResponse = res.json().await?;
        debug!(count = body.predictions.len(), "raw predictions");
        best_fruit(&body.predictions).ok_or(ClassifyError::NotRecognized)
    }
}
