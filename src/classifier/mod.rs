//! Image classification: maps an uploaded image to a fruit label and confidence.
//!
//! Backends implement [`Classifier`]. The one handed to [`AppState`](crate::state::AppState)
//! is normally a [`LazyClassifier`] that builds its backend on first use.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

mod labels;
mod lazy;
mod mock;
mod remote;

pub use labels::canonical_fruit;
pub use lazy::{ClassifierLoader, LazyClassifier, MockLoader, RemoteLoader};
pub use mock::MockClassifier;
pub use remote::RemoteClassifier;

/// A validated image upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// 0..=1, rounded to two decimals.
    pub confidence: f64,
    pub note: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("no fruit recognised in the image")]
    NotRecognized,
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &ImageUpload) -> Result<Prediction, ClassifyError>;
}
