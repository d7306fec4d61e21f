use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{ClassifyError, Classifier, ImageUpload, MockClassifier, Prediction, RemoteClassifier};

/// Builds the real classifier. Called at most once per successful load.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Classifier>, ClassifyError>;
}

/// Process-wide classifier, initialised on first request.
///
/// Concurrent first callers wait on the same load. A failed load is not cached,
/// so the next request tries again.
pub struct LazyClassifier {
    loader: Box<dyn ClassifierLoader>,
    cell: OnceCell<Arc<dyn Classifier>>,
}

impl LazyClassifier {
    pub fn new(loader: impl ClassifierLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> Result<Arc<dyn Classifier>, ClassifyError> {
        self.cell
            .get_or_try_init(|| self.loader.load())
            .await
            .cloned()
    }
}

#[async_trait]
impl Classifier for LazyClassifier {
    async fn classify(&self, image: &ImageUpload) -> Result<Prediction, ClassifyError> {
        self.get().await?.classify(image).await
    }
}

pub struct MockLoader {
    pub delay: Duration,
}

#[async_trait]
impl ClassifierLoader for MockLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>, ClassifyError> {
        info!(delay_ms = self.delay.as_millis() as u64, "using mock classifier");
        Ok(Arc::new(MockClassifier::new(self.delay)))
    }
}

/// Connects to the inference server and checks the model fits the memory ceiling.
pub struct RemoteLoader {
    pub base_url: String,
    pub max_model_bytes: u64,
    /// Used when the model is over the ceiling.
    pub fallback_delay: Duration,
}

#[async_trait]
impl ClassifierLoader for RemoteLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>, ClassifyError> {
        let remote = RemoteClassifier::new(RemoteClassifier::http_client()?, self.base_url.clone());
        let health = remote.health().await?;
        if health.status != "ok" {
            return Err(ClassifyError::Unavailable(format!(
                "inference server status {:?}",
                health.status
            )));
        }
        match health.model_bytes {
            Some(bytes) if bytes > self.max_model_bytes => {
                warn!(
                    model_bytes = bytes,
                    limit_bytes = self.max_model_bytes,
                    "model exceeds memory ceiling; falling back to mock classifier"
                );
                Ok(Arc::new(MockClassifier::new(self.fallback_delay)))
            }
            model_bytes => {
                info!(url = %self.base_url, ?model_bytes, "remote classifier ready");
                Ok(Arc::new(remote))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use bytes::Bytes;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail_first: bool,
    }

    #[async_trait]
    impl ClassifierLoader for CountingLoader {
        async fn load(&self) -> Result<Arc<dyn Classifier>, ClassifyError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail_first && n == 0 {
                return Err(ClassifyError::Unavailable("warming up".into()));
            }
            Ok(Arc::new(MockClassifier::new(Duration::ZERO)))
        }
    }

    fn image() -> ImageUpload {
        ImageUpload {
            filename: Some("a.png".into()),
            content_type: "image/png".into(),
            data: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn loads_once_under_concurrency() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = Arc::new(LazyClassifier::new(CountingLoader {
            calls: calls.clone(),
            fail_first: false,
        }));
        assert!(!lazy.is_loaded());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lazy = lazy.clone();
            handles.push(tokio::spawn(async move { lazy.classify(&image()).await }));
        }
        for h in handles {
            h.await.unwrap().expect("classify");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(lazy.is_loaded());
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = LazyClassifier::new(CountingLoader {
            calls: calls.clone(),
            fail_first: true,
        });
        assert!(lazy.classify(&image()).await.is_err());
        assert!(!lazy.is_loaded());
        assert!(lazy.classify(&image()).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    async fn health_server(model_bytes: u64) -> String {
        let app = Router::new().route(
            "/health",
            get(move || async move { Json(json!({"status": "ok", "model_bytes": model_bytes})) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn oversized_model_falls_back_to_mock() {
        let base = health_server(2_000).await;
        let loader = RemoteLoader {
            base_url: base,
            max_model_bytes: 1_000,
            fallback_delay: Duration::ZERO,
        };
        let clf = loader.load().await.unwrap();
        // The inference server has no /classify route; only the mock can answer.
        let p = clf.classify(&image()).await.unwrap();
        assert_eq!(p.note.as_deref(), Some("Mocked prediction."));
    }

    #[tokio::test]
    async fn unreachable_server_fails_load() {
        let loader = RemoteLoader {
            base_url: "http://127.0.0.1:9".into(),
            max_model_bytes: 1_000,
            fallback_delay: Duration::ZERO,
        };
        assert!(loader.load().await.is_err());
    }
}
