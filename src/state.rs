use std::{sync::Arc, time::Duration};

use sqlx::SqlitePool;
use tracing::info;

use crate::{
    auth::{InMemorySessionStore, SessionStore},
    classifier::{Classifier, LazyClassifier, MockLoader, RemoteLoader},
    config::{AppConfig, ClassifierBackend, ClassifierConfig, NutritionBackend, NutritionConfig},
    db,
    nutrition::{MockNutrition, NutritionProvider, UsdaNutrition},
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub classifier: Arc<dyn Classifier>,
    pub nutrition: Arc<dyn NutritionProvider>,
}

impl AppState {
    /// Connects to the configured database, runs migrations and wires the backends.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(&config.database_url).await?;
        db::migrate(&db).await?;
        Self::with_db(db, config)
    }

    /// Same wiring over a private in-memory database.
    pub async fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        let db = db::connect_in_memory().await?;
        db::migrate(&db).await?;
        Self::with_db(db, config)
    }

    fn with_db(db: SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let sessions = Arc::new(InMemorySessionStore::new(time::Duration::minutes(
            config.session_ttl_minutes,
        ))) as Arc<dyn SessionStore>;
        let classifier = build_classifier(&config.classifier);
        let nutrition = build_nutrition(&config.nutrition)?;
        Ok(Self::from_parts(
            db,
            Arc::new(config),
            sessions,
            classifier,
            nutrition,
        ))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        sessions: Arc<dyn SessionStore>,
        classifier: Arc<dyn Classifier>,
        nutrition: Arc<dyn NutritionProvider>,
    ) -> Self {
        Self {
            db,
            config,
            sessions,
            classifier,
            nutrition,
        }
    }
}

pub fn build_classifier(cfg: &ClassifierConfig) -> Arc<dyn Classifier> {
    let delay = Duration::from_millis(cfg.mock_delay_ms);
    let lazy = match (cfg.backend, cfg.url.as_deref()) {
        (ClassifierBackend::Remote, Some(url)) => {
            info!(url, max_model_mb = cfg.max_model_mb, "remote classifier (lazy)");
            LazyClassifier::new(RemoteLoader {
                base_url: url.to_string(),
                max_model_bytes: cfg.max_model_mb.saturating_mul(1024 * 1024),
                fallback_delay: delay,
            })
        }
        _ => LazyClassifier::new(MockLoader { delay }),
    };
    Arc::new(lazy)
}

pub fn build_nutrition(cfg: &NutritionConfig) -> anyhow::Result<Arc<dyn NutritionProvider>> {
    let provider: Arc<dyn NutritionProvider> = match cfg.backend {
        NutritionBackend::Mock => Arc::new(MockNutrition),
        NutritionBackend::Usda => {
            info!(base_url = %cfg.usda_base_url, "USDA nutrition provider");
            Arc::new(UsdaNutrition::new(cfg)?)
        }
    };
    Ok(provider)
}
