use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;

const DEV_SECRET: &str = "dev-secret-change-in-production-min-32-chars";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    Mock,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,
    pub url: Option<String>,
    /// Models reporting more than this are not loaded; the mock takes over.
    pub max_model_mb: u64,
    pub mock_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutritionBackend {
    Mock,
    Usda,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NutritionConfig {
    pub backend: NutritionBackend,
    pub usda_api_key: String,
    pub usda_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub session_ttl_minutes: i64,
    pub host: String,
    pub port: Option<u16>,
    pub static_dir: String,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub classifier: ClassifierConfig,
    pub nutrition: NutritionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let database_url =
            get("DATABASE_URL").unwrap_or_else(|| "sqlite://fruitscan.db?mode=rwc".into());

        let secret = match get("SECRET_KEY").or_else(|| get("JWT_SECRET")) {
            Some(s) => s,
            None => {
                warn!("SECRET_KEY not set; using the development signing key");
                DEV_SECRET.to_string()
            }
        };
        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "fruitscan".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "fruitscan-users".into()),
            ttl_minutes: parse_or(&get, "JWT_TTL_MINUTES", 60 * 24 * 7)?,
            refresh_ttl_minutes: parse_or(&get, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };

        let port = match get("PORT").or_else(|| get("APP_PORT")) {
            Some(p) => Some(
                p.trim()
                    .parse::<u16>()
                    .with_context(|| format!("invalid port {p:?}"))?,
            ),
            None => None,
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let classifier = ClassifierConfig {
            backend: match get("CLASSIFIER").as_deref().map(str::trim) {
                None | Some("mock") => ClassifierBackend::Mock,
                Some("remote") => ClassifierBackend::Remote,
                Some(other) => bail!("unknown CLASSIFIER {other:?} (expected mock or remote)"),
            },
            url: get("CLASSIFIER_URL").map(|u| u.trim_end_matches('/').to_string()),
            max_model_mb: parse_or(&get, "CLASSIFIER_MAX_MODEL_MB", 512)?,
            mock_delay_ms: parse_or(&get, "MOCK_DELAY_MS", 1400)?,
        };
        if classifier.backend == ClassifierBackend::Remote && classifier.url.is_none() {
            bail!("CLASSIFIER=remote requires CLASSIFIER_URL");
        }

        let backend = match get("NUTRITION_PROVIDER").as_deref().map(str::trim) {
            None | Some("mock") => NutritionBackend::Mock,
            Some("usda") => NutritionBackend::Usda,
            Some(other) => bail!("unknown NUTRITION_PROVIDER {other:?} (expected mock or usda)"),
        };
        let usda_api_key = match get("USDA_API_KEY") {
            Some(k) => k,
            None => {
                if backend == NutritionBackend::Usda {
                    warn!("USDA_API_KEY not set; falling back to the rate-limited DEMO_KEY");
                }
                "DEMO_KEY".to_string()
            }
        };
        let nutrition = NutritionConfig {
            backend,
            usda_api_key,
            usda_base_url: get("USDA_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.nal.usda.gov/fdc/v1".into()),
        };

        let max_upload_mb: usize = parse_or(&get, "MAX_UPLOAD_MB", 10)?;
        let Some(max_upload_bytes) = max_upload_mb.checked_mul(1024 * 1024) else {
            bail!("MAX_UPLOAD_MB {max_upload_mb} is too large");
        };

        Ok(Self {
            database_url,
            jwt,
            session_ttl_minutes: parse_or(&get, "SESSION_TTL_MINUTES", 60 * 24 * 7)?,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "static".into()),
            cors_origins,
            max_upload_bytes,
            classifier,
            nutrition,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got {v:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config_from(&[]).expect("defaults load");
        assert_eq!(cfg.database_url, "sqlite://fruitscan.db?mode=rwc");
        assert_eq!(cfg.jwt.secret, DEV_SECRET);
        assert_eq!(cfg.jwt.ttl_minutes, 60 * 24 * 7);
        assert_eq!(cfg.port, None);
        assert_eq!(cfg.classifier.backend, ClassifierBackend::Mock);
        assert_eq!(cfg.classifier.mock_delay_ms, 1400);
        assert_eq!(cfg.nutrition.backend, NutritionBackend::Mock);
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
        assert!(cfg.cors_origins.is_empty());
    }

    #[test]
    fn port_and_secret_come_from_environment() {
        let cfg = config_from(&[("PORT", "8123"), ("SECRET_KEY", "s3cret")]).unwrap();
        assert_eq!(cfg.port, Some(8123));
        assert_eq!(cfg.jwt.secret, "s3cret");

        let cfg = config_from(&[("APP_PORT", "9000"), ("JWT_SECRET", "other")]).unwrap();
        assert_eq!(cfg.port, Some(9000));
        assert_eq!(cfg.jwt.secret, "other");
    }

    #[test]
    fn rejects_bad_numbers_and_backends() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("MOCK_DELAY_MS", "-1")]).is_err());
        assert!(config_from(&[("CLASSIFIER", "torch")]).is_err());
        assert!(config_from(&[("NUTRITION_PROVIDER", "edamam")]).is_err());
    }

    #[test]
    fn huge_upload_limit_is_an_error() {
        let huge = usize::MAX.to_string();
        let err = config_from(&[("MAX_UPLOAD_MB", huge.as_str())]).unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_MB"));
        let cfg = config_from(&[("MAX_UPLOAD_MB", "3")]).unwrap();
        assert_eq!(cfg.max_upload_bytes, 3 * 1024 * 1024);
    }

    #[test]
    fn remote_classifier_needs_url() {
        assert!(config_from(&[("CLASSIFIER", "remote")]).is_err());
        let cfg = config_from(&[
            ("CLASSIFIER", "remote"),
            ("CLASSIFIER_URL", "http://localhost:9000/"),
        ])
        .unwrap();
        assert_eq!(cfg.classifier.url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cfg = config_from(&[("CORS_ORIGINS", "http://a.test, http://b.test,,")]).unwrap();
        assert_eq!(cfg.cors_origins, vec!["http://a.test", "http://b.test"]);
    }
}
