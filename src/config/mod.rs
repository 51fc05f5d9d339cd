use crate::error::{ApiError, Result};
use config::{builder::DefaultState, ConfigBuilder, Environment, File};
use reqwest::Url;
use serde::Deserialize;
use std::{env, path::PathBuf, time::Duration};

const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub embedding: EmbeddingConfig,
    pub pinecone: PineconeConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub id_column: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub verify_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_host: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub request_timeout_secs: u64,
}

impl RecommendationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from defaults, optional config files and `APP_*` environment variables.
    pub fn load() -> Result<Self> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false));

        if let Ok(path) = env::var("APP_CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Builder pre-populated with every default.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let origins: Vec<String> = DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect();

        Ok(config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000_i64)?
            .set_default("server.cors_origins", origins)?
            .set_default("dataset.path", "intern_data_ikarus.csv")?
            .set_default("dataset.id_column", "uniq_id")?
            .set_default("embedding.base_url", "https://api-inference.huggingface.co")?
            .set_default("embedding.model", "sentence-transformers/clip-ViT-B-32")?
            .set_default("embedding.dimension", 512_i64)?
            .set_default("embedding.timeout_secs", 30_i64)?
            .set_default("embedding.verify_on_startup", true)?
            // The conventional variable is only a fallback; APP_PINECONE__API_KEY wins.
            .set_default(
                "pinecone.api_key",
                env::var("PINECONE_API_KEY").unwrap_or_default(),
            )?
            .set_default("pinecone.index_host", "")?
            .set_default("pinecone.timeout_secs", 15_i64)?
            .set_default("recommendation.default_top_k", 5_i64)?
            .set_default("recommendation.max_top_k", 50_i64)?
            .set_default("recommendation.request_timeout_secs", 20_i64)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pinecone.api_key.trim().is_empty() {
            return Err(ApiError::Configuration(
                "Pinecone API key is missing (set APP_PINECONE__API_KEY or PINECONE_API_KEY)"
                    .to_string(),
            ));
        }
        if self.pinecone.index_host.trim().is_empty() {
            return Err(ApiError::Configuration(
                "Pinecone index host is missing (set APP_PINECONE__INDEX_HOST)".to_string(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(ApiError::Configuration(
                "embedding.dimension must be greater than zero".to_string(),
            ));
        }

        let rec = &self.recommendation;
        if rec.max_top_k == 0 || rec.default_top_k == 0 || rec.default_top_k > rec.max_top_k {
            return Err(ApiError::Configuration(format!(
                "recommendation.default_top_k ({}) must be within 1..={}",
                rec.default_top_k, rec.max_top_k
            )));
        }
        if self.dataset.id_column.trim().is_empty() {
            return Err(ApiError::Configuration(
                "dataset.id_column cannot be empty".to_string(),
            ));
        }
        for origin in &self.server.cors_origins {
            validate_origin(origin)?;
        }

        Ok(())
    }
}

/// CORS origins are exact `scheme://host[:port]` values; credentials rule out `*`.
fn validate_origin(origin: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(ApiError::Configuration(format!(
            "server.cors_origins entry '{}' {}",
            origin, reason
        )))
    };

    if origin.trim() == "*" {
        return invalid("is a wildcard, which cannot be combined with credentials");
    }
    let url = match Url::parse(origin) {
        Ok(url) => url,
        Err(e) => return invalid(&format!("is not a valid origin: {}", e)),
    };
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return invalid("must be an http(s) origin with a host");
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return invalid("must not carry a path, query or fragment");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::io::Write;

    /// Sets variables for the guard's lifetime, restoring the previous values on drop.
    struct EnvGuard(Vec<(&'static str, Option<String>)>);

    impl EnvGuard {
        fn set(vars: &[(&'static str, Option<&str>)]) -> Self {
            let saved = vars
                .iter()
                .map(|&(key, value)| {
                    let previous = env::var(key).ok();
                    match value {
                        Some(value) => env::set_var(key, value),
                        None => env::remove_var(key),
                    }
                    (key, previous)
                })
                .collect();
            Self(saved)
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, previous) in &self.0 {
                match previous {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }

    fn from_toml(toml: &str) -> Config {
        Config::defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const MINIMAL: &str = r#"
        [pinecone]
        api_key = "pc-test"
        index_host = "https://products-abc.svc.pinecone.io"
    "#;

    #[test]
    fn test_defaults() {
        let config = from_toml(MINIMAL);
        assert_eq!(config.server.port, 8000);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
        assert_eq!(config.dataset.id_column, "uniq_id");
        assert_eq!(config.embedding.dimension, 512);
        assert_eq!(config.embedding.api_key, None);
        assert_eq!(config.pinecone.namespace, None);
        assert_eq!(config.recommendation.default_top_k, 5);
        assert_eq!(config.recommendation.max_top_k, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = from_toml(
            r#"
            [server]
            port = 9100
            cors_origins = ["https://shop.example.com"]

            [pinecone]
            api_key = "pc-test"
            index_host = "https://products-abc.svc.pinecone.io"
            namespace = "catalog"

            [recommendation]
            max_top_k = 20
            "#,
        );
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.cors_origins, vec!["https://shop.example.com"]);
        assert_eq!(config.pinecone.namespace.as_deref(), Some("catalog"));
        assert_eq!(config.recommendation.max_top_k, 20);
    }

    #[test]
    fn test_validate_rejects_missing_index_host() {
        let mut config = from_toml(MINIMAL);
        config.pinecone.index_host = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_default_above_max() {
        let mut config = from_toml(MINIMAL);
        config.recommendation.default_top_k = 60;
        assert!(matches!(
            config.validate(),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_cors_origins() {
        for origin in [
            "*",
            "localhost:5173",
            "ftp://files.example.com",
            "https://shop.example.com/app",
        ] {
            let mut config = from_toml(MINIMAL);
            config.server.cors_origins = vec![origin.to_string()];
            assert!(
                matches!(config.validate(), Err(ApiError::Configuration(_))),
                "{} should be rejected",
                origin
            );
        }

        let mut config = from_toml(MINIMAL);
        config.server.cors_origins = vec!["https://shop.example.com:8443".to_string()];
        assert!(config.validate().is_ok());
    }

    // Only test that touches the process environment, so the guard is enough.
    #[test]
    fn test_load_layers_file_then_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
            [server]
            port = 9100

            [pinecone]
            api_key = "from-file"
            index_host = "https://products-abc.svc.pinecone.io"
            namespace = "catalog"
            "#,
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        {
            let _env = EnvGuard::set(&[
                ("APP_CONFIG_FILE", Some(&path)),
                ("APP_SERVER__PORT", Some("9200")),
                ("APP_SERVER__CORS_ORIGINS", Some("https://a.com,https://b.com")),
                ("APP_PINECONE__API_KEY", Some("primary")),
                ("PINECONE_API_KEY", Some("fallback")),
            ]);

            let config = Config::load().unwrap();
            assert_eq!(config.server.port, 9200);
            assert_eq!(
                config.server.cors_origins,
                vec!["https://a.com", "https://b.com"]
            );
            assert_eq!(config.pinecone.api_key, "primary");
            assert_eq!(config.pinecone.namespace.as_deref(), Some("catalog"));
        }

        {
            let _env = EnvGuard::set(&[
                ("APP_CONFIG_FILE", None),
                ("APP_SERVER__PORT", None),
                ("APP_SERVER__CORS_ORIGINS", None),
                ("APP_PINECONE__API_KEY", None),
                ("APP_PINECONE__INDEX_HOST", Some("https://products-abc.svc.pinecone.io")),
                ("PINECONE_API_KEY", Some("fallback")),
            ]);

            let config = Config::load().unwrap();
            assert_eq!(config.server.port, 8000);
            assert_eq!(config.pinecone.api_key, "fallback");
            assert_eq!(config.pinecone.namespace, None);
        }
    }
}
