// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const MAX_BATCH_SIZE: usize = 2048;
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "KB_EMBEDDINGS";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    pub input_csv: PathBuf,
    pub parquet: PathBuf,
    pub json_index: PathBuf,
    #[serde(default)]
    pub answers_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub batch_size: usize,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub multiplier_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub threshold: f64,
    pub query_prefix: String,
}

impl Config {
    /// Loads `path`, or `config/default.toml` when none is given. An explicit
    /// path must exist; the default file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_layered(path, true),
            None => Self::load_layered(Path::new(DEFAULT_CONFIG_PATH), false),
        }
    }

    /// Layers built-in defaults, the TOML file, then `KB_EMBEDDINGS__*`
    /// environment variables, and validates the result.
    pub fn load_layered(file: &Path, required: bool) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(file).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            paths: PathsConfig {
                input_csv: PathBuf::from("kb.cleaned.csv"),
                parquet: PathBuf::from("kb_embeddings.parquet"),
                json_index: PathBuf::from("kb_index.json"),
                answers_csv: None,
            },
            embedding: EmbeddingConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: DEFAULT_MODEL.to_string(),
                batch_size: 128,
                api_key_env: "OPENAI_API_KEY".to_string(),
                timeout_secs: 60,
                retry: RetryConfig {
                    max_attempts: 6,
                    multiplier_ms: 1_000,
                    min_delay_ms: 1_000,
                    max_delay_ms: 20_000,
                },
            },
            search: SearchConfig {
                top_k: 5,
                threshold: 0.35,
                query_prefix: "query: ".to_string(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding.batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if self.embedding.batch_size > MAX_BATCH_SIZE {
            return Err(PipelineError::Config(format!(
                "batch_size must not exceed {}",
                MAX_BATCH_SIZE
            )));
        }

        if self.embedding.model.trim().is_empty() {
            return Err(PipelineError::Config("model must not be empty".to_string()));
        }

        if !self.embedding.base_url.starts_with("http://")
            && !self.embedding.base_url.starts_with("https://")
        {
            return Err(PipelineError::Config(format!(
                "base_url must be an http(s) URL: {}",
                self.embedding.base_url
            )));
        }

        let retry = &self.embedding.retry;
        if retry.max_attempts == 0 {
            return Err(PipelineError::Config(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }

        if retry.min_delay_ms > retry.max_delay_ms {
            return Err(PipelineError::Config(
                "retry.min_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }

        if self.search.top_k == 0 {
            return Err(PipelineError::Config(
                "search.top_k must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.embedding.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(PipelineError::MissingCredential(var.clone())),
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.embedding.model, DEFAULT_MODEL);
        assert_eq!(config.embedding.batch_size, 128);
        assert_eq!(config.embedding.retry.max_attempts, 6);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = Config::default_config();
        config.embedding.batch_size = 0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_batch() {
        let mut config = Config::default_config();
        config.embedding.batch_size = MAX_BATCH_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let mut config = Config::default_config();
        config.embedding.retry.min_delay_ms = 30_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = Config::default_config();
        config.embedding.base_url = "api.openai.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[paths]
input_csv = "data/kb.csv"
parquet = "data/kb.parquet"
json_index = "data/kb.json"

[embedding]
base_url = "http://localhost:8080/v1"
model = "text-embedding-3-large"
batch_size = 64
api_key_env = "KB_TEST_KEY"
timeout_secs = 10

[embedding.retry]
max_attempts = 3
multiplier_ms = 100
min_delay_ms = 100
max_delay_ms = 1000

[search]
top_k = 3
threshold = 0.5
query_prefix = ""
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.paths.input_csv, PathBuf::from("data/kb.csv"));
        assert_eq!(config.embedding.batch_size, 64);
        assert_eq!(config.embedding.retry.max_attempts, 3);
        assert!(config.paths.answers_csv.is_none());
        assert_eq!(config.search.top_k, 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[embedding]\nbatch_size = 32\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.embedding.model, DEFAULT_MODEL);
        assert_eq!(config.paths.parquet, PathBuf::from("kb_embeddings.parquet"));
        assert_eq!(config.search.top_k, 5);
    }

    #[test]
    fn test_missing_optional_file_layers_env_over_defaults() {
        let dir = TempDir::new().unwrap();
        // SAFETY: no other test reads or asserts on this key.
        unsafe { std::env::set_var("KB_EMBEDDINGS__EMBEDDING__TIMEOUT_SECS", "42") };

        let config = Config::load_layered(&dir.path().join("absent.toml"), false).unwrap();
        assert_eq!(config.embedding.timeout_secs, 42);
        assert_eq!(config.embedding.model, DEFAULT_MODEL);
        assert_eq!(config.paths.input_csv, PathBuf::from("kb.cleaned.csv"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_loaded_values_are_validated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[embedding]\nbatch_size = 0\n").unwrap();

        assert!(matches!(Config::load(Some(&path)), Err(PipelineError::Config(_))));
    }
}
