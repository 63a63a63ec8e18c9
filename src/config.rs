use clap::Parser;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::openai_engine::OpenAiConfig;

#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// JSON file with `positive` and `negative` review lists
    #[arg(long, env = "DATASET_PATH", default_value = "movie_review_dataset.json")]
    pub dataset: PathBuf,

    /// Where to write the classified results
    #[arg(long, env = "OUTPUT_PATH", default_value = "results.json")]
    pub output: PathBuf,

    /// Number of reviews taken from each sentiment list
    #[arg(long, env = "PER_CLASS_LIMIT", default_value = "100")]
    pub per_class_limit: usize,

    /// Chat model used for classification
    #[arg(long, env = "MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Sampling temperature
    #[arg(long, env = "TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub api_base: String,

    /// API key for the model service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    /// Maximum number of concurrent inference calls
    #[arg(long, env = "WORKERS", default_value = "8")]
    pub workers: usize,

    /// Serve Prometheus metrics on this address while running
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<SocketAddr>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dataset", &self.dataset)
            .field("output", &self.output)
            .field("per_class_limit", &self.per_class_limit)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("workers", &self.workers)
            .field("metrics_address", &self.metrics_address)
            .finish()
    }
}

impl From<&Config> for OpenAiConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_with_only_a_key() {
        let config = Config::try_parse_from(["review-classifier", "--api-key", "sk-test"]).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.per_class_limit, 100);
        assert_eq!(config.workers, 8);
        assert!(config.metrics_address.is_none());

        let client = OpenAiConfig::from(&config);
        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.timeout, Duration::from_secs(60));
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = Config::try_parse_from(["review-classifier", "--api-key", "sk-secret"]).unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
