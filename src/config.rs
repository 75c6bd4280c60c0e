use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Search loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Wall-clock budget for one search, checked once per expansion
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

fn default_search_timeout_secs() -> u64 {
    100
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout; the only way to bound a single slow page
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    /// Only links under this prefix are followed
    #[serde(default = "default_article_prefix")]
    pub article_prefix: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_fetch_timeout_secs(),
            article_prefix: default_article_prefix(),
        }
    }
}

fn default_user_agent() -> String {
    format!("wikipath/{}", env!("CARGO_PKG_VERSION"))
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_article_prefix() -> String {
    "https://en.wikipedia.org/wiki/".to_string()
}

/// Embeddings configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub provider: String,
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key_env: String,
    /// Page text is cut to this many characters before embedding
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_base: default_api_base(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_input_chars: default_max_input_chars(),
            cache_capacity: default_cache_capacity(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_max_input_chars() -> usize {
    8000
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// Path-finding requests allowed per client IP per minute
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            static_dir: default_static_dir(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    5001
}

fn default_rate_limit_per_minute() -> u32 {
    5
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("client")
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in WIKIPATH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("WIKIPATH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_file(&config_path)
    }

    /// Load and validate a specific config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.search.timeout_secs == 0 {
            anyhow::bail!("search.timeout_secs must be greater than 0");
        }

        if self.fetcher.timeout_secs == 0 {
            anyhow::bail!("fetcher.timeout_secs must be greater than 0");
        }

        let prefix = url::Url::parse(&self.fetcher.article_prefix).with_context(|| {
            format!(
                "fetcher.article_prefix is not a valid URL: {}",
                self.fetcher.article_prefix
            )
        })?;
        if prefix.host_str().is_none() {
            anyhow::bail!("fetcher.article_prefix must include a host");
        }

        if self.embeddings.provider != "openai" {
            anyhow::bail!(
                "Unsupported embeddings.provider '{}' (supported: openai)",
                self.embeddings.provider
            );
        }

        if self.embeddings.max_input_chars == 0 {
            anyhow::bail!("embeddings.max_input_chars must be greater than 0");
        }

        if self.embeddings.timeout_secs == 0 {
            anyhow::bail!("embeddings.timeout_secs must be greater than 0");
        }

        if self.http_server.rate_limit_per_minute == 0 {
            anyhow::bail!("http_server.rate_limit_per_minute must be greater than 0");
        }

        Ok(())
    }

    /// Time budget for a single search
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_secs)
    }

    /// Directory holding the browser client
    pub fn static_dir(&self) -> &Path {
        &self.http_server.static_dir
    }
}
