use serde::{Deserialize, Serialize};

/// Main configuration structure for EchoFinder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Webhook server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Issue tracker (GitHub) configuration
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Text-generation (synthesis) configuration
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Similarity matcher configuration
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            tracker: TrackerConfig::default(),
            embedding: EmbeddingConfig::default(),
            synthesis: SynthesisConfig::default(),
            matcher: MatcherConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".echofinder/echofinder.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Webhook server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_server_port() -> u16 {
    8090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Issue tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrackerConfig {
    /// Base URL of the tracker REST API
    #[serde(default = "default_tracker_api_base")]
    pub api_base: String,

    /// Access token. Falls back to the `GITHUB_TOKEN` env var.
    #[serde(default)]
    pub token: Option<String>,

    /// Repositories (`owner/repo`) covered by the startup sync.
    #[serde(default)]
    pub repos: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "default_tracker_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tracker_api_base() -> String {
    "https://api.github.com".to_string()
}

const fn default_tracker_timeout_secs() -> u64 {
    30
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base: default_tracker_api_base(),
            token: None,
            repos: vec![],
            timeout_secs: default_tracker_timeout_secs(),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    /// Expected embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

fn default_embedding_base_url() -> String {
    "http://localhost:8001".to_string()
}

const fn default_embedding_timeout_secs() -> u64 {
    30
}

const fn default_embedding_dimension() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            timeout_secs: default_embedding_timeout_secs(),
            dimension: default_embedding_dimension(),
        }
    }
}

/// Text-generation configuration for merge synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SynthesisConfig {
    /// Base URL of the generation API
    #[serde(default = "default_synthesis_api_base")]
    pub api_base: String,

    /// API key. Falls back to the `GEMINI_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Ordered model fallback chain: the first model is tried first,
    /// later entries are only used on transient failures.
    #[serde(default = "default_synthesis_models")]
    pub models: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "default_synthesis_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_synthesis_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_synthesis_models() -> Vec<String> {
    vec!["gemini-2.5-flash".to_string(), "gemini-2.0-flash".to_string()]
}

const fn default_synthesis_timeout_secs() -> u64 {
    60
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            api_base: default_synthesis_api_base(),
            api_key: None,
            models: default_synthesis_models(),
            timeout_secs: default_synthesis_timeout_secs(),
        }
    }
}

/// Similarity matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MatcherConfig {
    /// A pair is proposed only when the best candidate's similarity
    /// strictly exceeds this cutoff.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Nearest-neighbor query limit.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
}

const fn default_similarity_threshold() -> f32 {
    0.70
}

const fn default_candidate_limit() -> usize {
    5
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            candidate_limit: default_candidate_limit(),
        }
    }
}
