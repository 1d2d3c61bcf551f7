use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Docpipe server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint of the remote partitioning service.
    pub partition_api_url: String,
    /// Optional API key forwarded to the partitioning service.
    pub partition_api_key: Option<String>,
    /// Request timeout applied to partitioning calls, in seconds.
    pub partition_timeout_secs: u64,
    /// Per-element character cap used when partitioning stored files.
    pub partition_max_characters: usize,
    /// MongoDB connection string.
    pub mongo_database_url: String,
    /// Database holding the file records.
    pub mongo_database_name: String,
    /// Collection holding the file records.
    pub mongo_collection_name: String,
    /// Object storage endpoint, either `host:port` or a full URL.
    pub storage_endpoint: String,
    /// Object storage access key.
    pub storage_access_key: String,
    /// Object storage secret key.
    pub storage_secret_key: String,
    /// Bucket containing stored files.
    pub storage_bucket: String,
    /// Region reported to the S3-compatible backend.
    pub storage_region: String,
    /// Whether to reach the storage endpoint over TLS.
    pub storage_secure: bool,
    /// Deployment label (`localhost`, `staging`, `production`).
    pub environment: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            partition_api_url: load_env("PARTITION_API_URL")?,
            partition_api_key: load_env_optional("PARTITION_API_KEY"),
            partition_timeout_secs: load_parsed("PARTITION_TIMEOUT_SECS")?.unwrap_or(300),
            partition_max_characters: load_parsed("PARTITION_MAX_CHARACTERS")?.unwrap_or(1500),
            mongo_database_url: load_env("MONGO_DATABASE_URL")?,
            mongo_database_name: load_env_optional("MONGO_DATABASE_NAME")
                .unwrap_or_else(|| "storage".to_string()),
            mongo_collection_name: load_env_optional("MONGO_COLLECTION_NAME")
                .unwrap_or_else(|| "files".to_string()),
            storage_endpoint: load_env("STORAGE_END_POINT")?,
            storage_access_key: load_env("STORAGE_ACCESS_KEY")?,
            storage_secret_key: load_env("STORAGE_SECRET_KEY")?,
            storage_bucket: load_env("ORQ_S3_BUCKET_NAME")?,
            storage_region: load_env_optional("STORAGE_REGION")
                .unwrap_or_else(|| "us-east-1".to_string()),
            storage_secure: load_env_optional("STORAGE_SECURE")
                .map(|value| parse_bool("STORAGE_SECURE", &value))
                .transpose()?
                .unwrap_or(true),
            environment: load_env_optional("ENVIRONMENT")
                .unwrap_or_else(|| "localhost".to_string()),
            server_port: load_parsed("SERVER_PORT")?,
            max_upload_bytes: load_parsed("MAX_UPLOAD_BYTES")?.unwrap_or(100 * 1024 * 1024),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        partition_api_url = %config.partition_api_url,
        storage_endpoint = %config.storage_endpoint,
        bucket = %config.storage_bucket,
        database = %config.mongo_database_name,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
