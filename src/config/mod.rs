mod defaults;
mod validation;

pub use defaults::*;
pub use validation::*;

use crate::infra::secrets::gcp_provider::DEFAULT_METADATA_TOKEN_URL;
use crate::infra::secrets::{EnvStore, ProcessEnv, SecretSourceMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level gatecreds configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How configured secret names are turned into values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretsConfig {
    pub source: SecretSourceMode,
    pub encoding: String,
    /// `https://secretmanager.googleapis.com/v1/projects/PROJECT_ID/secrets`
    pub gcp_base_url: Option<String>,
    pub gcp_token_url: String,
    pub http_timeout_secs: u64,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            source: SecretSourceMode::parse(DEFAULT_SECRETS_SOURCE),
            encoding: DEFAULT_ENCODING.to_string(),
            gcp_base_url: None,
            gcp_token_url: DEFAULT_METADATA_TOKEN_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Location of the paper account policy table and the identity to look up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: Option<String>,
    /// Machine name the policy row is keyed by.
    pub identity: Option<String>,
    pub connect_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_POLICY_PORT,
            user: None,
            password: None,
            database: None,
            identity: None,
            connect_timeout_secs: DEFAULT_POLICY_CONNECT_TIMEOUT_SECS,
            query_timeout_secs: DEFAULT_POLICY_QUERY_TIMEOUT_SECS,
        }
    }
}

impl PolicyConfig {
    /// Whether any policy store setting was supplied.
    pub fn is_partially_configured(&self) -> bool {
        [&self.host, &self.user, &self.database, &self.identity]
            .iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// Paper account credentials used when the policy opts this machine in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperConfig {
    pub account: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with_env(path, &ProcessEnv)
    }

    pub fn load_with_env(path: Option<&str>, env: &dyn EnvStore) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(find_config_file);

        let mut config = match config_path {
            Some(config_path) if config_path.exists() => {
                info!("Loading config from {}", config_path.display());
                load_config_file(&config_path)?
            }
            Some(config_path) => {
                warn!(
                    "Config file {} not found, using defaults",
                    config_path.display()
                );
                Config::default()
            }
            None => Config::default(),
        };

        config.apply_env_overrides(env);
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self, env: &dyn EnvStore) {
        if let Some(source) = env.get("GATEWAY_SECRETS_SOURCE") {
            self.secrets.source = SecretSourceMode::parse(&source);
        }

        if let Some(encoding) = env.get("GATEWAY_ENCODING") {
            self.secrets.encoding = encoding;
        }

        if let Some(url) = env.get("GATEWAY_GCP_BASE_URL") {
            self.secrets.gcp_base_url = Some(url);
        }

        if let Some(url) = env.get("GATEWAY_GCP_TOKEN_URL") {
            self.secrets.gcp_token_url = url;
        }

        if let Some(secs) = parse_env(env, "GATEWAY_HTTP_TIMEOUT_SECS") {
            self.secrets.http_timeout_secs = secs;
        }

        if let Some(host) = env.get("GATEWAY_DB_HOST") {
            self.policy.host = Some(host);
        }

        if let Some(port) = parse_env(env, "GATEWAY_DB_PORT") {
            self.policy.port = port;
        }

        if let Some(user) = env.get("GATEWAY_DB_USER") {
            self.policy.user = Some(user);
        }

        if let Some(password) = env.get("GATEWAY_DB_PASSWORD") {
            self.policy.password = Some(password);
        }

        if let Some(database) = env.get("GATEWAY_DB_NAME") {
            self.policy.database = Some(database);
        }

        if let Some(identity) = env.get("GATEWAY_MACHINE_NAME") {
            self.policy.identity = Some(identity);
        }

        if let Some(secs) = parse_env(env, "GATEWAY_DB_CONNECT_TIMEOUT_SECS") {
            self.policy.connect_timeout_secs = secs;
        }

        if let Some(secs) = parse_env(env, "GATEWAY_DB_QUERY_TIMEOUT_SECS") {
            self.policy.query_timeout_secs = secs;
        }

        if let Some(account) = env.get("GATEWAY_PAPER_ACCOUNT") {
            self.paper.account = Some(account);
        }

        if let Some(password) = env.get("GATEWAY_PAPER_PASSWORD") {
            self.paper.password = Some(password);
        }

        if let Some(level) = env.get("GATEWAY_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}

fn parse_env<T: std::str::FromStr>(env: &dyn EnvStore, name: &str) -> Option<T> {
    let raw = env.get(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {name}={raw}: not a valid number");
            None
        }
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("gatecreds.json"),
        PathBuf::from("gatecreds.yaml"),
        PathBuf::from("gatecreds.yml"),
        PathBuf::from("gatecreds.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // Check home directory
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".gatecreds").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Load configuration from a file path.
fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in '{}'", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in '{}'", path.display()))?,
        _ => {
            // Try JSON5 first, then regular JSON
            json5::from_str(&content)
                .or_else(|_| serde_json::from_str(&content))
                .with_context(|| format!("Invalid JSON in '{}'", path.display()))?
        }
    };

    Ok(config)
}
