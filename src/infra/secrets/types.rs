//! Core types for credential secret resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Source mode
// ============================================================================

/// How configured values are turned into secrets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecretSourceMode {
    /// The configured value is the secret itself.
    Direct,
    /// The configured value is a path to a file holding the secret.
    FileIndirect,
    /// The configured value is a secret reference fetched from a managed
    /// secrets service.
    ManagedFetch,
    /// Selector not recognized. Every resolution under this mode yields absence.
    Unknown(String),
}

impl SecretSourceMode {
    pub const DIRECT: &'static str = "env";
    pub const FILE_INDIRECT: &'static str = "fs";
    pub const MANAGED_FETCH: &'static str = "gcp_secrets_manager";

    /// Parse an operator-supplied selector. An empty selector means `Direct`.
    pub fn parse(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "" | Self::DIRECT => Self::Direct,
            Self::FILE_INDIRECT => Self::FileIndirect,
            Self::MANAGED_FETCH => Self::ManagedFetch,
            _ => Self::Unknown(selector.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Direct => Self::DIRECT,
            Self::FileIndirect => Self::FILE_INDIRECT,
            Self::ManagedFetch => Self::MANAGED_FETCH,
            Self::Unknown(s) => s,
        }
    }
}

impl Default for SecretSourceMode {
    fn default() -> Self {
        Self::Direct
    }
}

impl From<String> for SecretSourceMode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<SecretSourceMode> for String {
    fn from(mode: SecretSourceMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for SecretSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Characters stripped from the right of a resolved value unless overridden.
pub const DEFAULT_RIGHT_TRIM: &str = "\r\n";

/// A single lookup: the configured name plus the trims applied to the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRequest {
    pub name: String,
    pub left_trim: Option<String>,
    pub right_trim: Option<String>,
}

impl SecretRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            left_trim: None,
            right_trim: Some(DEFAULT_RIGHT_TRIM.to_string()),
        }
    }

    pub fn left_trim(mut self, chars: impl Into<String>) -> Self {
        self.left_trim = Some(chars.into());
        self
    }

    /// Replace the right-trim set. `None` leaves the right side untouched.
    pub fn right_trim(mut self, chars: Option<&str>) -> Self {
        self.right_trim = chars.map(String::from);
        self
    }

    /// Apply the configured trims to a raw value.
    pub fn trim(&self, value: &str) -> String {
        let mut out = value;
        if let Some(set) = &self.left_trim {
            out = out.trim_start_matches(|c| set.contains(c));
        }
        if let Some(set) = &self.right_trim {
            out = out.trim_end_matches(|c| set.contains(c));
        }
        out.to_string()
    }
}

impl From<&str> for SecretRequest {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ============================================================================
// Errors and results
// ============================================================================

/// Everything that can go wrong while resolving one secret.
///
/// None of these reach callers of the resolver: they are logged and folded
/// into absence.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The name is not configured. Expected and silent.
    #[error("'{0}' is not set")]
    ConfigurationAbsence(String),
    /// A configured value is structurally wrong.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Network failure or unexpected HTTP status.
    #[error("transport error: {0}")]
    Transport(String),
    /// Malformed payload.
    #[error("decode error: {0}")]
    Decode(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SecretError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SecretError::Decode(err.to_string())
        } else {
            SecretError::Transport(err.to_string())
        }
    }
}

/// Result of resolving a single secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretResolution {
    /// Successfully resolved to a value.
    Resolved(String),
    /// Resolution failed with a reason.
    Failed(String),
    /// The name is not configured.
    NotFound(String),
}

impl SecretResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, SecretResolution::Resolved(_))
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            SecretResolution::Resolved(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            SecretResolution::Resolved(v) => Some(v),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SecretResolution::Failed(msg) | SecretResolution::NotFound(msg) => Some(msg),
            SecretResolution::Resolved(_) => None,
        }
    }
}

impl From<Result<String, SecretError>> for SecretResolution {
    fn from(result: Result<String, SecretError>) -> Self {
        match result {
            Ok(value) => SecretResolution::Resolved(value),
            Err(err @ SecretError::ConfigurationAbsence(_)) => {
                SecretResolution::NotFound(err.to_string())
            }
            Err(err) => SecretResolution::Failed(err.to_string()),
        }
    }
}

// ============================================================================
// Environment store
// ============================================================================

/// Read-only name/value store the configured secret names are looked up in.
pub trait EnvStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvStore for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvStore for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// One secret source strategy.
///
/// `fetch` receives the configured name and the raw value found for it, and
/// turns that value into the secret text. Trimming is done by the resolver.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// The mode this provider serves.
    fn mode(&self) -> SecretSourceMode;

    /// Display name for logging.
    fn name(&self) -> &str;

    async fn fetch(&self, name: &str, raw: &str) -> SecretResolution;
}

/// Redact a secret value for display (show first 2 and last 2 chars).
pub fn redact_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_modes() {
        assert_eq!(SecretSourceMode::parse("env"), SecretSourceMode::Direct);
        assert_eq!(SecretSourceMode::parse(""), SecretSourceMode::Direct);
        assert_eq!(SecretSourceMode::parse("FS"), SecretSourceMode::FileIndirect);
        assert_eq!(
            SecretSourceMode::parse("gcp_secrets_manager"),
            SecretSourceMode::ManagedFetch
        );
        assert_eq!(
            SecretSourceMode::parse("vault"),
            SecretSourceMode::Unknown("vault".into())
        );
    }

    #[test]
    fn source_mode_serde_uses_selector_strings() {
        let json = serde_json::to_string(&SecretSourceMode::FileIndirect).unwrap();
        assert_eq!(json, "\"fs\"");
        let mode: SecretSourceMode = serde_json::from_str("\"gcp_secrets_manager\"").unwrap();
        assert_eq!(mode, SecretSourceMode::ManagedFetch);
    }

    #[test]
    fn default_request_trims_trailing_newlines_only() {
        let req = SecretRequest::new("GATEWAY_ACCOUNT");
        assert_eq!(req.trim("  user\r\n\n"), "  user");
    }

    #[test]
    fn explicit_trims() {
        let req = SecretRequest::new("X").left_trim(" \t").right_trim(Some(" "));
        assert_eq!(req.trim("\t value \n "), "value \n");

        let untouched = SecretRequest::new("X").right_trim(None);
        assert_eq!(untouched.trim("value\n"), "value\n");
    }

    #[test]
    fn secret_resolution_from_result() {
        let ok: SecretResolution = Ok::<_, SecretError>("v".to_string()).into();
        assert_eq!(ok.value(), Some("v"));

        let missing: SecretResolution =
            Err::<String, _>(SecretError::ConfigurationAbsence("K".into())).into();
        assert!(matches!(missing, SecretResolution::NotFound(_)));

        let failed: SecretResolution =
            Err::<String, _>(SecretError::Decode("bad base64".into())).into();
        assert!(!failed.is_resolved());
        assert!(failed.error_message().unwrap().contains("bad base64"));
    }

    #[test]
    fn hashmap_env_store() {
        let mut env = HashMap::new();
        env.insert("A".to_string(), "1".to_string());
        assert_eq!(EnvStore::get(&env, "A"), Some("1".into()));
        assert_eq!(EnvStore::get(&env, "B"), None);
    }

    #[test]
    fn redact_short_value() {
        assert_eq!(redact_secret("abc"), "***");
    }

    #[test]
    fn redact_long_value() {
        let redacted = redact_secret("hunter2-password");
        assert!(redacted.starts_with("hu"));
        assert!(redacted.ends_with("rd"));
        assert!(redacted.contains('…'));
    }
}
