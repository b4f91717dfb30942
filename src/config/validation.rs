use super::Config;
use crate::infra::secrets::{SecretSourceMode, TextEncoding};
use anyhow::Result;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
///
/// Problems found here do not stop resolution: the affected secrets resolve
/// to nothing and the policy check falls back to the live account.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if let SecretSourceMode::Unknown(selector) = &config.secrets.source {
        errors.push(ConfigValidationError {
            path: "secrets.source".to_string(),
            message: format!(
                "Unknown secrets source '{selector}' (expected env, fs or gcp_secrets_manager)"
            ),
        });
    }

    if config.secrets.source == SecretSourceMode::FileIndirect
        && TextEncoding::parse(&config.secrets.encoding).is_none()
    {
        errors.push(ConfigValidationError {
            path: "secrets.encoding".to_string(),
            message: format!("Unsupported encoding '{}'", config.secrets.encoding),
        });
    }

    if config.secrets.source == SecretSourceMode::ManagedFetch {
        if config
            .secrets
            .gcp_base_url
            .as_deref()
            .map_or(true, str::is_empty)
        {
            errors.push(ConfigValidationError {
                path: "secrets.gcpBaseUrl".to_string(),
                message: "Secret manager source requires a base URL".to_string(),
            });
        }

        if config.secrets.http_timeout_secs == 0 {
            errors.push(ConfigValidationError {
                path: "secrets.httpTimeoutSecs".to_string(),
                message: "Timeout must be greater than 0".to_string(),
            });
        }
    }

    let policy = &config.policy;
    if policy.is_partially_configured() {
        let required = [
            ("policy.host", &policy.host),
            ("policy.user", &policy.user),
            ("policy.database", &policy.database),
            ("policy.identity", &policy.identity),
        ];
        for (path, value) in required {
            if value.as_deref().map_or(true, str::is_empty) {
                errors.push(ConfigValidationError {
                    path: path.to_string(),
                    message: "Policy store is partially configured; paper account check will be skipped"
                        .to_string(),
                });
            }
        }

        if policy.connect_timeout_secs == 0 || policy.query_timeout_secs == 0 {
            errors.push(ConfigValidationError {
                path: "policy".to_string(),
                message: "Policy store timeouts must be greater than 0".to_string(),
            });
        }
    }

    if config.paper.account.is_some() && !policy.is_partially_configured() {
        warn!("Paper account is configured but no policy store is; it will never be used");
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
