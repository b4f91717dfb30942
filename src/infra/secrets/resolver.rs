//! Secret resolver.
//!
//! Looks a name up in the environment store and hands the raw value to the
//! provider for the configured source mode. Every failure is logged and
//! reported as absence; callers decide whether a missing secret is fatal.

use super::env_provider::EnvSecretProvider;
use super::file_provider::{FileSecretProvider, TextEncoding};
use super::gcp_provider::GcpSecretProvider;
use super::types::{
    EnvStore, ProcessEnv, SecretProvider, SecretRequest, SecretResolution, SecretSourceMode,
};
use crate::config::SecretsConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Resolves logical secret names through a single configured source mode.
pub struct SecretResolver {
    mode: SecretSourceMode,
    env: Arc<dyn EnvStore>,
    /// The provider for `mode`, or the reason none could be built.
    provider: Result<Box<dyn SecretProvider>, String>,
}

impl SecretResolver {
    /// Build a resolver for a mode with an explicit provider.
    ///
    /// A provider whose mode differs from `mode` is rejected by resolution
    /// at call time, same as an unknown mode.
    pub fn new(
        mode: SecretSourceMode,
        env: Arc<dyn EnvStore>,
        provider: Option<Box<dyn SecretProvider>>,
    ) -> Self {
        let provider = provider.ok_or_else(|| format!("unknown secrets source '{mode}'"));
        Self {
            mode,
            env,
            provider,
        }
    }

    /// Build a resolver from configuration, reading names from the process
    /// environment.
    pub fn from_config(config: &SecretsConfig) -> Result<Self> {
        Self::with_env(config, Arc::new(ProcessEnv))
    }

    /// Build a resolver from configuration over an arbitrary environment store.
    pub fn with_env(config: &SecretsConfig, env: Arc<dyn EnvStore>) -> Result<Self> {
        let mode = config.source.clone();
        let provider: Result<Box<dyn SecretProvider>, String> = match &mode {
            SecretSourceMode::Direct => Ok(Box::new(EnvSecretProvider::new())),
            SecretSourceMode::FileIndirect => match TextEncoding::parse(&config.encoding) {
                Some(encoding) => Ok(Box::new(FileSecretProvider::new(encoding))),
                None => {
                    error!("Unsupported secrets encoding '{}'", config.encoding);
                    Err(format!("unsupported encoding '{}'", config.encoding))
                }
            },
            SecretSourceMode::ManagedFetch => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(config.http_timeout_secs))
                    .build()
                    .context("failed to build HTTP client for secret manager")?;
                Ok(Box::new(GcpSecretProvider::new(
                    config.gcp_base_url.clone(),
                    config.gcp_token_url.clone(),
                    client,
                )))
            }
            SecretSourceMode::Unknown(_) => Err(format!("unknown secrets source '{mode}'")),
        };

        Ok(Self {
            mode,
            env,
            provider,
        })
    }

    /// One-line description of the resolver for diagnostics.
    pub fn describe(&self) -> String {
        match &self.provider {
            Ok(provider) => format!("mode={} provider={}", self.mode, provider.name()),
            Err(reason) => format!("mode={} provider=none ({reason})", self.mode),
        }
    }

    /// Resolve a secret, returning `None` when it is unset or cannot be read.
    pub async fn resolve(&self, request: impl Into<SecretRequest>) -> Option<String> {
        self.resolve_detailed(request).await.into_value()
    }

    /// Resolve a secret and report why it is missing, if it is.
    pub async fn resolve_detailed(&self, request: impl Into<SecretRequest>) -> SecretResolution {
        let request = request.into();
        let name = request.name.as_str();

        let raw = match self.env.get(name) {
            Some(raw) => raw,
            None => {
                debug!("{name} is not set");
                return SecretResolution::NotFound(format!("{name} is not set"));
            }
        };

        let provider = match &self.provider {
            Ok(provider) if provider.mode() == self.mode => provider,
            Ok(provider) => {
                error!(
                    "Provider '{}' does not serve secrets source '{}' while resolving {name}",
                    provider.name(),
                    self.mode
                );
                return SecretResolution::Failed(format!(
                    "unknown secrets source '{}'",
                    self.mode
                ));
            }
            Err(reason) => {
                error!("Cannot resolve {name}: {reason}");
                return SecretResolution::Failed(reason.clone());
            }
        };

        match provider.fetch(name, &raw).await {
            SecretResolution::Resolved(value) => {
                debug!("Resolved {name} via provider '{}'", provider.name());
                SecretResolution::Resolved(request.trim(&value))
            }
            SecretResolution::Failed(msg) => {
                error!("Unable to resolve {name} via '{}': {msg}", provider.name());
                SecretResolution::Failed(msg)
            }
            SecretResolution::NotFound(msg) => {
                debug!("{name} not found via '{}': {msg}", provider.name());
                SecretResolution::NotFound(msg)
            }
        }
    }
}
