//! Direct secret provider.
//!
//! The configured environment value is the secret itself.

use super::types::{SecretProvider, SecretResolution, SecretSourceMode};
use async_trait::async_trait;

/// Returns configured values unchanged.
pub struct EnvSecretProvider;

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    fn mode(&self) -> SecretSourceMode {
        SecretSourceMode::Direct
    }

    fn name(&self) -> &str {
        "env"
    }

    async fn fetch(&self, _name: &str, raw: &str) -> SecretResolution {
        SecretResolution::Resolved(raw.to_string())
    }
}
