//! Secret sources for gateway credentials.
//!
//! A single configured mode decides how a configured value becomes a secret:
//! - **env**: the value is the secret
//! - **fs**: the value is a path to a file holding the secret
//! - **gcp_secrets_manager**: the value is a Secret Manager reference

pub mod env_provider;
pub mod file_provider;
pub mod gcp_provider;
pub mod resolver;
pub mod types;

pub use file_provider::TextEncoding;
pub use resolver::SecretResolver;
pub use types::{
    redact_secret, EnvStore, ProcessEnv, SecretError, SecretProvider, SecretRequest,
    SecretResolution, SecretSourceMode,
};
