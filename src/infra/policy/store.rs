//! Policy store connection seam.

use super::value::PolicyValue;
use crate::config::PolicyConfig;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Policy store failures. Logged by the gate, never surfaced to callers.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to connect to policy store: {0}")]
    Connect(String),
    #[error("policy query failed: {0}")]
    Query(String),
    #[error("policy store {0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
}

/// A fully configured policy store location plus the identity to look up.
#[derive(Clone, PartialEq, Eq)]
pub struct PolicyTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// `None` covers both an unset and an empty password.
    pub password: Option<String>,
    pub database: String,
    pub identity: String,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
}

impl PolicyTarget {
    /// Returns `None` unless host, user, database and identity are all set
    /// and non-empty.
    pub fn from_config(config: &PolicyConfig) -> Option<Self> {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        Some(Self {
            host: present(&config.host)?,
            port: config.port,
            user: present(&config.user)?,
            password: present(&config.password),
            database: present(&config.database)?,
            identity: present(&config.identity)?,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        })
    }
}

impl std::fmt::Debug for PolicyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("identity", &self.identity)
            .finish()
    }
}

/// Opens connections to the policy store.
#[async_trait]
pub trait PolicyConnector: Send + Sync {
    async fn connect(
        &self,
        target: &PolicyTarget,
    ) -> Result<Box<dyn PolicyConnection>, PolicyError>;
}

/// A single open connection, used for one lookup and then closed.
#[async_trait]
pub trait PolicyConnection: Send {
    /// Fetch the decision for `identity`. `Ok(None)` means no row matched.
    async fn fetch_decision(&mut self, identity: &str)
        -> Result<Option<PolicyValue>, PolicyError>;

    async fn close(self: Box<Self>) -> Result<(), PolicyError>;
}
