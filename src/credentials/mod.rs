//! Gateway login credentials.
//!
//! [`CredentialProvider`] hands out the account, password and password key
//! the gateway logs in with. When the policy gate says this machine uses the
//! paper account and paper credentials are configured, those replace the
//! normally resolved account and password.

pub mod override_state;

pub use override_state::{CredentialOverrideState, OverrideSnapshot};

use crate::config::{Config, PaperConfig};
use crate::infra::policy::AccountPolicyGate;
use crate::infra::secrets::{EnvStore, ProcessEnv, SecretResolver};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Environment name holding the gateway account.
pub const ACCOUNT_ENV: &str = "GATEWAY_ACCOUNT";
/// Environment name holding the gateway password.
pub const PASSWORD_ENV: &str = "GATEWAY_PASSWORD";
/// Environment name holding the key that decrypts the password.
pub const KEY_ENV: &str = "GATEWAY_KEY";

/// Operator-supplied paper account credentials. Empty values count as unset.
#[derive(Debug, Clone, Default)]
pub struct OverrideCredentials {
    pub account: Option<String>,
    pub password: Option<String>,
}

impl OverrideCredentials {
    fn account(&self) -> Option<&str> {
        self.account.as_deref().filter(|a| !a.is_empty())
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

impl From<&PaperConfig> for OverrideCredentials {
    fn from(config: &PaperConfig) -> Self {
        Self {
            account: config.account.clone(),
            password: config.password.clone(),
        }
    }
}

pub struct CredentialProvider {
    resolver: SecretResolver,
    gate: AccountPolicyGate,
    paper: OverrideCredentials,
    state: Arc<CredentialOverrideState>,
}

impl CredentialProvider {
    pub fn new(
        resolver: SecretResolver,
        gate: AccountPolicyGate,
        paper: OverrideCredentials,
        state: Arc<CredentialOverrideState>,
    ) -> Self {
        Self {
            resolver,
            gate,
            paper,
            state,
        }
    }

    /// Wire a provider from configuration against the process environment
    /// and the MySQL policy store.
    pub fn from_config(config: &Config, state: Arc<CredentialOverrideState>) -> Result<Self> {
        Self::with_env(config, Arc::new(ProcessEnv), state)
    }

    pub fn with_env(
        config: &Config,
        env: Arc<dyn EnvStore>,
        state: Arc<CredentialOverrideState>,
    ) -> Result<Self> {
        let resolver = SecretResolver::with_env(&config.secrets, env)?;
        let gate = AccountPolicyGate::from_config(&config.policy);
        Ok(Self::new(resolver, gate, (&config.paper).into(), state))
    }

    pub fn resolver(&self) -> &SecretResolver {
        &self.resolver
    }

    pub fn gate(&self) -> &AccountPolicyGate {
        &self.gate
    }

    pub fn override_state(&self) -> &Arc<CredentialOverrideState> {
        &self.state
    }

    /// Gateway account name.
    pub async fn account(&self) -> Option<String> {
        if self.gate.should_use_override().await {
            if let Some(account) = self.paper.account() {
                info!("Using paper account credentials from policy configuration");
                self.state.announce_account(account);
                return Some(account.to_string());
            }
        }
        self.resolver.resolve(ACCOUNT_ENV).await
    }

    /// Gateway account password.
    ///
    /// The paper password is only used alongside a paper account, so a live
    /// account is never paired with a paper password.
    pub async fn password(&self) -> Option<String> {
        if self.gate.should_use_override().await && self.paper.account().is_some() {
            if let Some(password) = self.paper.password() {
                info!("Using paper password from policy configuration");
                self.state.record_password(password);
                return Some(password.to_string());
            }
        }
        self.resolver.resolve(PASSWORD_ENV).await
    }

    /// Key that decrypts the password. Never replaced by the paper override.
    pub async fn key(&self) -> Option<String> {
        self.resolver.resolve(KEY_ENV).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::infra::policy::{
        PolicyConnection, PolicyConnector, PolicyError, PolicyTarget, PolicyValue,
    };
    use crate::infra::secrets::SecretSourceMode;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedPolicy(Option<PolicyValue>);

    struct FixedConnection(Option<PolicyValue>);

    #[async_trait]
    impl PolicyConnector for FixedPolicy {
        async fn connect(
            &self,
            _target: &PolicyTarget,
        ) -> Result<Box<dyn PolicyConnection>, PolicyError> {
            Ok(Box::new(FixedConnection(self.0.clone())))
        }
    }

    #[async_trait]
    impl PolicyConnection for FixedConnection {
        async fn fetch_decision(
            &mut self,
            _identity: &str,
        ) -> Result<Option<PolicyValue>, PolicyError> {
            Ok(self.0.clone())
        }

        async fn close(self: Box<Self>) -> Result<(), PolicyError> {
            Ok(())
        }
    }

    fn provider(use_paper: bool, paper: OverrideCredentials) -> CredentialProvider {
        let env: HashMap<String, String> = [
            (ACCOUNT_ENV, "liveUser"),
            (PASSWORD_ENV, "livePass\n"),
            (KEY_ENV, "k3y"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let policy = PolicyConfig {
            host: Some("db".into()),
            user: Some("u".into()),
            database: Some("ops".into()),
            identity: Some("gw-01".into()),
            ..PolicyConfig::default()
        };
        let gate = AccountPolicyGate::new(
            &policy,
            Arc::new(FixedPolicy(Some(PolicyValue::Bool(use_paper)))),
        );
        let resolver = SecretResolver::new(
            SecretSourceMode::Direct,
            Arc::new(env),
            Some(Box::new(crate::infra::secrets::env_provider::EnvSecretProvider::new())),
        );
        CredentialProvider::new(resolver, gate, paper, Arc::new(CredentialOverrideState::new()))
    }

    fn paper(account: &str, password: &str) -> OverrideCredentials {
        OverrideCredentials {
            account: Some(account.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn override_replaces_account_and_password() {
        let creds = provider(true, paper("demoUser", "demoPass"));
        assert_eq!(creds.account().await.as_deref(), Some("demoUser"));
        assert_eq!(creds.password().await.as_deref(), Some("demoPass"));
        assert!(creds.override_state().is_active());
    }

    #[tokio::test]
    async fn empty_override_account_falls_through() {
        let creds = provider(true, paper("", "demoPass"));
        assert_eq!(creds.account().await.as_deref(), Some("liveUser"));
        assert!(!creds.override_state().is_active());
    }

    #[tokio::test]
    async fn empty_override_account_keeps_live_password() {
        let creds = provider(true, paper("", "demoPass"));
        assert_eq!(creds.account().await.as_deref(), Some("liveUser"));
        assert_eq!(creds.password().await.as_deref(), Some("livePass"));
    }

    #[tokio::test]
    async fn inactive_policy_uses_live_credentials() {
        let creds = provider(false, paper("demoUser", "demoPass"));
        assert_eq!(creds.account().await.as_deref(), Some("liveUser"));
        assert_eq!(creds.password().await.as_deref(), Some("livePass"));
        assert!(!creds.override_state().is_active());
    }

    #[tokio::test]
    async fn password_does_not_announce() {
        let creds = provider(true, paper("demoUser", "demoPass"));
        assert_eq!(creds.password().await.as_deref(), Some("demoPass"));
        assert!(!creds.override_state().is_active());
    }

    #[tokio::test]
    async fn key_ignores_override() {
        for use_paper in [true, false] {
            let creds = provider(use_paper, paper("demoUser", "demoPass"));
            assert_eq!(creds.key().await.as_deref(), Some("k3y"));
        }
    }
}
