//! One-shot paper account policy check.

use super::mysql::MySqlPolicyConnector;
use super::store::{PolicyConnector, PolicyError, PolicyTarget};
use super::value::PolicyValue;
use crate::config::PolicyConfig;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Decides once per process whether this machine uses the paper account.
///
/// The first call to [`should_use_override`](Self::should_use_override)
/// runs the check; concurrent first callers wait for it. The decision is
/// kept for the life of the gate, including the `false` produced by missing
/// configuration or an unreachable store.
pub struct AccountPolicyGate {
    target: Option<PolicyTarget>,
    connector: Arc<dyn PolicyConnector>,
    decision: OnceCell<bool>,
}

impl AccountPolicyGate {
    pub fn new(config: &PolicyConfig, connector: Arc<dyn PolicyConnector>) -> Self {
        Self {
            target: PolicyTarget::from_config(config),
            connector,
            decision: OnceCell::new(),
        }
    }

    /// Gate backed by the MySQL policy store.
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config, Arc::new(MySqlPolicyConnector))
    }

    /// The memoized decision, if the check has already run.
    pub fn decision(&self) -> Option<bool> {
        self.decision.get().copied()
    }

    pub async fn should_use_override(&self) -> bool {
        *self.decision.get_or_init(|| self.check()).await
    }

    async fn check(&self) -> bool {
        let Some(target) = &self.target else {
            debug!("Policy store not fully configured, skipping paper account check");
            return false;
        };

        let decision = match self.lookup(target).await {
            Ok(Some(value)) => {
                if let PolicyValue::Other(type_name) = &value {
                    warn!("Unknown value type for paper account flag: {type_name}");
                }
                let use_paper = value.normalize();
                debug!("Policy value for {}: {value}", target.identity);
                info!(
                    "Policy check: machine {} should {}use paper account",
                    target.identity,
                    if use_paper { "" } else { "NOT " }
                );
                use_paper
            }
            Ok(None) => {
                info!(
                    "No policy entry found for machine {}, using default account",
                    target.identity
                );
                false
            }
            Err(e) => {
                error!("Policy check failed: {e}");
                false
            }
        };

        debug!("Policy check result: {decision}");
        decision
    }

    /// Open a connection, run the lookup, and close the connection whatever
    /// the lookup returned.
    async fn lookup(&self, target: &PolicyTarget) -> Result<Option<PolicyValue>, PolicyError> {
        let mut conn = self.connector.connect(target).await?;
        info!("Connected to policy store at {}", target.host);

        let result = conn.fetch_decision(&target.identity).await;
        if let Err(e) = conn.close().await {
            warn!("Failed to close policy store connection: {e}");
        }
        result
    }
}
