//! Shared record of the paper account override.
//!
//! The credential provider writes here when it hands out paper credentials.
//! Anything else in the process that needs to know which account family is
//! in use reads this record instead of repeating the policy check.

use crate::infra::secrets::redact_secret;
use parking_lot::RwLock;
use serde::Serialize;

/// Exported name of the override-active flag.
pub const USE_PAPER_ACCOUNT_ENV: &str = "GATEWAY_USE_PAPER_ACCOUNT";
/// Exported name of the selected override account.
pub const PAPER_ACCOUNT_ENV: &str = "GATEWAY_PAPER_ACCOUNT";
/// Exported name of the selected override password.
pub const PAPER_PASSWORD_ENV: &str = "GATEWAY_PAPER_PASSWORD";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSnapshot {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
}

/// Process-wide override record. Last writer wins.
#[derive(Debug, Default)]
pub struct CredentialOverrideState {
    inner: RwLock<OverrideSnapshot>,
}

impl CredentialOverrideState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the override active and record the account handed out.
    pub fn announce_account(&self, account: &str) {
        let mut inner = self.inner.write();
        inner.active = true;
        inner.account = Some(account.to_string());
    }

    /// Record the override password handed out. Does not set the flag.
    pub fn record_password(&self, password: &str) {
        self.inner.write().password = Some(password.to_string());
    }

    pub fn is_active(&self) -> bool {
        self.inner.read().active
    }

    pub fn snapshot(&self) -> OverrideSnapshot {
        self.inner.read().clone()
    }

    /// Environment-style pairs for consumers outside the process.
    pub fn env_pairs(&self) -> Vec<(&'static str, String)> {
        let inner = self.inner.read();
        let mut pairs = vec![(USE_PAPER_ACCOUNT_ENV, inner.active.to_string())];
        if let Some(account) = &inner.account {
            pairs.push((PAPER_ACCOUNT_ENV, account.clone()));
        }
        if let Some(password) = &inner.password {
            pairs.push((PAPER_PASSWORD_ENV, password.clone()));
        }
        pairs
    }

    /// `KEY=value` lines for display. The password is redacted unless
    /// `reveal` is set.
    pub fn export_lines(&self, reveal: bool) -> Vec<String> {
        self.env_pairs()
            .into_iter()
            .map(|(name, value)| {
                if name == PAPER_PASSWORD_ENV && !reveal {
                    format!("{name}={}", redact_secret(&value))
                } else {
                    format!("{name}={value}")
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_inactive() {
        let state = CredentialOverrideState::new();
        assert!(!state.is_active());
        assert_eq!(
            state.env_pairs(),
            vec![(USE_PAPER_ACCOUNT_ENV, "false".to_string())]
        );
    }

    #[test]
    fn password_alone_does_not_activate() {
        let state = CredentialOverrideState::new();
        state.record_password("paperpw");
        assert!(!state.is_active());
    }

    #[test]
    fn announce_exports_flag_and_values() {
        let state = CredentialOverrideState::new();
        state.announce_account("demoUser");
        state.record_password("paperpw");
        assert_eq!(
            state.env_pairs(),
            vec![
                (USE_PAPER_ACCOUNT_ENV, "true".to_string()),
                (PAPER_ACCOUNT_ENV, "demoUser".to_string()),
                (PAPER_PASSWORD_ENV, "paperpw".to_string()),
            ]
        );
    }

    #[test]
    fn export_lines_redact_password_by_default() {
        let state = CredentialOverrideState::new();
        state.announce_account("demoUser");
        state.record_password("paperPassword");
        assert_eq!(
            state.export_lines(false),
            vec![
                "GATEWAY_USE_PAPER_ACCOUNT=true".to_string(),
                "GATEWAY_PAPER_ACCOUNT=demoUser".to_string(),
                "GATEWAY_PAPER_PASSWORD=pa…rd".to_string(),
            ]
        );
        assert_eq!(
            state.export_lines(true)[2],
            "GATEWAY_PAPER_PASSWORD=paperPassword"
        );
    }

    #[test]
    fn snapshot_serialization_omits_password() {
        let state = CredentialOverrideState::new();
        state.announce_account("demoUser");
        state.record_password("paperpw");
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"active": true, "account": "demoUser"})
        );
    }
}
