//! Credential resolution for trading-gateway agents.
//!
//! Secrets come from one configured source (environment values, files, or
//! Google Secret Manager). A one-time policy lookup decides whether this
//! machine logs in with the paper account instead of the live one.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod infra;
pub mod logging;
