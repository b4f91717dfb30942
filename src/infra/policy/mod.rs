//! Paper account policy.
//!
//! An operational MySQL table says, per machine, whether the gateway should
//! log in with the paper account. The check runs at most once per process.

pub mod gate;
pub mod mysql;
pub mod store;
pub mod value;

pub use gate::AccountPolicyGate;
pub use mysql::MySqlPolicyConnector;
pub use store::{PolicyConnection, PolicyConnector, PolicyError, PolicyTarget};
pub use value::PolicyValue;
