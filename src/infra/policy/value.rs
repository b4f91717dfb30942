//! Decision values read from the policy store.

use std::fmt;

/// Strings that mean "use the paper account", compared case-insensitively.
const TRUTHY_TEXT: &[&str] = &["true", "1", "yes", "on"];

/// A decision column value, tagged by the type the store returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyValue {
    Bool(bool),
    Int(i64),
    Text(String),
    /// Any other column type, carrying the store's type name.
    Other(String),
}

impl PolicyValue {
    /// Collapse the value to a decision. Unrecognized types are `false`.
    pub fn normalize(&self) -> bool {
        match self {
            PolicyValue::Bool(b) => *b,
            PolicyValue::Int(n) => *n != 0,
            PolicyValue::Text(s) => TRUTHY_TEXT.iter().any(|t| s.eq_ignore_ascii_case(t)),
            PolicyValue::Other(_) => false,
        }
    }

    /// `false`, zero and the empty string. A blank column does not shadow
    /// later decision columns.
    pub fn is_blank(&self) -> bool {
        match self {
            PolicyValue::Bool(b) => !*b,
            PolicyValue::Int(n) => *n == 0,
            PolicyValue::Text(s) => s.is_empty(),
            PolicyValue::Other(_) => false,
        }
    }
}

impl From<bool> for PolicyValue {
    fn from(value: bool) -> Self {
        PolicyValue::Bool(value)
    }
}

impl From<i64> for PolicyValue {
    fn from(value: i64) -> Self {
        PolicyValue::Int(value)
    }
}

impl From<u64> for PolicyValue {
    fn from(value: u64) -> Self {
        PolicyValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for PolicyValue {
    fn from(value: &str) -> Self {
        PolicyValue::Text(value.to_string())
    }
}

impl From<String> for PolicyValue {
    fn from(value: String) -> Self {
        PolicyValue::Text(value)
    }
}

impl fmt::Display for PolicyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyValue::Bool(b) => write!(f, "bool({b})"),
            PolicyValue::Int(n) => write!(f, "int({n})"),
            PolicyValue::Text(s) => write!(f, "text({s:?})"),
            PolicyValue::Other(t) => write!(f, "unsupported({t})"),
        }
    }
}
