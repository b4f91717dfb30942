/// Default configuration constants used across the system.

/// Default secrets source selector.
pub const DEFAULT_SECRETS_SOURCE: &str = "env";

/// Default encoding for secret files.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Default HTTP timeout for secret manager requests.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Default MySQL port for the policy store.
pub const DEFAULT_POLICY_PORT: u16 = 3306;

/// Default policy store connect timeout.
pub const DEFAULT_POLICY_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default policy store query timeout.
pub const DEFAULT_POLICY_QUERY_TIMEOUT_SECS: u64 = 10;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
