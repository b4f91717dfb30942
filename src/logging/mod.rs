use crate::config::DEFAULT_LOG_LEVEL;
use tracing_subscriber::EnvFilter;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gatecreds={level}")))
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr);

    // Ignore the error when a subscriber is already installed (tests, embedding).
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Run `f` under a temporary subscriber at the default level.
///
/// Used for work that happens before the configured level is known, such as
/// loading the config file itself.
pub fn with_bootstrap<T>(json: bool, f: impl FnOnce() -> T) -> T {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(DEFAULT_LOG_LEVEL))
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::with_default(builder.json().finish(), f)
    } else {
        tracing::subscriber::with_default(builder.finish(), f)
    }
}
