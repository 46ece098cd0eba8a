//! Tracing subscriber setup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "LOG_LEVEL";

/// Installs a stderr `fmt` layer filtered by `LOG_LEVEL` (default: `default_level`).
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init(default_level: LevelFilter) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var(LOG_ENV_VAR)
                .from_env_lossy(),
        )
        .try_init();
}
