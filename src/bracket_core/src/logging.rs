use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info` for this crate and `warn` for others.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,bracket_core=info,madness=info"));

    // A second call (tests, embedding) keeps the subscriber already installed.
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
