//! Logging setup
//!
//! Installs a `tracing-subscriber` formatter on stderr so log lines never
//! mix with assistant output on stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Priority: `RUST_LOG` env var > `debug` flag > default "warn"
pub fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    let default_filter = format!("{},parley={}", level, level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .ok();
}
