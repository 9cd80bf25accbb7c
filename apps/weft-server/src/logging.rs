//! Tracing subscriber setup for the server binary.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level is used, and
/// repeated `-v` flags raise it (`-v` info, `-vv` debug, `-vvv` trace).
pub fn init(config: &LoggingConfig, verbose: u8) {
    let directive = match verbose {
        0 => config.level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
