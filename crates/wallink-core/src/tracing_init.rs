//! Logging setup for wallink binaries.
//!
//! Logs always go to stderr; stdout carries the URLs and results a user
//! copies or a script parses.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CRATES: [&str; 4] = ["wallink", "wallink_cli", "wallink_core", "wallink_crypto"];

/// Filter directives enabling `level` for every wallink crate.
pub fn default_directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. A valid `RUST_LOG` takes precedence over
/// `level`; `log_json` switches to one JSON object per line.
pub fn init_tracing(level: &str, log_json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(log_json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!log_json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}
