//! Subscriber setup for the `termcore` binary.
//!
//! `TERMCORE_LOG` (or `RUST_LOG`) enables output with the usual filter
//! syntax, e.g. `TERMCORE_LOG=termcore::term_index=trace`.
//! `TERMCORE_LOG_FORMAT=json` switches to one JSON object per event.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("TERMCORE_LOG_FORMAT").unwrap_or_default())
    }
}

fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("TERMCORE_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Installs the global subscriber when `TERMCORE_LOG` or `RUST_LOG` is set.
/// Output always goes to stderr.
pub fn init_tracing() {
    let has_own_log = std::env::var("TERMCORE_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_own_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
