//! Logging setup.
//!
//! Library code emits `tracing` events; binaries call [`init_logging`] once.
//! `RUST_LOG` overrides the default filter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "healthdata=info,tower_http=info";

/// Install the global subscriber, human-readable or JSON lines.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).try_init()
    };

    // A second call (tests, embedding) keeps the first subscriber.
    if let Err(e) = result {
        tracing::debug!("logging already initialized: {}", e);
    }
}
