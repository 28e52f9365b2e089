//! Diagnostic logging setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured filter is used.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_FILTER: &str = "twlog=info,tower_http=info";

/// Install the global subscriber. Diagnostics go to stderr so they never
/// interleave with access lines written to stdout.
pub fn init_logging(filter: &str) {
    let fallback = if filter.is_empty() { DEFAULT_FILTER } else { filter };

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
