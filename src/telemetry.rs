//! Tracing setup and span constructors.

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one connection's worker.
    pub fn connection(id: &str, authority: &str) -> Span {
        info_span!("connection", id = %id, authority = %authority)
    }

    /// Span for the operator console.
    pub fn console() -> Span {
        info_span!("console")
    }
}
