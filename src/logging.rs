//! Logging configuration using tracing.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{FbmError, FbmResult};

/// Initialize logging with the specified level
///
/// `RUST_LOG` takes precedence over `level`. Diagnostics go to stderr so
/// they never mix with command output.
pub fn init(level: &str) -> FbmResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| FbmError::Config(format!("Failed to initialize logging: {}", e)))
}
