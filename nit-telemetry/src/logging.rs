//! Tracing subscriber bootstrap.

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when neither `RUST_LOG` nor a caller default is supplied.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a global fmt subscriber. `RUST_LOG` takes precedence over
/// `default_filter`.
///
/// # Errors
///
/// Fails when the filter directive is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(default_filter: Option<&str>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter.unwrap_or(DEFAULT_FILTER))
            .context("invalid tracing filter directive")?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .context("a global tracing subscriber is already installed")
}
