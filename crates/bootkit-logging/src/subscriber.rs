//! # Subscriber installation
//!
//! Builds a `tracing_subscriber` registry with an `EnvFilter` and one fmt
//! layer chosen by [`LogFormat`].

use std::io;
use thiserror::Error;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingProperties};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        source: tracing_subscriber::filter::ParseError,
    },
}

/// Build the filter, preferring `RUST_LOG` when it is set
pub fn build_filter(properties: &LoggingProperties) -> Result<EnvFilter, LoggingError> {
    let directive = properties.filter_directive();
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(directive).map_err(|source| LoggingError::InvalidFilter {
            filter: directive.to_string(),
            source,
        })
    })
}

/// Install the global subscriber described by `properties`
///
/// Returns `Ok(false)` when a global subscriber is already installed, which
/// happens when several boots share one process.
pub fn init_logging(properties: &LoggingProperties) -> Result<bool, LoggingError> {
    let filter = build_filter(properties)?;
    let location = properties.include_location;

    let installed = match properties.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(location)
                    .with_line_number(location)
                    .json(),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(location)
                    .with_line_number(location)
                    .pretty(),
            )
            .try_init(),
        LogFormat::Plain => tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(location)
                    .with_line_number(location),
            )
            .try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::info!(
                target: "bootkit::logging",
                "Logging initialized (filter: {}, format: {:?})",
                properties.filter_directive(),
                properties.format
            );
            Ok(true)
        }
        Err(_) => {
            tracing::debug!(target: "bootkit::logging", "Global subscriber already installed");
            Ok(false)
        }
    }
}
