//! # bootkit-logging
//!
//! Installs a `tracing` subscriber from `logging.*` properties during the
//! Configuring phase of a boot.

pub mod config;
pub mod extender;
pub mod subscriber;

pub use config::{LogFormat, LoggingProperties, LoggingPropertiesExt, Severity};
pub use extender::{logging_initializer, LoggingExtender};
pub use subscriber::{build_filter, init_logging, LoggingError};
