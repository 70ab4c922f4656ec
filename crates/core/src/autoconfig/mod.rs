//! # Auto-configuration
//!
//! Ordered, conditional registration units. Units run in ascending
//! [`AutoConfiguration::order`] against a shared staging [`Module`](crate::container::Module)
//! which is loaded into the container once every unit has run.

pub mod registry;
pub mod scope;
pub mod unit;

pub use registry::{AutoConfigurationOutcome, AutoConfigurationRegistry};
pub use scope::AutoConfigurationScope;
pub use unit::{auto_configuration, AutoConfiguration, FnAutoConfiguration};
