//! # Lifecycle
//!
//! The phase state machine that drives a boot, the extender hooks observing
//! it and the context the hooks operate on.

pub mod context;
pub mod engine;
pub mod extender;
pub mod phase;

pub use context::BootContext;
pub use engine::Boot;
pub use extender::{HookResult, LifecycleExtender, PhaseHooks};
pub use phase::BootPhase;
