mod boot;
mod core;
mod property;

pub use boot::{BootError, HookError};
pub use self::core::CoreError;
pub use property::PropertyError;
