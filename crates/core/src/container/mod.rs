#[allow(clippy::module_inception)]
pub mod container;
pub mod descriptor;
pub mod module;
pub mod scope;

pub use container::Container;
pub use descriptor::{Qualifier, ServiceDescriptor, ServiceFactory, ServiceId};
pub use module::Module;
pub use scope::{ScopeId, ServiceScope};
