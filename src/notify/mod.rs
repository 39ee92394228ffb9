//! Observer notifications for configuration updates and poll failures.

pub mod observer;
pub mod registry;

pub use observer::{ConfigObserver, ObserverFn};
pub use registry::ObserverRegistry;
