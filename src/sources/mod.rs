//! Property source implementations.

mod file;
mod memory;
mod property_source;
pub mod properties;

#[cfg(feature = "http")]
mod remote;

pub use file::FileSource;
pub use memory::MemorySource;
pub use property_source::{PropertySource, RawProperties};

#[cfg(feature = "http")]
pub use remote::{HttpAuth, HttpSource, HttpSourceBuilder};
