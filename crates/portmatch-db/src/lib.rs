//! # portmatch-db
//!
//! Descriptor store for the portmatch kernel.
//!
//! This crate provides:
//! - `SearchPath` construction from environment variables and release trees
//! - `DescriptorStore` loading of JSON descriptors by name or path
//! - discovery of the platforms and base interfaces on a search path
//! - `InterfaceRequest`, the consumer's choice of base interface plus overrides
//!
//! It never interprets descriptor structure. That is the kernel's job.
//!
//! ## Data model
//!
//! ```text
//! <dir>/<name>.json (on disk, one descriptor per file)
//!     ↓  DescriptorStore::load
//! portmatch_kernel::Descriptor (name + origin + parsed JSON)
//! ```

pub mod request;
pub mod search_path;
pub mod store;

#[cfg(test)]
mod testing;

pub use request::{COMMAND_LINE_ORIGIN, InterfaceRequest};
pub use search_path::{
    DB_ROOT_ENV, DEFAULT_DB_ROOT, IFC_DB_DIR, IFC_DB_PATH_ENV, PLATFORM_DB_DIR,
    PLATFORM_DB_PATH_ENV, PLATFORM_ROOT_ENV, SearchPath,
};
pub use store::{
    DescriptorKind, DescriptorStore, PLATFORM_DEFAULTS_NAME, StoreError, discover_interfaces,
    discover_platforms, read_descriptor,
};
