//! # Portmatch Kernel
//!
//! Reconciles a consumer's declared port requirements against the ports a
//! platform offers, producing a fully resolved port list or a single precise
//! diagnostic.
//!
//! The kernel is pure: it never touches the filesystem. Descriptors arrive as
//! already-parsed JSON from a store (see `portmatch-db`), and the resolved
//! list is handed to whatever renders downstream artifacts.
//!
//! ## Pipeline
//!
//! ```text
//! Descriptor            ← parsed JSON + name + origin
//!     │  canonicalize_descriptor / requirement_set / offering_set
//! RequirementSet, OfferingSet
//!     │  merge_overrides    (consumer extensions + allow-listed overrides)
//! RequirementSet (merged copy)
//!     │  negotiate          (per-port match + vector sizing)
//! Vec<ResolvedMatch>
//! ```

pub mod canonical;
pub mod error;
pub mod merge;
pub mod negotiate;
pub mod port;

pub use canonical::{
    Descriptor, KEY_MODULE_PORTS, KEY_MODULE_PORTS_OFFERED, KEY_PLATFORM_NAME,
    canonicalize_descriptor, offering_set, platform_defaults, requirement_set,
};
pub use error::{PortShape, ResolveError, Shortfall, failure_class};
pub use merge::{OVERRIDABLE_FIELDS, is_overridable, merge_overrides};
pub use negotiate::{Resolution, ResolvedMatch, negotiate, resolve, size_vector};
pub use port::{
    EntryLimit, OfferingSet, PlatformDefaults, PortDescriptor, PortKey, RequirementSet,
};
