//! Error types for portmatch kernel operations.

use std::fmt;

/// Stable identifiers for each failure, used by JSON reports.
pub mod failure_class {
    pub const SCHEMA_ERROR: &str = "schema_error";
    pub const MISSING_FIELD: &str = "missing_field";
    pub const UNAUTHORIZED_OVERRIDE: &str = "unauthorized_override";
    pub const UNSATISFIED_REQUIREMENT: &str = "unsatisfied_requirement";
    pub const VECTOR_MISMATCH: &str = "vector_mismatch";
    pub const INSUFFICIENT_ENTRIES: &str = "insufficient_entries";
}

/// Every fatal condition raised while canonicalizing, merging or matching.
///
/// None of these are retried: descriptors are static, so the same inputs
/// always fail the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A structural field does not have the expected shape.
    #[error("schema error in {origin}: {detail}")]
    Schema { origin: String, detail: String },

    /// A required field is absent from a port record.
    #[error("module port {port} is missing '{field}' in {origin}")]
    MissingField {
        origin: String,
        port: String,
        field: String,
    },

    /// An override touched a field outside the allow-list.
    #[error("may not update module port class '{class}', field '{field}' ({origin})")]
    UnauthorizedOverride {
        origin: String,
        class: String,
        field: String,
    },

    /// A non-optional requirement has no offering with the same key.
    #[error("{owner} needs port {port} that {offering} doesn't offer")]
    UnsatisfiedRequirement {
        owner: String,
        port: String,
        offering: String,
    },

    /// Requirement and offering disagree on scalar vs. vector shape.
    #[error("{owner} port {port} expects {requested} but {offering} offers only {offered}")]
    VectorMismatch {
        owner: String,
        port: String,
        offering: String,
        requested: PortShape,
        offered: PortShape,
    },

    /// No entry count satisfies both sides' bounds.
    #[error("{owner} port {port} {shortfall} {offering} (resolved {entries}, minimum {minimum})")]
    InsufficientEntries {
        owner: String,
        port: String,
        offering: String,
        shortfall: Shortfall,
        entries: u64,
        minimum: u64,
    },
}

impl ResolveError {
    pub fn failure_class(&self) -> &'static str {
        match self {
            Self::Schema { .. } => failure_class::SCHEMA_ERROR,
            Self::MissingField { .. } => failure_class::MISSING_FIELD,
            Self::UnauthorizedOverride { .. } => failure_class::UNAUTHORIZED_OVERRIDE,
            Self::UnsatisfiedRequirement { .. } => failure_class::UNSATISFIED_REQUIREMENT,
            Self::VectorMismatch { .. } => failure_class::VECTOR_MISMATCH,
            Self::InsufficientEntries { .. } => failure_class::INSUFFICIENT_ENTRIES,
        }
    }

    pub(crate) fn schema(origin: &str, detail: impl Into<String>) -> Self {
        Self::Schema {
            origin: origin.to_string(),
            detail: detail.into(),
        }
    }
}

/// Whether a port is a single instance or an array of instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortShape {
    Scalar,
    Vector,
}

impl PortShape {
    pub fn of(vector: bool) -> Self {
        if vector { Self::Vector } else { Self::Scalar }
    }
}

impl fmt::Display for PortShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("a non-vector"),
            Self::Vector => f.write_str("a vector"),
        }
    }
}

/// Which side's lower bound a resolved entry count violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortfall {
    /// The requirement wants more entries than the offering can supply.
    Requirement,
    /// Clamping to the requirement's maximum fell below the offering's floor.
    Offering,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement => f.write_str("requires more vector entries than"),
            Self::Offering => f.write_str("accepts fewer vector entries than required by"),
        }
    }
}
