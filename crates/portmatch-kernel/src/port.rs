//! Port descriptors and the sets that hold them.
//!
//! A port is identified by its compound key (`class`, `interface`). Requirement
//! sets index ports by class alone, since a consumer may name each class once;
//! offering sets index by the full key.

use crate::error::ResolveError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

pub const FIELD_CLASS: &str = "class";
pub const FIELD_INTERFACE: &str = "interface";
pub const FIELD_VECTOR: &str = "vector";
pub const FIELD_OPTIONAL: &str = "optional";
pub const FIELD_MIN_ENTRIES: &str = "min-entries";
pub const FIELD_MAX_ENTRIES: &str = "max-entries";
pub const FIELD_DEFAULT_ENTRIES: &str = "default-entries";
pub const FIELD_PARAMS: &str = "params";

/// Minimum entry count assumed when a vector port does not declare one.
pub const DEFAULT_MIN_ENTRIES: u64 = 1;

/// Compound identity of a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortKey {
    pub class: String,
    pub interface: String,
}

impl PortKey {
    pub fn new(class: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            interface: interface.into(),
        }
    }

    /// `class:interface`, the form used in diagnostics.
    pub fn label(&self) -> String {
        format!("{}:{}", self.class, self.interface)
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.class, self.interface)
    }
}

impl Serialize for PortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Upper bound on a vector port's entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryLimit {
    Bounded(u64),
    /// No explicit maximum was requested.
    #[default]
    Unbounded,
}

impl EntryLimit {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    pub fn bound(&self) -> Option<u64> {
        match self {
            Self::Bounded(n) => Some(*n),
            Self::Unbounded => None,
        }
    }

    pub fn admits(&self, entries: u64) -> bool {
        match self {
            Self::Bounded(n) => entries <= *n,
            Self::Unbounded => true,
        }
    }
}

impl Serialize for EntryLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bounded(n) => serializer.serialize_u64(*n),
            Self::Unbounded => serializer.serialize_none(),
        }
    }
}

/// One typed port record, on either the requirement or the offering side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortDescriptor {
    pub class: String,
    pub interface: String,
    pub vector: bool,
    pub optional: bool,
    pub min_entries: u64,
    #[serde(skip_serializing_if = "EntryLimit::is_unbounded")]
    pub max_entries: EntryLimit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_entries: Option<u64>,
    pub params: Map<String, Value>,
    /// Fields the engine does not interpret, kept for the renderer.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PortDescriptor {
    /// A scalar, mandatory port with every structural default applied.
    pub fn new(class: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            interface: interface.into(),
            vector: false,
            optional: false,
            min_entries: DEFAULT_MIN_ENTRIES,
            max_entries: EntryLimit::Unbounded,
            default_entries: None,
            params: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn key(&self) -> PortKey {
        PortKey::new(self.class.as_str(), self.interface.as_str())
    }

    /// Interpret a JSON port record, filling structural defaults.
    pub fn from_json(value: &Value, origin: &str) -> Result<Self, ResolveError> {
        let Some(record) = value.as_object() else {
            return Err(ResolveError::schema(
                origin,
                format!("module ports must be objects ({value})"),
            ));
        };
        let class = required_string(record, FIELD_CLASS, "<unnamed>", origin)?;
        let interface = required_string(record, FIELD_INTERFACE, &class, origin)?;

        let mut port = Self::new(class, interface);
        for (field, value) in record {
            match field.as_str() {
                FIELD_CLASS | FIELD_INTERFACE => {}
                FIELD_VECTOR => port.vector = read_bool(value, &port.class, field, origin)?,
                FIELD_OPTIONAL | FIELD_MIN_ENTRIES | FIELD_MAX_ENTRIES
                | FIELD_DEFAULT_ENTRIES | FIELD_PARAMS => {
                    port.set_field(field, value, origin)?;
                }
                _ => {
                    port.extra.insert(field.clone(), value.clone());
                }
            }
        }
        port.check_window(origin)?;
        Ok(port)
    }

    /// Write one of the fields a consumer record may override.
    ///
    /// Returns `Ok(false)` when `field` is not one of them.
    pub(crate) fn set_field(
        &mut self,
        field: &str,
        value: &Value,
        origin: &str,
    ) -> Result<bool, ResolveError> {
        match field {
            FIELD_OPTIONAL => self.optional = read_bool(value, &self.class, field, origin)?,
            FIELD_MIN_ENTRIES => self.min_entries = read_count(value, &self.class, field, origin)?,
            FIELD_MAX_ENTRIES => {
                self.max_entries = if value.is_null() {
                    EntryLimit::Unbounded
                } else {
                    EntryLimit::Bounded(read_count(value, &self.class, field, origin)?)
                };
            }
            FIELD_DEFAULT_ENTRIES => {
                self.default_entries = if value.is_null() {
                    None
                } else {
                    Some(read_count(value, &self.class, field, origin)?)
                };
            }
            FIELD_PARAMS => {
                let Some(params) = value.as_object() else {
                    return Err(ResolveError::schema(
                        origin,
                        format!("module port '{}' field 'params' must be an object", self.class),
                    ));
                };
                self.params = params.clone();
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// `min-entries` may not exceed a bounded `max-entries`.
    pub(crate) fn check_window(&self, origin: &str) -> Result<(), ResolveError> {
        if !self.max_entries.admits(self.min_entries) {
            return Err(ResolveError::schema(
                origin,
                format!(
                    "module port {} has min-entries {} above max-entries {}",
                    self.key().label(),
                    self.min_entries,
                    self.max_entries.bound().unwrap_or_default()
                ),
            ));
        }
        Ok(())
    }
}

/// Consumer-side ports, keyed by class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequirementSet {
    /// Logical name of the descriptor, used as the owner in diagnostics.
    pub name: String,
    /// Top-level interface class the set was built from.
    pub class: String,
    pub origin: String,
    pub module_ports: BTreeMap<String, PortDescriptor>,
}

impl RequirementSet {
    /// Ports in (`class`, `interface`) order.
    pub fn sorted_ports(&self) -> Vec<&PortDescriptor> {
        let mut ports: Vec<&PortDescriptor> = self.module_ports.values().collect();
        ports.sort_by(|left, right| compare_ports(left, right));
        ports
    }
}

/// Provider-side ports, keyed by compound identity. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OfferingSet {
    pub name: String,
    pub platform_name: String,
    pub origin: String,
    pub module_ports_offered: BTreeMap<PortKey, PortDescriptor>,
}

impl OfferingSet {
    pub fn get(&self, key: &PortKey) -> Option<&PortDescriptor> {
        self.module_ports_offered.get(key)
    }
}

/// Platform-wide parameter defaults, passed through to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformDefaults {
    pub name: String,
    pub origin: String,
    pub params: Map<String, Value>,
}

fn compare_ports(left: &PortDescriptor, right: &PortDescriptor) -> Ordering {
    left.class
        .cmp(&right.class)
        .then_with(|| left.interface.cmp(&right.interface))
}

fn required_string(
    record: &Map<String, Value>,
    field: &str,
    port: &str,
    origin: &str,
) -> Result<String, ResolveError> {
    match record.get(field) {
        None => Err(ResolveError::MissingField {
            origin: origin.to_string(),
            port: port.to_string(),
            field: field.to_string(),
        }),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(ResolveError::schema(
            origin,
            format!("module port {port} field '{field}' must be a string, got {other}"),
        )),
    }
}

fn read_bool(value: &Value, class: &str, field: &str, origin: &str) -> Result<bool, ResolveError> {
    value.as_bool().ok_or_else(|| {
        ResolveError::schema(
            origin,
            format!("module port '{class}' field '{field}' must be a boolean, got {value}"),
        )
    })
}

fn read_count(value: &Value, class: &str, field: &str, origin: &str) -> Result<u64, ResolveError> {
    value.as_u64().ok_or_else(|| {
        ResolveError::schema(
            origin,
            format!(
                "module port '{class}' field '{field}' must be a non-negative integer, got {value}"
            ),
        )
    })
}
