//! Consumer overrides and extensions over a base requirement set.
//!
//! A consumer may add port classes the base template never anticipated
//! (extensions), and may retune a small set of fields on classes the base
//! already declares (overrides). Structural fields of an inherited port
//! (`interface`, `vector`) are never writable from the consumer side.

use crate::error::ResolveError;
use crate::port::{
    FIELD_CLASS, FIELD_DEFAULT_ENTRIES, FIELD_INTERFACE, FIELD_MAX_ENTRIES, FIELD_MIN_ENTRIES,
    FIELD_OPTIONAL, FIELD_PARAMS, PortDescriptor, RequirementSet,
};
use serde_json::{Map, Value};
use tracing::info;

/// Fields a consumer record may overwrite on an inherited port.
pub const OVERRIDABLE_FIELDS: [&str; 5] = [
    FIELD_DEFAULT_ENTRIES,
    FIELD_MAX_ENTRIES,
    FIELD_MIN_ENTRIES,
    FIELD_OPTIONAL,
    FIELD_PARAMS,
];

pub fn is_overridable(field: &str) -> bool {
    OVERRIDABLE_FIELDS.contains(&field)
}

/// Apply `overrides` in order on top of a copy of `base`.
///
/// `base` is left untouched so a cached template can serve several consumers.
/// Later records see the effect of earlier ones: repeated overrides of the
/// same field resolve last-wins, and a class introduced by an extension can
/// be overridden further down the list.
pub fn merge_overrides(
    base: &RequirementSet,
    overrides: &[Value],
    origin: &str,
) -> Result<RequirementSet, ResolveError> {
    let mut merged = base.clone();
    for record in overrides {
        let Some(record) = record.as_object() else {
            return Err(ResolveError::schema(
                origin,
                format!("module-ports entries must be objects ({record})"),
            ));
        };
        let class = record_class(record, origin)?;

        match merged.module_ports.get(class) {
            None => {
                let port = extension_port(record, class, origin)?;
                info!(origin, class, interface = %port.interface, "adding module port class");
                merged.module_ports.insert(class.to_string(), port);
            }
            Some(existing) => {
                let port = override_port(existing, record, origin)?;
                merged.module_ports.insert(class.to_string(), port);
            }
        }
    }
    Ok(merged)
}

fn record_class<'a>(record: &'a Map<String, Value>, origin: &str) -> Result<&'a str, ResolveError> {
    match record.get(FIELD_CLASS) {
        None => Err(ResolveError::MissingField {
            origin: origin.to_string(),
            port: "<unnamed>".to_string(),
            field: FIELD_CLASS.to_string(),
        }),
        Some(Value::String(class)) => Ok(class.as_str()),
        Some(other) => Err(ResolveError::schema(
            origin,
            format!("module port class must be a string, got {other}"),
        )),
    }
}

fn extension_port(
    record: &Map<String, Value>,
    class: &str,
    origin: &str,
) -> Result<PortDescriptor, ResolveError> {
    if !record.contains_key(FIELD_INTERFACE) {
        return Err(ResolveError::MissingField {
            origin: origin.to_string(),
            port: class.to_string(),
            field: FIELD_INTERFACE.to_string(),
        });
    }
    PortDescriptor::from_json(&Value::Object(record.clone()), origin)
}

/// Check every field of the record first, then write into a copy of `existing`.
fn override_port(
    existing: &PortDescriptor,
    record: &Map<String, Value>,
    origin: &str,
) -> Result<PortDescriptor, ResolveError> {
    let class = existing.class.as_str();
    if let Some(field) = record
        .keys()
        .find(|field| field.as_str() != FIELD_CLASS && !is_overridable(field))
    {
        return Err(ResolveError::UnauthorizedOverride {
            origin: origin.to_string(),
            class: class.to_string(),
            field: field.clone(),
        });
    }

    let mut port = existing.clone();
    for (field, value) in record {
        if field == FIELD_CLASS {
            continue;
        }
        info!(origin, class, field = field.as_str(), %value, "overriding module port field");
        port.set_field(field, value, origin)?;
    }
    port.check_window(origin)?;
    Ok(port)
}
