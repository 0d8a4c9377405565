//! Descriptor canonicalization.
//!
//! Older descriptors used different names for two structural keys. They are
//! rewritten here so later stages only ever see the current schema, then the
//! raw JSON is interpreted into typed requirement and offering sets.

use crate::error::ResolveError;
use crate::port::{
    EntryLimit, FIELD_CLASS, OfferingSet, PlatformDefaults, PortDescriptor, RequirementSet,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::debug;

pub const KEY_MODULE_PORTS: &str = "module-ports";
pub const KEY_MODULE_PORTS_OFFERED: &str = "module-ports-offered";
pub const KEY_PLATFORM_NAME: &str = "platform-name";

/// (legacy key, current key) pairs, applied in order.
const LEGACY_RENAMES: [(&str, &str); 2] = [
    ("module-arguments", KEY_MODULE_PORTS),
    ("name", FIELD_CLASS),
];

/// A parsed descriptor as handed over by the descriptor store.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Logical name, usually the file stem.
    pub name: String,
    /// Where the descriptor came from, for diagnostics.
    pub origin: String,
    pub body: Value,
}

impl Descriptor {
    pub fn new(name: impl Into<String>, origin: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
            body,
        }
    }
}

/// Rewrite legacy top-level keys in place. Returns true if anything changed.
///
/// A legacy key replaces any value already stored under the current key.
/// Running this twice is the same as running it once.
pub fn canonicalize_descriptor(body: &mut Value) -> bool {
    let Some(object) = body.as_object_mut() else {
        return false;
    };
    let mut changed = false;
    for (legacy, current) in LEGACY_RENAMES {
        if let Some(value) = object.remove(legacy) {
            debug!(legacy, current, "renamed legacy descriptor key");
            object.insert(current.to_string(), value);
            changed = true;
        }
    }
    changed
}

/// Interpret a base interface descriptor as a requirement set.
pub fn requirement_set(descriptor: &Descriptor) -> Result<RequirementSet, ResolveError> {
    let origin = descriptor.origin.as_str();
    let mut body = descriptor.body.clone();
    canonicalize_descriptor(&mut body);
    if !body.is_object() {
        return Err(ResolveError::schema(origin, "descriptor is not an object"));
    }

    let class = body
        .get(FIELD_CLASS)
        .and_then(Value::as_str)
        .unwrap_or(descriptor.name.as_str())
        .to_string();

    let mut module_ports = BTreeMap::new();
    for entry in container_entries(&body, KEY_MODULE_PORTS, origin)? {
        let port = PortDescriptor::from_json(entry, origin)?;
        match module_ports.entry(port.class.clone()) {
            Entry::Occupied(_) => {
                return Err(ResolveError::schema(
                    origin,
                    format!("module port class '{}' is declared more than once", port.class),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(port);
            }
        }
    }

    Ok(RequirementSet {
        name: descriptor.name.clone(),
        class,
        origin: origin.to_string(),
        module_ports,
    })
}

/// Interpret a platform descriptor as an offering set.
///
/// Platform descriptors have no legacy spellings, so they are read as is.
pub fn offering_set(descriptor: &Descriptor) -> Result<OfferingSet, ResolveError> {
    let origin = descriptor.origin.as_str();
    let body = &descriptor.body;
    if !body.is_object() {
        return Err(ResolveError::schema(origin, "descriptor is not an object"));
    }

    let platform_name = body
        .get(KEY_PLATFORM_NAME)
        .and_then(Value::as_str)
        .unwrap_or(descriptor.name.as_str())
        .to_string();

    let mut module_ports_offered = BTreeMap::new();
    for entry in container_entries(body, KEY_MODULE_PORTS_OFFERED, origin)? {
        let port = PortDescriptor::from_json(entry, origin)?;
        check_offered_vector(&port, origin)?;
        match module_ports_offered.entry(port.key()) {
            Entry::Occupied(slot) => {
                return Err(ResolveError::schema(
                    origin,
                    format!("offered port {} is declared more than once", slot.key().label()),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(port);
            }
        }
    }

    Ok(OfferingSet {
        name: descriptor.name.clone(),
        platform_name,
        origin: origin.to_string(),
        module_ports_offered,
    })
}

/// Interpret the platform defaults descriptor. Its content is opaque here
/// and passes through unchanged.
pub fn platform_defaults(descriptor: &Descriptor) -> Result<PlatformDefaults, ResolveError> {
    let Value::Object(params) = descriptor.body.clone() else {
        return Err(ResolveError::schema(
            &descriptor.origin,
            "descriptor is not an object",
        ));
    };
    Ok(PlatformDefaults {
        name: descriptor.name.clone(),
        origin: descriptor.origin.clone(),
        params,
    })
}

/// The port records under `key`, which may be a list or a mapping.
fn container_entries<'a>(
    body: &'a Value,
    key: &str,
    origin: &str,
) -> Result<Vec<&'a Value>, ResolveError> {
    match body.get(key) {
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(Value::Object(entries)) => Ok(entries.values().collect()),
        Some(_) => Err(ResolveError::schema(
            origin,
            format!("{key} is not a list or a mapping"),
        )),
        None => Err(ResolveError::schema(origin, format!("{key} is missing"))),
    }
}

/// Offered vectors must be bounded, and an offered default must fit the window.
fn check_offered_vector(port: &PortDescriptor, origin: &str) -> Result<(), ResolveError> {
    if !port.vector {
        return Ok(());
    }
    let EntryLimit::Bounded(max_entries) = port.max_entries else {
        return Err(ResolveError::schema(
            origin,
            format!("offered vector port {} must declare max-entries", port.key().label()),
        ));
    };
    if let Some(default_entries) = port.default_entries
        && (default_entries < port.min_entries || default_entries > max_entries)
    {
        return Err(ResolveError::schema(
            origin,
            format!(
                "offered vector port {} default-entries {default_entries} is outside [{}, {max_entries}]",
                port.key().label(),
                port.min_entries
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_request() -> Value {
        json!({
            "name": "ccip_std_afu",
            "module-arguments": [
                {"class": "clocks", "interface": "pClk"}
            ]
        })
    }

    #[test]
    fn canonicalize_renames_legacy_keys() {
        let mut body = legacy_request();
        assert!(canonicalize_descriptor(&mut body));
        assert_eq!(body.get("class"), Some(&json!("ccip_std_afu")));
        assert!(body.get("name").is_none());
        assert!(body.get("module-arguments").is_none());
        assert!(body.get(KEY_MODULE_PORTS).is_some());
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let mut once = legacy_request();
        canonicalize_descriptor(&mut once);
        let mut twice = once.clone();
        assert!(!canonicalize_descriptor(&mut twice));
        assert_eq!(once, twice);
    }

    #[test]
    fn canonicalize_leaves_other_content_alone() {
        let mut body = json!({
            "class": "ccip_std_afu",
            "module-ports": [],
            "platform-name": "dcp"
        });
        let before = body.clone();
        assert!(!canonicalize_descriptor(&mut body));
        assert_eq!(body, before);
    }

    #[test]
    fn requirement_set_accepts_mapping_container() {
        let descriptor = Descriptor::new(
            "ccip_std_afu",
            "afu_top_ifc_db/ccip_std_afu.json",
            json!({
                "module-ports": {
                    "cci-p": {"class": "cci-p", "interface": "struct"},
                    "clocks": {"class": "clocks", "interface": "pClk"}
                }
            }),
        );
        let requirements = requirement_set(&descriptor).expect("requirement set should parse");
        assert_eq!(requirements.class, "ccip_std_afu");
        assert_eq!(
            requirements.module_ports.keys().collect::<Vec<_>>(),
            vec!["cci-p", "clocks"]
        );
    }

    #[test]
    fn requirement_set_rejects_scalar_container() {
        let descriptor = Descriptor::new("afu", "afu.json", json!({"module-ports": 7}));
        let err = requirement_set(&descriptor).expect_err("scalar container should fail");
        assert_eq!(
            err.to_string(),
            "schema error in afu.json: module-ports is not a list or a mapping"
        );
    }

    #[test]
    fn requirement_set_rejects_duplicate_class() {
        let descriptor = Descriptor::new(
            "afu",
            "afu.json",
            json!({"module-ports": [
                {"class": "clocks", "interface": "pClk"},
                {"class": "clocks", "interface": "pClkDiv2"}
            ]}),
        );
        let err = requirement_set(&descriptor).expect_err("duplicate class should fail");
        assert!(matches!(err, ResolveError::Schema { .. }));
    }

    #[test]
    fn offering_set_keys_by_class_and_interface() {
        let descriptor = Descriptor::new(
            "dcp",
            "platform_db/dcp.json",
            json!({
                "platform-name": "intg_xeon",
                "module-ports-offered": [
                    {"class": "clocks", "interface": "pClk"},
                    {"class": "clocks", "interface": "pClkDiv2"}
                ]
            }),
        );
        let offerings = offering_set(&descriptor).expect("offering set should parse");
        assert_eq!(offerings.platform_name, "intg_xeon");
        assert_eq!(offerings.module_ports_offered.len(), 2);
    }

    #[test]
    fn offering_set_does_not_rename_top_level_keys() {
        let descriptor = Descriptor::new(
            "dcp",
            "platform_db/dcp.json",
            json!({
                "name": "Intel Xeon + FPGA",
                "module-ports-offered": [{"class": "clocks", "interface": "pClk"}]
            }),
        );
        let offerings = offering_set(&descriptor).expect("offering set should parse");
        assert_eq!(offerings.platform_name, "dcp");
        assert_eq!(offerings.module_ports_offered.len(), 1);
    }

    #[test]
    fn platform_defaults_pass_through_unchanged() {
        let body = json!({
            "name": "board-x",
            "module-arguments": {"keep": true},
            "clocks": {"pclk-freq": 200}
        });
        let descriptor = Descriptor::new("platform_defaults", "platform_defaults.json", body.clone());
        let defaults = platform_defaults(&descriptor).expect("defaults should parse");
        assert_eq!(
            defaults.params.keys().collect::<Vec<_>>(),
            vec!["clocks", "module-arguments", "name"]
        );
        assert_eq!(Value::Object(defaults.params), body);
    }

    #[test]
    fn platform_defaults_must_be_an_object() {
        let descriptor = Descriptor::new("platform_defaults", "platform_defaults.json", json!([]));
        let err = platform_defaults(&descriptor).expect_err("list body should fail");
        assert_eq!(err.failure_class(), crate::failure_class::SCHEMA_ERROR);
    }

    #[test]
    fn offering_set_requires_bounded_vectors() {
        let descriptor = Descriptor::new(
            "dcp",
            "dcp.json",
            json!({"module-ports-offered": [
                {"class": "local-memory", "interface": "avalon_mm", "vector": true}
            ]}),
        );
        let err = offering_set(&descriptor).expect_err("unbounded offered vector should fail");
        assert!(err.to_string().contains("must declare max-entries"));
    }

    #[test]
    fn offering_set_rejects_default_outside_window() {
        let descriptor = Descriptor::new(
            "dcp",
            "dcp.json",
            json!({"module-ports-offered": [{
                "class": "local-memory",
                "interface": "avalon_mm",
                "vector": true,
                "min-entries": 1,
                "max-entries": 2,
                "default-entries": 4
            }]}),
        );
        let err = offering_set(&descriptor).expect_err("default above max should fail");
        assert!(err.to_string().contains("outside [1, 2]"));
    }
}
