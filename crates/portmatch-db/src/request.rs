//! The consumer's interface request.
//!
//! A consumer either names a base interface class directly, or ships a JSON
//! descriptor whose `afu-image.afu-top-interface` object names the class and
//! optionally lists port overrides and extensions.

use crate::search_path::is_json_file;
use crate::store::{StoreError, read_descriptor};
use portmatch_kernel::port::FIELD_CLASS;
use portmatch_kernel::{KEY_MODULE_PORTS, ResolveError, canonicalize_descriptor};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const IMAGE_KEY: &str = "afu-image";
const TOP_INTERFACE_KEY: &str = "afu-top-interface";

/// Origin label used when the request did not come from a file.
pub const COMMAND_LINE_ORIGIN: &str = "<command line>";

/// Which base interface a consumer wants, and how it patches it.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceRequest {
    /// Base interface class, naming a descriptor in the interface database.
    pub class: String,
    /// File stem of the consumer descriptor, if any.
    pub name: Option<String>,
    /// Path of the consumer descriptor, if any.
    pub origin: Option<String>,
    /// Override and extension records, in file order.
    pub overrides: Vec<Value>,
}

impl InterfaceRequest {
    /// A bare class with nothing to merge.
    pub fn from_class(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: None,
            origin: None,
            overrides: Vec::new(),
        }
    }

    /// Load a request from a JSON file, or a directory holding exactly one.
    ///
    /// When the file names no class, `default_class` is used instead and the
    /// file's overrides are ignored.
    pub fn load(source: &Path, default_class: Option<&str>) -> Result<Self, StoreError> {
        let path = locate_request_file(source)?;
        info!(path = %path.display(), "loading AFU interface request");
        let descriptor = read_descriptor(&path)?;

        let Some(mut top) = descriptor
            .body
            .get(IMAGE_KEY)
            .and_then(|image| image.get(TOP_INTERFACE_KEY))
            .cloned()
        else {
            return Self::fallback(&descriptor.origin, default_class, descriptor.name);
        };
        canonicalize_descriptor(&mut top);

        let Some(class) = top.get(FIELD_CLASS).and_then(Value::as_str) else {
            return Self::fallback(&descriptor.origin, default_class, descriptor.name);
        };

        let overrides = match top.get(KEY_MODULE_PORTS) {
            None => Vec::new(),
            Some(Value::Array(records)) => records.clone(),
            Some(_) => {
                return Err(ResolveError::Schema {
                    origin: descriptor.origin.clone(),
                    detail: format!("{KEY_MODULE_PORTS} is not a list"),
                }
                .into());
            }
        };

        Ok(Self {
            class: class.to_string(),
            name: Some(descriptor.name),
            origin: Some(descriptor.origin),
            overrides,
        })
    }

    /// Label for diagnostics about the override records.
    pub fn overrides_origin(&self) -> &str {
        self.origin.as_deref().unwrap_or(COMMAND_LINE_ORIGIN)
    }

    fn fallback(
        origin: &str,
        default_class: Option<&str>,
        name: String,
    ) -> Result<Self, StoreError> {
        let Some(class) = default_class else {
            return Err(StoreError::MissingInterfaceClass {
                path: origin.to_string(),
            });
        };
        warn!(
            path = origin,
            default_class = class,
            "no afu-image:afu-top-interface:class found, using default interface"
        );
        Ok(Self {
            class: class.to_string(),
            name: Some(name),
            origin: Some(origin.to_string()),
            overrides: Vec::new(),
        })
    }
}

fn locate_request_file(source: &Path) -> Result<PathBuf, StoreError> {
    if source.is_file() {
        return Ok(source.to_path_buf());
    }
    if !source.is_dir() {
        return Err(StoreError::Layout(format!(
            "AFU source ({}) not found",
            source.display()
        )));
    }

    let entries = fs::read_dir(source).map_err(|e| StoreError::Io {
        path: source.display().to_string(),
        message: e.to_string(),
    })?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_json_file(path))
        .collect();

    match candidates.len() {
        0 => Err(StoreError::Layout(format!(
            "AFU source directory ({}) has no JSON file",
            source.display()
        ))),
        1 => Ok(candidates.remove(0)),
        _ => Err(StoreError::Layout(format!(
            "AFU source directory ({}) has multiple JSON files; name one explicitly",
            source.display()
        ))),
    }
}
