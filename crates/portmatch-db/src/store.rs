//! Descriptor loading from the search path.
//!
//! The store only answers "give me the parsed JSON for this name". Whether
//! that JSON is a well-formed interface or platform is the kernel's call, so
//! missing/unreadable/unparseable files fail here and everything structural
//! fails later.

use crate::search_path::SearchPath;
use portmatch_kernel::{
    Descriptor, KEY_MODULE_PORTS, KEY_PLATFORM_NAME, ResolveError, canonicalize_descriptor,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Name of the platform-wide defaults descriptor in the platform database.
pub const PLATFORM_DEFAULTS_NAME: &str = "platform_defaults";

/// Errors raised while locating or reading descriptors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} database '{name}' not found (searched {})", .searched.join(", "))]
    NotFound {
        kind: DescriptorKind,
        name: String,
        searched: Vec<String>,
    },

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse JSON file {path}: {message}")]
    Parse { path: String, message: String },

    /// The consumer's sources are not laid out as expected.
    #[error("{0}")]
    Layout(String),

    #[error("no afu-image:afu-top-interface:class found in {path}")]
    MissingInterfaceClass { path: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Which database a descriptor belongs to, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Platform,
    PlatformDefaults,
    Interface,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform => f.write_str("platform"),
            Self::PlatformDefaults => f.write_str("platform-params"),
            Self::Interface => f.write_str("AFU interface"),
        }
    }
}

/// Loads descriptors of one kind from a search path.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    search_path: SearchPath,
    kind: DescriptorKind,
}

impl DescriptorStore {
    pub fn new(search_path: SearchPath, kind: DescriptorKind) -> Self {
        Self { search_path, kind }
    }

    /// Load by file path if `name_or_path` is an existing file, else by name.
    pub fn load(&self, name_or_path: &str) -> Result<Descriptor, StoreError> {
        self.try_load(name_or_path)?
            .ok_or_else(|| StoreError::NotFound {
                kind: self.kind,
                name: name_or_path.to_string(),
                searched: self
                    .search_path
                    .dirs()
                    .iter()
                    .map(|dir| dir.display().to_string())
                    .collect(),
            })
    }

    /// Like [`load`](Self::load), but a missing descriptor is `Ok(None)`.
    pub fn try_load(&self, name_or_path: &str) -> Result<Option<Descriptor>, StoreError> {
        let direct = Path::new(name_or_path);
        let path = if direct.is_file() {
            direct.to_path_buf()
        } else {
            match self.search_path.find(name_or_path) {
                Some(path) => path,
                None => return Ok(None),
            }
        };
        info!(kind = %self.kind, path = %path.display(), "loading descriptor");
        read_descriptor(&path).map(Some)
    }
}

/// Read and parse one JSON descriptor. Its name is the file stem.
pub fn read_descriptor(path: &Path) -> Result<Descriptor, StoreError> {
    let bytes = fs::read(path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let body: Value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Descriptor::new(name, path.display().to_string(), body))
}

/// Platform names declared by every parseable descriptor on the path.
pub fn discover_platforms(search_path: &SearchPath) -> Vec<String> {
    let mut platforms = BTreeSet::new();
    for path in search_path.json_files() {
        let Some(body) = parse_quietly(&path) else {
            continue;
        };
        if let Some(name) = body.get(KEY_PLATFORM_NAME).and_then(Value::as_str) {
            platforms.insert(name.to_string());
        }
    }
    platforms.into_iter().collect()
}

/// Names of every parseable descriptor on the path that declares module ports,
/// under either the current or the legacy key.
pub fn discover_interfaces(search_path: &SearchPath) -> Vec<String> {
    let mut interfaces = BTreeSet::new();
    for path in search_path.json_files() {
        let Some(mut body) = parse_quietly(&path) else {
            continue;
        };
        canonicalize_descriptor(&mut body);
        if body.get(KEY_MODULE_PORTS).is_some()
            && let Some(stem) = path.file_stem()
        {
            interfaces.insert(stem.to_string_lossy().into_owned());
        }
    }
    interfaces.into_iter().collect()
}

fn parse_quietly(path: &Path) -> Option<Value> {
    match read_descriptor(path) {
        Ok(descriptor) => Some(descriptor.body),
        Err(err) => {
            debug!(path = %path.display(), %err, "skipping unreadable descriptor");
            None
        }
    }
}
