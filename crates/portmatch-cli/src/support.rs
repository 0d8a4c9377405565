use portmatch_db::{DescriptorStore, InterfaceRequest, SearchPath, StoreError};
use portmatch_kernel::Descriptor;
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use tracing::info;

/// Report a fatal diagnostic and exit with status 1.
pub fn exit_with(err: impl Display) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

pub fn load_descriptor_or_exit(store: &DescriptorStore, name_or_path: &str) -> Descriptor {
    store.load(name_or_path).unwrap_or_else(|e| exit_with(e))
}

/// Build the interface request from `--ifc`, or from the AFU sources.
pub fn load_request_or_exit(
    ifc: Option<&str>,
    src: Option<&Path>,
    default_ifc: Option<&str>,
) -> InterfaceRequest {
    match (ifc, src) {
        (Some(class), _) => InterfaceRequest::from_class(class),
        (None, Some(src)) => {
            InterfaceRequest::load(src, default_ifc).unwrap_or_else(|e| exit_with(e))
        }
        (None, None) => exit_with(StoreError::Layout(
            "either --ifc or --src must be specified".to_string(),
        )),
    }
}

pub fn render_json_or_exit<T: Serialize>(value: &T, what: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| {
        eprintln!("error: failed to render {what} json: {err}");
        std::process::exit(2);
    })
}

/// Write `debug_<name>.json` into `dir`.
pub fn write_debug_json_or_exit<T: Serialize>(dir: &Path, name: &str, value: &T) {
    let path = dir.join(format!("debug_{name}.json"));
    info!(path = %path.display(), "writing debug dump");
    let rendered = render_json_or_exit(value, name);
    if let Err(err) = fs::create_dir_all(dir) {
        exit_with(format!("failed to create {}: {err}", dir.display()));
    }
    if let Err(err) = fs::write(&path, format!("{rendered}\n")) {
        exit_with(format!("failed to write {}: {err}", path.display()));
    }
}

/// Search-path directories in order, flagging the last as the default.
pub fn search_path_rows(search_path: &SearchPath) -> Vec<(String, bool)> {
    let last = search_path.dirs().len().saturating_sub(1);
    search_path
        .dirs()
        .iter()
        .enumerate()
        .map(|(index, dir)| (dir.display().to_string(), index == last))
        .collect()
}
