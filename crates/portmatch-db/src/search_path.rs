//! Directory search paths for descriptor databases.
//!
//! A search path is built from a colon-separated environment variable, then a
//! release tree (if one is configured and present), then the shipped default
//! directory, which is always last.

use std::fs;
use std::path::{Path, PathBuf};

pub const PLATFORM_DB_PATH_ENV: &str = "PORTMATCH_PLATFORM_DB_PATH";
pub const IFC_DB_PATH_ENV: &str = "PORTMATCH_IFC_DB_PATH";
pub const PLATFORM_ROOT_ENV: &str = "PORTMATCH_PLATFORM_ROOT";
pub const DB_ROOT_ENV: &str = "PORTMATCH_DB_ROOT";
pub const DEFAULT_DB_ROOT: &str = "/usr/share/portmatch";
pub const PLATFORM_DB_DIR: &str = "platform_db";
pub const IFC_DB_DIR: &str = "afu_top_ifc_db";

/// Ordered list of directories to search; the last entry is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Build a search path from `env_name`, reading variables through `lookup`.
    pub fn from_env<F>(env_name: &str, default_dir: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut dirs: Vec<PathBuf> = lookup(env_name)
            .map(|value| {
                value
                    .split(':')
                    .filter(|entry| !entry.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        if let Some(root) = lookup(PLATFORM_ROOT_ENV) {
            let release_dir = Path::new(root.trim_end_matches('/'))
                .join("hw")
                .join("lib")
                .join("platform")
                .join(default_dir);
            if release_dir.is_dir() {
                dirs.push(release_dir);
            }
        }

        let db_root = lookup(DB_ROOT_ENV).unwrap_or_else(|| DEFAULT_DB_ROOT.to_string());
        dirs.push(Path::new(&db_root).join(default_dir));
        Self { dirs }
    }

    /// Platform database path from the process environment.
    pub fn platforms() -> Self {
        Self::from_env(PLATFORM_DB_PATH_ENV, PLATFORM_DB_DIR, |name| {
            std::env::var(name).ok()
        })
    }

    /// Base interface database path from the process environment.
    pub fn interfaces() -> Self {
        Self::from_env(IFC_DB_PATH_ENV, IFC_DB_DIR, |name| std::env::var(name).ok())
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn default_dir(&self) -> Option<&Path> {
        self.dirs.last().map(PathBuf::as_path)
    }

    /// First `<dir>/<name>.json` that exists, in search order.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(format!("{name}.json")))
            .find(|candidate| candidate.is_file())
    }

    /// Every `*.json` file in every directory, sorted within each directory.
    pub fn json_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for dir in &self.dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            let mut found: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| is_json_file(path))
                .collect();
            found.sort();
            files.extend(found);
        }
        files
    }
}

pub(crate) fn is_json_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TempDirGuard;
    use std::collections::BTreeMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn env_entries_come_first_and_empty_entries_drop() {
        let path = SearchPath::from_env(
            PLATFORM_DB_PATH_ENV,
            PLATFORM_DB_DIR,
            lookup_from(&[
                (PLATFORM_DB_PATH_ENV, "/a::/b:"),
                (DB_ROOT_ENV, "/opt/portmatch"),
            ]),
        );
        assert_eq!(
            path.dirs(),
            &[
                PathBuf::from("/a"),
                PathBuf::from("/b"),
                PathBuf::from("/opt/portmatch/platform_db"),
            ]
        );
    }

    #[test]
    fn default_root_is_used_without_env() {
        let path = SearchPath::from_env(IFC_DB_PATH_ENV, IFC_DB_DIR, lookup_from(&[]));
        assert_eq!(
            path.default_dir(),
            Some(Path::new("/usr/share/portmatch/afu_top_ifc_db"))
        );
        assert_eq!(path.dirs().len(), 1);
    }

    #[test]
    fn release_dir_is_included_only_when_present() {
        let root_guard = TempDirGuard::new("release");
        let root = root_guard.path().to_path_buf();
        let root_str = root.to_string_lossy().into_owned();

        let missing = SearchPath::from_env(
            PLATFORM_DB_PATH_ENV,
            PLATFORM_DB_DIR,
            lookup_from(&[(PLATFORM_ROOT_ENV, root_str.as_str())]),
        );
        assert_eq!(missing.dirs().len(), 1);

        let release_dir = root.join("hw/lib/platform/platform_db");
        fs::create_dir_all(&release_dir).expect("release dir should be created");
        let present = SearchPath::from_env(
            PLATFORM_DB_PATH_ENV,
            PLATFORM_DB_DIR,
            lookup_from(&[(PLATFORM_ROOT_ENV, root_str.as_str())]),
        );
        assert_eq!(present.dirs().len(), 2);
        assert_eq!(present.dirs()[0], release_dir);
    }

    #[test]
    fn find_returns_first_hit_in_order() {
        let first_guard = TempDirGuard::new("first");
        let first = first_guard.path().to_path_buf();
        let second_guard = TempDirGuard::new("second");
        let second = second_guard.path().to_path_buf();
        fs::write(second.join("dcp.json"), "{}").expect("fixture should write");
        fs::write(first.join("dcp.json"), "{}").expect("fixture should write");

        let path = SearchPath::new(vec![first.clone(), second.clone()]);
        assert_eq!(path.find("dcp"), Some(first.join("dcp.json")));
        assert_eq!(path.find("missing"), None);
    }
}
