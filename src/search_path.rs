use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use semver::Version;

const NODE_PATH_ENV: &str = "NODE_PATH";
const NVM_DIR_ENV: &str = "NVM_DIR";

/// Prepends `dir` to `PATH` unless it is already listed.
pub fn modify_path(dir: &Path) {
    if let Some(updated) = prepend_search_path(env::var_os("PATH"), dir) {
        env::set_var("PATH", updated);
    }
}

/// Returns the new search path, or `None` when nothing needs to change.
pub(crate) fn prepend_search_path(existing: Option<OsString>, dir: &Path) -> Option<OsString> {
    if dir.as_os_str().is_empty() {
        return None;
    }

    let mut entries: Vec<PathBuf> = existing
        .as_deref()
        .map(|value| env::split_paths(value).collect())
        .unwrap_or_default();
    if entries.iter().any(|entry| entry == dir) {
        return None;
    }

    entries.insert(0, dir.to_path_buf());
    env::join_paths(entries).ok()
}

pub fn node_modules_dir(resource_root: &Path) -> PathBuf {
    resource_root.join("node").join("node_modules")
}

/// Points `NODE_PATH` at the bundled node runtime's modules.
pub fn set_node_path(resource_root: &Path) {
    let modules_dir = node_modules_dir(resource_root);
    if let Some(updated) = prepend_search_path(env::var_os(NODE_PATH_ENV), &modules_dir) {
        env::set_var(NODE_PATH_ENV, updated);
    }
}

pub fn default_nvm_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os(NVM_DIR_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|home| home.join(".nvm"))
}

pub fn get_nvm_path() -> Option<PathBuf> {
    default_nvm_dir().and_then(|dir| resolve_nvm_bin_dir(&dir))
}

/// Resolves the `bin` directory of the node version nvm uses by default.
pub(crate) fn resolve_nvm_bin_dir(nvm_dir: &Path) -> Option<PathBuf> {
    let versions_dir = nvm_dir.join("versions").join("node");
    let installed = installed_node_versions(&versions_dir);
    if installed.is_empty() {
        return None;
    }

    let alias = fs::read_to_string(nvm_dir.join("alias").join("default"))
        .map(|raw| raw.trim().to_string())
        .unwrap_or_default();
    let selected = select_node_version(&alias, &installed)?;

    let bin_dir = versions_dir.join(format!("v{selected}")).join("bin");
    bin_dir.is_dir().then_some(bin_dir)
}

fn installed_node_versions(versions_dir: &Path) -> Vec<Version> {
    let Ok(entries) = fs::read_dir(versions_dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            Version::parse(name.strip_prefix('v')?).ok()
        })
        .collect()
}

/// Picks the highest installed version matching an nvm alias such as
/// `20`, `v18.19`, `v20.11.1`, `node` or `lts/*`.
pub(crate) fn select_node_version(alias: &str, installed: &[Version]) -> Option<Version> {
    let alias = alias.trim();
    let wants_latest =
        alias.is_empty() || matches!(alias, "node" | "stable") || alias.starts_with("lts/");

    let prefix: Vec<u64> = if wants_latest {
        Vec::new()
    } else {
        let parts: Option<Vec<u64>> = alias
            .trim_start_matches('v')
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect();
        parts?
    };

    installed
        .iter()
        .filter(|version| {
            let components = [version.major, version.minor, version.patch];
            prefix
                .iter()
                .zip(components.iter())
                .all(|(wanted, actual)| wanted == actual)
        })
        .max()
        .cloned()
}
