use std::path::{Path, PathBuf};

use crate::{runtime_env::Platform, search_path, service};

const MACOS_BIN_DIRS: [&str; 6] = [
    "/opt/homebrew/bin",
    "/opt/homebrew/sbin",
    "/usr/local/bin",
    "/usr/local/sbin",
    "/usr/bin",
    "/usr/sbin",
];

/// What the ready sequence changes in the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartupPlan {
    /// Prepended to `PATH` in order, so the last entry ends up first.
    pub path_dirs: Vec<PathBuf>,
    pub node_path_root: Option<PathBuf>,
    pub nvm_bin_dir: Option<PathBuf>,
}

pub fn plan_startup<F>(platform: Platform, resource_root: &Path, nvm_lookup: F) -> StartupPlan
where
    F: FnOnce() -> Option<PathBuf>,
{
    match platform {
        Platform::Windows => StartupPlan {
            path_dirs: service::bin_dir_list(resource_root),
            node_path_root: Some(resource_root.to_path_buf()),
            nvm_bin_dir: None,
        },
        Platform::MacOs => {
            let mut path_dirs: Vec<PathBuf> = MACOS_BIN_DIRS.iter().map(PathBuf::from).collect();
            let nvm_bin_dir = nvm_lookup();
            if let Some(dir) = nvm_bin_dir.as_ref() {
                path_dirs.push(dir.clone());
            }
            StartupPlan {
                path_dirs,
                node_path_root: None,
                nvm_bin_dir,
            }
        }
        Platform::Linux => StartupPlan::default(),
    }
}

pub fn apply_startup_plan<F>(plan: &StartupPlan, log: F)
where
    F: Fn(&str),
{
    for dir in &plan.path_dirs {
        search_path::modify_path(dir);
    }
    if let Some(root) = plan.node_path_root.as_deref() {
        search_path::set_node_path(root);
    }
    if !plan.path_dirs.is_empty() {
        log(&format!(
            "search path extended with {} director{}",
            plan.path_dirs.len(),
            if plan.path_dirs.len() == 1 { "y" } else { "ies" }
        ));
    }
    if let Some(dir) = plan.nvm_bin_dir.as_deref() {
        log(&format!("nvm default node found at {}", dir.display()));
    }
}
