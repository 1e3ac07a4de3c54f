use std::{env, path::PathBuf};

use url::Url;

use crate::{APP_ROOT_ENV, DEV_SERVER_URL_ENV, PUBLIC_DIR_ENV};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// macOS apps stay resident after their last window closes.
    pub fn keeps_running_without_windows(self) -> bool {
        self == Platform::MacOs
    }
}

/// Process-wide locations the shell and its child processes agree on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEnv {
    pub app_root: PathBuf,
    pub renderer_dist: PathBuf,
    pub public_dir: PathBuf,
    pub dev_server_url: Option<Url>,
}

impl DesktopEnv {
    pub fn from_process_env() -> Self {
        Self::resolve(|key| env::var(key).ok(), default_app_root())
    }

    pub fn resolve<F>(lookup: F, default_root: PathBuf) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_root = lookup(APP_ROOT_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or(default_root);
        let dev_server_url = lookup(DEV_SERVER_URL_ENV)
            .and_then(|value| normalize_dev_server_url(&value));
        let renderer_dist = app_root.join("dist");
        let public_dir = if dev_server_url.is_some() {
            app_root.join("public")
        } else {
            renderer_dist.clone()
        };

        Self {
            app_root,
            renderer_dist,
            public_dir,
            dev_server_url,
        }
    }

    /// Publishes `APP_ROOT` and `VITE_PUBLIC` for child processes.
    pub fn export(&self) {
        env::set_var(APP_ROOT_ENV, &self.app_root);
        env::set_var(PUBLIC_DIR_ENV, &self.public_dir);
    }
}

fn normalize_dev_server_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed),
        _ => None,
    }
}

fn default_app_root() -> PathBuf {
    if tauri::is_dev() {
        let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        return candidate.canonicalize().unwrap_or(candidate);
    }

    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Root of the per-user Dive data directory (`~/.dive`).
pub fn default_dive_root_dir() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".dive"))
}

pub fn default_log_dir() -> Option<PathBuf> {
    default_dive_root_dir().map(|root| root.join("logs"))
}
