use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Child,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use crate::{
    append_desktop_log, append_shutdown_log,
    process_control::{self, LaunchPlan},
    runtime_env, DEFAULT_SERVICE_PORT, MCP_CONFIG_FILE, MCP_HOST_CMD_ENV, MCP_HOST_LOG_FILE,
    SCRIPTS_DIR_ENV, SERVICE_PORT_ENV,
};

const BUNDLED_BIN_DIRS: [&str; 3] = ["node", "uv", "python"];

/// Owns the MCP host process and the locations it shares with the renderer.
#[derive(Debug)]
pub struct ServiceState {
    pub port: u16,
    pub scripts_dir: PathBuf,
    pub config_path: PathBuf,
    pub log_dir: Option<PathBuf>,
    child: Mutex<Option<Child>>,
    cleaned_up: AtomicBool,
}

impl Default for ServiceState {
    fn default() -> Self {
        let root_dir = runtime_env::default_dive_root_dir()
            .unwrap_or_else(|| env::temp_dir().join("dive"));
        let scripts_dir = env::var(SCRIPTS_DIR_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| root_dir.join("scripts"));

        Self::new(
            parse_service_port(env::var(SERVICE_PORT_ENV).ok().as_deref()),
            scripts_dir,
            root_dir.join(MCP_CONFIG_FILE),
            runtime_env::default_log_dir(),
        )
    }
}

impl ServiceState {
    pub fn new(
        port: u16,
        scripts_dir: PathBuf,
        config_path: PathBuf,
        log_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            port,
            scripts_dir,
            config_path,
            log_dir,
            child: Mutex::new(None),
            cleaned_up: AtomicBool::new(false),
        }
    }

    pub fn ensure_scripts_dir(&self) -> Result<&Path, String> {
        fs::create_dir_all(&self.scripts_dir).map_err(|error| {
            format!(
                "Failed to create scripts directory {}: {}",
                self.scripts_dir.display(),
                error
            )
        })?;
        Ok(&self.scripts_dir)
    }

    pub fn is_host_running(&self) -> bool {
        self.child
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Starts the MCP host. Returns `Ok(false)` when no host is configured or
    /// bundled, and when one is already running.
    pub fn init_mcp_client(&self, resource_root: Option<&Path>) -> Result<bool, String> {
        let mut guard = self
            .child
            .lock()
            .map_err(|_| "MCP host process lock poisoned.".to_string())?;
        if guard.is_some() {
            return Ok(false);
        }

        let custom_cmd = env::var(MCP_HOST_CMD_ENV).ok();
        let bundled_host = resource_root.map(bundled_host_path);
        let Some(plan) = self.resolve_host_launch_plan(custom_cmd.as_deref(), bundled_host)? else {
            append_desktop_log("MCP host is not configured or bundled; skipping startup");
            return Ok(false);
        };

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }
        self.ensure_scripts_dir()?;

        let log_path = self.log_dir.as_ref().map(|dir| dir.join(MCP_HOST_LOG_FILE));
        append_desktop_log(&format!(
            "starting MCP host: {} (port {})",
            plan.debug_command(),
            self.port
        ));
        let child = process_control::spawn_logged(&plan, log_path.as_deref())?;
        *guard = Some(child);
        self.cleaned_up.store(false, Ordering::Release);
        Ok(true)
    }

    pub(crate) fn resolve_host_launch_plan(
        &self,
        custom_cmd: Option<&str>,
        bundled_host: Option<PathBuf>,
    ) -> Result<Option<LaunchPlan>, String> {
        let (cmd, args) = match custom_cmd.map(str::trim).filter(|value| !value.is_empty()) {
            Some(custom_cmd) => {
                let mut pieces = shlex::split(custom_cmd)
                    .ok_or_else(|| format!("Invalid {MCP_HOST_CMD_ENV}: {custom_cmd}"))?;
                if pieces.is_empty() {
                    return Err(format!("{MCP_HOST_CMD_ENV} is empty."));
                }
                let cmd = pieces.remove(0);
                (cmd, pieces)
            }
            None => match bundled_host.filter(|path| path.is_file()) {
                Some(path) => (path.to_string_lossy().to_string(), Vec::new()),
                None => return Ok(None),
            },
        };

        let cwd = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(env::temp_dir);

        Ok(Some(LaunchPlan {
            cmd,
            args,
            cwd,
            env: vec![
                ("DIVE_PORT".to_string(), self.port.to_string()),
                (
                    "DIVE_CONFIG_PATH".to_string(),
                    self.config_path.to_string_lossy().to_string(),
                ),
                (
                    "DIVE_SCRIPTS_DIR".to_string(),
                    self.scripts_dir.to_string_lossy().to_string(),
                ),
            ],
        }))
    }

    /// Stops the MCP host. Safe to call more than once.
    pub async fn cleanup(&self) {
        if self.cleaned_up.swap(true, Ordering::AcqRel) {
            return;
        }

        let child = match self.child.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(mut child) = child else {
            append_shutdown_log("cleanup: no MCP host process to stop");
            return;
        };

        append_shutdown_log(&format!("cleanup: stopping MCP host pid={}", child.id()));
        let stopped = tokio::task::spawn_blocking(move || {
            process_control::stop_child_process(&mut child);
        })
        .await;
        if let Err(error) = stopped {
            append_shutdown_log(&format!("cleanup: failed to join MCP host stop task: {error}"));
        }
    }
}

pub fn bin_dir_list(resource_root: &Path) -> Vec<PathBuf> {
    BUNDLED_BIN_DIRS
        .iter()
        .map(|name| resource_root.join(name))
        .collect()
}

fn bundled_host_path(resource_root: &Path) -> PathBuf {
    let binary = if cfg!(target_os = "windows") {
        "mcp-host.exe"
    } else {
        "mcp-host"
    };
    resource_root.join("mcp-host").join(binary)
}

pub(crate) fn parse_service_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port > 0)
        .unwrap_or(DEFAULT_SERVICE_PORT)
}
