use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub cmd: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl LaunchPlan {
    pub fn debug_command(&self) -> String {
        let mut parts = vec![self.cmd.as_str()];
        parts.extend(self.args.iter().map(String::as_str));
        shlex::try_join(parts.iter().copied()).unwrap_or_else(|_| parts.join(" "))
    }
}

/// Keeps console programs from flashing a window under the GUI subsystem.
fn hide_console_window(command: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = command;
}

/// Spawns the plan with stdout and stderr appended to `log_path` when given.
pub fn spawn_logged(plan: &LaunchPlan, log_path: Option<&Path>) -> Result<Child, String> {
    if !plan.cwd.exists() {
        fs::create_dir_all(&plan.cwd).map_err(|error| {
            format!(
                "Failed to create working directory {}: {}",
                plan.cwd.display(),
                error
            )
        })?;
    }

    let mut command = Command::new(&plan.cmd);
    command
        .args(&plan.args)
        .current_dir(&plan.cwd)
        .stdin(Stdio::null());
    hide_console_window(&mut command);
    for (key, value) in &plan.env {
        command.env(key, value);
    }

    match log_path {
        Some(log_path) => {
            if let Some(log_parent) = log_path.parent() {
                fs::create_dir_all(log_parent).map_err(|error| {
                    format!(
                        "Failed to create log directory {}: {}",
                        log_parent.display(),
                        error
                    )
                })?;
            }
            let stdout_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .map_err(|error| format!("Failed to open log {}: {}", log_path.display(), error))?;
            let stderr_file = stdout_file
                .try_clone()
                .map_err(|error| format!("Failed to clone log handle: {error}"))?;
            command.stdout(Stdio::from(stdout_file));
            command.stderr(Stdio::from(stderr_file));
        }
        None => {
            command.stdout(Stdio::null());
            command.stderr(Stdio::null());
        }
    }

    command.spawn().map_err(|error| {
        format!(
            "Failed to spawn process with command {}: {}",
            plan.debug_command(),
            error
        )
    })
}

pub fn stop_child_process(child: &mut Child) {
    #[cfg(target_os = "windows")]
    {
        let mut taskkill = Command::new("taskkill");
        taskkill
            .args(["/pid", &child.id().to_string(), "/t", "/f"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
        hide_console_window(&mut taskkill);
        let _ = taskkill.status();
        let _ = child.wait();
    }

    #[cfg(not(target_os = "windows"))]
    {
        let _ = child.kill();
        let _ = child.wait();
    }
}
