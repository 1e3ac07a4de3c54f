#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod ipc_commands;
mod lifecycle;
mod logging;
mod main_window;
mod mcp_config;
mod model_list;
mod process_control;
mod runtime_env;
mod search_path;
mod service;
mod startup;
mod system_open;
mod updater;
mod window_actions;

pub(crate) use app_constants::*;
pub(crate) use app_types::{
    AppState, PendingUpdate, UpdateAvailablePayload, UpdateErrorPayload, UpdateProgressPayload,
};
pub(crate) use logging::{append_desktop_log, append_shutdown_log, append_startup_log};

fn main() {
    app_runtime::run();
}
