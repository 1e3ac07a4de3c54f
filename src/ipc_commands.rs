use std::path::{Path, PathBuf};

use tauri::{AppHandle, Manager};

use crate::{
    append_desktop_log, main_window, mcp_config,
    model_list::{self, ModelProvider},
    service::ServiceState,
    system_open, updater, AppState, UpdateAvailablePayload,
};

fn resolve_resource_path(resource_dir: Option<&Path>, relative: &str) -> String {
    match resource_dir {
        Some(dir) => dir.join(relative).to_string_lossy().to_string(),
        None => relative.to_string(),
    }
}

#[tauri::command]
pub(crate) async fn open_win(app_handle: AppHandle, arg: String) -> Result<(), String> {
    let state = app_handle.state::<AppState>();
    let port = app_handle.state::<ServiceState>().port;
    main_window::open_child_window(
        &app_handle,
        &state.env,
        state.platform,
        port,
        &arg,
        append_desktop_log,
    )
    .map(|_| ())
}

#[tauri::command]
pub(crate) fn api_port(app_handle: AppHandle) -> u16 {
    app_handle.state::<ServiceState>().port
}

/// Resolves a renderer-relative resource. Development builds read straight
/// from the working tree.
#[tauri::command]
pub(crate) fn api_get_resources(app_handle: AppHandle, p: String) -> Result<String, String> {
    if tauri::is_dev() {
        return Ok(resolve_resource_path(None, &p));
    }
    let resource_dir: PathBuf = app_handle
        .path()
        .resource_dir()
        .map_err(|error| format!("Failed to resolve resource directory: {error}"))?;
    Ok(resolve_resource_path(Some(&resource_dir), &p))
}

#[tauri::command]
pub(crate) fn fs_open_scripts_dir(app_handle: AppHandle) -> Result<(), String> {
    let service = app_handle.state::<ServiceState>();
    let scripts_dir = service.ensure_scripts_dir()?;
    system_open::open_path(scripts_dir).inspect_err(|error| append_desktop_log(error))
}

#[tauri::command]
pub(crate) fn api_fill_path_to_config(app_handle: AppHandle, config: String) -> String {
    let service = app_handle.state::<ServiceState>();
    mcp_config::fill_path_to_config(&config, &service.scripts_dir)
}

#[tauri::command]
pub(crate) async fn api_openai_model_list(api_key: String) -> Vec<String> {
    model_list::list_provider_models(
        ModelProvider::OpenAi {
            api_key,
            base_url: None,
        },
        append_desktop_log,
    )
    .await
}

#[tauri::command]
pub(crate) async fn api_anthropic_model_list(
    api_key: String,
    base_url: Option<String>,
) -> Vec<String> {
    model_list::list_provider_models(
        ModelProvider::Anthropic { api_key, base_url },
        append_desktop_log,
    )
    .await
}

#[tauri::command]
pub(crate) async fn api_ollama_model_list(base_url: Option<String>) -> Vec<String> {
    model_list::list_provider_models(ModelProvider::Ollama { host: base_url }, append_desktop_log)
        .await
}

#[tauri::command]
pub(crate) async fn api_openai_compatible_model_list(
    api_key: String,
    base_url: Option<String>,
) -> Vec<String> {
    model_list::list_provider_models(
        ModelProvider::OpenAiCompatible { api_key, base_url },
        append_desktop_log,
    )
    .await
}

#[tauri::command]
pub(crate) async fn check_update(app_handle: AppHandle) -> Result<UpdateAvailablePayload, String> {
    updater::check_for_update(&app_handle).await
}

#[tauri::command]
pub(crate) async fn start_download(app_handle: AppHandle) -> Result<(), String> {
    updater::download_and_install(&app_handle).await
}

#[tauri::command]
pub(crate) fn quit_and_install(app_handle: AppHandle) {
    append_desktop_log("restarting to apply update");
    app_handle.restart();
}
