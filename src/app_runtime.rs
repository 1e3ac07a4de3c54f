use std::path::PathBuf;

use tauri::{webview::PageLoadEvent, AppHandle, Emitter, Manager, RunEvent, WindowEvent};

use crate::{
    append_desktop_log, append_shutdown_log, append_startup_log, ipc_commands,
    lifecycle::{self, LifecycleAction, LifecycleEvent},
    logging,
    runtime_env::{self, DesktopEnv, Platform},
    search_path,
    service::ServiceState,
    startup, updater, window_actions, AppState, PendingUpdate, DESKTOP_LOG_FILE,
    MAIN_PROCESS_MESSAGE_EVENT, MAIN_WINDOW_LABEL,
};

fn resource_root(app_handle: &AppHandle, env: &DesktopEnv) -> PathBuf {
    if tauri::is_dev() {
        return env.app_root.clone();
    }
    match app_handle.path().resource_dir() {
        Ok(dir) => dir,
        Err(error) => {
            append_startup_log(&format!(
                "failed to resolve resource directory, using app root: {error}"
            ));
            env.app_root.clone()
        }
    }
}

/// Prepares the search path, starts the MCP host and opens the main window.
/// Every step tolerates having run before.
fn run_ready_sequence(app_handle: &AppHandle) {
    let state = app_handle.state::<AppState>();
    let resource_root = resource_root(app_handle, &state.env);

    let plan = startup::plan_startup(state.platform, &resource_root, search_path::get_nvm_path);
    startup::apply_startup_plan(&plan, append_startup_log);

    let service = app_handle.state::<ServiceState>();
    match service.init_mcp_client(Some(&resource_root)) {
        Ok(true) => append_startup_log(&format!("MCP host started on port {}", service.port)),
        Ok(false) if service.is_host_running() => {
            append_startup_log("MCP host already running");
        }
        Ok(false) => {}
        Err(error) => append_startup_log(&format!("failed to start MCP host: {error}")),
    }

    window_actions::dispatch_lifecycle_event(app_handle, LifecycleEvent::Ready, append_startup_log);
}

fn handle_all_windows_closed(app_handle: &AppHandle, api: &tauri::ExitRequestApi) {
    let action = app_handle
        .state::<AppState>()
        .handle_lifecycle(LifecycleEvent::AllWindowsClosed);
    append_shutdown_log(&format!("all windows closed -> {action:?}"));

    match action {
        LifecycleAction::StayResident => api.prevent_exit(),
        LifecycleAction::CleanupThenExit => {
            api.prevent_exit();
            let exit_handle = app_handle.clone();
            tauri::async_runtime::spawn(async move {
                let service = exit_handle.state::<ServiceState>();
                lifecycle::cleanup_then_exit(service.cleanup(), || {
                    append_shutdown_log("cleanup finished, exiting");
                    exit_handle.exit(0);
                })
                .await;
            });
        }
        _ => {}
    }
}

fn handle_exit(app_handle: &AppHandle) {
    let service = app_handle.state::<ServiceState>();
    tauri::async_runtime::block_on(service.cleanup());
}

pub(crate) fn run() {
    match logging::init_logging(
        runtime_env::default_log_dir().as_deref(),
        DESKTOP_LOG_FILE,
    ) {
        Ok(Some(path)) => append_startup_log(&format!("desktop log path: {}", path.display())),
        Ok(None) => append_startup_log("desktop log file disabled: home directory not found"),
        Err(error) => eprintln!("failed to initialize logging: {error}"),
    }
    append_startup_log("desktop process starting");

    let platform = Platform::current();
    let env = DesktopEnv::from_process_env();
    env.export();
    append_startup_log(&format!(
        "app root: {} renderer dist: {} dev server: {}",
        env.app_root.display(),
        env.renderer_dist.display(),
        env.dev_server_url
            .as_ref()
            .map(|url| url.as_str())
            .unwrap_or("none")
    ));

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app_handle, argv, _cwd| {
            append_desktop_log(&format!("second instance launched with {} args", argv.len()));
            window_actions::dispatch_lifecycle_event(
                app_handle,
                LifecycleEvent::SecondInstance,
                append_desktop_log,
            );
        }))
        .plugin(tauri_plugin_process::init())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .manage(AppState::new(platform, env))
        .manage(ServiceState::default())
        .manage(PendingUpdate::default())
        .invoke_handler(tauri::generate_handler![
            ipc_commands::open_win,
            ipc_commands::api_port,
            ipc_commands::api_get_resources,
            ipc_commands::fs_open_scripts_dir,
            ipc_commands::api_fill_path_to_config,
            ipc_commands::api_openai_model_list,
            ipc_commands::api_anthropic_model_list,
            ipc_commands::api_ollama_model_list,
            ipc_commands::api_openai_compatible_model_list,
            ipc_commands::check_update,
            ipc_commands::start_download,
            ipc_commands::quit_and_install,
        ])
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }

            let state = window.app_handle().state::<AppState>();
            match event {
                WindowEvent::Resized(_) => {
                    let event = match window.is_minimized() {
                        Ok(true) => LifecycleEvent::Minimized,
                        Ok(false) => LifecycleEvent::Restored,
                        Err(error) => {
                            append_desktop_log(&format!(
                                "failed to read main window state: {error}"
                            ));
                            return;
                        }
                    };
                    state.handle_lifecycle(event);
                }
                WindowEvent::Destroyed => {
                    state.handle_lifecycle(LifecycleEvent::WindowDestroyed);
                    append_desktop_log("main window destroyed");
                }
                _ => {}
            }
        })
        .on_page_load(|webview, payload| {
            if let PageLoadEvent::Finished = payload.event() {
                append_desktop_log(&format!("page-load finished: {}", payload.url()));
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                if let Err(error) =
                    webview.emit_to(webview.label(), MAIN_PROCESS_MESSAGE_EVENT, timestamp)
                {
                    append_desktop_log(&format!(
                        "failed to emit {MAIN_PROCESS_MESSAGE_EVENT}: {error}"
                    ));
                }
            }
        })
        .setup(|app| {
            let app_handle = app.handle().clone();
            run_ready_sequence(&app_handle);
            updater::spawn_startup_update_check(app_handle);
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { code: None, api, .. } => {
                handle_all_windows_closed(app_handle, &api);
            }
            RunEvent::Exit => {
                handle_exit(app_handle);
            }
            #[cfg(target_os = "macos")]
            RunEvent::Reopen { .. } => {
                let action = app_handle
                    .state::<AppState>()
                    .handle_lifecycle(LifecycleEvent::Reactivate);
                append_desktop_log(&format!("reactivated -> {action:?}"));
                if action == LifecycleAction::CreateWindow {
                    run_ready_sequence(app_handle);
                } else {
                    window_actions::apply_lifecycle_action(app_handle, action, append_desktop_log);
                }
            }
            _ => {}
        });
}
