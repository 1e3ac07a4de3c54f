use tauri::{AppHandle, Manager};

use crate::{
    lifecycle::{LifecycleAction, LifecycleEvent},
    main_window,
    service::ServiceState,
    AppState, MAIN_WINDOW_LABEL,
};

pub fn focus_main_window<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str),
{
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        log("focus_main_window skipped: main window not found");
        return;
    };
    main_window::restore_and_focus(&window, log);
}

/// Builds the main window and records it in the lifecycle state.
pub fn open_main_window<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str) + Copy + Send + Sync + 'static,
{
    let state = app_handle.state::<AppState>();
    let port = app_handle.state::<ServiceState>().port;
    match main_window::create_main_window(app_handle, &state.env, state.platform, port, log) {
        Ok(_) => {
            state.handle_lifecycle(LifecycleEvent::WindowCreated);
        }
        Err(error) => log(&error),
    }
}

/// Carries out a window-level lifecycle decision. Exit decisions belong to
/// the run loop and are ignored here.
pub fn apply_lifecycle_action<F>(app_handle: &AppHandle, action: LifecycleAction, log: F)
where
    F: Fn(&str) + Copy + Send + Sync + 'static,
{
    match action {
        LifecycleAction::CreateWindow => open_main_window(app_handle, log),
        LifecycleAction::RestoreAndFocus | LifecycleAction::Focus => {
            focus_main_window(app_handle, log)
        }
        LifecycleAction::None
        | LifecycleAction::StayResident
        | LifecycleAction::CleanupThenExit => {}
    }
}

pub fn dispatch_lifecycle_event<F>(app_handle: &AppHandle, event: LifecycleEvent, log: F)
where
    F: Fn(&str) + Copy + Send + Sync + 'static,
{
    let state = app_handle.state::<AppState>();
    let action = state.handle_lifecycle(event);
    log(&format!(
        "lifecycle {event:?} -> {action:?} (window {:?})",
        state.presence()
    ));
    apply_lifecycle_action(app_handle, action, log);
}
