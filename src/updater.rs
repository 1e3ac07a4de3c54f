use std::time::Instant;

use tauri::{AppHandle, Emitter, Manager};
use tauri_plugin_updater::UpdaterExt;

use crate::{
    append_desktop_log, append_startup_log, PendingUpdate, UpdateAvailablePayload,
    UpdateErrorPayload, UpdateProgressPayload, MAIN_WINDOW_LABEL, UPDATE_AVAILABLE_EVENT,
    UPDATE_DOWNLOADED_EVENT, UPDATE_ERROR_EVENT, UPDATE_PROGRESS_EVENT,
};

fn store_pending(app_handle: &AppHandle, update: Option<tauri_plugin_updater::Update>) {
    let pending = app_handle.state::<PendingUpdate>();
    match pending.0.lock() {
        Ok(mut guard) => *guard = update,
        Err(poisoned) => *poisoned.into_inner() = update,
    }
}

fn take_pending(app_handle: &AppHandle) -> Option<tauri_plugin_updater::Update> {
    let pending = app_handle.state::<PendingUpdate>();
    let taken = match pending.0.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    taken
}

/// Asks the release feed for a newer build and remembers it for
/// `download_and_install`.
pub async fn check_for_update(app_handle: &AppHandle) -> Result<UpdateAvailablePayload, String> {
    let current_version = app_handle.package_info().version.to_string();
    let updater = app_handle
        .updater()
        .map_err(|error| format!("Failed to initialize updater: {error}"))?;

    let check_started = Instant::now();
    let update = updater
        .check()
        .await
        .map_err(|error| format!("Failed to check for updates: {error}"))?;
    let new_version = update.as_ref().map(|update| update.version.clone());
    append_desktop_log(&format!(
        "update check finished: current_version={} latest_version={} elapsed_ms={}",
        current_version,
        new_version.as_deref().unwrap_or(&current_version),
        check_started.elapsed().as_millis()
    ));

    store_pending(app_handle, update);
    Ok(UpdateAvailablePayload {
        update: new_version.is_some(),
        version: current_version,
        new_version,
    })
}

/// Silent check at startup. Failures only reach the log, since a missing
/// release feed is normal for fresh installs.
pub fn spawn_startup_update_check(app_handle: AppHandle) {
    tauri::async_runtime::spawn(async move {
        match check_for_update(&app_handle).await {
            Ok(payload) if payload.update => {
                append_startup_log(&format!(
                    "update available: {}",
                    payload.new_version.as_deref().unwrap_or_default()
                ));
                if let Err(error) =
                    app_handle.emit_to(MAIN_WINDOW_LABEL, UPDATE_AVAILABLE_EVENT, payload)
                {
                    append_startup_log(&format!("failed to emit {UPDATE_AVAILABLE_EVENT}: {error}"));
                }
            }
            Ok(_) => {}
            Err(error) => append_startup_log(&format!("update check skipped: {error}")),
        }
    });
}

fn emit_update_error(app_handle: &AppHandle, message: String) {
    append_desktop_log(&message);
    if let Err(error) = app_handle.emit_to(
        MAIN_WINDOW_LABEL,
        UPDATE_ERROR_EVENT,
        UpdateErrorPayload {
            message: message.clone(),
        },
    ) {
        append_desktop_log(&format!("failed to emit {UPDATE_ERROR_EVENT}: {error}"));
    }
}

/// Downloads and installs the pending update, reporting progress to the
/// main window. Installing still needs `quit_and_install` to take effect.
pub async fn download_and_install(app_handle: &AppHandle) -> Result<(), String> {
    let update = match take_pending(app_handle) {
        Some(update) => update,
        None => {
            let payload = check_for_update(app_handle).await.map_err(|error| {
                emit_update_error(app_handle, error.clone());
                error
            })?;
            if !payload.update {
                return Err("No update available.".to_string());
            }
            take_pending(app_handle).ok_or_else(|| "No update available.".to_string())?
        }
    };

    append_desktop_log(&format!("downloading update {}", update.version));
    let progress_handle = app_handle.clone();
    let finished_handle = app_handle.clone();
    let mut transferred: u64 = 0;
    let result = update
        .download_and_install(
            move |chunk_length, content_length| {
                transferred += chunk_length as u64;
                let payload = UpdateProgressPayload::new(transferred, content_length);
                if let Err(error) =
                    progress_handle.emit_to(MAIN_WINDOW_LABEL, UPDATE_PROGRESS_EVENT, payload)
                {
                    append_desktop_log(&format!("failed to emit {UPDATE_PROGRESS_EVENT}: {error}"));
                }
            },
            move || {
                append_desktop_log("update download finished");
                if let Err(error) =
                    finished_handle.emit_to(MAIN_WINDOW_LABEL, UPDATE_DOWNLOADED_EVENT, ())
                {
                    append_desktop_log(&format!(
                        "failed to emit {UPDATE_DOWNLOADED_EVENT}: {error}"
                    ));
                }
            },
        )
        .await;

    if let Err(error) = result {
        let message = format!("Failed to install update {}: {error}", update.version);
        emit_update_error(app_handle, message.clone());
        return Err(message);
    }

    append_desktop_log(&format!("update {} installed", update.version));
    Ok(())
}
