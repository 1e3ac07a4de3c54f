use std::sync::Mutex;

use crate::{
    lifecycle::{LifecycleAction, LifecycleEvent, WindowLifecycle, WindowPresence},
    runtime_env::{DesktopEnv, Platform},
};

/// Application-owned state handed to every lifecycle callback.
#[derive(Debug)]
pub(crate) struct AppState {
    pub(crate) platform: Platform,
    pub(crate) env: DesktopEnv,
    lifecycle: Mutex<WindowLifecycle>,
}

impl AppState {
    pub(crate) fn new(platform: Platform, env: DesktopEnv) -> Self {
        Self {
            platform,
            env,
            lifecycle: Mutex::new(WindowLifecycle::new(platform)),
        }
    }

    pub(crate) fn presence(&self) -> WindowPresence {
        match self.lifecycle.lock() {
            Ok(lifecycle) => lifecycle.presence(),
            Err(poisoned) => poisoned.into_inner().presence(),
        }
    }

    pub(crate) fn handle_lifecycle(&self, event: LifecycleEvent) -> LifecycleAction {
        match self.lifecycle.lock() {
            Ok(mut lifecycle) => lifecycle.handle(event),
            Err(poisoned) => poisoned.into_inner().handle(event),
        }
    }
}

#[derive(Default)]
pub(crate) struct PendingUpdate(pub(crate) Mutex<Option<tauri_plugin_updater::Update>>);

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateAvailablePayload {
    pub(crate) update: bool,
    pub(crate) version: String,
    pub(crate) new_version: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateProgressPayload {
    pub(crate) total: Option<u64>,
    pub(crate) transferred: u64,
    pub(crate) percent: Option<f64>,
}

impl UpdateProgressPayload {
    pub(crate) fn new(transferred: u64, total: Option<u64>) -> Self {
        let percent = total
            .filter(|total| *total > 0)
            .map(|total| (transferred as f64 / total as f64 * 100.0).min(100.0));
        Self {
            total,
            transferred,
            percent,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct UpdateErrorPayload {
    pub(crate) message: String,
}
