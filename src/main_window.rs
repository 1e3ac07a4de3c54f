use std::sync::atomic::{AtomicU32, Ordering};

use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use url::Url;

use crate::{
    runtime_env::{DesktopEnv, Platform},
    system_open, APP_TITLE, CHILD_WINDOW_LABEL_PREFIX, MAIN_WINDOW_LABEL,
};

const INDEX_HTML: &str = "index.html";
const INTERNAL_SCHEMES: [&str; 3] = ["tauri", "asset", "ipc"];
const INTERNAL_HOSTS: [&str; 3] = ["tauri.localhost", "asset.localhost", "ipc.localhost"];

static CHILD_WINDOW_COUNTER: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NavigationDecision {
    Allow,
    OpenExternal,
    Deny,
}

/// Keeps the webview on the app's own pages. Secure links leave for the
/// system browser; everything else is dropped.
pub(crate) fn decide_navigation(target: &Url, dev_server_url: Option<&Url>) -> NavigationDecision {
    if INTERNAL_SCHEMES.contains(&target.scheme()) {
        return NavigationDecision::Allow;
    }
    if target
        .host_str()
        .is_some_and(|host| INTERNAL_HOSTS.contains(&host))
    {
        return NavigationDecision::Allow;
    }
    if dev_server_url.is_some_and(|dev| dev.origin() == target.origin()) {
        return NavigationDecision::Allow;
    }
    if target.scheme() == "https" {
        return NavigationDecision::OpenExternal;
    }
    NavigationDecision::Deny
}

pub(crate) fn page_url(env: &DesktopEnv, hash: Option<&str>) -> WebviewUrl {
    let hash = hash.map(str::trim).filter(|value| !value.is_empty());
    match env.dev_server_url.as_ref() {
        Some(dev_url) => {
            let mut url = dev_url.clone();
            url.set_fragment(hash);
            WebviewUrl::External(url)
        }
        None => match hash {
            Some(hash) => WebviewUrl::App(format!("{INDEX_HTML}#{hash}").into()),
            None => WebviewUrl::App(INDEX_HTML.into()),
        },
    }
}

fn bridge_init_script(platform: Platform, port: u16) -> String {
    let platform = match platform {
        Platform::Windows => "win32",
        Platform::MacOs => "darwin",
        Platform::Linux => "linux",
    };
    let bridge = serde_json::json!({ "platform": platform, "port": port });
    format!("(function(){{try{{window.__DIVE_DESKTOP__=Object.freeze({bridge});}}catch(_e){{}}}})();")
}

fn apply_navigation_policy<'a, F>(
    builder: WebviewWindowBuilder<'a, tauri::Wry, AppHandle>,
    env: &DesktopEnv,
    log: F,
) -> WebviewWindowBuilder<'a, tauri::Wry, AppHandle>
where
    F: Fn(&str) + Send + Sync + 'static,
{
    let dev_server_url = env.dev_server_url.clone();
    builder.on_navigation(move |target| {
        match decide_navigation(target, dev_server_url.as_ref()) {
            NavigationDecision::Allow => true,
            NavigationDecision::OpenExternal => {
                if let Err(error) = system_open::open_external_url(target.as_str()) {
                    log(&format!("failed to open external link {target}: {error}"));
                }
                false
            }
            NavigationDecision::Deny => {
                log(&format!("blocked navigation to {target}"));
                false
            }
        }
    })
}

pub fn create_main_window<F>(
    app_handle: &AppHandle,
    env: &DesktopEnv,
    platform: Platform,
    port: u16,
    log: F,
) -> Result<WebviewWindow, String>
where
    F: Fn(&str) + Copy + Send + Sync + 'static,
{
    if let Some(existing) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) {
        log("main window already exists; reusing it");
        return Ok(existing);
    }

    let builder = WebviewWindowBuilder::new(app_handle, MAIN_WINDOW_LABEL, page_url(env, None))
        .title(APP_TITLE)
        .inner_size(1280.0, 800.0)
        .min_inner_size(480.0, 360.0)
        .initialization_script(&bridge_init_script(platform, port));
    let window = apply_navigation_policy(builder, env, log)
        .build()
        .map_err(|error| format!("Failed to create main window: {error}"))?;

    #[cfg(debug_assertions)]
    if env.dev_server_url.is_some() {
        window.open_devtools();
    }

    log("main window created");
    Ok(window)
}

pub fn open_child_window<F>(
    app_handle: &AppHandle,
    env: &DesktopEnv,
    platform: Platform,
    port: u16,
    hash: &str,
    log: F,
) -> Result<WebviewWindow, String>
where
    F: Fn(&str) + Copy + Send + Sync + 'static,
{
    let index = CHILD_WINDOW_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    let label = format!("{CHILD_WINDOW_LABEL_PREFIX}{index}");
    let builder = WebviewWindowBuilder::new(app_handle, &label, page_url(env, Some(hash)))
        .title(APP_TITLE)
        .initialization_script(&bridge_init_script(platform, port));
    let window = apply_navigation_policy(builder, env, log)
        .build()
        .map_err(|error| format!("Failed to create child window {label}: {error}"))?;

    log(&format!("child window {label} opened at #{hash}"));
    Ok(window)
}

pub fn restore_and_focus<F>(window: &WebviewWindow, log: F)
where
    F: Fn(&str),
{
    if let Ok(true) = window.is_minimized() {
        if let Err(error) = window.unminimize() {
            log(&format!("failed to restore window {}: {}", window.label(), error));
        }
    }
    if let Err(error) = window.show() {
        log(&format!("failed to show window {}: {}", window.label(), error));
    }
    if let Err(error) = window.set_focus() {
        log(&format!("failed to focus window {}: {}", window.label(), error));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("valid url")
    }

    fn packaged_env() -> DesktopEnv {
        DesktopEnv::resolve(|_| None, PathBuf::from("/opt/dive"))
    }

    fn dev_env() -> DesktopEnv {
        DesktopEnv::resolve(
            |key| (key == crate::DEV_SERVER_URL_ENV).then(|| "http://localhost:5173/".to_string()),
            PathBuf::from("/work/dive"),
        )
    }

    #[test]
    fn decide_navigation_allows_app_pages() {
        let dev = url("http://localhost:5173/");
        assert_eq!(
            decide_navigation(&url("tauri://localhost/index.html"), None),
            NavigationDecision::Allow
        );
        assert_eq!(
            decide_navigation(&url("http://tauri.localhost/#/setup"), None),
            NavigationDecision::Allow
        );
        assert_eq!(
            decide_navigation(&url("http://localhost:5173/#/chat"), Some(&dev)),
            NavigationDecision::Allow
        );
    }

    #[test]
    fn decide_navigation_sends_https_links_to_browser() {
        assert_eq!(
            decide_navigation(&url("https://github.com/OpenAgentPlatform/Dive"), None),
            NavigationDecision::OpenExternal
        );
    }

    #[test]
    fn decide_navigation_denies_insecure_and_local_schemes() {
        let dev = url("http://localhost:5173/");
        assert_eq!(
            decide_navigation(&url("http://example.com"), Some(&dev)),
            NavigationDecision::Deny
        );
        assert_eq!(
            decide_navigation(&url("file:///etc/hosts"), None),
            NavigationDecision::Deny
        );
        assert_eq!(
            decide_navigation(&url("http://localhost:3000/"), Some(&dev)),
            NavigationDecision::Deny
        );
    }

    #[test]
    fn page_url_uses_dev_server_with_hash() {
        match page_url(&dev_env(), Some("/settings")) {
            WebviewUrl::External(url) => {
                assert_eq!(url.as_str(), "http://localhost:5173/#/settings")
            }
            other => panic!("unexpected url {other:?}"),
        }
    }

    #[test]
    fn page_url_uses_bundled_index_when_packaged() {
        match page_url(&packaged_env(), Some("/settings")) {
            WebviewUrl::App(path) => assert_eq!(path, PathBuf::from("index.html#/settings")),
            other => panic!("unexpected url {other:?}"),
        }
        match page_url(&packaged_env(), Some("  ")) {
            WebviewUrl::App(path) => assert_eq!(path, PathBuf::from("index.html")),
            other => panic!("unexpected url {other:?}"),
        }
    }

    #[test]
    fn bridge_init_script_exposes_platform_and_port() {
        let script = bridge_init_script(Platform::MacOs, 61990);
        assert!(script.contains(r#""platform":"darwin""#));
        assert!(script.contains(r#""port":61990"#));
    }
}
