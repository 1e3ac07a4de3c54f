use std::{
    ffi::OsStr,
    path::Path,
    process::{Command, Stdio},
};

use url::Url;

pub(crate) fn parse_openable_url(raw_url: &str, allowed_schemes: &[&str]) -> Result<Url, String> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err("Missing external URL.".to_string());
    }

    let parsed = Url::parse(trimmed).map_err(|error| format!("Invalid URL: {error}"))?;
    if allowed_schemes.contains(&parsed.scheme()) {
        Ok(parsed)
    } else {
        Err(format!(
            "Unsupported URL scheme '{}', only {} allowed.",
            parsed.scheme(),
            allowed_schemes.join("/")
        ))
    }
}

/// Opens a secure link in the user's browser.
pub fn open_external_url(raw_url: &str) -> Result<(), String> {
    let parsed = parse_openable_url(raw_url, &["https"])?;
    open_with_system_handler(OsStr::new(parsed.as_str()), false)
}

/// Reveals a directory or file in the platform file manager.
pub fn open_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Path does not exist: {}", path.display()));
    }
    open_with_system_handler(path.as_os_str(), true)
}

fn spawn_detached(program: &str, args: &[&OsStr]) -> Result<(), String> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run '{program}': {error}"))
}

#[cfg(target_os = "macos")]
fn open_with_system_handler(target: &OsStr, _is_path: bool) -> Result<(), String> {
    spawn_detached("open", &[target])
}

#[cfg(target_os = "windows")]
fn open_with_system_handler(target: &OsStr, is_path: bool) -> Result<(), String> {
    if is_path {
        spawn_detached("explorer", &[target])
    } else {
        spawn_detached(
            "rundll32",
            &[OsStr::new("url.dll,FileProtocolHandler"), target],
        )
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn open_with_system_handler(target: &OsStr, _is_path: bool) -> Result<(), String> {
    spawn_detached("xdg-open", &[target])
}

#[cfg(not(any(target_os = "macos", target_os = "windows", unix)))]
fn open_with_system_handler(_target: &OsStr, _is_path: bool) -> Result<(), String> {
    Err("Opening external targets is not supported on this platform.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_openable_url_accepts_allowed_schemes() {
        let parsed = parse_openable_url(" https://dive.example/docs ", &["https"])
            .expect("https should be accepted");
        assert_eq!(parsed.as_str(), "https://dive.example/docs");
    }

    #[test]
    fn parse_openable_url_rejects_other_schemes() {
        let error = parse_openable_url("http://dive.example", &["https"])
            .expect_err("http should be rejected");
        assert!(error.contains("Unsupported URL scheme 'http'"));
        assert!(parse_openable_url("file:///etc/passwd", &["http", "https"]).is_err());
    }

    #[test]
    fn parse_openable_url_rejects_blank_and_invalid_input() {
        assert_eq!(
            parse_openable_url("   ", &["https"]),
            Err("Missing external URL.".to_string())
        );
        assert!(parse_openable_url("not a url", &["https"])
            .expect_err("invalid")
            .starts_with("Invalid URL"));
    }

    #[test]
    fn open_path_rejects_missing_paths() {
        let temp = tempfile::tempdir().expect("temp dir");
        let missing = temp.path().join("missing");
        assert!(open_path(&missing)
            .expect_err("missing path")
            .starts_with("Path does not exist"));
    }
}
