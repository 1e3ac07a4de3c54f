use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const SCRIPT_EXTENSIONS: [&str; 6] = ["js", "mjs", "cjs", "ts", "mts", "cts"];

/// Top level of the MCP host config. Server entries stay raw JSON so that
/// servers of any transport survive a rewrite untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpConfig {
    pub mcp_servers: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rewrites missing script arguments to files that live in `scripts_dir`.
///
/// Input that does not parse as an MCP config is returned untouched.
pub fn fill_path_to_config(raw_config: &str, scripts_dir: &Path) -> String {
    fill_path_to_config_with(raw_config, scripts_dir, |path| path.exists())
}

pub(crate) fn fill_path_to_config_with<F>(
    raw_config: &str,
    scripts_dir: &Path,
    exists: F,
) -> String
where
    F: Fn(&Path) -> bool,
{
    match try_fill_path_to_config(raw_config, scripts_dir, &exists) {
        Ok(filled) => filled,
        Err(error) => {
            crate::append_desktop_log(&format!(
                "fillPathToConfig returned input unchanged: {error}"
            ));
            raw_config.to_string()
        }
    }
}

fn try_fill_path_to_config<F>(
    raw_config: &str,
    scripts_dir: &Path,
    exists: &F,
) -> Result<String, serde_json::Error>
where
    F: Fn(&Path) -> bool,
{
    let mut config: McpConfig = serde_json::from_str(raw_config)?;

    for (name, server) in config.mcp_servers.iter_mut() {
        let Some(args) = server.get_mut("args").and_then(Value::as_array_mut) else {
            continue;
        };
        // Non-string arguments keep their slot but never match a script.
        let arg_strings: Vec<String> = args
            .iter()
            .map(|arg| arg.as_str().unwrap_or_default().to_string())
            .collect();
        if let Some(resolved) = resolve_script_arg(&arg_strings, scripts_dir, exists) {
            crate::append_desktop_log(&format!(
                "mcp server '{}' script resolved to {}",
                name, resolved.path
            ));
            args[resolved.index] = Value::String(resolved.path);
        }
    }

    serde_json::to_string(&config)
}

#[derive(Debug, PartialEq, Eq)]
struct ResolvedScriptArg {
    index: usize,
    path: String,
}

fn resolve_script_arg<F>(args: &[String], scripts_dir: &Path, exists: &F) -> Option<ResolvedScriptArg>
where
    F: Fn(&Path) -> bool,
{
    let script = args.iter().find(|arg| is_script_path(arg))?;
    if exists(Path::new(script)) {
        return None;
    }

    let index = args.iter().rposition(|arg| arg == script)?;
    let file_name = Path::new(script).file_name()?;
    let candidates = [
        scripts_dir.join(strip_root(Path::new(script))),
        scripts_dir.join(file_name),
    ];
    let found = candidates.into_iter().find(|candidate| exists(candidate))?;

    Some(ResolvedScriptArg {
        index,
        path: found.to_string_lossy().to_string(),
    })
}

/// Drops drive prefixes and root separators so an absolute script path
/// nests under the scripts dir instead of replacing it.
fn strip_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_) | Component::ParentDir))
        .collect()
}

fn is_script_path(arg: &str) -> bool {
    Path::new(arg)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| SCRIPT_EXTENSIONS.contains(&extension))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;

    fn config_with_args(args: &[&str]) -> String {
        json!({
            "mcpServers": {
                "weather": {
                    "enabled": true,
                    "command": "node",
                    "args": args,
                }
            }
        })
        .to_string()
    }

    fn weather_args(filled: &str) -> Vec<String> {
        let parsed: Value = serde_json::from_str(filled).expect("filled config is json");
        serde_json::from_value(parsed["mcpServers"]["weather"]["args"].clone())
            .expect("args array")
    }

    #[test]
    fn existing_script_is_left_unchanged() {
        let temp = tempfile::tempdir().expect("temp dir");
        let script = temp.path().join("server.js");
        fs::write(&script, "").expect("write script");
        let raw = config_with_args(&[script.to_str().expect("utf-8 path"), "--verbose"]);

        let filled = fill_path_to_config(&raw, &temp.path().join("scripts"));

        let before: Value = serde_json::from_str(&raw).expect("raw json");
        let after: Value = serde_json::from_str(&filled).expect("filled json");
        assert_eq!(before, after);
    }

    #[test]
    fn missing_script_is_resolved_by_file_name_in_scripts_dir() {
        let temp = tempfile::tempdir().expect("temp dir");
        let scripts_dir = temp.path().join("scripts");
        fs::create_dir_all(&scripts_dir).expect("create scripts dir");
        fs::write(scripts_dir.join("weather.js"), "").expect("write script");
        let raw = config_with_args(&["/missing/location/weather.js", "--units", "metric"]);

        let filled = fill_path_to_config(&raw, &scripts_dir);

        assert_eq!(
            weather_args(&filled),
            vec![
                scripts_dir.join("weather.js").to_string_lossy().to_string(),
                "--units".to_string(),
                "metric".to_string(),
            ]
        );
    }

    #[test]
    fn relative_path_under_scripts_dir_wins_over_file_name() {
        let scripts_dir = Path::new("/scripts");
        let relative = scripts_dir.join("tools/weather.ts");
        let flat = scripts_dir.join("weather.ts");
        let exists = |path: &Path| path == relative || path == flat;
        let raw = config_with_args(&["tools/weather.ts"]);

        let filled = fill_path_to_config_with(&raw, scripts_dir, exists);

        assert_eq!(
            weather_args(&filled),
            vec![relative.to_string_lossy().to_string()]
        );
    }

    #[test]
    fn unresolvable_script_keeps_original_argument() {
        let raw = config_with_args(&["missing.mjs"]);
        let filled = fill_path_to_config_with(&raw, Path::new("/scripts"), |_| false);
        assert_eq!(weather_args(&filled), vec!["missing.mjs".to_string()]);
    }

    #[test]
    fn duplicated_script_argument_rewrites_last_occurrence() {
        let flat = Path::new("/scripts").join("a.js");
        let exists = |path: &Path| path == flat;
        let raw = config_with_args(&["a.js", "--then", "a.js"]);

        let filled = fill_path_to_config_with(&raw, Path::new("/scripts"), exists);

        assert_eq!(
            weather_args(&filled),
            vec![
                "a.js".to_string(),
                "--then".to_string(),
                flat.to_string_lossy().to_string(),
            ]
        );
    }

    #[test]
    fn servers_without_script_arguments_are_untouched() {
        let raw = json!({
            "mcpServers": {
                "fetch": { "enabled": false, "command": "uvx", "args": ["mcp-server-fetch"] }
            }
        })
        .to_string();
        let filled = fill_path_to_config_with(&raw, Path::new("/scripts"), |_| true);
        let before: Value = serde_json::from_str(&raw).expect("raw json");
        let after: Value = serde_json::from_str(&filled).expect("filled json");
        assert_eq!(before, after);
    }

    #[test]
    fn unknown_fields_and_server_order_are_preserved() {
        let raw = r#"{"mcpServers":{"zeta":{"enabled":true,"command":"node","args":["z.js"],"env":{"TOKEN":"x"}},"alpha":{"enabled":true,"command":"uvx","args":[]}},"version":2}"#;
        let flat = Path::new("/scripts").join("z.js");
        let exists = |path: &Path| path == flat;

        let filled = fill_path_to_config_with(raw, Path::new("/scripts"), exists);
        let parsed: Value = serde_json::from_str(&filled).expect("filled json");

        let names: Vec<&String> = parsed["mcpServers"]
            .as_object()
            .expect("servers object")
            .keys()
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(parsed["mcpServers"]["zeta"]["env"]["TOKEN"], "x");
        assert_eq!(parsed["version"], 2);
    }

    #[test]
    fn servers_of_other_transports_do_not_block_rewrites() {
        let flat = Path::new("/scripts").join("weather.js");
        let exists = |path: &Path| path == flat;
        let raw = json!({
            "mcpServers": {
                "remote": { "enabled": true, "transport": "sse", "url": "http://x" },
                "broken": { "command": "node", "args": "not-a-list" },
                "weather": { "command": "node", "args": ["weather.js", 3] }
            }
        })
        .to_string();

        let filled = fill_path_to_config_with(&raw, Path::new("/scripts"), exists);
        let parsed: Value = serde_json::from_str(&filled).expect("filled json");

        assert_eq!(
            parsed["mcpServers"]["weather"]["args"],
            json!([flat.to_string_lossy(), 3])
        );
        assert_eq!(
            parsed["mcpServers"]["remote"],
            json!({ "enabled": true, "transport": "sse", "url": "http://x" })
        );
        assert_eq!(parsed["mcpServers"]["broken"]["args"], "not-a-list");
    }

    #[test]
    fn absolute_script_path_is_tried_under_scripts_dir() {
        let nested = Path::new("/scripts").join("tools").join("weather.js");
        let exists = |path: &Path| path == nested;
        let raw = config_with_args(&["/tools/weather.js"]);

        let filled = fill_path_to_config_with(&raw, Path::new("/scripts"), exists);

        assert_eq!(
            weather_args(&filled),
            vec![nested.to_string_lossy().to_string()]
        );
    }

    #[test]
    fn rewritten_server_keeps_its_keys_and_their_order() {
        let flat = Path::new("/scripts").join("w.js");
        let exists = |path: &Path| path == flat;
        let raw = r#"{"mcpServers":{"weather":{"command":"node","args":["w.js"],"env":{}}}}"#;

        let filled = fill_path_to_config_with(raw, Path::new("/scripts"), exists);
        let parsed: Value = serde_json::from_str(&filled).expect("filled json");

        assert_eq!(
            parsed["mcpServers"]["weather"].to_string(),
            json!({ "command": "node", "args": [flat.to_string_lossy()], "env": {} }).to_string()
        );
    }

    #[test]
    fn malformed_json_returns_exact_input() {
        let raw = "{ \"mcpServers\": { oops";
        assert_eq!(fill_path_to_config(raw, Path::new("/scripts")), raw);
    }

    #[test]
    fn config_without_servers_returns_exact_input() {
        let raw = r#"{ "other": true }"#;
        assert_eq!(fill_path_to_config(raw, Path::new("/scripts")), raw);
    }

    #[test]
    fn is_script_path_checks_extension_only() {
        assert!(is_script_path("server.js"));
        assert!(is_script_path("dist/index.mjs"));
        assert!(is_script_path("main.ts"));
        assert!(!is_script_path("--opts"));
        assert!(!is_script_path("server.json"));
        assert!(!is_script_path("js"));
    }
}
