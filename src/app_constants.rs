pub const APP_TITLE: &str = "Dive AI";
pub const MAIN_WINDOW_LABEL: &str = "main";
pub const CHILD_WINDOW_LABEL_PREFIX: &str = "child-";

pub const DESKTOP_LOG_FILE: &str = "dive-desktop.log";
pub const MCP_HOST_LOG_FILE: &str = "mcp-host.log";
pub const LOG_FILTER_ENV: &str = "DIVE_LOG";

pub const APP_ROOT_ENV: &str = "APP_ROOT";
pub const DEV_SERVER_URL_ENV: &str = "VITE_DEV_SERVER_URL";
pub const PUBLIC_DIR_ENV: &str = "VITE_PUBLIC";

pub const SERVICE_PORT_ENV: &str = "DIVE_SERVICE_PORT";
pub const SCRIPTS_DIR_ENV: &str = "DIVE_SCRIPTS_DIR";
pub const MCP_HOST_CMD_ENV: &str = "DIVE_MCP_HOST_CMD";
pub const DEFAULT_SERVICE_PORT: u16 = 61990;
pub const MCP_CONFIG_FILE: &str = "config.json";

pub const MAIN_PROCESS_MESSAGE_EVENT: &str = "main-process-message";
pub const UPDATE_AVAILABLE_EVENT: &str = "update-can-available";
pub const UPDATE_PROGRESS_EVENT: &str = "download-progress";
pub const UPDATE_DOWNLOADED_EVENT: &str = "update-downloaded";
pub const UPDATE_ERROR_EVENT: &str = "update-error";
