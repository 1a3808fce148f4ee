// Platform config locations for the sidebar.
//
// Linux:   $XDG_CONFIG_HOME/tabsidebar or ~/.config/tabsidebar
// macOS:   ~/Library/Application Support/TabSidebar
// Windows: %APPDATA%/TabSidebar

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("tabsidebar"),
        _ => home_dir().join(".config").join("tabsidebar"),
    }
}

#[cfg(target_os = "macos")]
pub fn get_config_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("TabSidebar")
}

#[cfg(target_os = "windows")]
pub fn get_config_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("TabSidebar")
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub fn get_config_dir() -> PathBuf {
    home_dir().join(".tabsidebar")
}

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}
