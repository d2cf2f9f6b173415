//! Persisted viewer preferences.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::{ViewMode, WhitespaceMode};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ViewerPrefs {
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub whitespace_mode: WhitespaceMode,
}

pub fn load_prefs() -> ViewerPrefs {
    let path = prefs_path();
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return ViewerPrefs::default();
    };
    toml::from_str(&contents).unwrap_or_default()
}

pub fn save_prefs(prefs: &ViewerPrefs) -> std::io::Result<()> {
    let path = prefs_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(prefs).unwrap_or_default();
    std::fs::write(path, contents)
}

fn prefs_path() -> PathBuf {
    if let Ok(path) = std::env::var("DIFFPANE_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    data_dir().join("prefs.toml")
}

fn data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("DIFFPANE_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("diffpane");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("diffpane");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("diffpane");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("diffpane");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".diffpane")
}
