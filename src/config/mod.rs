// Configuration sources, launch policy and server settings

mod env;
mod ini;
mod policy;
mod server;

pub use env::*;
pub use ini::*;
pub use policy::*;
pub use server::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("'{0}' section not found in the config file")]
    MissingSection(String),

    #[error("Required value(s) missing in {section}: {}", .keys.join(", "))]
    RequiredValueMissing { section: String, keys: Vec<String> },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Script slot '{0}' is required but empty")]
    MissingSlot(ScriptSlot),
}

/// Default config file location: `./config.ini`, then `<home>/SteamcmdLauncher/config.ini`
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }

    directories::UserDirs::new()
        .map(|d| d.home_dir().join("SteamcmdLauncher").join(DEFAULT_CONFIG_FILE))
        .filter(|p| p.exists())
        .unwrap_or(local)
}

pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

/// `path` joined onto the launcher's current directory, unless already absolute
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            tracing::warn!("Cannot resolve current directory: {}", e);
            path.to_path_buf()
        }
    }
}
