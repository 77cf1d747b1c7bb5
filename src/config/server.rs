// Server location settings - executable, working directory and log location

use super::env::EnvSource;
use super::ini::ConfigSource;
use super::policy::{LaunchPolicy, ServerField};
use super::{absolute_path, ConfigError};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const SERVER_SECTION: &str = "Server Configuration";
pub const SETTINGS_SECTION: &str = "Server Settings";

/// Key naming the log directory. Read from either section; never emitted as a flag.
pub const LOG_LOCATION_KEY: &str = "LogLocation";

/// Environment variable names used by the env-driven flow
pub const ENV_SERVER_PATH: &str = "SERVER_PATH";
pub const ENV_WORKING_DIRECTORY: &str = "SERVER_WORKING_DIRECTORY";
pub const ENV_LOG_LOCATION: &str = "SERVER_LOG_LOCATION";

/// Section names used by the INI flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNames {
    pub server: String,
    pub settings: String,
}

impl Default for SectionNames {
    fn default() -> Self {
        Self {
            server: SERVER_SECTION.to_string(),
            settings: SETTINGS_SECTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub executable_path: PathBuf,
    pub working_directory: PathBuf,
    pub log_location: PathBuf,
}

impl ServerConfig {
    /// Resolve from the INI server section. `LogLocation` may also live in the settings section.
    pub fn from_ini(
        source: &ConfigSource,
        sections: &SectionNames,
        policy: &LaunchPolicy,
    ) -> Result<Self, ConfigError> {
        let server = source.require_section(&sections.server)?;
        let log_location = server
            .get(LOG_LOCATION_KEY)
            .or_else(|| source.get(&sections.settings, LOG_LOCATION_KEY));

        Self::resolve(
            &sections.server,
            server.get("ExecutablePath"),
            server.get("WorkingDirectory"),
            log_location,
            policy,
        )
    }

    pub fn from_env(env: &EnvSource, policy: &LaunchPolicy) -> Result<Self, ConfigError> {
        Self::resolve(
            "environment",
            env.get(ENV_SERVER_PATH),
            env.get(ENV_WORKING_DIRECTORY),
            env.get(ENV_LOG_LOCATION),
            policy,
        )
    }

    fn resolve(
        origin: &str,
        executable: Option<&str>,
        working_directory: Option<&str>,
        log_location: Option<&str>,
        policy: &LaunchPolicy,
    ) -> Result<Self, ConfigError> {
        let executable = non_empty(executable);
        let working_directory = non_empty(working_directory);
        let log_location = non_empty(log_location);

        // Report every missing required key at once
        let mut missing = Vec::new();
        for (field, value) in [
            (ServerField::ExecutablePath, executable),
            (ServerField::WorkingDirectory, working_directory),
            (ServerField::LogLocation, log_location),
        ] {
            if value.is_none() && policy.server_requires(field) {
                missing.push(field.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(ConfigError::RequiredValueMissing {
                section: origin.to_string(),
                keys: missing,
            });
        }

        let executable_path = executable_path(executable.unwrap_or_default());
        let working_directory = match working_directory {
            Some(dir) => PathBuf::from(dir),
            None => default_working_directory(&executable_path),
        };
        // Relative log paths are resolved by the server inside its working directory
        let log_location = PathBuf::from(log_location.unwrap_or("."));

        Ok(Self {
            executable_path,
            working_directory,
            log_location,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The child runs in another directory, so a path with a directory part is
/// pinned to the launcher's current directory. Bare names stay for `PATH` lookup.
fn executable_path(value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => absolute_path(&path),
        _ => path,
    }
}

fn default_working_directory(executable: &Path) -> PathBuf {
    match executable.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
