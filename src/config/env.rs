// Environment configuration channel - `.env` file merged with the process environment

use super::ini::parse_properties;
use super::ConfigError;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

/// Snapshot of environment settings, taken once at startup.
/// Process variables take precedence over the `.env` file.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    values: HashMap<String, String>,
}

impl EnvSource {
    /// Load `dotenv_path` (if it exists) and overlay the current process environment
    pub fn load(dotenv_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();

        if let Some(path) = dotenv_path {
            if path.exists() {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let section = parse_properties(&content)?;
                for (key, value) in section.entries() {
                    values.insert(key.to_string(), value.to_string());
                }
                tracing::debug!("Loaded {} entries from {:?}", section.len(), path);
            } else {
                tracing::debug!("No env file at {:?}, using process environment only", path);
            }
        }

        overlay_os_vars(&mut values, std::env::vars_os());
        Ok(Self { values })
    }

    /// Build a source from explicit pairs, without touching the process environment
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Variables that are not valid UTF-8 cannot name or carry a launcher setting; skip them
fn overlay_os_vars(
    values: &mut HashMap<String, String>,
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) {
    for (key, value) in vars {
        match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => {
                values.insert(key, value);
            }
            (key, _) => tracing::debug!("Skipping non UTF-8 environment variable {:?}", key),
        }
    }
}
