// SteamCMD update script - typed template with named slots

use crate::config::{ConfigError, EnvSource, LaunchPolicy, ScriptSlot, Section};
use crate::launch::SettingLookup;
use std::collections::BTreeMap;
use std::path::Path;

/// BattleBit Remastered dedicated server
pub const DEFAULT_APP_ID: &str = "671860";

pub const SETUP_SECTION: &str = "Setup";

/// `[Setup]` keys for each slot
pub const INI_SLOT_KEYS: [(ScriptSlot, &str); 6] = [
    (ScriptSlot::InstallDir, "force_install_dir"),
    (ScriptSlot::Username, "username"),
    (ScriptSlot::Password, "password"),
    (ScriptSlot::AppId, "app_id"),
    (ScriptSlot::Branch, "branch"),
    (ScriptSlot::BetaPassword, "beta_password"),
];

/// Environment variables for each slot. `USERNAMER` avoids the OS-provided `USERNAME` on Windows.
pub const ENV_SLOT_KEYS: [(ScriptSlot, &str); 6] = [
    (ScriptSlot::InstallDir, "SERVER"),
    (ScriptSlot::Username, "USERNAMER"),
    (ScriptSlot::Password, "PASSWORD"),
    (ScriptSlot::AppId, "APPID"),
    (ScriptSlot::Branch, "BRANCH"),
    (ScriptSlot::BetaPassword, "BETAPASSWORD"),
];

/// Raw slot values as read from a configuration source. Empty values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptValues {
    values: BTreeMap<ScriptSlot, String>,
}

impl ScriptValues {
    pub fn collect(settings: &impl SettingLookup, keys: &[(ScriptSlot, &str)]) -> Self {
        let mut values = Self::default();
        for (slot, key) in keys {
            if let Some(value) = settings.lookup(key) {
                values.set(*slot, value);
            }
        }
        values
    }

    pub fn from_section(section: &Section) -> Self {
        Self::collect(section, &INI_SLOT_KEYS)
    }

    pub fn from_env(env: &EnvSource) -> Self {
        Self::collect(env, &ENV_SLOT_KEYS)
    }

    pub fn set(&mut self, slot: ScriptSlot, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.values.remove(&slot);
        } else {
            self.values.insert(slot, value.to_string());
        }
    }

    pub fn get(&self, slot: ScriptSlot) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamCmdScript {
    install_dir: Option<String>,
    username: Option<String>,
    password: Option<String>,
    app_id: String,
    branch: Option<String>,
    beta_password: Option<String>,
}

impl SteamCmdScript {
    /// Validate required slots, then fill in defaults for the optional ones
    pub fn from_values(values: &ScriptValues, policy: &LaunchPolicy) -> Result<Self, ConfigError> {
        if let Some(slot) = policy
            .required_script
            .iter()
            .find(|slot| values.get(**slot).is_none())
        {
            return Err(ConfigError::MissingSlot(*slot));
        }

        let owned = |slot| values.get(slot).map(str::to_string);
        let branch = owned(ScriptSlot::Branch);
        let mut beta_password = owned(ScriptSlot::BetaPassword);
        if branch.is_none() && beta_password.take().is_some() {
            tracing::warn!("Beta password set without a branch, ignoring it");
        }

        Ok(Self {
            install_dir: owned(ScriptSlot::InstallDir),
            username: owned(ScriptSlot::Username),
            password: owned(ScriptSlot::Password),
            app_id: owned(ScriptSlot::AppId).unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
            branch,
            beta_password,
        })
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            "@ShutdownOnFailedCommand 1".to_string(),
            "@NoPromptForPassword 1".to_string(),
        ];

        if let Some(dir) = &self.install_dir {
            lines.push(format!("force_install_dir {}", dir));
        }

        let login = match (&self.username, &self.password) {
            (Some(user), Some(password)) => format!("login {} {}", user, password),
            (Some(user), None) => format!("login {}", user),
            (None, _) => "login anonymous".to_string(),
        };
        lines.push(login);

        let mut update = format!("app_update {}", self.app_id);
        if let Some(branch) = &self.branch {
            update.push_str(&format!(" -beta {}", branch));
            if let Some(beta_password) = &self.beta_password {
                update.push_str(&format!(" {}", beta_password));
            }
        }
        update.push_str(" validate");
        lines.push(update);
        lines.push("quit".to_string());

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Render into `path`, creating parent directories
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.render())?;
        tracing::info!("Wrote SteamCMD script {:?} (app {})", path, self.app_id);
        Ok(())
    }
}
