// Launch policy - which values are mandatory and how failures are reported

use super::env::EnvSource;
use super::ini::Section;
use super::ConfigError;
use crate::launch::SettingLookup;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// INI section holding policy overrides
pub const POLICY_SECTION: &str = "Launcher";

/// Names of the four policy overrides in one configuration channel
#[derive(Debug, Clone, Copy)]
pub struct PolicyKeys {
    pub required_server: &'static str,
    pub required_script: &'static str,
    pub exit_code: &'static str,
    pub kill_on_interrupt: &'static str,
}

/// `[Launcher]` keys
pub const SECTION_POLICY_KEYS: PolicyKeys = PolicyKeys {
    required_server: "RequiredServerKeys",
    required_script: "RequiredScriptSlots",
    exit_code: "ExitCode",
    kill_on_interrupt: "KillOnInterrupt",
};

/// Environment variables for the env-driven flow
pub const ENV_POLICY_KEYS: PolicyKeys = PolicyKeys {
    required_server: "LAUNCHER_REQUIRED_SERVER_KEYS",
    required_script: "LAUNCHER_REQUIRED_SCRIPT_SLOTS",
    exit_code: "LAUNCHER_EXIT_CODE",
    kill_on_interrupt: "LAUNCHER_KILL_ON_INTERRUPT",
};

/// Logical values describing where and how the server runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServerField {
    ExecutablePath,
    WorkingDirectory,
    LogLocation,
}

/// Named slots of the SteamCMD update script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ScriptSlot {
    InstallDir,
    Username,
    Password,
    AppId,
    Branch,
    BetaPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitCodePolicy {
    /// The child's exit code becomes the launcher's exit code
    #[default]
    Relay,
    /// Every child failure exits with 1
    Collapse,
}

impl ExitCodePolicy {
    /// Exit code for a run whose child failed with `child_code`
    pub fn exit_code(self, child_code: i32) -> i32 {
        match self {
            ExitCodePolicy::Relay if child_code != 0 => child_code,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPolicy {
    pub required_server: Vec<ServerField>,
    pub required_script: Vec<ScriptSlot>,
    pub exit_code: ExitCodePolicy,
    pub kill_on_interrupt: bool,
}

impl Default for LaunchPolicy {
    fn default() -> Self {
        Self {
            required_server: vec![ServerField::ExecutablePath, ServerField::WorkingDirectory],
            required_script: vec![
                ScriptSlot::InstallDir,
                ScriptSlot::Username,
                ScriptSlot::Password,
                ScriptSlot::AppId,
            ],
            exit_code: ExitCodePolicy::Relay,
            kill_on_interrupt: false,
        }
    }
}

impl LaunchPolicy {
    /// Policy for the environment-driven flow: only `SERVER_PATH` is mandatory
    pub fn env_default() -> Self {
        Self {
            required_server: vec![ServerField::ExecutablePath],
            ..Self::default()
        }
    }

    /// Apply overrides from a `[Launcher]` section. Keys not present keep their defaults.
    pub fn from_section(section: Option<&Section>) -> Result<Self, ConfigError> {
        match section {
            Some(section) => Self::default().with_overrides(section, &SECTION_POLICY_KEYS),
            None => Ok(Self::default()),
        }
    }

    /// `env_default` with `LAUNCHER_*` overrides. An empty list requires nothing.
    pub fn from_env(env: &EnvSource) -> Result<Self, ConfigError> {
        Self::env_default().with_overrides(env, &ENV_POLICY_KEYS)
    }

    fn with_overrides(
        mut self,
        settings: &impl SettingLookup,
        keys: &PolicyKeys,
    ) -> Result<Self, ConfigError> {
        if let Some(list) = settings.lookup(keys.required_server) {
            self.required_server = parse_list(list, keys.required_server)?;
        }
        if let Some(list) = settings.lookup(keys.required_script) {
            self.required_script = parse_list(list, keys.required_script)?;
        }
        if let Some(value) = settings.lookup(keys.exit_code) {
            self.exit_code = value.parse().map_err(|message| ConfigError::InvalidValue {
                key: keys.exit_code.to_string(),
                message,
            })?;
        }
        if let Some(value) = settings.lookup(keys.kill_on_interrupt) {
            self.kill_on_interrupt = parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
                key: keys.kill_on_interrupt.to_string(),
                message: format!("'{}' is not a boolean", value),
            })?;
        }

        tracing::debug!("Launch policy: {:?}", self);
        Ok(self)
    }

    pub fn server_requires(&self, field: ServerField) -> bool {
        field == ServerField::ExecutablePath || self.required_server.contains(&field)
    }

    pub fn script_requires(&self, slot: ScriptSlot) -> bool {
        self.required_script.contains(&slot)
    }
}

fn parse_list<T>(list: &str, key: &str) -> Result<Vec<T>, ConfigError>
where
    T: FromStr<Err = String>,
{
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse().map_err(|message| ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })
        })
        .collect()
}

/// Accepts the usual INI boolean spellings
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

// "ExecutablePath", "executable_path" and "EXECUTABLE-PATH" all name the same thing
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

impl FromStr for ServerField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "executablepath" => Ok(ServerField::ExecutablePath),
            "workingdirectory" => Ok(ServerField::WorkingDirectory),
            "loglocation" => Ok(ServerField::LogLocation),
            _ => Err(format!("unknown server key '{}'", s)),
        }
    }
}

impl fmt::Display for ServerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerField::ExecutablePath => "ExecutablePath",
            ServerField::WorkingDirectory => "WorkingDirectory",
            ServerField::LogLocation => "LogLocation",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ScriptSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "installdir" | "forceinstalldir" => Ok(ScriptSlot::InstallDir),
            "username" => Ok(ScriptSlot::Username),
            "password" => Ok(ScriptSlot::Password),
            "appid" => Ok(ScriptSlot::AppId),
            "branch" => Ok(ScriptSlot::Branch),
            "betapassword" => Ok(ScriptSlot::BetaPassword),
            _ => Err(format!("unknown script slot '{}'", s)),
        }
    }
}

impl fmt::Display for ScriptSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScriptSlot::InstallDir => "install_dir",
            ScriptSlot::Username => "username",
            ScriptSlot::Password => "password",
            ScriptSlot::AppId => "app_id",
            ScriptSlot::Branch => "branch",
            ScriptSlot::BetaPassword => "beta_password",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ExitCodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relay" => Ok(ExitCodePolicy::Relay),
            "collapse" => Ok(ExitCodePolicy::Collapse),
            _ => Err(format!("expected 'relay' or 'collapse', got '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSource;

    #[test]
    fn test_defaults_without_section() {
        let policy = LaunchPolicy::from_section(None).unwrap();
        assert_eq!(policy, LaunchPolicy::default());
        assert!(policy.server_requires(ServerField::WorkingDirectory));
        assert!(!policy.script_requires(ScriptSlot::BetaPassword));
    }

    #[test]
    fn test_section_overrides() {
        let source = ConfigSource::parse(
            "[Launcher]\nRequiredServerKeys = executable_path\nRequiredScriptSlots = InstallDir, AppId, Branch\nExitCode = collapse\nKillOnInterrupt = yes\n",
        )
        .unwrap();
        let policy = LaunchPolicy::from_section(source.section(POLICY_SECTION)).unwrap();

        assert_eq!(policy.required_server, vec![ServerField::ExecutablePath]);
        assert_eq!(
            policy.required_script,
            vec![ScriptSlot::InstallDir, ScriptSlot::AppId, ScriptSlot::Branch]
        );
        assert_eq!(policy.exit_code, ExitCodePolicy::Collapse);
        assert!(policy.kill_on_interrupt);
    }

    #[test]
    fn test_executable_path_is_always_required() {
        let policy = LaunchPolicy {
            required_server: Vec::new(),
            ..LaunchPolicy::default()
        };
        assert!(policy.server_requires(ServerField::ExecutablePath));
        assert!(!policy.server_requires(ServerField::WorkingDirectory));
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let source = ConfigSource::parse("[Launcher]\nRequiredServerKeys = Port\n").unwrap();
        let err = LaunchPolicy::from_section(source.section(POLICY_SECTION)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "RequiredServerKeys"));

        let source = ConfigSource::parse("[Launcher]\nKillOnInterrupt = maybe\n").unwrap();
        assert!(LaunchPolicy::from_section(source.section(POLICY_SECTION)).is_err());
    }

    #[test]
    fn test_env_default() {
        let policy = LaunchPolicy::env_default();
        assert!(!policy.server_requires(ServerField::WorkingDirectory));
        assert_eq!(policy.required_script, LaunchPolicy::default().required_script);
    }

    #[test]
    fn test_env_overrides() {
        let env = EnvSource::from_pairs([
            ("LAUNCHER_REQUIRED_SCRIPT_SLOTS", ""),
            ("LAUNCHER_EXIT_CODE", "collapse"),
        ]);
        let policy = LaunchPolicy::from_env(&env).unwrap();

        assert!(policy.required_script.is_empty());
        assert_eq!(policy.required_server, vec![ServerField::ExecutablePath]);
        assert_eq!(policy.exit_code, ExitCodePolicy::Collapse);
        assert!(!policy.kill_on_interrupt);

        let env = EnvSource::from_pairs([("LAUNCHER_KILL_ON_INTERRUPT", "sometimes")]);
        let err = LaunchPolicy::from_env(&env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "LAUNCHER_KILL_ON_INTERRUPT"));
    }

    #[test]
    fn test_exit_code_policy() {
        assert_eq!(ExitCodePolicy::Relay.exit_code(3), 3);
        assert_eq!(ExitCodePolicy::Collapse.exit_code(3), 1);
        assert_eq!(ExitCodePolicy::Relay.exit_code(0), 1);
    }
}
