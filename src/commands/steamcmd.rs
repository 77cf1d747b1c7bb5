// SteamCMD flows - write the update script and run it through SteamCMD

use super::{run_command, RunMode, RunStatus};
use crate::config::{
    ConfigError, ConfigSource, EnvSource, ExitCodePolicy, LaunchPolicy, POLICY_SECTION,
};
use crate::error::{Error, Result};
use crate::steamcmd::{
    steamcmd_dir_from_ini, ScriptValues, SteamCmd, SteamCmdScript, DEFAULT_SCRIPT_NAME,
    DEFAULT_STEAMCMD_DIR, SETUP_SECTION,
};
use std::path::{Path, PathBuf};

/// Where the update script comes from
#[derive(Debug, Clone)]
pub enum ScriptSource {
    /// `[Setup]` section of an INI file
    Ini(PathBuf),
    /// `.env` file plus the process environment
    Env(PathBuf),
}

#[derive(Debug, Clone)]
pub struct WriteScriptOptions {
    pub source: ScriptSource,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Config file consulted for `[ServerConfig] SteamCMD_Directory` and `[Launcher]`
    pub config_path: Option<PathBuf>,
    pub steamcmd_dir: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub exit_code: Option<ExitCodePolicy>,
}

/// Render the script and write it to `output` (or `<steamcmd dir>/update.txt`). Returns the written path.
pub fn write_script(options: &WriteScriptOptions) -> Result<PathBuf> {
    match &options.source {
        ScriptSource::Ini(config_path) => {
            let source = ConfigSource::load(config_path)?;
            let policy = LaunchPolicy::from_section(source.section(POLICY_SECTION))?;
            let output = options
                .output
                .clone()
                .unwrap_or_else(|| default_script_path(&steamcmd_dir(None, Some(&source))));
            write_script_from_ini(&source, &policy, &output)?;
            Ok(output)
        }
        ScriptSource::Env(env_file) => {
            let env = EnvSource::load(Some(env_file))?;
            let output = options
                .output
                .clone()
                .unwrap_or_else(|| default_script_path(Path::new(DEFAULT_STEAMCMD_DIR)));
            write_script_from_env(&env, &LaunchPolicy::from_env(&env)?, &output)?;
            Ok(output)
        }
    }
}

pub fn write_script_from_ini(source: &ConfigSource, policy: &LaunchPolicy, output: &Path) -> Result<()> {
    let setup = source.require_section(SETUP_SECTION)?;
    let script = SteamCmdScript::from_values(&ScriptValues::from_section(setup), policy)?;
    save(&script, output)
}

pub fn write_script_from_env(env: &EnvSource, policy: &LaunchPolicy, output: &Path) -> Result<()> {
    let script = SteamCmdScript::from_values(&ScriptValues::from_env(env), policy)?;
    save(&script, output)
}

fn save(script: &SteamCmdScript, output: &Path) -> Result<()> {
    script.write_to(output).map_err(|source| Error::Write {
        path: output.to_path_buf(),
        source,
    })
}

/// Run an existing update script through SteamCMD
pub async fn update(options: &UpdateOptions) -> Result<RunStatus> {
    let source = match &options.config_path {
        Some(path) => Some(ConfigSource::load(path)?),
        None => None,
    };
    let mut policy =
        LaunchPolicy::from_section(source.as_ref().and_then(|s| s.section(POLICY_SECTION)))?;
    if let Some(exit_code) = options.exit_code {
        policy.exit_code = exit_code;
    }

    let dir = steamcmd_dir(options.steamcmd_dir.as_deref(), source.as_ref());
    let script = options
        .script
        .clone()
        .unwrap_or_else(|| default_script_path(&dir));

    run_update(&dir, &script, &policy).await
}

/// `steamcmd +runscript <script>`, run from the SteamCMD directory
pub async fn run_update(steamcmd_dir: &Path, script: &Path, policy: &LaunchPolicy) -> Result<RunStatus> {
    let steamcmd = SteamCmd::locate(steamcmd_dir)?;
    if !script.is_file() {
        return Err(ConfigError::NotFound(script.to_path_buf()).into());
    }

    let command = steamcmd.runscript_command(script)?;
    tracing::info!("Running SteamCMD: {}", command);

    let status = run_command(&command, steamcmd.directory(), RunMode::Wait, policy).await?;
    if status == RunStatus::Completed {
        tracing::info!("SteamCMD has been executed with the script.");
    }
    Ok(status)
}

/// Explicit directory, then `[ServerConfig] SteamCMD_Directory`, then `./SteamCMD`
fn steamcmd_dir(explicit: Option<&Path>, source: Option<&ConfigSource>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| source.and_then(steamcmd_dir_from_ini))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STEAMCMD_DIR))
}

fn default_script_path(steamcmd_dir: &Path) -> PathBuf {
    steamcmd_dir.join(DEFAULT_SCRIPT_NAME)
}
