// Server launch flows - INI driven (`start`) and environment driven (`start-env`)

use super::{run_command, steamcmd, RunMode, RunStatus};
use crate::config::{
    ConfigSource, EnvSource, ExitCodePolicy, LaunchPolicy, SectionNames, ServerConfig,
    LOG_LOCATION_KEY, POLICY_SECTION,
};
use crate::error::{Error, Result};
use crate::launch::{
    ArgumentBuilder, ArgumentSpec, CommandLine, KeyCase, KeyStyle, KeyTransform, LaunchError,
};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const FIXED_FLAGS: [&str; 2] = ["-batchmode", "-nographics"];
pub const LOG_FILE_FLAG: &str = "-logFile";

/// Settings read from the environment, in the order they are passed to the server
pub const ENV_SERVER_VARIABLES: &[&str] = &[
    "SERVER_NAME",
    "SERVER_PORT",
    "SERVER_HZ",
    "SERVER_SAVE_STATS",
    "SERVER_DYNAMIC_ROOMS",
    "SERVER_MAX_PLAYERS",
    "SERVER_PLAYERS_TO_START",
    "SERVER_FIRST_ROOM",
    "SERVER_DYNAMIC_FIRST_MAP",
    "SERVER_DYNAMIC_FIRST_GAMEMODE",
    "SERVER_DYNAMIC_FIRST_SIZE",
    "SERVER_DYNAMIC_FIXED_SIZE",
    "SERVER_BEGINNER_SERVER",
    "SERVER_DYNAMIC_MAX_SIZE",
    "SERVER_RCON_ENABLED",
    "SERVER_RCON_PASSWORD",
    "SERVER_REGION",
    "SERVER_TESTER_SERVER",
];

/// Everything needed to start the server, resolved up front
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub server: ServerConfig,
    pub command: CommandLine,
}

#[derive(Debug, Clone)]
pub struct StartOptions {
    pub config_path: PathBuf,
    pub sections: SectionNames,
    pub mode: RunMode,
    pub exit_code: Option<ExitCodePolicy>,
}

#[derive(Debug, Clone)]
pub struct EnvStartOptions {
    pub env_file: PathBuf,
    pub update: bool,
    pub steamcmd_dir: PathBuf,
    pub script_path: PathBuf,
    pub mode: RunMode,
    pub exit_code: Option<ExitCodePolicy>,
}

/// `<log_location>/log_<YYYYmmdd_HHMMSS>.txt`
pub fn log_file_path(log_location: &Path, now: &DateTime<Local>) -> PathBuf {
    log_location.join(format!("log_{}.txt", now.format("%Y%m%d_%H%M%S")))
}

/// `[executable, -batchmode, -nographics, -logFile, <log>, flags...]`
pub fn server_command(
    server: &ServerConfig,
    flags: Vec<String>,
    now: &DateTime<Local>,
) -> std::result::Result<CommandLine, LaunchError> {
    let log_file = log_file_path(&server.log_location, now);

    CommandLine::from_path(&server.executable_path)?
        .fixed(FIXED_FLAGS)
        .fixed([
            LOG_FILE_FLAG.to_string(),
            log_file.to_string_lossy().into_owned(),
        ])
        .flags(flags)
        .require_flags()
}

pub fn plan_from_ini(
    source: &ConfigSource,
    sections: &SectionNames,
    policy: &LaunchPolicy,
    now: &DateTime<Local>,
) -> Result<LaunchPlan> {
    let server = ServerConfig::from_ini(source, sections, policy)?;
    let flags = ArgumentBuilder::default()
        .exclude(LOG_LOCATION_KEY)
        .flags_from_section(source, &sections.settings)?;
    let command = server_command(&server, flags, now)?;

    Ok(LaunchPlan { server, command })
}

pub fn plan_from_env(
    env: &EnvSource,
    policy: &LaunchPolicy,
    now: &DateTime<Local>,
) -> Result<LaunchPlan> {
    let server = ServerConfig::from_env(env, policy)?;
    let builder = ArgumentBuilder::new(KeyTransform {
        style: KeyStyle::StripPrefix { separator: '_' },
        case: KeyCase::Preserve,
    });
    let spec = ArgumentSpec::new(ENV_SERVER_VARIABLES.iter().copied());
    let command = server_command(&server, builder.flags_from_spec(&spec, env), now)?;

    Ok(LaunchPlan { server, command })
}

/// Launch the server described by the INI file
pub async fn start(options: &StartOptions) -> Result<RunStatus> {
    let source = ConfigSource::load(&options.config_path)?;
    let mut policy = LaunchPolicy::from_section(source.section(POLICY_SECTION))?;
    if let Some(exit_code) = options.exit_code {
        policy.exit_code = exit_code;
    }

    let plan = plan_from_ini(&source, &options.sections, &policy, &Local::now())?;
    execute(&plan, options.mode, &policy).await
}

/// Update through SteamCMD (unless disabled), then launch the server described by the environment
pub async fn start_env(options: &EnvStartOptions) -> Result<RunStatus> {
    let env = EnvSource::load(Some(&options.env_file))?;
    let mut policy = LaunchPolicy::from_env(&env)?;
    if let Some(exit_code) = options.exit_code {
        policy.exit_code = exit_code;
    }

    // Resolve the launch before touching SteamCMD so config errors fail fast
    let plan = plan_from_env(&env, &policy, &Local::now())?;

    let dry_run = matches!(options.mode, RunMode::DryRun { .. });
    if options.update && !dry_run {
        steamcmd::write_script_from_env(&env, &policy, &options.script_path)?;
        // A failed update still leaves the previous install runnable
        match steamcmd::run_update(&options.steamcmd_dir, &options.script_path, &policy).await {
            Ok(RunStatus::Interrupted) => return Ok(RunStatus::Interrupted),
            Ok(_) => {}
            Err(Error::ChildFailed { code, .. }) => {
                tracing::warn!("SteamCMD exited with code {}, starting the installed server", code);
            }
            Err(e) => return Err(e),
        }
    }

    execute(&plan, options.mode, &policy).await
}

async fn execute(plan: &LaunchPlan, mode: RunMode, policy: &LaunchPolicy) -> Result<RunStatus> {
    if let RunMode::DryRun { json } = mode {
        if json {
            println!("{}", serde_json::to_string_pretty(plan)?);
        } else {
            println!("{}", plan.command);
        }
        return Ok(RunStatus::DryRun);
    }

    // Relative log locations are resolved by the server against its working directory
    let log_dir = plan.server.working_directory.join(&plan.server.log_location);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        tracing::warn!("Could not create log directory {:?}: {}", log_dir, e);
    }

    run_command(&plan.command, &plan.server.working_directory, mode, policy).await
}
