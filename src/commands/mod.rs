// Operator flows: launch the server, write the update script, run SteamCMD

pub mod server;
pub mod steamcmd;

use crate::config::LaunchPolicy;
use crate::error::{Error, Result};
use crate::launch::{CommandLine, ProcessLauncher, ProcessOutcome};
use std::path::Path;

/// What to do with a built command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Start and wait for exit
    #[default]
    Wait,
    /// Start and return immediately
    Detach,
    /// Print the command instead of running it
    DryRun { json: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Interrupted,
    Detached(Option<u32>),
    DryRun,
}

/// Run `command` in `working_directory` according to `mode` (dry-run is handled by callers)
pub(crate) async fn run_command(
    command: &CommandLine,
    working_directory: &Path,
    mode: RunMode,
    policy: &LaunchPolicy,
) -> Result<RunStatus> {
    let launcher = ProcessLauncher::new(policy.kill_on_interrupt);

    match mode {
        RunMode::DryRun { .. } => Ok(RunStatus::DryRun),
        RunMode::Detach => {
            let pid = launcher.spawn_detached(command, working_directory)?;
            Ok(RunStatus::Detached(pid))
        }
        RunMode::Wait => match launcher.launch(command, working_directory).await {
            Ok(ProcessOutcome::Completed) => Ok(RunStatus::Completed),
            Ok(ProcessOutcome::Interrupted) => Ok(RunStatus::Interrupted),
            Err(e) => Err(Error::from_launch(e, policy.exit_code)),
        },
    }
}
