// Process launcher - starts a child in a working directory and waits for it

use super::{CommandLine, LaunchError};
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// How a supervised child run ended, when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exited with code 0
    Completed,
    /// The operator interrupted the wait
    Interrupted,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    kill_on_interrupt: bool,
}

impl ProcessLauncher {
    pub fn new(kill_on_interrupt: bool) -> Self {
        Self { kill_on_interrupt }
    }

    /// Start `command` in `working_directory` and wait until it exits or the
    /// launcher receives Ctrl+C / SIGTERM.
    pub async fn launch(
        &self,
        command: &CommandLine,
        working_directory: &Path,
    ) -> Result<ProcessOutcome, LaunchError> {
        self.launch_until(command, working_directory, shutdown_signal())
            .await
    }

    /// Like [`ProcessLauncher::launch`], with the interrupt source supplied by the caller.
    /// A non-zero exit is `LaunchError::ProcessFailed`; an interrupt is not an error.
    pub async fn launch_until<F>(
        &self,
        command: &CommandLine,
        working_directory: &Path,
        interrupt: F,
    ) -> Result<ProcessOutcome, LaunchError>
    where
        F: Future<Output = ()>,
    {
        let mut child = self.spawn(command, working_directory)?;
        tracing::info!("Started {} (pid {:?})", command.program(), child.id());

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(LaunchError::Wait)?;
                if status.success() {
                    tracing::info!("{} exited successfully", command.program());
                    Ok(ProcessOutcome::Completed)
                } else {
                    // No code means the child was killed by a signal
                    let code = status.code().unwrap_or(1);
                    tracing::warn!("{} exited with code {}", command.program(), code);
                    Err(LaunchError::ProcessFailed { code })
                }
            }
            _ = interrupt => {
                tracing::info!("Interrupted: stopping {}", command.program());
                if self.kill_on_interrupt {
                    match child.kill().await {
                        Ok(()) => tracing::info!("Killed {}", command.program()),
                        Err(e) => tracing::warn!("Failed to kill {}: {}", command.program(), e),
                    }
                }
                Ok(ProcessOutcome::Interrupted)
            }
        }
    }

    /// Start `command` without waiting. Returns the child's pid when known.
    pub fn spawn_detached(
        &self,
        command: &CommandLine,
        working_directory: &Path,
    ) -> Result<Option<u32>, LaunchError> {
        let child = self.spawn(command, working_directory)?;
        let pid = child.id();
        tracing::info!("Started {} in the background (pid {:?})", command.program(), pid);
        Ok(pid)
    }

    fn spawn(&self, command: &CommandLine, working_directory: &Path) -> Result<Child, LaunchError> {
        if !working_directory.is_dir() {
            return Err(LaunchError::WorkingDirectoryNotFound(
                working_directory.to_path_buf(),
            ));
        }

        tracing::info!("Executing: {}", command);
        tracing::debug!("Working directory: {:?}", working_directory);

        Command::new(command.program())
            .args(command.args())
            .current_dir(working_directory)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| {
                tracing::error!("Failed to spawn process '{}': {}", command.program(), source);
                LaunchError::Spawn {
                    program: command.program().to_string(),
                    source,
                }
            })
    }
}

/// Resolves on Ctrl+C (and SIGTERM on unix). Never resolves if no handler can be installed.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!("Failed to install signal handlers: {}", e);
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
            _ = sigint.recv() => tracing::info!("Received SIGINT signal"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            return std::future::pending().await;
        }
        tracing::info!("Received Ctrl+C signal");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandLine {
        CommandLine::new("sh").unwrap().fixed(["-c", script])
    }

    #[tokio::test]
    async fn test_successful_exit() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = ProcessLauncher::default()
            .launch_until(&shell("exit 0"), dir.path(), std::future::pending())
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Completed);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_process_failed() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessLauncher::default()
            .launch_until(&shell("exit 3"), dir.path(), std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::ProcessFailed { code: 3 }));
        assert!(err.to_string().contains('3'));
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let outcome = ProcessLauncher::default()
            .launch_until(&shell("test -f marker"), dir.path(), std::future::pending())
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Completed);
    }

    #[tokio::test]
    async fn test_interrupt_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = ProcessLauncher::new(true)
            .launch_until(&shell("sleep 30"), dir.path(), std::future::ready(()))
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Interrupted);
    }

    #[tokio::test]
    async fn test_interrupt_leaves_child_running_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let command = shell("echo $$ > pid.tmp && mv pid.tmp pid && exec sleep 30");

        let pid_ready = {
            let pid_file = pid_file.clone();
            async move {
                while !pid_file.exists() {
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                }
            }
        };
        let outcome = ProcessLauncher::default()
            .launch_until(&command, dir.path(), pid_ready)
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome::Interrupted);

        let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
        let alive = std::process::Command::new("kill")
            .args(["-0", &pid])
            .status()
            .unwrap();
        let killed = std::process::Command::new("kill").arg(&pid).status().unwrap();
        assert!(alive.success());
        assert!(killed.success());
    }

    #[tokio::test]
    async fn test_missing_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = ProcessLauncher::default()
            .launch_until(&shell("exit 0"), &missing, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::WorkingDirectoryNotFound(path) if path == missing));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let command = CommandLine::new("steamcmd-launcher-no-such-binary").unwrap();
        let err = ProcessLauncher::default()
            .launch_until(&command, dir.path(), std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_spawn_detached_returns_pid() {
        let dir = tempfile::tempdir().unwrap();
        let pid = ProcessLauncher::default()
            .spawn_detached(&shell("exit 0"), dir.path())
            .unwrap();
        assert!(pid.is_some());
    }
}
