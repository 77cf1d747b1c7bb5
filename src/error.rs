use crate::config::{ConfigError, ExitCodePolicy};
use crate::launch::LaunchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("Subprocess Error: Command exited with code {code}")]
    ChildFailed { code: i32, exit_code: i32 },

    #[error("SteamCMD executable not found in {0:?}")]
    SteamCmdNotFound(PathBuf),

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize launch plan: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the exit-code policy to a child failure; other launch errors pass through
    pub fn from_launch(err: LaunchError, policy: ExitCodePolicy) -> Self {
        match err {
            LaunchError::ProcessFailed { code } => Error::ChildFailed {
                code,
                exit_code: policy.exit_code(code),
            },
            other => Error::Launch(other),
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ChildFailed { exit_code, .. } => *exit_code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_failure_exit_codes() {
        let relayed = Error::from_launch(LaunchError::ProcessFailed { code: 3 }, ExitCodePolicy::Relay);
        assert_eq!(relayed.exit_code(), 3);
        assert!(relayed.to_string().contains("code 3"));

        let collapsed =
            Error::from_launch(LaunchError::ProcessFailed { code: 3 }, ExitCodePolicy::Collapse);
        assert_eq!(collapsed.exit_code(), 1);
        assert!(collapsed.to_string().contains("code 3"));
    }

    #[test]
    fn test_configuration_errors_exit_with_one() {
        let err = Error::from(ConfigError::MissingSection("Server Settings".to_string()));
        assert_eq!(err.exit_code(), 1);

        let err = Error::from_launch(LaunchError::EmptyCommandLine, ExitCodePolicy::Relay);
        assert!(matches!(err, Error::Launch(LaunchError::EmptyCommandLine)));
        assert_eq!(err.exit_code(), 1);
    }
}
