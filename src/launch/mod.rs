// Command-line building and child process supervision

mod args;
mod process;

pub use args::*;
pub use process::*;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Executable path is empty")]
    EmptyProgram,

    #[error("No launch flags were generated from the configuration")]
    EmptyCommandLine,

    #[error("Working directory not found: {0:?}")]
    WorkingDirectoryNotFound(PathBuf),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed while waiting for child process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Subprocess Error: Command exited with code {code}")]
    ProcessFailed { code: i32 },
}
