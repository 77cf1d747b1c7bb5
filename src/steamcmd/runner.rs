// SteamCMD runner - locates the executable and builds `+runscript` command lines

use crate::config::{absolute_path, ConfigSource};
use crate::error::{Error, Result};
use crate::launch::CommandLine;
use std::path::{Path, PathBuf};

pub const DEFAULT_STEAMCMD_DIR: &str = "SteamCMD";
pub const DEFAULT_SCRIPT_NAME: &str = "update.txt";

/// Section/key naming the SteamCMD install directory
pub const STEAMCMD_SECTION: &str = "ServerConfig";
pub const STEAMCMD_DIR_KEY: &str = "SteamCMD_Directory";

#[cfg(windows)]
const EXECUTABLE_NAMES: &[&str] = &["steamcmd.exe"];
#[cfg(not(windows))]
const EXECUTABLE_NAMES: &[&str] = &["steamcmd.sh", "steamcmd"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamCmd {
    directory: PathBuf,
    executable: PathBuf,
}

impl SteamCmd {
    /// Find the SteamCMD executable inside `directory`
    pub fn locate(directory: &Path) -> Result<Self> {
        let executable = EXECUTABLE_NAMES
            .iter()
            .map(|name| directory.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::SteamCmdNotFound(directory.to_path_buf()))?;

        tracing::debug!("Found SteamCMD at {:?}", executable);
        Ok(Self {
            directory: directory.to_path_buf(),
            executable,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `steamcmd +runscript <script>`. Relative script paths are made absolute
    /// because SteamCMD runs from its own directory.
    pub fn runscript_command(&self, script: &Path) -> Result<CommandLine> {
        let script = absolute_path(script);
        let command = CommandLine::from_path(&absolute_path(&self.executable))?
            .fixed(["+runscript".to_string(), script.to_string_lossy().into_owned()]);
        Ok(command)
    }
}

/// Directory from `[ServerConfig] SteamCMD_Directory`, if configured
pub fn steamcmd_dir_from_ini(source: &ConfigSource) -> Option<PathBuf> {
    source
        .get(STEAMCMD_SECTION, STEAMCMD_DIR_KEY)
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}
