// SteamCMD Launcher - configure, update and launch dedicated game servers

pub mod commands;
pub mod config;
pub mod error;
pub mod launch;
pub mod steamcmd;

pub use error::{Error, Result};
