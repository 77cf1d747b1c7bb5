// SteamCMD Launcher - Main entry point
// Launch dedicated game servers from INI or environment settings

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use steamcmd_launcher_lib::commands::server::{self, EnvStartOptions, StartOptions};
use steamcmd_launcher_lib::commands::steamcmd::{self, ScriptSource, UpdateOptions, WriteScriptOptions};
use steamcmd_launcher_lib::commands::{RunMode, RunStatus};
use steamcmd_launcher_lib::config::{default_config_path, ExitCodePolicy, SectionNames};
use steamcmd_launcher_lib::steamcmd::{DEFAULT_SCRIPT_NAME, DEFAULT_STEAMCMD_DIR};
use tracing_subscriber::EnvFilter;

/// Configure, update and launch dedicated game servers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (INI)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch the server described by the INI file
    Start {
        /// Section holding ExecutablePath and WorkingDirectory
        #[arg(long, default_value = "Server Configuration")]
        server_section: String,

        /// Section whose keys become launch flags
        #[arg(long, default_value = "Server Settings")]
        settings_section: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Update through SteamCMD, then launch the server described by SERVER_* variables
    StartEnv {
        /// Env file merged under the process environment
        #[arg(long, default_value = ".env", value_name = "FILE")]
        env_file: PathBuf,

        /// Skip the SteamCMD update
        #[arg(long)]
        no_update: bool,

        /// SteamCMD install directory
        #[arg(long, default_value = DEFAULT_STEAMCMD_DIR, value_name = "DIR")]
        steamcmd_dir: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Write the SteamCMD update script
    WriteScript {
        /// Read script values from the environment instead of the INI `[Setup]` section
        #[arg(long)]
        from_env: bool,

        /// Env file used with --from-env
        #[arg(long, default_value = ".env", value_name = "FILE")]
        env_file: PathBuf,

        /// Output path (defaults to <steamcmd dir>/update.txt)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Run an update script through SteamCMD
    Update {
        /// SteamCMD install directory (overrides the config file)
        #[arg(long, value_name = "DIR")]
        steamcmd_dir: Option<PathBuf>,

        /// Script to run (defaults to <steamcmd dir>/update.txt)
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// relay | collapse
        #[arg(long, value_name = "POLICY")]
        exit_code: Option<ExitCodePolicy>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Print the command line instead of starting the server
    #[arg(long)]
    dry_run: bool,

    /// With --dry-run, print the full launch plan as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// Start the server and return without waiting for it
    #[arg(long, conflicts_with = "dry_run")]
    detach: bool,

    /// relay | collapse
    #[arg(long, value_name = "POLICY")]
    exit_code: Option<ExitCodePolicy>,
}

impl RunArgs {
    fn mode(&self) -> RunMode {
        if self.dry_run {
            RunMode::DryRun { json: self.json }
        } else if self.detach {
            RunMode::Detach
        } else {
            RunMode::Wait
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    initialize_logging(cli.debug);

    match run(cli).await {
        Ok(RunStatus::Interrupted) => {
            tracing::info!("Server stopped by user.");
        }
        Ok(RunStatus::Detached(pid)) => {
            tracing::info!("Server started in the background (pid {:?})", pid);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> steamcmd_launcher_lib::Result<RunStatus> {
    match cli.command {
        Command::Start {
            server_section,
            settings_section,
            run: args,
        } => {
            let config_path = cli.config.unwrap_or_else(default_config_path);
            tracing::info!("Config file: {:?}", config_path);
            server::start(&StartOptions {
                config_path,
                sections: SectionNames {
                    server: server_section,
                    settings: settings_section,
                },
                mode: args.mode(),
                exit_code: args.exit_code,
            })
            .await
        }
        Command::StartEnv {
            env_file,
            no_update,
            steamcmd_dir,
            run: args,
        } => {
            let script_path = steamcmd_dir.join(DEFAULT_SCRIPT_NAME);
            server::start_env(&EnvStartOptions {
                env_file,
                update: !no_update,
                steamcmd_dir,
                script_path,
                mode: args.mode(),
                exit_code: args.exit_code,
            })
            .await
        }
        Command::WriteScript {
            from_env,
            env_file,
            output,
        } => {
            let source = if from_env {
                ScriptSource::Env(env_file)
            } else {
                ScriptSource::Ini(cli.config.unwrap_or_else(default_config_path))
            };
            let written = steamcmd::write_script(&WriteScriptOptions { source, output })?;
            tracing::info!("SteamCMD script written to {:?}", written);
            Ok(RunStatus::Completed)
        }
        Command::Update {
            steamcmd_dir,
            script,
            exit_code,
        } => {
            // The default config is optional here; an explicit one must exist
            let config_path = cli
                .config
                .or_else(|| Some(default_config_path()).filter(|p| p.exists()));
            steamcmd::update(&UpdateOptions {
                config_path,
                steamcmd_dir,
                script,
                exit_code,
            })
            .await
        }
    }
}

fn initialize_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
