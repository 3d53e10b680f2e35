//! dedupctl - lifecycle manager for deduplicating block-device stacks.
//!
//! Brings the layered stack (deduplicating device -> volume group ->
//! logical volume -> filesystem mount) online in dependency order at boot,
//! offline in reverse order at shutdown, and reports the topology on
//! demand. All relationships are discovered fresh from the system's
//! storage tools on every invocation.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use dedupctl::commands;
use dedupctl::config::Config;
use dedupctl::process::SystemRunner;

#[derive(Parser)]
#[command(name = "dedupctl")]
#[command(about = "Manage the lifecycle of deduplicating block-device storage stacks")]
struct Cli {
    /// Echo each external command before running it
    #[arg(long, global = true)]
    verbose: bool,

    /// Print external commands without executing them
    #[arg(long, global = true)]
    no_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring every deduplicating device's stack online
    Start,
    /// Take every stack offline, leaf mounts first
    Stop,
    /// Stop, let device state settle, then start
    #[command(visible_alias = "force-reload")]
    Restart,
    /// Report the discovered topology
    Status {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                // init-script convention: invalid usage exits 3
                _ => ExitCode::from(3),
            };
        }
    };

    let config = Config::from_env();
    let runner = SystemRunner::new(cli.verbose, cli.no_run);

    let code = match cli.command {
        Commands::Start => commands::cmd_start(&runner, &config),
        Commands::Stop => commands::cmd_stop(&runner, &config),
        Commands::Restart => commands::cmd_restart(&runner, &config),
        Commands::Status { json } => match commands::cmd_status(&runner, &config, json) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("Error: {err:#}");
                1
            }
        },
    };
    ExitCode::from(code)
}
