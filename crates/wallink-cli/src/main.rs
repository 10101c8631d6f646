//! wallink CLI
//!
//! Connects to a deep-link wallet from a terminal: prints the connect URL,
//! reads the wallet's redirect back from stdin and reports the session.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use wallink_cli::config_cmd;
use wallink_cli::connect_cmd::{self, ConnectArgs};
use wallink_core::config::load_config;
use wallink_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "wallink")]
#[command(version, about = "Deep-link wallet session CLI", long_about = None)]
struct Cli {
    /// Config file to load on top of the global settings
    #[arg(long, global = true, env = "WALLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a connection attempt and wait for the wallet's redirect
    Connect(ConnectArgs),
    /// Print the resolved configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    init_tracing(&config.log_level, cli.log_json);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting wallink CLI");

    let mut out = io::stdout();
    match cli.command {
        Command::Connect(args) => {
            args.apply(&mut config)?;
            connect_cmd::run(config, &args, io::stdin().lock(), &mut out)
        }
        Command::Config => config_cmd::run(&config, &mut out),
    }
}
