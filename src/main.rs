//! probe - a command/response probe for JSON-over-TCP servers
//!
//! Sends JSON commands (`ping`, `compile`, `shutdown`, ...) to a server over
//! TCP, one fresh connection per exchange, and reports each decoded reply.

use clap::Parser;
use probe::commands::Commands;
use probe::{cli, common};

#[derive(Parser)]
#[command(name = "probe", about = "Command/response probe for JSON-over-TCP servers")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    common::logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
