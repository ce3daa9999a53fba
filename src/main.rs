use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;

use cmd::{RunArgs, SendArgs, ServeArgs};
use netargs::utils;

/// netargs - serve a command-line grammar over TCP / HTTP
///
/// Command layout:
///   netargs serve [--http] [--port N] [--host H] [-c config.yaml]
///   netargs send  [--xml] [--addr HOST:PORT] [-f KEY[=VALUE] ...] [--raw]
///   netargs run   [--envelope json|xml] -- <ARGS>
///
/// Global flags / env:
///   -v / -vv        Increase verbosity
///   -q / --quiet    Errors only
///   NAP_CONFIG      Config file fallback for `serve`
///
/// Demo grammar (served by `serve`, used by `run`):
///   -x TEXT  -y INT  [-z]      (`-x damn` raises "division by zero")
///
/// Examples:
///   netargs serve --response-delay 200
///   netargs send -f x=hello -f y=3 -f z
///   netargs send --xml -f x=damn -f y=1
///   curl 'http://127.0.0.1:8080/xml?-x=hi&-y=2'   (after `netargs serve --http --port 8080`)
#[derive(Parser, Debug)]
#[command(
    name = "netargs",
    version,
    author,
    about = "netargs - serve a command-line argument grammar over the network",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the demo grammar on a stream or HTTP listener
    Serve(ServeArgs),

    /// Send one request to a stream server
    Send(SendArgs),

    /// Parse arguments and call the handler locally
    Run(RunArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    match cli.command {
        Commands::Serve(args) => cmd::execute_serve(args),
        Commands::Send(args) => cmd::execute_send(args),
        Commands::Run(args) => cmd::execute_run(args),
    }
}
