//! Unified twinproxy CLI.
//!
//! - `twinproxy serve` - Run the SOCKS5/HTTP gateway
//! - `twinproxy passwd` - Manage htpasswd credential files
//!
//! The gateway is also available as the standalone `twinproxy-gateway`
//! binary.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// twinproxy unified CLI.
#[derive(Parser)]
#[command(
    name = "twinproxy",
    version,
    about = "SOCKS5 and HTTP forward proxy gateway",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the proxy gateway.
    #[command(name = "serve", alias = "server")]
    Serve(Box<twinproxy_gateway::ServeArgs>),

    /// Manage credential files.
    #[command(name = "passwd")]
    Passwd(twinproxy_auth::cli::PasswdArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => twinproxy_gateway::cli::run(*args).await,
        Commands::Passwd(args) => twinproxy_auth::cli::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
