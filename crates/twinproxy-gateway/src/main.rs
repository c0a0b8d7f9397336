//! Gateway standalone binary.

use clap::Parser;
use twinproxy_gateway::{ServeArgs, cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ServeArgs::parse();
    cli::run(args).await
}
