//! mustwatch-server entry point

use anyhow::Result;
use clap::Parser;
use mustwatch_server::{run_server, ServerArgs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = ServerArgs::parse();
    run_server(args).await
}
