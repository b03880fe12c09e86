//! Ranch agent - runs one broker container for the ranch orchestrator

use clap::Parser;
use ranch_agent::cli::Cli;
use ranch_agent::domain::error::render_chain;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        let message = render_chain(&e);
        tracing::error!(kind = e.kind().as_str(), error = %message, "agent failed");
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}
