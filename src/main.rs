use clap::Parser;
use dotenvy::dotenv;
use school_desk::{cli::Cli, errors::Result};
use std::io::Write;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output such as CSV exports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Non-fatal, env vars can be set externally
    dotenv().ok();

    let cli = Cli::parse();
    debug!("Running {:?}", cli.command);

    let output = school_desk::cli::run(cli)
        .await
        .inspect_err(|e| error!("Command failed: {}", e))?;

    std::io::stdout().write_all(output.as_bytes())?;
    Ok(())
}
