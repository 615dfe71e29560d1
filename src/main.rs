use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use quiz_session::cli::Args;
use quiz_session::{print_summary, run, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = SessionConfig::resolve(&args)?;

    if !config.color {
        colored::control::set_override(false);
    }

    // Diagnostics go to stderr so they never interleave with the transcript.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| format!("Invalid log filter {:?}: {}", config.log_filter, e))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Ctrl-C closes the input inside `run`, so it ends like end of input.
    match run(&config).await {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
