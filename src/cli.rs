use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "quiz-session")]
#[command(version)]
#[command(about = "Answer quiz questions from a WebSocket quiz server in the terminal")]
pub struct Args {
    /// Server origin, e.g. http://localhost:8000 (https selects wss)
    #[arg(long)]
    pub origin: Option<String>,

    /// TOML config file (defaults to ./quiz-session.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log filter for stderr diagnostics, e.g. "debug" (RUST_LOG takes precedence)
    #[arg(long)]
    pub log: Option<String>,
}
