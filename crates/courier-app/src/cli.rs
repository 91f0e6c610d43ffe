use clap::Parser;

/// Courier — a terminal client for the chat server.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about)]
pub struct Args {
    /// Server base URL override (e.g. http://localhost:3000).
    #[arg(short = 's', long)]
    pub server: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
