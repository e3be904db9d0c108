use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let parsed = cli::Cli::parse();

    // Dispatch to CLI handler; any failed command maps to a non-zero exit
    let summary = parsed.dispatch().await?;
    if !summary.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
