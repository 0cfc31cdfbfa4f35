use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use repsync::cli::args::{Cli, Commands};
use repsync::cli::commands::{self, Context};
use repsync::error::RepsyncError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        let code = e.downcast_ref::<RepsyncError>().map_or(1, RepsyncError::exit_code);
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Context::load(cli.output, cli.user)?;

    let output = match cli.command {
        Commands::Folder(args) => commands::folder(&ctx, args.command).await?,
        Commands::Routine(args) => commands::routine(&ctx, args.command).await?,
        Commands::Workout(args) => commands::workout(&ctx, args.command)?,
    };

    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}
