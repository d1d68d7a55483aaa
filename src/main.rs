use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod db;
mod lock;
mod logging;
mod markdown;
mod models;
mod render;
mod source;
mod sync;

use commands::{ConfigCommand, Context, ImportCommand, PullCommand, RenderCommand, SyncCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "caljournal")]
#[command(version)]
#[command(about = "Sync calendar events into SQLite and Markdown journals", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch events and render documents and journals
    Sync(SyncCommand),

    /// Fetch events into the store only
    Import(ImportCommand),

    /// Render documents and journals from the store only
    Render(RenderCommand),

    /// Copy event document frontmatter back into the store
    Pull(PullCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;
    logging::init(config.log_file.value.as_deref())?;

    match cli.command {
        Some(Commands::Sync(cmd)) => {
            let ctx = Context::open(config).await?;
            cmd.run(&ctx).await?;
        }
        Some(Commands::Import(cmd)) => {
            let ctx = Context::open(config).await?;
            cmd.run(&ctx).await?;
        }
        Some(Commands::Render(cmd)) => {
            let ctx = Context::open(config).await?;
            cmd.run(&ctx).await?;
        }
        Some(Commands::Pull(cmd)) => {
            let ctx = Context::open(config).await?;
            cmd.run(&ctx).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
