mod commands;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "hsmoa")]
#[command(about = "Collect a day's home-shopping broadcast schedule from hsmoa.com")]
struct Cli {
    /// Console output: table, json, or none
    #[arg(long, default_value = "table", global = true)]
    format: String,

    #[command(flatten)]
    collect: commands::collect::CollectArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List known channel codes and display names
    Channels,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hsmoa=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.format.as_str() {
        "json" => OutputFormat::Json,
        "none" => OutputFormat::None,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Some(Commands::Channels) => {
            commands::channels::run(&format)?;
            Ok(ExitCode::SUCCESS)
        }
        None => commands::collect::run(&cli.collect, &format).await,
    }
}
