//! Keepsake CLI - prune dated backup files against a tiered retention policy

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use keepsake::config::Config;
use keepsake_cli::commands::{CleanCommand, ConfigCommand};
use keepsake_cli::error::CliResult;
use keepsake_cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "keepsake")]
#[command(about = "Prune dated backup files with GFS-style retention")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Classify files in a directory and delete or move the expired ones")]
    Clean(CleanCommand),

    #[clap(about = "Show the effective configuration")]
    Config(ConfigCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    init_logging();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Clean(cmd) => cmd.execute(&config, format),
        Command::Config(cmd) => cmd.execute(&config, format),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,keepsake=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
