use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use metabolikal_sync::cli::args::{Cli, Commands};
use metabolikal_sync::cli::commands::{self, Context};
use metabolikal_sync::config::{Config, Paths};

const LOG_ENV: &str = "METABOLIKAL_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let paths = Paths::resolve(cli.home.as_deref()).context("could not resolve data directory")?;
    let config = Config::load_from_path(&paths.config_file)
        .with_context(|| format!("could not load {}", paths.config_file.display()))?;

    init_logging(&config.logging.level);
    tracing::debug!(root = %paths.root.display(), "starting");

    let ctx = Context::new(paths, config, cli.output);

    let output = match cli.command {
        Commands::Queue(args) => commands::queue(&ctx, args.command)?,
        Commands::Pending { source_id, date } => {
            commands::pending(&ctx, &source_id, date.as_deref())?
        }
        Commands::List => commands::list(&ctx)?,
        Commands::Status => commands::status(&ctx)?,
        Commands::Clear { force } => commands::clear(&ctx, force)?,
        Commands::Sync(args) => commands::sync(&ctx, args.command)?,
        Commands::Ledger { date } => commands::ledger(&ctx, date.as_deref())?,
        Commands::PlanDay { start, date, cycle } => {
            commands::plan_day(&ctx, &start, date.as_deref(), cycle)?
        }
        Commands::Completions { shell, install } => commands::completions(shell, install)?,
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
