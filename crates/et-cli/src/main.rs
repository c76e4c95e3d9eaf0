use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use et_cli::commands::{demo, recommend, register, status, train};
use et_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so a second initialization doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Register(args)) => {
            let config = load_config(cli.config.as_deref())?;
            register::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Recommend(args)) => {
            let config = load_config(cli.config.as_deref())?;
            recommend::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Train { min_workouts }) => {
            let config = load_config(cli.config.as_deref())?;
            train::run(&mut stdout, *min_workouts, &config)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            status::run(&mut stdout, &config)?;
        }
        Some(Commands::Demo) => {
            // In-memory only; no config or storage needed
            demo::run(&mut stdout)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
