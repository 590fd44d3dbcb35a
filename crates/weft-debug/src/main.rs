//! `weft`: parse files with the bracket grammar and inspect incremental
//! reparses.

mod cli;
mod commands;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use weft_syntax::SyntaxConfig;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Tree { file, stop } => {
            let text = read(&file)?;
            let config = load_config(cli.config.as_deref(), &file)?;
            print!("{}", commands::tree(&text, &config, stop)?);
        }
        Command::Edit {
            file,
            at,
            delete,
            insert,
            tree,
        } => {
            let text = read(&file)?;
            let config = load_config(cli.config.as_deref(), &file)?;
            print!(
                "{}",
                commands::edit(&text, &config, at, delete, &insert, tree)?
            );
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_config(explicit: Option<&Path>, input: &Path) -> Result<SyntaxConfig> {
    let config = match explicit {
        Some(path) => SyntaxConfig::load(path)?,
        None => SyntaxConfig::discover(input.parent().unwrap_or_else(|| Path::new(".")))?,
    };
    info!("Using {config:?}");
    Ok(config)
}
