#![allow(clippy::print_stdout)]

mod args;
mod marketplace;

use crate::args::Cli;
use crate::marketplace::Marketplace;

use anyhow::{Context, Result};
use clap::Parser;
use knobs::{Options, Resolver};
use knobs_loader::OptionsLoader;
use knobs_logger::{LogFormat, Logger};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _logger = Logger::builder()
        .name("knobs-demo")
        .level(cli.level)
        .format(if cli.json_logs { LogFormat::Json } else { LogFormat::Compact })
        .init()?;

    let mut loader = OptionsLoader::new().env_prefix(cli.env_prefix.as_str());
    if let Some(seed) = &cli.seed {
        loader = loader.file(seed);
    }
    let store = loader.load()?;
    info!(options = store.len(), "Seed options loaded");

    let mut options = Options::from_parts(store, Resolver::new());
    marketplace::register_filters(&mut options)?;
    for (key, raw) in &cli.append {
        options
            .append(key.as_str(), marketplace::parse_value(raw))
            .with_context(|| format!("Failed to append option '{key}'"))?;
    }

    let resolved =
        options.resolve_with(&Marketplace).context("Failed to resolve marketplace options")?;
    info!(options = resolved.len(), "Marketplace options resolved");

    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
