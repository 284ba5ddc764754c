//! Command-line arguments for `knobs-demo`.

use clap::Parser;
use knobs_logger::LevelFilter;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "knobs-demo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve marketplace options from a seed file, the environment and flags")]
pub(crate) struct Cli {
    /// TOML or JSON file seeding the options
    #[arg(long, value_name = "PATH")]
    pub(crate) seed: Option<PathBuf>,

    /// Prefix of environment overrides (e.g. KNOBS__DOMAIN)
    #[arg(long, value_name = "PREFIX", default_value = "KNOBS")]
    pub(crate) env_prefix: String,

    /// Minimum log level written to stderr
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub(crate) level: LevelFilter,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub(crate) json_logs: bool,

    /// Append an option after loading; repeatable. Values are read as JSON when possible
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub(crate) append: Vec<(String, String)>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    Ok((key.trim().to_owned(), value.to_owned()))
}
