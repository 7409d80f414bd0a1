//! Command-line interface.

pub mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::config::{FileConfig, Overrides, RunConfig, SiteConfig};

/// Config file consulted when present in the working directory.
const CONFIG_FILE: &str = "config.yaml";

/// Dynamic rendering behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DynamicMode {
    /// Render only when the static result looks incomplete.
    Auto,
    /// Render every page.
    Always,
}

impl DynamicMode {
    fn as_str(&self) -> &'static str {
        match self {
            DynamicMode::Auto => "auto",
            DynamicMode::Always => "always",
        }
    }
}

#[derive(Parser)]
#[command(name = "shopscrape")]
#[command(about = "Product listing scraper with heuristic price extraction")]
#[command(version)]
pub struct Cli {
    /// Seed URL list, one per line
    #[arg(long)]
    sites: Option<PathBuf>,

    /// Directory for the report file
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Max products per site
    #[arg(long, env = "SCRAPER_FIRST_N")]
    first_n: Option<usize>,

    /// Dynamic rendering behavior
    #[arg(long, value_enum, env = "SCRAPER_DYNAMIC")]
    dynamic: Option<DynamicMode>,

    /// Force static fetches only (no browser)
    #[arg(long)]
    static_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Parse arguments, resolve effective settings, run the scrape.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = FileConfig::load(Path::new(CONFIG_FILE))?;
    let sites = SiteConfig::from_entries(&file_config.sites);
    let overrides = Overrides {
        sites_file: cli.sites,
        out_dir: cli.out_dir,
        first_n: cli.first_n,
        dynamic: cli.dynamic.map(|mode| mode.as_str().to_string()),
        static_only: cli.static_only,
    };
    let run_config = RunConfig::resolve(&overrides, &file_config.defaults);

    commands::cmd_scrape(&run_config, &sites).await
}
