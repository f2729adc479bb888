use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use carseed::config::Config;
use carseed::{db, ensure_seeded, logger};

/// Load the demonstration drivers and cars, creating only what is missing.
#[derive(Parser)]
#[command(name = "carseed")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/carseed/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the connection to seed (default: the first configured)
    #[arg(long)]
    connection: Option<String>,

    /// Create the driver and car tables if they do not exist
    #[arg(long)]
    init_schema: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize file logging under the app config directory
    if let Ok(dir) = Config::app_config_dir() {
        let _ = logger::init(dir.join("carseed.log"));
    }

    let result = run(&cli);
    if let Err(err) = &result {
        log::error!("fatal error: {:#}", err);
    }
    result
}

fn run(cli: &Cli) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let config = Config::load(&path)?;
    let conn = config.select(cli.connection.as_deref())?;

    let mut store = db::open(&conn)?;
    if cli.init_schema {
        store
            .ensure_schema()
            .context("failed to create driver and car tables")?;
    }
    let report = ensure_seeded(store.as_mut())?;
    println!("{report}");
    Ok(())
}
