pub mod chunk;
pub mod cli;
pub mod columns;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod io_utils;
pub mod job;
pub mod layout;
pub mod normalize;
pub mod reconcile_cmd;
pub mod summary;
pub mod table;
pub mod workbook;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

pub use dataset::{CellValue, Dataset};
pub use engine::{MatchMode, ReconcileOptions, Reconciliation, reconcile};
pub use error::ReconcileError;
pub use normalize::KeySpec;
pub use summary::Summary;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_recon", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sheets(args) => handle_sheets(&args),
        Commands::Columns(args) => columns::execute(&args),
        Commands::Reconcile(args) => reconcile_cmd::execute(&args),
    }
}

fn handle_sheets(args: &cli::SheetsArgs) -> Result<()> {
    let names = workbook::sheet_names(&args.input)
        .with_context(|| format!("Listing sheets of {:?}", args.input))?;
    let rows = names
        .iter()
        .enumerate()
        .map(|(idx, name)| vec![(idx + 1).to_string(), name.clone()])
        .collect::<Vec<_>>();
    let headers = vec!["#".to_string(), "sheet".to_string()];
    table::print_table(&headers, &rows);
    info!("Listed {} sheet(s) in {:?}", names.len(), args.input);
    Ok(())
}
