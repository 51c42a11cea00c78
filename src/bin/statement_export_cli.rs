//! CLI tool for statement-xlsx - exports a JSON list of transactions as XLSX
//!
//! Usage:
//!   statement_export_cli <transactions.json> --source "January"
//!   statement_export_cli <transactions.json> --source "January" --save-to ~/Downloads
//!   statement_export_cli <transactions.json> --source "January" --open

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use statement_xlsx::delivery::FixedFolder;
use statement_xlsx::error::Result;
use statement_xlsx::{
    DeliveryChain, DeliveryOutcome, DeliveryStatus, ExportConfig, SaveToFolder, StatementExporter,
    SystemShare, Transaction,
};

/// Export a statement's transactions to an .xlsx workbook.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON file holding an array of transactions.
    input: PathBuf,

    /// Name of the source statement, used in the output file name.
    #[arg(long)]
    source: String,

    /// JSON export configuration file.
    #[arg(long, env = "STATEMENT_XLSX_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the generated file (overrides the config file).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// UTC offset for the Date column, e.g. +05:30 (overrides the config file).
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<String>,

    /// Copy the finished file into this folder.
    #[arg(long)]
    save_to: Option<PathBuf>,

    /// Open the finished file with the system handler.
    #[arg(long)]
    open: bool,

    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.log_level);
    debug!("Log level set to {}", args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };
    if let Some(dir) = &args.out_dir {
        config.output_dir = Some(dir.clone());
    }
    if let Some(offset) = &args.utc_offset {
        config.utc_offset = Some(offset.clone());
    }

    let data = std::fs::read_to_string(&args.input)?;
    let transactions: Vec<Transaction> = serde_json::from_str(&data)?;
    debug!(count = transactions.len(), "read transactions");

    let mut chain = DeliveryChain::new();
    if let Some(folder) = &args.save_to {
        chain = chain.with(SaveToFolder::new(FixedFolder(folder.clone())));
    }
    if args.open {
        chain = chain.with(SystemShare::default());
    }

    let mut exporter = StatementExporter::new(config)?;
    if !chain.is_empty() {
        exporter = exporter.with_delivery(chain);
    }

    let outcome = exporter.export(&args.source, &transactions)?;
    println!("{}", outcome.file.path.display());

    match outcome.delivery {
        DeliveryStatus::NotRequested => {}
        DeliveryStatus::Completed(DeliveryOutcome::Delivered { channel, location }) => {
            match location {
                Some(path) => eprintln!("Delivered via {channel}: {}", path.display()),
                None => eprintln!("Delivered via {channel}"),
            }
        }
        DeliveryStatus::Completed(DeliveryOutcome::Cancelled { channel }) => {
            eprintln!("Delivery via {channel} cancelled; file kept at the path above");
        }
        DeliveryStatus::Failed(err) => {
            eprintln!("File written but not delivered: {err}");
        }
    }
    Ok(())
}

fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            "statement_xlsx",
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
