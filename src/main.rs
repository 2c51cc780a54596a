mod classify;
mod error;
mod report;
mod scan;
mod settings;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use report::StdoutSink;
use scan::ScanOutcome;
use settings::Settings;
use store::{SqliteReader, SqliteStore};

#[derive(Parser)]
#[command(name = "image_audit", about = "Classify catalog image URLs by storage host")]
struct Cli {
    /// Settings file (TOML). Defaults to ./image_audit.toml when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report every record's image URL and its classification
    Scan,
    /// Load a JSON export into the configured collection
    Import {
        /// Array of objects with an `id`, or an object keyed by id
        file: PathBuf,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    info!(
        store = ?settings.store_path,
        collection = %settings.collection,
        "settings loaded"
    );

    match cli.command.unwrap_or(Commands::Scan) {
        Commands::Scan => {
            let store = SqliteReader::new(&settings.store_path, settings.fields());
            let mut sink = StdoutSink::new();
            // open and fetch failures are reported by the scan itself and do not change the exit code
            match scan::scan(&store, &settings.collection, &settings.classifier(), &mut sink) {
                ScanOutcome::Completed(summary) => info!(?summary, "scan finished"),
                ScanOutcome::Failed(e) => warn!("scan aborted: {}", e),
            }
        }
        Commands::Import { file } => {
            let store = SqliteStore::open(&settings.store_path, settings.fields())?;
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let docs = store::parse_export(&text)
                .with_context(|| format!("Failed to parse {:?}", file))?;
            let written = store.import(&settings.collection, &docs)?;
            println!(
                "Imported {} documents into '{}' ({:?})",
                written, settings.collection, settings.store_path
            );
        }
    }
    Ok(())
}
