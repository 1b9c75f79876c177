// src/main.rs
mod docx;
mod extractors;
mod storage;
mod utils;

use clap::Parser;
use docx::BodySummary;
use extractors::TableExtractor;
use std::path::PathBuf;
use storage::{CollisionPolicy, SavedTable, StorageManager, StorageOptions, TableLayout};
use utils::AppError;

/// Extracts every table of a Word document into its own CSV file,
/// named after the "Table N: Title" caption that precedes it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the .docx document
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for extracted tables
    #[arg(short, long, default_value = "output_tables")]
    output_dir: PathBuf,

    /// Field delimiter for the written files (single ASCII character)
    #[arg(short, long, default_value = ",")]
    delimiter: String,

    /// What to do when an output file name is already taken
    #[arg(long, value_enum, default_value_t = CollisionPolicy::Overwrite)]
    on_collision: CollisionPolicy,

    /// Do not write manifest.json
    #[arg(long)]
    no_manifest: bool,

    /// Only log the names tables would get; write nothing
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn storage_options(&self) -> Result<StorageOptions, AppError> {
        Ok(StorageOptions {
            delimiter: parse_delimiter(&self.delimiter)?,
            collision: self.on_collision,
        })
    }
}

fn parse_delimiter(raw: &str) -> Result<u8, AppError> {
    match raw.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' && *byte != b'\r' => Ok(*byte),
        _ => Err(AppError::Config(format!(
            "Delimiter must be a single ASCII character other than a quote or newline, got {:?}",
            raw
        ))),
    }
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting table extraction for args: {:?}", args);

    run(&args)
}

fn run(args: &Args) -> Result<(), AppError> {
    let options = args.storage_options()?;

    // 2. Read the document body
    if !args.input.is_file() {
        return Err(AppError::Config(format!(
            "Input document {} does not exist",
            args.input.display()
        )));
    }
    let elements = docx::reader::read_document(&args.input)?;
    let summary = BodySummary::of(&elements);
    tracing::info!(
        "Read {} paragraphs and {} tables from {}",
        summary.paragraphs,
        summary.tables,
        args.input.display()
    );

    // 3. Name every table in one pass
    let tables = TableExtractor::new().extract_tables(&elements);
    if tables.is_empty() {
        tracing::warn!("No tables found in {}", args.input.display());
    }

    if args.dry_run {
        for table in &tables {
            let layout = TableLayout::plan(&table.rows);
            tracing::info!(
                "[dry run] {} ({} rows x {} columns, header: {})",
                table.name,
                layout.data_rows(),
                layout.columns(),
                layout.has_header()
            );
        }
        return Ok(());
    }

    // 4. Write tables in document order; the first failure aborts the run
    let mut storage = StorageManager::new(&args.output_dir, options)?;
    let saved = save_all(&mut storage, &tables)?;

    // 5. Manifest
    if !args.no_manifest {
        storage.save_manifest(&args.input, &saved)?;
    }

    tracing::info!(
        "Processing finished. Saved {} tables to {}",
        saved.len(),
        storage.base_dir().display()
    );
    Ok(())
}

fn save_all(
    storage: &mut StorageManager,
    tables: &[extractors::ExtractedTable],
) -> Result<Vec<SavedTable>, AppError> {
    let mut saved = Vec::with_capacity(tables.len());
    for table in tables {
        match storage.save_table(table) {
            Ok(entry) => saved.push(entry),
            Err(e) => {
                tracing::error!(
                    "Failed to save {} after {} tables were written: {}",
                    table.name,
                    saved.len(),
                    e
                );
                return Err(e.into());
            }
        }
    }
    Ok(saved)
}
