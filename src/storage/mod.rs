// src/storage/mod.rs
use crate::extractors::tables::{ExtractedTable, TableName};
use crate::utils::error::StorageError;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

/// What to do when a table's file name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CollisionPolicy {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Keep the existing file and write `<name>_2.csv`, `<name>_3.csv`, ...
    Suffix,
}

#[derive(Debug, Clone, Copy)]
pub struct StorageOptions {
    pub delimiter: u8,
    pub collision: CollisionPolicy,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            collision: CollisionPolicy::Overwrite,
        }
    }
}

/// How a table's rows are laid out in the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLayout {
    /// First row is the header, data rows are padded to its width.
    WithHeader {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Widest data row disagrees with the header: columns are labelled
    /// `0..width` and every row is data.
    Positional {
        width: usize,
        rows: Vec<Vec<String>>,
    },
    /// Table without rows.
    Empty,
}

impl TableLayout {
    pub fn plan(rows: &[Vec<String>]) -> Self {
        let Some((header, data)) = rows.split_first() else {
            return TableLayout::Empty;
        };

        // Short data rows are padded; only the widest data row decides
        // whether the first row can serve as the header.
        let data_width = data.iter().map(Vec::len).max();
        if data_width.map_or(true, |w| w == header.len()) {
            return TableLayout::WithHeader {
                header: header.clone(),
                rows: pad_rows(data, header.len()),
            };
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        tracing::debug!(
            "Ragged table (header has {} columns, widest row {}), using positional columns",
            header.len(),
            width
        );
        let padded = pad_rows(rows, width);
        TableLayout::Positional { width, rows: padded }
    }

    pub fn has_header(&self) -> bool {
        matches!(self, TableLayout::WithHeader { .. })
    }

    pub fn data_rows(&self) -> usize {
        match self {
            TableLayout::WithHeader { rows, .. } | TableLayout::Positional { rows, .. } => rows.len(),
            TableLayout::Empty => 0,
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            TableLayout::WithHeader { header, .. } => header.len(),
            TableLayout::Positional { width, .. } => *width,
            TableLayout::Empty => 0,
        }
    }

    /// Writes the header line (real or positional) followed by the data rows.
    pub fn write_to<W: Write>(&self, out: W, delimiter: u8) -> Result<(), StorageError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);

        match self {
            TableLayout::WithHeader { header, rows } => {
                writer.write_record(header)?;
                for row in rows {
                    writer.write_record(row)?;
                }
            }
            TableLayout::Positional { width, rows } => {
                writer.write_record((0..*width).map(|i| i.to_string()))?;
                for row in rows {
                    writer.write_record(row)?;
                }
            }
            TableLayout::Empty => {}
        }

        writer.flush()?;
        Ok(())
    }
}

fn pad_rows(rows: &[Vec<String>], width: usize) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut row = row.clone();
            row.resize(width, String::new());
            row
        })
        .collect()
}

/// One table as it landed on disk; also the manifest entry.
#[derive(Debug, Clone, Serialize)]
pub struct SavedTable {
    pub file: String,
    pub section: String,
    pub table_index: u32,
    pub title: String,
    pub rows: usize,
    pub columns: usize,
    pub has_header: bool,
    #[serde(skip)]
    pub path: PathBuf,
}

impl SavedTable {
    fn new(name: &TableName, layout: &TableLayout, path: PathBuf) -> Self {
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.file_name());
        Self {
            file,
            section: name.section_label(),
            table_index: name.table_index,
            title: name.title_or_placeholder().to_string(),
            rows: layout.data_rows(),
            columns: layout.columns(),
            has_header: layout.has_header(),
            path,
        }
    }
}

pub struct StorageManager {
    base_dir: PathBuf,
    options: StorageOptions,
    written: HashSet<PathBuf>,
}

impl StorageManager {
    /// Creates a new StorageManager, creating the output directory if needed
    pub fn new<P: AsRef<Path>>(base_dir: P, options: StorageOptions) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
            tracing::debug!("Created output directory {}", base_path.display());
        }

        Ok(Self {
            base_dir: base_path,
            options,
            written: HashSet::new(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Serializes one table into the output directory.
    pub fn save_table(&mut self, table: &ExtractedTable) -> Result<SavedTable, StorageError> {
        let layout = TableLayout::plan(&table.rows);
        let file_path = self.resolve_path(&table.name);

        let file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        layout.write_to(file, self.options.delimiter)?;

        self.written.insert(file_path.clone());
        tracing::info!("Saved table to {}", file_path.display());

        Ok(SavedTable::new(&table.name, &layout, file_path))
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.written.contains(path) || path.exists()
    }

    fn resolve_path(&self, name: &TableName) -> PathBuf {
        let candidate = self.base_dir.join(name.file_name());

        match self.options.collision {
            CollisionPolicy::Overwrite => {
                if self.written.contains(&candidate) {
                    tracing::warn!(
                        "{} was already written in this run and will be overwritten",
                        candidate.display()
                    );
                }
                candidate
            }
            CollisionPolicy::Suffix => {
                let stem = name.stem();
                let mut path = candidate;
                let mut n = 1;
                while self.is_taken(&path) {
                    n += 1;
                    path = self.base_dir.join(format!("{}_{}.csv", stem, n));
                }
                if n > 1 {
                    tracing::debug!("Name {} taken, using {}", name, path.display());
                }
                path
            }
        }
    }

    /// Saves a JSON summary of the run next to the tables
    pub fn save_manifest(&self, source: &Path, tables: &[SavedTable]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(MANIFEST_FILE);

        let manifest = serde_json::json!({
            "source": source.display().to_string(),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
            "delimiter": char::from(self.options.delimiter).to_string(),
            "table_count": tables.len(),
            "tables": tables,
        });

        let manifest_str = serde_json::to_string_pretty(&manifest)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, manifest_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved manifest to {}", file_path.display());

        Ok(file_path)
    }
}
