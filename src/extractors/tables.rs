// src/extractors/tables.rs

// --- Imports ---
use crate::docx::DocumentElement;
use crate::extractors::caption::{parse_caption, Caption};
use std::fmt;

/// Title fragment used when a table had no caption (or an empty one).
pub const UNTITLED: &str = "Untitled";

// --- Data Structures ---

/// Deterministic output name of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub section_id: u32,
    pub table_index: u32,
    pub title: Option<String>,
}

impl TableName {
    /// `A01`, `A02`, ...
    pub fn section_label(&self) -> String {
        format!("A{:02}", self.section_id)
    }

    pub fn title_or_placeholder(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => UNTITLED,
        }
    }

    /// File stem without extension, e.g. `A01_Table_2_Untitled`.
    pub fn stem(&self) -> String {
        format!(
            "{}_Table_{}_{}",
            self.section_label(),
            self.table_index,
            self.title_or_placeholder()
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.stem())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// A named table ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    pub name: TableName,
    pub rows: Vec<Vec<String>>,
}

/// Running caption/section state carried across one body walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionState {
    pub section_id: Option<u32>,
    pub table_in_section: u32,
    /// Title from the last caption, held until the next table consumes it.
    pub pending_title: Option<String>,
}

impl ExtractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one paragraph through the caption parser.
    /// Returns the caption if the paragraph was one; otherwise state is untouched.
    pub fn observe_paragraph(&mut self, text: &str) -> Option<Caption> {
        let caption = parse_caption(text)?;

        if caption.starts_section() {
            self.section_id = Some(self.section_id.map_or(1, |id| id + 1));
            self.table_in_section = 1;
        } else {
            self.table_in_section += 1;
        }
        self.pending_title = Some(caption.title.clone());

        tracing::debug!(
            "Caption 'Table {}' -> section {:?}, table {}, title '{}'",
            caption.number,
            self.section_id,
            self.table_in_section,
            caption.title
        );
        Some(caption)
    }

    /// Names the table at the current position and consumes the pending title.
    pub fn name_table(&mut self) -> TableName {
        let section_id = match self.section_id {
            None => {
                self.table_in_section = 1;
                1
            }
            Some(id) => {
                if self.pending_title.is_none() {
                    self.table_in_section += 1;
                }
                id
            }
        };
        self.section_id = Some(section_id);

        TableName {
            section_id,
            table_index: self.table_in_section,
            title: self.pending_title.take(),
        }
    }
}

// --- Extractor ---

/// Walks body elements once, in order, naming every table it meets.
#[derive(Debug, Default)]
pub struct TableExtractor;

impl TableExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_tables(&self, elements: &[DocumentElement]) -> Vec<ExtractedTable> {
        let mut state = ExtractionState::new();
        let mut tables = Vec::new();

        for element in elements {
            match element {
                DocumentElement::Paragraph { text } => {
                    state.observe_paragraph(text);
                }
                DocumentElement::Table { rows } => {
                    let name = state.name_table();
                    tracing::debug!("Table {} named {}", tables.len() + 1, name);
                    tables.push(ExtractedTable {
                        name,
                        rows: rows.clone(),
                    });
                }
            }
        }

        tracing::info!("Named {} tables", tables.len());
        tables
    }
}
