// src/docx/models.rs

/// One top-level block of a document body, in original document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentElement {
    Paragraph { text: String },
    /// Rows of trimmed cell text, one entry per layout-grid column.
    Table { rows: Vec<Vec<String>> },
}

impl DocumentElement {
    pub fn paragraph(text: impl Into<String>) -> Self {
        DocumentElement::Paragraph { text: text.into() }
    }

    #[cfg(test)]
    pub fn table<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        DocumentElement::Table {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

/// Counts of what a body walk produced, used for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BodySummary {
    pub paragraphs: usize,
    pub tables: usize,
}

impl BodySummary {
    pub fn of(elements: &[DocumentElement]) -> Self {
        elements.iter().fold(Self::default(), |mut acc, el| {
            match el {
                DocumentElement::Paragraph { .. } => acc.paragraphs += 1,
                DocumentElement::Table { .. } => acc.tables += 1,
            }
            acc
        })
    }
}
