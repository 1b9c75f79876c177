// src/extractors/mod.rs
pub mod caption;
pub mod tables;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use caption::{parse_caption, sanitize_title, Caption};
#[allow(unused_imports)]
pub use tables::{ExtractedTable, ExtractionState, TableExtractor, TableName};
