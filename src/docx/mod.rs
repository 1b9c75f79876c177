// src/docx/mod.rs
pub mod models;
pub mod reader;

pub use models::{BodySummary, DocumentElement};
