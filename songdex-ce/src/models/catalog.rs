//! Catalog read models — source files, sheets, extracted titles
//!
//! These records are created once at ingest time and never mutated after;
//! the aggregates in [`CatalogStats`] are recomputed from them on demand.

use serde::{Deserialize, Serialize};

/// How many raw rows a sheet keeps as preview sample
pub const PREVIEW_ROWS: usize = 5;

/// A detected column for one semantic role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMatch {
    /// Column display name as it appeared in the header row
    pub name: String,
    /// Zero-based column index
    pub index: usize,
}

/// Column matches per semantic role; absent roles stay `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedColumns {
    pub title: Option<ColumnMatch>,
    pub artist: Option<ColumnMatch>,
    pub lyrics: Option<ColumnMatch>,
}

/// One sheet of an ingested source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub sheet_name: String,
    pub detected_columns: DetectedColumns,
    /// Number of data rows in the sheet (headers excluded)
    pub row_count: usize,
    /// Bounded sample of raw rows, not the full sheet
    pub preview: Vec<Vec<String>>,
}

/// An ingested source file with its sheets, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    pub sheets: Vec<Sheet>,
}

/// File/sheet origin of an extracted title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleSource {
    pub filename: String,
    pub sheet_name: String,
}

/// A candidate song title extracted from a sheet
///
/// `title` is prefix-normalized (catalog label stripped, whitespace trimmed).
/// Deduplication is keyed on the lower-cased trimmed title; first-seen
/// provenance wins when duplicates collapse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedTitle {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    pub source: TitleSource,
}

/// Aggregate counts over the current catalog input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_files: usize,
    pub total_sheets: usize,
    /// Raw non-empty titles before deduplication
    pub total_titles: usize,
    /// Titles surviving deduplication
    pub unique_titles: usize,
}
