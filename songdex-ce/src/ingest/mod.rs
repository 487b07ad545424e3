//! Catalog ingestion — column detection, title extraction, deduplication
//!
//! Input is pre-parsed tabular data (the service never reads spreadsheet
//! bytes). Each raw sheet passes through the column detector, then the title
//! extractor reads the detected columns row by row and builds the
//! deduplicated candidate list with per-title provenance.

pub mod column_detector;
pub mod title_extractor;

pub use column_detector::ColumnDetector;
pub use title_extractor::{normalize_key, strip_title_label, TitleExtractor};

use crate::models::{CatalogStats, ExtractedTitle, Sheet, SourceFile};
use serde::{Deserialize, Serialize};

/// Pre-parsed sheet as supplied by the raw sheet provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSheet {
    pub sheet_name: String,
    /// Header row cells
    pub headers: Vec<String>,
    /// Data rows (headers excluded)
    pub rows: Vec<Vec<String>>,
}

/// Pre-parsed file as supplied by the raw sheet provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFile {
    pub filename: String,
    pub sheets: Vec<RawSheet>,
}

/// Result of ingesting a set of raw files
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Per-file detection detail with bounded previews
    pub files: Vec<SourceFile>,
    /// Deduplicated titles in first-seen order
    pub titles: Vec<ExtractedTitle>,
    /// Derived aggregates over this input
    pub stats: CatalogStats,
}

/// Run detection and extraction over raw input
pub fn ingest(raw_files: &[RawFile]) -> IngestOutcome {
    let detector = ColumnDetector::new();

    let files: Vec<SourceFile> = raw_files
        .iter()
        .map(|file| SourceFile {
            filename: file.filename.clone(),
            sheets: file
                .sheets
                .iter()
                .map(|sheet| detector.detect_sheet(sheet))
                .collect(),
        })
        .collect();

    let (titles, raw_count) = TitleExtractor::new().extract(raw_files, &files);

    let stats = CatalogStats {
        total_files: files.len(),
        total_sheets: files.iter().map(|f| f.sheets.len()).sum(),
        total_titles: raw_count,
        unique_titles: titles.len(),
    };

    tracing::info!(
        total_files = stats.total_files,
        total_sheets = stats.total_sheets,
        total_titles = stats.total_titles,
        unique_titles = stats.unique_titles,
        "Catalog ingested"
    );

    IngestOutcome {
        files,
        titles,
        stats,
    }
}

/// Session-scoped catalog aggregate
///
/// Replaced wholesale on each ingest; never mutated in place.
#[derive(Debug, Default)]
pub struct CatalogStore {
    pub files: Vec<SourceFile>,
    pub titles: Vec<ExtractedTitle>,
    pub stats: CatalogStats,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, outcome: IngestOutcome) {
        self.files = outcome.files;
        self.titles = outcome.titles;
        self.stats = outcome.stats;
    }

    /// Look up an extracted title by its normalized key
    pub fn title_by_key(&self, key: &str) -> Option<&ExtractedTitle> {
        self.titles
            .iter()
            .find(|title| normalize_key(&title.title) == key)
    }
}
