//! Title extraction and deduplication
//!
//! Reads the detected title column of every sheet, strips the known catalog
//! label prefix, trims whitespace, and discards empty titles. The unique set
//! is keyed on the normalized title (lower-cased, trimmed); canonical titles
//! live in an ordered list with a side index from key to slot, so membership
//! checks are O(1) and output order is first-seen order.

use super::{RawFile, RawSheet};
use crate::models::{ExtractedTitle, SourceFile, TitleSource};
use std::collections::HashMap;

/// Catalog label prefixes stripped from title cells (lowercase)
pub const TITLE_LABEL_PREFIXES: &[&str] = &["música:", "musica:", "song name:"];

/// Normalized dedup key for a title
pub fn normalize_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Strip one leading catalog label (case-insensitive) and trim
///
/// Stripping is idempotent: the label never survives a pass, so a second
/// pass finds nothing to strip.
pub fn strip_title_label(raw: &str) -> &str {
    let trimmed = raw.trim();
    for prefix in TITLE_LABEL_PREFIXES {
        if let Some(rest) = strip_prefix_ignore_case(trimmed, prefix) {
            return rest.trim();
        }
    }
    trimmed
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut remainder = s;
    for p in prefix.chars() {
        let mut chars = remainder.chars();
        let c = chars.next()?;
        if c.to_lowercase().eq(p.to_lowercase()) {
            remainder = chars.as_str();
        } else {
            return None;
        }
    }
    Some(remainder)
}

/// Extracts and deduplicates candidate titles across all ingested sheets
#[derive(Debug, Default)]
pub struct TitleExtractor;

impl TitleExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Walk every sheet with a detected title column, in input order
    ///
    /// Returns the deduplicated titles plus the raw (pre-dedup, non-empty)
    /// count. First-seen provenance wins, including the artist and lyrics
    /// values, so output is deterministic for a given input ordering.
    pub fn extract(
        &self,
        raw_files: &[RawFile],
        detected_files: &[SourceFile],
    ) -> (Vec<ExtractedTitle>, usize) {
        let mut titles: Vec<ExtractedTitle> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut raw_count = 0;

        for (raw_file, file) in raw_files.iter().zip(detected_files) {
            for (raw_sheet, sheet) in raw_file.sheets.iter().zip(&file.sheets) {
                let columns = &sheet.detected_columns;
                let Some(title_col) = &columns.title else {
                    tracing::debug!(
                        file = %raw_file.filename,
                        sheet = %raw_sheet.sheet_name,
                        "No title column detected, skipping sheet"
                    );
                    continue;
                };

                for row in &raw_sheet.rows {
                    let Some(cell) = row.get(title_col.index) else {
                        continue;
                    };
                    let title = strip_title_label(cell);
                    if title.is_empty() {
                        continue;
                    }
                    raw_count += 1;

                    let key = normalize_key(title);
                    if index.contains_key(&key) {
                        continue;
                    }

                    index.insert(key, titles.len());
                    titles.push(ExtractedTitle {
                        title: title.to_string(),
                        artist: column_value(columns.artist.as_ref(), row),
                        lyrics: column_value(columns.lyrics.as_ref(), row),
                        source: TitleSource {
                            filename: raw_file.filename.clone(),
                            sheet_name: raw_sheet.sheet_name.clone(),
                        },
                    });
                }
            }
        }

        (titles, raw_count)
    }
}

fn column_value(column: Option<&crate::models::ColumnMatch>, row: &[String]) -> Option<String> {
    let cell = row.get(column?.index)?.trim();
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}
