//! Data models for songdex-ce (Catalog Enrichment service)

pub mod batch_session;
pub mod catalog;
pub mod error_log;
pub mod music_item;

pub use batch_session::{BatchSession, ProcessingSnapshot, StateTransition};
pub use catalog::{
    CatalogStats, ColumnMatch, DetectedColumns, ExtractedTitle, Sheet, SourceFile, TitleSource,
};
pub use error_log::{ErrorEntry, ErrorLog};
pub use music_item::{EnrichedFields, ItemStatus, ItemStore, MusicItem};
