//! Shared types for Songdex modules
//!
//! Provides the common error type, the event bus used for SSE broadcasting,
//! and configuration resolution shared by the service binaries.

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
