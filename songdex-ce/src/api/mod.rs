//! HTTP API handlers
//!
//! The presentation layer consumes read models and issues commands over
//! these routes; live updates stream over `/events` (SSE).

pub mod batch;
pub mod catalog;
pub mod errors;
pub mod health;
pub mod selection;
pub mod sse;
pub mod validation;

pub use batch::batch_routes;
pub use catalog::catalog_routes;
pub use errors::error_routes;
pub use health::health_routes;
pub use selection::selection_routes;
pub use sse::event_stream;
pub use validation::validation_routes;
