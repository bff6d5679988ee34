//! Import orchestration
//!
//! Reads a document into the object-graph linker, resolves it and commits the
//! linked ROIs to one image.

pub mod coordinator;
pub mod summary;

pub use coordinator::ImportCoordinator;
pub use summary::ImportSummary;
