//! Object-graph linker
//!
//! Rebuilds ROIs, their shapes and their annotation links from the flat records
//! a document reader emits, then commits the ROIs to the store as one batch.
//!
//! Resolution is two-phase. Containers are all registered first, so a reference
//! may name an object declared before or after it in the document. Links are
//! realized through a table keyed by (target role, reference role); a pair with
//! no entry is an error rather than a dropped link.

pub mod graph;
mod links;
pub mod records;

pub use graph::{CommittedGraph, LinkerState, ObjectGraphLinker, ResolvedGraph};
pub use records::{ContainerRecord, GraphObject, IndexAxis, Indexes, ReferenceRecord};
