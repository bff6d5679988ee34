//! Document reader and writer abstractions
//!
//! Readers turn a structured document into linker records; writers serialize
//! a metadata projection. Neither knows about the store.

use crate::core::linker::{ContainerRecord, ObjectGraphLinker, ReferenceRecord};
use crate::core::metadata::MetadataRetrieve;
use crate::domain::{LinkError, Result};
use std::path::Path;

/// Receives records in document order
pub trait RecordSink {
    /// # Errors
    ///
    /// Returns the sink's rejection of a structurally invalid container.
    fn add_container(&mut self, record: ContainerRecord) -> std::result::Result<(), LinkError>;

    fn add_reference(&mut self, record: ReferenceRecord);
}

impl RecordSink for ObjectGraphLinker {
    fn add_container(&mut self, record: ContainerRecord) -> std::result::Result<(), LinkError> {
        ObjectGraphLinker::add_container(self, record)
    }

    fn add_reference(&mut self, record: ReferenceRecord) {
        ObjectGraphLinker::add_reference(self, record);
    }
}

/// Counts of the records a read produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub containers: usize,
    pub references: usize,
}

/// Emits container and reference records from a document
///
/// Containers are emitted top-down: a ROI always precedes its shapes.
pub trait DocumentReader {
    /// # Errors
    ///
    /// Returns an I/O error if the document cannot be read, a
    /// [`crate::domain::DocumentError`] for malformed content, or the sink's
    /// [`LinkError`].
    fn read(&self, path: &Path, sink: &mut dyn RecordSink) -> Result<ReadStats>;
}

/// Serializes a complete document
pub trait DocumentWriter {
    /// Renders the whole document before touching `path`
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::DocumentError::WriteFailed`] if rendering or
    /// writing fails; no partial file is left behind.
    fn write(&self, metadata: &dyn MetadataRetrieve, path: &Path) -> Result<()>;
}
