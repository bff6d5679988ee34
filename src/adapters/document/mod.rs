//! Document adapters
//!
//! - [`traits`] - reader/writer interfaces and the record sink
//! - [`ome_xml`] - OME-XML implementation of both

pub mod ome_xml;
pub mod traits;

pub use ome_xml::OmeXml;
pub use traits::{DocumentReader, DocumentWriter, ReadStats, RecordSink};
