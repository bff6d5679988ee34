//! OME-XML documents
//!
//! Supported subset:
//!
//! ```text
//! OME
//! ├── Image*            (Pixels > Channel*, MetadataOnly, Plane*; ROIRef*; AnnotationRef*)
//! ├── StructuredAnnotations
//! │   └── *Annotation   (Description?, Value)
//! └── ROI*              (Union > Shape*; AnnotationRef*; Description?)
//! ```
//!
//! Shapes carry a `Transform` child and their own `AnnotationRef`s. Unknown
//! elements are ignored on read. Text is read as written; an `XMLAnnotation`
//! value holding markup is kept as that markup.

mod reader;
mod writer;

use crate::domain::AnnotationKind;

/// Default namespace of written documents
pub const OME_NAMESPACE: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";

/// Reads and writes OME-XML
#[derive(Debug, Clone, Copy, Default)]
pub struct OmeXml;

/// Element name of an annotation kind
fn annotation_element(kind: AnnotationKind) -> &'static str {
    match kind {
        AnnotationKind::Boolean => "BooleanAnnotation",
        AnnotationKind::Comment => "CommentAnnotation",
        AnnotationKind::Double => "DoubleAnnotation",
        AnnotationKind::Long => "LongAnnotation",
        AnnotationKind::Map => "MapAnnotation",
        AnnotationKind::Tag => "TagAnnotation",
        AnnotationKind::Term => "TermAnnotation",
        AnnotationKind::Timestamp => "TimestampAnnotation",
        AnnotationKind::Xml => "XMLAnnotation",
    }
}

fn annotation_kind_of(element: &str) -> Option<AnnotationKind> {
    AnnotationKind::ALL
        .into_iter()
        .find(|kind| annotation_element(*kind) == element)
}
