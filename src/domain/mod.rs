//! Domain models and types for roitool.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **The closed object schema** ([`ObjectKind`], [`Details`], [`ModelObject`])
//! - **Strongly-typed identifiers** ([`ImageId`], [`Lsid`], [`LsidAuthority`])
//! - **Domain models** ([`Image`], [`Roi`], [`Shape`], [`Annotation`])
//! - **Error types** ([`RoiToolError`], [`LinkError`], [`LsidError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Shared annotations
//!
//! An annotation may be linked from an image, several ROIs and several shapes at
//! once. Owners hold it as `Arc<Annotation>`:
//!
//! ```rust
//! use roitool::domain::{Annotation, AnnotationValue, Roi};
//! use std::sync::Arc;
//!
//! let tag = Arc::new(Annotation::new(AnnotationValue::Tag("tumour".into())));
//! let mut first = Roi::new();
//! let mut second = Roi::new();
//! first.link_annotation(Arc::clone(&tag));
//! second.link_annotation(Arc::clone(&tag));
//! assert!(Arc::ptr_eq(&first.annotations[0], &second.annotations[0]));
//! ```

pub mod annotation;
pub mod errors;
pub mod ids;
pub mod image;
pub mod object;
pub mod result;
pub mod roi;

// Re-export commonly used types for convenience
pub use annotation::{Annotation, AnnotationKind, AnnotationOwner, AnnotationValue, MapPair};
pub use errors::{
    DocumentError, ExportError, LinkError, LsidError, ReferenceSide, RoiToolError, StoreError,
};
pub use ids::{ImageId, Lsid, LsidAuthority};
pub use image::{Channel, Image, Pixels, PlaneInfo, Quantity};
pub use object::{Details, ModelObject, ObjectKind, ObjectRef};
pub use result::Result;
pub use roi::{AffineTransform, FillRule, FontStyle, Marker, Roi, Shape, ShapeGeometry};
