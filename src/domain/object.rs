//! The closed domain schema
//!
//! Every object the tool moves between a document and the store has an
//! [`ObjectKind`] and a set of persistence [`Details`]. The schema is fixed, so
//! the mapping from kind to canonical type name is a static table rather than
//! anything discovered at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of domain objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Abstract domain root. Carries no type name of its own.
    Object,
    Image,
    Pixels,
    Channel,
    PlaneInfo,
    Roi,
    Rectangle,
    Ellipse,
    Point,
    Line,
    Polyline,
    Polygon,
    Label,
    Mask,
    BooleanAnnotation,
    CommentAnnotation,
    DoubleAnnotation,
    LongAnnotation,
    MapAnnotation,
    TagAnnotation,
    TermAnnotation,
    TimestampAnnotation,
    XmlAnnotation,
}

/// Canonical type names of the concrete kinds
const CANONICAL_NAMES: &[(ObjectKind, &str)] = &[
    (ObjectKind::Image, "Image"),
    (ObjectKind::Pixels, "Pixels"),
    (ObjectKind::Channel, "Channel"),
    (ObjectKind::PlaneInfo, "PlaneInfo"),
    (ObjectKind::Roi, "Roi"),
    (ObjectKind::Rectangle, "Rectangle"),
    (ObjectKind::Ellipse, "Ellipse"),
    (ObjectKind::Point, "Point"),
    (ObjectKind::Line, "Line"),
    (ObjectKind::Polyline, "Polyline"),
    (ObjectKind::Polygon, "Polygon"),
    (ObjectKind::Label, "Label"),
    (ObjectKind::Mask, "Mask"),
    (ObjectKind::BooleanAnnotation, "BooleanAnnotation"),
    (ObjectKind::CommentAnnotation, "CommentAnnotation"),
    (ObjectKind::DoubleAnnotation, "DoubleAnnotation"),
    (ObjectKind::LongAnnotation, "LongAnnotation"),
    (ObjectKind::MapAnnotation, "MapAnnotation"),
    (ObjectKind::TagAnnotation, "TagAnnotation"),
    (ObjectKind::TermAnnotation, "TermAnnotation"),
    (ObjectKind::TimestampAnnotation, "TimestampAnnotation"),
    (ObjectKind::XmlAnnotation, "XmlAnnotation"),
];

impl ObjectKind {
    /// Canonical type name, or `None` for the abstract root
    pub fn canonical_name(self) -> Option<&'static str> {
        CANONICAL_NAMES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, name)| *name)
    }

    /// Returns true for the abstract domain root
    pub fn is_abstract(self) -> bool {
        self.canonical_name().is_none()
    }

    /// Returns true for the geometric shape kinds
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            ObjectKind::Rectangle
                | ObjectKind::Ellipse
                | ObjectKind::Point
                | ObjectKind::Line
                | ObjectKind::Polyline
                | ObjectKind::Polygon
                | ObjectKind::Label
                | ObjectKind::Mask
        )
    }

    /// Returns true for the annotation kinds
    pub fn is_annotation(self) -> bool {
        matches!(
            self,
            ObjectKind::BooleanAnnotation
                | ObjectKind::CommentAnnotation
                | ObjectKind::DoubleAnnotation
                | ObjectKind::LongAnnotation
                | ObjectKind::MapAnnotation
                | ObjectKind::TagAnnotation
                | ObjectKind::TermAnnotation
                | ObjectKind::TimestampAnnotation
                | ObjectKind::XmlAnnotation
        )
    }

    /// Looks up a concrete kind by its canonical name
    pub fn from_canonical_name(name: &str) -> Option<Self> {
        CANONICAL_NAMES
            .iter()
            .find(|(_, candidate)| *candidate == name)
            .map(|(kind, _)| *kind)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name().unwrap_or("Object"))
    }
}

/// Store-assigned persistence details
///
/// Both fields are `None` for objects created during an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Details {
    pub id: Option<i64>,
    pub update_event: Option<i64>,
}

impl Details {
    /// Details of an object that has been persisted at the given revision
    pub fn persisted(id: i64, update_event: i64) -> Self {
        Self {
            id: Some(id),
            update_event: Some(update_event),
        }
    }

    /// Details carrying only an identity, as on an unloaded reference
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            update_event: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Common surface of every domain object
pub trait ModelObject {
    /// Concrete kind of this object
    fn kind(&self) -> ObjectKind;

    /// Persistence details
    fn details(&self) -> &Details;

    fn id(&self) -> Option<i64> {
        self.details().id
    }
}

/// Identity-only reference to an object that has not been loaded
///
/// Imported ROIs point at their image through one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub details: Details,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, id: i64) -> Self {
        Self {
            kind,
            details: Details::with_id(id),
        }
    }
}

impl ModelObject for ObjectRef {
    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn details(&self) -> &Details {
        &self.details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_concrete_kind_has_a_unique_name() {
        let mut names: Vec<&str> = CANONICAL_NAMES.iter().map(|(_, name)| *name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_root_kind_is_abstract() {
        assert!(ObjectKind::Object.is_abstract());
        assert_eq!(ObjectKind::Object.canonical_name(), None);
        assert!(!ObjectKind::Roi.is_abstract());
    }

    #[test]
    fn test_canonical_name_lookup_round_trips() {
        for (kind, name) in CANONICAL_NAMES {
            assert_eq!(ObjectKind::from_canonical_name(name), Some(*kind));
        }
        assert_eq!(ObjectKind::from_canonical_name("Object"), None);
    }

    #[test]
    fn test_kind_families() {
        assert!(ObjectKind::Mask.is_shape());
        assert!(!ObjectKind::Mask.is_annotation());
        assert!(ObjectKind::XmlAnnotation.is_annotation());
        assert!(!ObjectKind::Roi.is_shape());
    }

    #[test]
    fn test_object_ref_is_unloaded() {
        let image = ObjectRef::new(ObjectKind::Image, 7);
        assert_eq!(image.id(), Some(7));
        assert_eq!(image.details().update_event, None);
    }
}
