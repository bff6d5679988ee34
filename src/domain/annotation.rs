//! Annotations: typed, optionally namespaced metadata linked to images, ROIs and shapes

use super::object::{Details, ModelObject, ObjectKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Annotation type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Boolean,
    Comment,
    Double,
    Long,
    Map,
    Tag,
    Term,
    Timestamp,
    Xml,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 9] = [
        AnnotationKind::Boolean,
        AnnotationKind::Comment,
        AnnotationKind::Double,
        AnnotationKind::Long,
        AnnotationKind::Map,
        AnnotationKind::Tag,
        AnnotationKind::Term,
        AnnotationKind::Timestamp,
        AnnotationKind::Xml,
    ];

    pub fn object_kind(self) -> ObjectKind {
        match self {
            AnnotationKind::Boolean => ObjectKind::BooleanAnnotation,
            AnnotationKind::Comment => ObjectKind::CommentAnnotation,
            AnnotationKind::Double => ObjectKind::DoubleAnnotation,
            AnnotationKind::Long => ObjectKind::LongAnnotation,
            AnnotationKind::Map => ObjectKind::MapAnnotation,
            AnnotationKind::Tag => ObjectKind::TagAnnotation,
            AnnotationKind::Term => ObjectKind::TermAnnotation,
            AnnotationKind::Timestamp => ObjectKind::TimestampAnnotation,
            AnnotationKind::Xml => ObjectKind::XmlAnnotation,
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.object_kind().fmt(f)
    }
}

/// One key/value entry of a map annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPair {
    pub key: String,
    pub value: String,
}

impl MapPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Annotation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AnnotationValue {
    Boolean(bool),
    Comment(String),
    Double(f64),
    Long(i64),
    /// Ordered; keys may repeat
    Map(Vec<MapPair>),
    Tag(String),
    Term(String),
    Timestamp(DateTime<Utc>),
    /// Free-text document body
    Xml(String),
}

impl AnnotationValue {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationValue::Boolean(_) => AnnotationKind::Boolean,
            AnnotationValue::Comment(_) => AnnotationKind::Comment,
            AnnotationValue::Double(_) => AnnotationKind::Double,
            AnnotationValue::Long(_) => AnnotationKind::Long,
            AnnotationValue::Map(_) => AnnotationKind::Map,
            AnnotationValue::Tag(_) => AnnotationKind::Tag,
            AnnotationValue::Term(_) => AnnotationKind::Term,
            AnnotationValue::Timestamp(_) => AnnotationKind::Timestamp,
            AnnotationValue::Xml(_) => AnnotationKind::Xml,
        }
    }
}

/// A single annotation
///
/// Owners hold annotations behind `Arc` so one annotation linked from several
/// owners stays one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub details: Details,
    pub namespace: Option<String>,
    pub description: Option<String>,
    pub value: AnnotationValue,
}

impl Annotation {
    pub fn new(value: AnnotationValue) -> Self {
        Self {
            details: Details::default(),
            namespace: None,
            description: None,
            value,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    pub fn annotation_kind(&self) -> AnnotationKind {
        self.value.kind()
    }

    /// Body text of an XML annotation
    pub fn xml_text(&self) -> Option<&str> {
        match &self.value {
            AnnotationValue::Xml(text) => Some(text),
            _ => None,
        }
    }
}

impl ModelObject for Annotation {
    fn kind(&self) -> ObjectKind {
        self.value.kind().object_kind()
    }

    fn details(&self) -> &Details {
        &self.details
    }
}

/// The object an annotation query is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationOwner {
    Image(i64),
    Roi(i64),
    Shape(i64),
}

impl AnnotationOwner {
    pub fn id(self) -> i64 {
        match self {
            AnnotationOwner::Image(id) | AnnotationOwner::Roi(id) | AnnotationOwner::Shape(id) => id,
        }
    }

    /// Path segment used by the store gateway
    pub fn collection(self) -> &'static str {
        match self {
            AnnotationOwner::Image(_) => "images",
            AnnotationOwner::Roi(_) => "rois",
            AnnotationOwner::Shape(_) => "shapes",
        }
    }
}

impl fmt::Display for AnnotationOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationOwner::Image(id) => write!(f, "Image:{id}"),
            AnnotationOwner::Roi(id) => write!(f, "Roi:{id}"),
            AnnotationOwner::Shape(id) => write!(f, "Shape:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_value() {
        let annotation = Annotation::new(AnnotationValue::Tag("tumour".into()));
        assert_eq!(annotation.kind(), ObjectKind::TagAnnotation);
        assert_eq!(annotation.annotation_kind(), AnnotationKind::Tag);
    }

    #[test]
    fn test_every_annotation_kind_maps_to_annotation_object_kind() {
        for kind in AnnotationKind::ALL {
            assert!(kind.object_kind().is_annotation());
        }
    }

    #[test]
    fn test_xml_text_only_for_xml() {
        let xml = Annotation::new(AnnotationValue::Xml("{}".into()));
        assert_eq!(xml.xml_text(), Some("{}"));
        let comment = Annotation::new(AnnotationValue::Comment("{}".into()));
        assert_eq!(comment.xml_text(), None);
    }

    #[test]
    fn test_value_serializes_tagged() {
        let value = AnnotationValue::Long(5);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Long", "value": 5}));
    }
}
