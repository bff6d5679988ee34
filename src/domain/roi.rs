//! Regions of interest and their shapes

use super::annotation::Annotation;
use super::object::{Details, ModelObject, ObjectKind, ObjectRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Line end decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Arrow,
}

impl Marker {
    pub fn as_str(self) -> &'static str {
        match self {
            Marker::Arrow => "Arrow",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Arrow" => Some(Marker::Arrow),
            _ => None,
        }
    }
}

/// Polygon fill rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillRule {
    EvenOdd,
    NonZero,
}

impl FillRule {
    pub fn as_str(self) -> &'static str {
        match self {
            FillRule::EvenOdd => "EvenOdd",
            FillRule::NonZero => "NonZero",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EvenOdd" => Some(FillRule::EvenOdd),
            "NonZero" => Some(FillRule::NonZero),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    Bold,
    BoldItalic,
    Italic,
    Normal,
}

impl FontStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Bold => "Bold",
            FontStyle::BoldItalic => "BoldItalic",
            FontStyle::Italic => "Italic",
            FontStyle::Normal => "Normal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Bold" => Some(FontStyle::Bold),
            "BoldItalic" => Some(FontStyle::BoldItalic),
            "Italic" => Some(FontStyle::Italic),
            "Normal" => Some(FontStyle::Normal),
            _ => None,
        }
    }
}

/// 2D affine transform applied to a shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a00: f64,
    pub a10: f64,
    pub a01: f64,
    pub a11: f64,
    pub a02: f64,
    pub a12: f64,
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            a00: 1.0,
            a10: 0.0,
            a01: 0.0,
            a11: 1.0,
            a02: 0.0,
            a12: 0.0,
        }
    }
}

/// Geometry of one shape, one variant per concrete shape kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ShapeGeometry {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
    },
    Point {
        x: f64,
        y: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        marker_start: Option<Marker>,
        marker_end: Option<Marker>,
    },
    Polyline {
        /// `x,y x,y ...`
        points: String,
        marker_start: Option<Marker>,
        marker_end: Option<Marker>,
    },
    Polygon {
        points: String,
    },
    Label {
        x: f64,
        y: f64,
    },
    Mask {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

impl ShapeGeometry {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ShapeGeometry::Rectangle { .. } => ObjectKind::Rectangle,
            ShapeGeometry::Ellipse { .. } => ObjectKind::Ellipse,
            ShapeGeometry::Point { .. } => ObjectKind::Point,
            ShapeGeometry::Line { .. } => ObjectKind::Line,
            ShapeGeometry::Polyline { .. } => ObjectKind::Polyline,
            ShapeGeometry::Polygon { .. } => ObjectKind::Polygon,
            ShapeGeometry::Label { .. } => ObjectKind::Label,
            ShapeGeometry::Mask { .. } => ObjectKind::Mask,
        }
    }

    pub fn is_mask(&self) -> bool {
        matches!(self, ShapeGeometry::Mask { .. })
    }
}

/// A single geometric primitive belonging to one ROI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub details: Details,
    pub geometry: ShapeGeometry,
    pub text: Option<String>,
    /// Signed RGBA
    pub fill_color: Option<i32>,
    pub fill_rule: Option<FillRule>,
    pub stroke_color: Option<i32>,
    /// Pixels
    pub stroke_width: Option<f64>,
    pub stroke_dash_array: Option<String>,
    pub font_family: Option<String>,
    /// Points
    pub font_size: Option<f64>,
    pub font_style: Option<FontStyle>,
    pub locked: Option<bool>,
    pub the_z: Option<u32>,
    pub the_c: Option<u32>,
    pub the_t: Option<u32>,
    pub transform: Option<AffineTransform>,
    #[serde(default)]
    pub annotations: Vec<Arc<Annotation>>,
}

impl Shape {
    pub fn new(geometry: ShapeGeometry) -> Self {
        Self {
            details: Details::default(),
            geometry,
            text: None,
            fill_color: None,
            fill_rule: None,
            stroke_color: None,
            stroke_width: None,
            stroke_dash_array: None,
            font_family: None,
            font_size: None,
            font_style: None,
            locked: None,
            the_z: None,
            the_c: None,
            the_t: None,
            transform: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    pub fn is_mask(&self) -> bool {
        self.geometry.is_mask()
    }

    /// Links an annotation; returns false if this exact annotation is already linked
    pub fn link_annotation(&mut self, annotation: Arc<Annotation>) -> bool {
        link_once(&mut self.annotations, annotation)
    }
}

impl ModelObject for Shape {
    fn kind(&self) -> ObjectKind {
        self.geometry.kind()
    }

    fn details(&self) -> &Details {
        &self.details
    }
}

/// Region of interest: a named collection of shapes on one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    #[serde(default)]
    pub details: Details,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub annotations: Vec<Arc<Annotation>>,
    /// Owning image, set when the ROI is committed
    pub image: Option<ObjectRef>,
}

impl Roi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn first_shape(&self) -> Option<&Shape> {
        self.shapes.first()
    }

    /// Links an annotation; returns false if this exact annotation is already linked
    pub fn link_annotation(&mut self, annotation: Arc<Annotation>) -> bool {
        link_once(&mut self.annotations, annotation)
    }
}

impl ModelObject for Roi {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Roi
    }

    fn details(&self) -> &Details {
        &self.details
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.details.id {
            Some(id) => write!(f, "Roi:{id}"),
            None => write!(f, "Roi:new"),
        }
    }
}

fn link_once(links: &mut Vec<Arc<Annotation>>, annotation: Arc<Annotation>) -> bool {
    if links.iter().any(|linked| Arc::ptr_eq(linked, &annotation)) {
        return false;
    }
    links.push(annotation);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::AnnotationValue;

    fn rectangle() -> Shape {
        Shape::new(ShapeGeometry::Rectangle {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        })
    }

    #[test]
    fn test_shape_kind_follows_geometry() {
        assert_eq!(rectangle().kind(), ObjectKind::Rectangle);
        let mask = Shape::new(ShapeGeometry::Mask {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        });
        assert!(mask.is_mask());
        assert_eq!(mask.kind(), ObjectKind::Mask);
    }

    #[test]
    fn test_first_shape_of_empty_roi() {
        assert!(Roi::new().first_shape().is_none());
        let roi = Roi::new().with_shape(rectangle());
        assert_eq!(roi.first_shape().map(|s| s.kind()), Some(ObjectKind::Rectangle));
    }

    #[test]
    fn test_link_annotation_is_identity_deduplicated() {
        let shared = Arc::new(Annotation::new(AnnotationValue::Tag("a".into())));
        let equal_but_distinct = Arc::new(Annotation::new(AnnotationValue::Tag("a".into())));

        let mut roi = Roi::new();
        assert!(roi.link_annotation(Arc::clone(&shared)));
        assert!(!roi.link_annotation(Arc::clone(&shared)));
        assert!(roi.link_annotation(equal_but_distinct));
        assert_eq!(roi.annotations.len(), 2);
    }

    #[test]
    fn test_style_enums_parse() {
        assert_eq!(FillRule::parse("EvenOdd"), Some(FillRule::EvenOdd));
        assert_eq!(FontStyle::parse("BoldItalic").map(FontStyle::as_str), Some("BoldItalic"));
        assert_eq!(Marker::parse("Circle"), None);
    }
}
