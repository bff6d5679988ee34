//! Records consumed by the linker

use crate::domain::{Annotation, LinkError, Lsid, ModelObject, ObjectKind, Roi, Shape};
use std::collections::BTreeMap;
use std::fmt;

/// Positional axis of a container within the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexAxis {
    Roi,
    Shape,
    Annotation,
}

impl IndexAxis {
    pub fn name(self) -> &'static str {
        match self {
            IndexAxis::Roi => "roiIndex",
            IndexAxis::Shape => "shapeIndex",
            IndexAxis::Annotation => "annotationIndex",
        }
    }
}

impl fmt::Display for IndexAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered axis → position mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indexes(BTreeMap<IndexAxis, usize>);

impl Indexes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, axis: IndexAxis, position: usize) -> Self {
        self.0.insert(axis, position);
        self
    }

    /// Indexes of a ROI container
    pub fn roi(roi_index: usize) -> Self {
        Self::new().with(IndexAxis::Roi, roi_index)
    }

    /// Indexes of a shape container
    pub fn shape(roi_index: usize, shape_index: usize) -> Self {
        Self::roi(roi_index).with(IndexAxis::Shape, shape_index)
    }

    /// Indexes of an annotation container
    pub fn annotation(annotation_index: usize) -> Self {
        Self::new().with(IndexAxis::Annotation, annotation_index)
    }

    pub fn get(&self, axis: IndexAxis) -> Option<usize> {
        self.0.get(&axis).copied()
    }

    pub(super) fn require(&self, axis: IndexAxis, lsid: &Lsid) -> Result<usize, LinkError> {
        self.get(axis).ok_or_else(|| LinkError::MissingIndex {
            lsid: lsid.to_string(),
            axis: axis.name(),
        })
    }
}

impl fmt::Display for Indexes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (n, (axis, position)) in self.0.iter().enumerate() {
            if n > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{axis}: {position}")?;
        }
        f.write_str("}")
    }
}

/// A freshly read object, tagged with its role in the graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphObject {
    /// Root of a tree, placed by `roiIndex`
    Root(Roi),
    /// Attached to the root named by its `roiIndex`
    Child(Shape),
    /// Registered only; attached through references
    CrossCutting(Annotation),
}

impl GraphObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            GraphObject::Root(roi) => roi.kind(),
            GraphObject::Child(shape) => shape.kind(),
            GraphObject::CrossCutting(annotation) => annotation.kind(),
        }
    }
}

/// `(identifier, object, positional indexes)`
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    pub lsid: Lsid,
    pub object: GraphObject,
    pub indexes: Indexes,
}

impl ContainerRecord {
    pub fn new(lsid: Lsid, object: GraphObject, indexes: Indexes) -> Self {
        Self {
            lsid,
            object,
            indexes,
        }
    }
}

/// Links the object named by `reference` onto the object named by `target`
///
/// `reference` may carry a qualifying suffix that is stripped before lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub target: Lsid,
    pub reference: Lsid,
}

impl ReferenceRecord {
    pub fn new(target: Lsid, reference: Lsid) -> Self {
        Self { target, reference }
    }
}
