//! Linker state machine: `Empty → Accumulating → Resolved → Committed`

use super::links::{LinkRole, LinkTable};
use super::records::{ContainerRecord, GraphObject, IndexAxis, ReferenceRecord};
use crate::adapters::store::RoiStore;
use crate::core::lsid::strip_reference_suffix;
use crate::domain::{
    Annotation, ImageId, LinkError, Lsid, ModelObject, ObjectKind, ObjectRef, ReferenceSide,
    Result, Roi,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observable linker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkerState {
    Empty,
    Accumulating,
    Resolved,
    Committed,
}

impl fmt::Display for LinkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkerState::Empty => "empty",
            LinkerState::Accumulating => "accumulating",
            LinkerState::Resolved => "resolved",
            LinkerState::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Location of a registered object in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NodeRef {
    Roi(usize),
    Shape { roi: usize, shape: usize },
    Annotation(usize),
}

impl NodeRef {
    pub(super) fn role(self) -> LinkRole {
        match self {
            NodeRef::Roi(_) => LinkRole::Roi,
            NodeRef::Shape { .. } => LinkRole::Shape,
            NodeRef::Annotation(_) => LinkRole::Annotation,
        }
    }

    fn belongs_to_roi(self, slot: usize) -> bool {
        match self {
            NodeRef::Roi(roi) | NodeRef::Shape { roi, .. } => roi == slot,
            NodeRef::Annotation(_) => false,
        }
    }
}

/// Objects of one run plus the identifier registry
#[derive(Debug, Default)]
pub(super) struct Arena {
    /// ROI positional table, in first-insertion order
    pub(super) rois: Vec<Roi>,
    /// roiIndex → position in `rois`
    roi_slots: HashMap<usize, usize>,
    pub(super) annotations: Vec<Arc<Annotation>>,
    registry: HashMap<Lsid, NodeRef>,
}

impl Arena {
    fn register(&mut self, lsid: Lsid, node: NodeRef) {
        if let Some(previous) = self.registry.insert(lsid.clone(), node) {
            debug!(lsid = %lsid, ?previous, "Identifier registered twice, keeping the later object");
        }
    }

    fn kind_of(&self, node: NodeRef) -> ObjectKind {
        match node {
            NodeRef::Roi(slot) => self.rois[slot].kind(),
            NodeRef::Shape { roi, shape } => self.rois[roi].shapes[shape].kind(),
            NodeRef::Annotation(index) => self.annotations[index].kind(),
        }
    }

    fn lookup(&self, lsid: &str, side: ReferenceSide) -> std::result::Result<NodeRef, LinkError> {
        Lsid::new(lsid)
            .ok()
            .and_then(|key| self.registry.get(&key).copied())
            .ok_or_else(|| LinkError::UnresolvedReference {
                side,
                lsid: lsid.to_string(),
            })
    }
}

/// Import-side graph builder
///
/// Accepts container records in document order, then reference records, and
/// is consumed by [`ObjectGraphLinker::resolve`].
///
/// # Examples
///
/// ```
/// use roitool::core::linker::{ContainerRecord, GraphObject, Indexes, ObjectGraphLinker, ReferenceRecord};
/// use roitool::domain::{Annotation, AnnotationValue, Lsid, Roi, Shape, ShapeGeometry};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut linker = ObjectGraphLinker::new();
/// linker.add_container(ContainerRecord::new(
///     Lsid::new("ROI:0")?,
///     GraphObject::Root(Roi::new()),
///     Indexes::roi(0),
/// ))?;
/// linker.add_container(ContainerRecord::new(
///     Lsid::new("Shape:0:0")?,
///     GraphObject::Child(Shape::new(ShapeGeometry::Point { x: 1.0, y: 1.0 })),
///     Indexes::shape(0, 0),
/// ))?;
/// linker.add_container(ContainerRecord::new(
///     Lsid::new("Annotation:0")?,
///     GraphObject::CrossCutting(Annotation::new(AnnotationValue::Tag("x".into()))),
///     Indexes::annotation(0),
/// ))?;
/// linker.add_reference(ReferenceRecord::new(Lsid::new("ROI:0")?, Lsid::new("Annotation:0")?));
///
/// let graph = linker.resolve()?;
/// assert_eq!(graph.rois()[0].shapes.len(), 1);
/// assert_eq!(graph.rois()[0].annotations.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ObjectGraphLinker {
    arena: Arena,
    references: Vec<ReferenceRecord>,
    containers_seen: usize,
}

impl ObjectGraphLinker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LinkerState {
        if self.containers_seen == 0 {
            LinkerState::Empty
        } else {
            LinkerState::Accumulating
        }
    }

    /// Dispatches one container record by the role of its object
    ///
    /// # Errors
    ///
    /// - [`LinkError::MissingIndex`] if a ROI or shape has no `roiIndex`
    /// - [`LinkError::OrphanChild`] if a shape's `roiIndex` has no ROI yet
    pub fn add_container(&mut self, record: ContainerRecord) -> std::result::Result<(), LinkError> {
        let ContainerRecord {
            lsid,
            object,
            indexes,
        } = record;
        debug!(lsid = %lsid, kind = %object.kind(), indexes = %indexes, "Container");
        self.containers_seen += 1;

        match object {
            GraphObject::Root(roi) => {
                let roi_index = indexes.require(IndexAxis::Roi, &lsid)?;
                let slot = match self.arena.roi_slots.get(&roi_index) {
                    Some(&slot) => {
                        warn!(lsid = %lsid, roi_index, "Replacing ROI already placed at this roiIndex");
                        self.arena.registry.retain(|_, node| !node.belongs_to_roi(slot));
                        self.arena.rois[slot] = roi;
                        slot
                    }
                    None => {
                        self.arena.rois.push(roi);
                        let slot = self.arena.rois.len() - 1;
                        self.arena.roi_slots.insert(roi_index, slot);
                        slot
                    }
                };
                self.arena.register(lsid, NodeRef::Roi(slot));
            }
            GraphObject::Child(shape) => {
                let roi_index = indexes.require(IndexAxis::Roi, &lsid)?;
                let Some(&slot) = self.arena.roi_slots.get(&roi_index) else {
                    return Err(LinkError::OrphanChild {
                        lsid: lsid.to_string(),
                        roi_index,
                    });
                };
                let roi = &mut self.arena.rois[slot];
                roi.add_shape(shape);
                let shape = roi.shapes.len() - 1;
                self.arena.register(lsid, NodeRef::Shape { roi: slot, shape });
            }
            GraphObject::CrossCutting(annotation) => {
                self.arena.annotations.push(Arc::new(annotation));
                let index = self.arena.annotations.len() - 1;
                self.arena.register(lsid, NodeRef::Annotation(index));
            }
        }
        Ok(())
    }

    /// Queues a reference for the resolution phase
    pub fn add_reference(&mut self, record: ReferenceRecord) {
        self.references.push(record);
    }

    /// Resolves every queued reference against the complete registry
    ///
    /// # Errors
    ///
    /// - [`LinkError::UnresolvedReference`] if either side is not registered
    /// - [`LinkError::NoLinkHandler`] if the pair of kinds cannot be linked
    pub fn resolve(self) -> std::result::Result<ResolvedGraph, LinkError> {
        let Self {
            mut arena,
            references,
            containers_seen,
        } = self;

        for reference in &references {
            debug!(target_lsid = %reference.target, reference_lsid = %reference.reference, "Reference");
        }
        debug!(
            containers = containers_seen,
            references = references.len(),
            rois = arena.rois.len(),
            annotations = arena.annotations.len(),
            "Resolving object graph"
        );

        let table = LinkTable::standard();
        let mut links_realized = 0;
        for record in &references {
            let target = arena.lookup(record.target.as_str(), ReferenceSide::Target)?;
            let reference = arena.lookup(
                strip_reference_suffix(record.reference.as_str()),
                ReferenceSide::Reference,
            )?;

            let Some(link) = table.handler(target.role(), reference.role()) else {
                return Err(LinkError::NoLinkHandler {
                    target: arena.kind_of(target),
                    reference: arena.kind_of(reference),
                });
            };
            if link(&mut arena, target, reference) {
                links_realized += 1;
            } else {
                debug!(target_lsid = %record.target, reference_lsid = %record.reference, "Link already present");
            }
        }

        debug!(links = links_realized, "Object graph resolved");
        Ok(ResolvedGraph {
            rois: arena.rois,
            links_realized,
        })
    }
}

/// Fully linked ROIs, ready to be committed
#[derive(Debug)]
pub struct ResolvedGraph {
    rois: Vec<Roi>,
    links_realized: usize,
}

impl ResolvedGraph {
    pub fn state(&self) -> LinkerState {
        LinkerState::Resolved
    }

    /// ROIs in positional-table order
    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    /// Number of distinct links created during resolution
    pub fn links_realized(&self) -> usize {
        self.links_realized
    }

    /// Points every ROI at the owning image by identity
    pub fn link_image(&mut self, image_id: ImageId) {
        let image = ObjectRef::new(ObjectKind::Image, image_id.get());
        for roi in &mut self.rois {
            roi.image = Some(image);
        }
    }

    /// Links the ROIs to `image_id` and saves them as one batch
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged; nothing is retried.
    pub async fn commit(mut self, image_id: ImageId, store: &dyn RoiStore) -> Result<CommittedGraph> {
        self.link_image(image_id);
        info!(image_id = %image_id, rois = self.rois.len(), "Saving ROIs");

        let saved = store.save_rois(self.rois).await?;
        for roi in &saved {
            info!(roi_id = ?roi.details.id, "Saved ROI with ID");
        }
        Ok(CommittedGraph { rois: saved })
    }
}

/// Persisted ROIs as returned by the store
#[derive(Debug)]
pub struct CommittedGraph {
    rois: Vec<Roi>,
}

impl CommittedGraph {
    pub fn state(&self) -> LinkerState {
        LinkerState::Committed
    }

    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    pub fn into_rois(self) -> Vec<Roi> {
        self.rois
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::linker::records::Indexes;
    use crate::domain::{AnnotationValue, Shape, ShapeGeometry};

    fn lsid(value: &str) -> Lsid {
        Lsid::new(value).unwrap()
    }

    fn roi_container(id: &str, roi_index: usize, name: &str) -> ContainerRecord {
        let roi = Roi {
            name: Some(name.to_string()),
            ..Roi::new()
        };
        ContainerRecord::new(lsid(id), GraphObject::Root(roi), Indexes::roi(roi_index))
    }

    fn shape_container(id: &str, roi_index: usize, shape_index: usize) -> ContainerRecord {
        let shape = Shape::new(ShapeGeometry::Point {
            x: shape_index as f64,
            y: 0.0,
        });
        ContainerRecord::new(
            lsid(id),
            GraphObject::Child(shape),
            Indexes::shape(roi_index, shape_index),
        )
    }

    fn annotation_container(id: &str, index: usize) -> ContainerRecord {
        let annotation = Annotation::new(AnnotationValue::Comment(format!("note {index}")));
        ContainerRecord::new(
            lsid(id),
            GraphObject::CrossCutting(annotation),
            Indexes::annotation(index),
        )
    }

    #[test]
    fn test_state_moves_from_empty_to_accumulating() {
        let mut linker = ObjectGraphLinker::new();
        assert_eq!(linker.state(), LinkerState::Empty);
        linker.add_container(roi_container("ROI:0", 0, "a")).unwrap();
        assert_eq!(linker.state(), LinkerState::Accumulating);
        assert_eq!(linker.resolve().unwrap().state(), LinkerState::Resolved);
    }

    #[test]
    fn test_shape_before_roi_is_orphan() {
        let mut linker = ObjectGraphLinker::new();
        let err = linker.add_container(shape_container("Shape:0:0", 0, 0)).unwrap_err();
        assert_eq!(
            err,
            LinkError::OrphanChild {
                lsid: "Shape:0:0".to_string(),
                roi_index: 0
            }
        );
    }

    #[test]
    fn test_shape_without_roi_index_is_rejected() {
        let mut linker = ObjectGraphLinker::new();
        let shape = Shape::new(ShapeGeometry::Point { x: 0.0, y: 0.0 });
        let record = ContainerRecord::new(lsid("Shape:x"), GraphObject::Child(shape), Indexes::new());
        assert!(matches!(
            linker.add_container(record),
            Err(LinkError::MissingIndex { axis: "roiIndex", .. })
        ));
    }

    #[test]
    fn test_rois_keep_first_insertion_order() {
        let mut linker = ObjectGraphLinker::new();
        linker.add_container(roi_container("ROI:5", 5, "five")).unwrap();
        linker.add_container(roi_container("ROI:1", 1, "one")).unwrap();
        linker.add_container(roi_container("ROI:5b", 5, "five again")).unwrap();

        let graph = linker.resolve().unwrap();
        let names: Vec<_> = graph.rois().iter().map(|r| r.name.as_deref()).collect();
        assert_eq!(names, vec![Some("five again"), Some("one")]);
    }

    #[test]
    fn test_replaced_roi_drops_stale_shape_identifiers() {
        let mut linker = ObjectGraphLinker::new();
        linker.add_container(roi_container("ROI:0", 0, "old")).unwrap();
        linker.add_container(shape_container("Shape:0:0", 0, 0)).unwrap();
        linker.add_container(roi_container("ROI:0b", 0, "new")).unwrap();
        linker.add_container(annotation_container("Annotation:0", 0)).unwrap();
        linker.add_reference(ReferenceRecord::new(lsid("Shape:0:0"), lsid("Annotation:0")));

        assert!(matches!(
            linker.resolve(),
            Err(LinkError::UnresolvedReference {
                side: ReferenceSide::Target,
                ..
            })
        ));
    }

    #[test]
    fn test_forward_and_backward_references_resolve() {
        let mut linker = ObjectGraphLinker::new();
        linker.add_container(annotation_container("Annotation:0", 0)).unwrap();
        linker.add_container(roi_container("ROI:0", 0, "a")).unwrap();
        linker.add_container(shape_container("Shape:0:0", 0, 0)).unwrap();
        linker.add_container(annotation_container("Annotation:1", 1)).unwrap();
        linker.add_reference(ReferenceRecord::new(lsid("ROI:0"), lsid("Annotation:0")));
        linker.add_reference(ReferenceRecord::new(lsid("Shape:0:0"), lsid("Annotation:1")));

        let graph = linker.resolve().unwrap();
        assert_eq!(graph.links_realized(), 2);
        let roi = &graph.rois()[0];
        assert_eq!(roi.annotations.len(), 1);
        assert_eq!(roi.shapes[0].annotations.len(), 1);
    }

    #[test]
    fn test_duplicate_reference_links_once() {
        let mut linker = ObjectGraphLinker::new();
        linker.add_container(roi_container("ROI:0", 0, "a")).unwrap();
        linker.add_container(annotation_container("Annotation:0", 0)).unwrap();
        linker.add_reference(ReferenceRecord::new(lsid("ROI:0"), lsid("Annotation:0")));
        linker.add_reference(ReferenceRecord::new(lsid("ROI:0"), lsid("Annotation:0")));

        let graph = linker.resolve().unwrap();
        assert_eq!(graph.links_realized(), 1);
        assert_eq!(graph.rois()[0].annotations.len(), 1);
    }

    #[test]
    fn test_shared_annotation_is_one_object() {
        let mut linker = ObjectGraphLinker::new();
        linker.add_container(roi_container("ROI:0", 0, "a")).unwrap();
        linker.add_container(roi_container("ROI:1", 1, "b")).unwrap();
        linker.add_container(annotation_container("Annotation:0", 0)).unwrap();
        linker.add_reference(ReferenceRecord::new(lsid("ROI:0"), lsid("Annotation:0")));
        linker.add_reference(ReferenceRecord::new(lsid("ROI:1"), lsid("Annotation:0")));

        let graph = linker.resolve().unwrap();
        let rois = graph.rois();
        assert!(Arc::ptr_eq(&rois[0].annotations[0], &rois[1].annotations[0]));
    }

    #[test]
    fn test_unknown_pair_has_no_handler() {
        let mut linker = ObjectGraphLinker::new();
        linker.add_container(roi_container("ROI:0", 0, "a")).unwrap();
        linker.add_container(shape_container("Shape:0:0", 0, 0)).unwrap();
        linker.add_reference(ReferenceRecord::new(lsid("ROI:0"), lsid("Shape:0:0")));

        assert_eq!(
            linker.resolve().unwrap_err(),
            LinkError::NoLinkHandler {
                target: ObjectKind::Roi,
                reference: ObjectKind::Point
            }
        );
    }

    #[test]
    fn test_missing_reference_side_is_named() {
        let mut linker = ObjectGraphLinker::new();
        linker.add_container(roi_container("ROI:0", 0, "a")).unwrap();
        linker.add_reference(ReferenceRecord::new(lsid("ROI:0"), lsid("Annotation:9")));

        assert_eq!(
            linker.resolve().unwrap_err(),
            LinkError::UnresolvedReference {
                side: ReferenceSide::Reference,
                lsid: "Annotation:9".to_string()
            }
        );
    }

    #[test]
    fn test_link_image_sets_unloaded_reference() {
        let mut linker = ObjectGraphLinker::new();
        linker.add_container(roi_container("ROI:0", 0, "a")).unwrap();
        linker.add_container(roi_container("ROI:1", 1, "b")).unwrap();
        let mut graph = linker.resolve().unwrap();
        graph.link_image(ImageId::new(12).unwrap());

        for roi in graph.rois() {
            assert_eq!(roi.image, Some(ObjectRef::new(ObjectKind::Image, 12)));
        }
    }
}
