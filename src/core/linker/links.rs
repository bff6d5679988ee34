//! Link table: (target role, reference role) → link function

use super::graph::{Arena, NodeRef};
use std::collections::HashMap;
use std::sync::Arc;

/// Role of a registered node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum LinkRole {
    Roi,
    Shape,
    Annotation,
}

/// Realizes one link; returns false when the link already existed
pub(super) type LinkFn = fn(&mut Arena, NodeRef, NodeRef) -> bool;

pub(super) struct LinkTable {
    handlers: HashMap<(LinkRole, LinkRole), LinkFn>,
}

impl LinkTable {
    pub(super) fn standard() -> Self {
        let mut handlers: HashMap<(LinkRole, LinkRole), LinkFn> = HashMap::new();
        handlers.insert((LinkRole::Roi, LinkRole::Annotation), link_roi_annotation);
        handlers.insert((LinkRole::Shape, LinkRole::Annotation), link_shape_annotation);
        Self { handlers }
    }

    pub(super) fn handler(&self, target: LinkRole, reference: LinkRole) -> Option<LinkFn> {
        self.handlers.get(&(target, reference)).copied()
    }
}

fn link_roi_annotation(arena: &mut Arena, target: NodeRef, reference: NodeRef) -> bool {
    let (NodeRef::Roi(slot), NodeRef::Annotation(index)) = (target, reference) else {
        return false;
    };
    let annotation = Arc::clone(&arena.annotations[index]);
    arena.rois[slot].link_annotation(annotation)
}

fn link_shape_annotation(arena: &mut Arena, target: NodeRef, reference: NodeRef) -> bool {
    let (NodeRef::Shape { roi, shape }, NodeRef::Annotation(index)) = (target, reference) else {
        return false;
    };
    let annotation = Arc::clone(&arena.annotations[index]);
    arena.rois[roi].shapes[shape].link_annotation(annotation)
}
