//! Annotation projection, bucketed per annotation kind

use super::{count, AnnotationRetrieve, MetadataProjection};
use crate::core::lsid::LsidScheme;
use crate::domain::{Annotation, AnnotationKind, AnnotationValue, ExportError, Lsid};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
pub(super) struct AnnotationProjection {
    by_kind: HashMap<AnnotationKind, Vec<(Lsid, Arc<Annotation>)>>,
}

impl AnnotationProjection {
    /// Keeps the first occurrence of each identity
    pub(super) fn new(
        scheme: &LsidScheme,
        annotations: &[Arc<Annotation>],
    ) -> Result<Self, ExportError> {
        let mut seen = HashSet::new();
        let mut by_kind: HashMap<AnnotationKind, Vec<(Lsid, Arc<Annotation>)>> = HashMap::new();

        for (index, annotation) in annotations.iter().enumerate() {
            let lsid = scheme
                .identifier_of(annotation.as_ref())
                .map_err(|source| ExportError::Projection {
                    subject: "annotation",
                    position: index,
                    source,
                })?;
            if !seen.insert(lsid.clone()) {
                continue;
            }
            by_kind
                .entry(annotation.annotation_kind())
                .or_default()
                .push((lsid, Arc::clone(annotation)));
        }

        Ok(Self { by_kind })
    }

    fn get(&self, kind: AnnotationKind, index: usize) -> Option<&(Lsid, Arc<Annotation>)> {
        self.by_kind.get(&kind)?.get(index)
    }
}

impl AnnotationRetrieve for MetadataProjection {
    fn annotation_count(&self, kind: AnnotationKind) -> i32 {
        count(self.annotations.by_kind.get(&kind).map_or(0, Vec::len))
    }

    fn annotation_id(&self, kind: AnnotationKind, index: usize) -> Option<&str> {
        self.annotations
            .get(kind, index)
            .map(|(lsid, _)| lsid.as_str())
    }

    fn annotation_namespace(&self, kind: AnnotationKind, index: usize) -> Option<&str> {
        self.annotations.get(kind, index)?.1.namespace.as_deref()
    }

    fn annotation_description(&self, kind: AnnotationKind, index: usize) -> Option<&str> {
        self.annotations.get(kind, index)?.1.description.as_deref()
    }

    fn annotation_value(&self, kind: AnnotationKind, index: usize) -> Option<&AnnotationValue> {
        self.annotations
            .get(kind, index)
            .map(|(_, annotation)| &annotation.value)
    }
}
