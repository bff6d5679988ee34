//! Object-graph linker behaviour through its public surface

use roitool::adapters::store::{InMemoryStore, RoiStore};
use roitool::core::linker::{
    ContainerRecord, GraphObject, Indexes, LinkerState, ObjectGraphLinker, ReferenceRecord,
};
use roitool::domain::{
    Annotation, AnnotationValue, Image, ImageId, LinkError, Lsid, ReferenceSide, Roi, Shape,
    ShapeGeometry,
};
use std::sync::Arc;

fn lsid(value: &str) -> Lsid {
    Lsid::new(value).unwrap()
}

fn named_roi(name: &str) -> GraphObject {
    GraphObject::Root(Roi {
        name: Some(name.to_string()),
        ..Roi::new()
    })
}

fn point(x: f64) -> GraphObject {
    GraphObject::Child(Shape::new(ShapeGeometry::Point { x, y: 0.0 }))
}

fn tag(text: &str) -> GraphObject {
    GraphObject::CrossCutting(Annotation::new(AnnotationValue::Tag(text.to_string())))
}

/// `rois` ROIs with `shapes` shapes each, every object linked to one shared tag
fn grid(rois: usize, shapes: usize) -> ObjectGraphLinker {
    let mut linker = ObjectGraphLinker::new();
    for r in 0..rois {
        let roi_lsid = format!("ROI:{r}");
        linker
            .add_container(ContainerRecord::new(
                lsid(&roi_lsid),
                named_roi(&format!("roi-{r}")),
                Indexes::roi(r),
            ))
            .unwrap();
        linker.add_reference(ReferenceRecord::new(lsid(&roi_lsid), lsid("Annotation:shared")));
        for s in 0..shapes {
            let shape_lsid = format!("Shape:{r}:{s}");
            linker
                .add_container(ContainerRecord::new(
                    lsid(&shape_lsid),
                    point(s as f64),
                    Indexes::shape(r, s),
                ))
                .unwrap();
            linker.add_reference(ReferenceRecord::new(lsid(&shape_lsid), lsid("Annotation:shared")));
        }
    }
    linker
        .add_container(ContainerRecord::new(
            lsid("Annotation:shared"),
            tag("shared"),
            Indexes::annotation(0),
        ))
        .unwrap();
    linker
}

#[test]
fn test_every_reference_becomes_one_link() {
    let graph = grid(4, 3).resolve().unwrap();

    assert_eq!(graph.rois().len(), 4);
    assert_eq!(graph.links_realized(), 4 + 4 * 3);
    for (r, roi) in graph.rois().iter().enumerate() {
        assert_eq!(roi.name, Some(format!("roi-{r}")));
        assert_eq!(roi.shapes.len(), 3);
        assert!(roi.shapes.iter().all(|shape| shape.annotations.len() == 1));
    }
}

#[test]
fn test_annotation_declared_last_is_shared_by_every_owner() {
    let graph = grid(2, 2).resolve().unwrap();
    let shared = &graph.rois()[0].annotations[0];

    for roi in graph.rois() {
        assert!(Arc::ptr_eq(shared, &roi.annotations[0]));
        for shape in &roi.shapes {
            assert!(Arc::ptr_eq(shared, &shape.annotations[0]));
        }
    }
}

#[test]
fn test_shape_order_follows_declaration() {
    let graph = grid(1, 5).resolve().unwrap();
    let xs: Vec<f64> = graph.rois()[0]
        .shapes
        .iter()
        .map(|shape| match shape.geometry {
            ShapeGeometry::Point { x, .. } => x,
            _ => f64::NAN,
        })
        .collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_reference_suffix_is_ignored_on_reference_side() {
    let mut linker = grid(1, 0);
    linker.add_reference(ReferenceRecord::new(
        lsid("ROI:0"),
        lsid("Annotation:shared:OMERO_EMISSION_FILTER"),
    ));

    let graph = linker.resolve().unwrap();
    assert_eq!(graph.rois()[0].annotations.len(), 1);
}

#[test]
fn test_unknown_target_is_reported() {
    let mut linker = grid(1, 1);
    linker.add_reference(ReferenceRecord::new(lsid("ROI:7"), lsid("Annotation:shared")));

    let err = linker.resolve().unwrap_err();
    assert!(matches!(
        err,
        LinkError::UnresolvedReference {
            side: ReferenceSide::Target,
            ..
        }
    ));
}

#[test]
fn test_roi_to_roi_reference_has_no_handler() {
    let mut linker = grid(2, 0);
    linker.add_reference(ReferenceRecord::new(lsid("ROI:0"), lsid("ROI:1")));

    assert!(matches!(
        linker.resolve(),
        Err(LinkError::NoLinkHandler { .. })
    ));
}

#[test]
fn test_roi_container_without_index_is_rejected() {
    let mut linker = ObjectGraphLinker::new();
    let err = linker
        .add_container(ContainerRecord::new(lsid("ROI:0"), named_roi("x"), Indexes::new()))
        .unwrap_err();
    assert!(matches!(err, LinkError::MissingIndex { .. }));
}

#[tokio::test]
async fn test_commit_saves_one_batch_linked_to_image() {
    let store = InMemoryStore::new("linker.example.org").unwrap();
    let image = store.add_image(Image::default()).await;
    let image_id = ImageId::new(image.details.id.unwrap()).unwrap();

    let linker = grid(3, 2);
    assert_eq!(linker.state(), LinkerState::Accumulating);
    let graph = linker.resolve().unwrap();
    assert_eq!(graph.state(), LinkerState::Resolved);

    let committed = graph.commit(image_id, &store).await.unwrap();
    assert_eq!(committed.state(), LinkerState::Committed);

    let saved = committed.rois();
    assert_eq!(saved.len(), 3);
    let event = saved[0].details.update_event;
    assert!(saved.iter().all(|roi| roi.details.update_event == event));
    assert!(saved
        .iter()
        .all(|roi| roi.image.and_then(|image| image.details.id) == Some(image_id.get())));

    let shared_id = saved[0].annotations[0].details.id;
    assert!(shared_id.is_some());
    assert!(saved
        .iter()
        .flat_map(|roi| roi.shapes.iter())
        .all(|shape| shape.annotations[0].details.id == shared_id));
    assert_eq!(store.find_rois(image_id).await.unwrap().len(), 3);
}
