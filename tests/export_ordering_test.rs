//! Export ordering and mask filtering against an in-memory store

use roitool::adapters::document::OmeXml;
use roitool::adapters::store::{InMemoryStore, RoiStore};
use roitool::config::ExportConfig;
use roitool::core::export::ExportCoordinator;
use roitool::domain::{
    Annotation, AnnotationValue, ExportError, Image, ImageId, ObjectKind, ObjectRef, Roi,
    RoiToolError, Shape, ShapeGeometry,
};
use std::sync::Arc;

const NAMESPACE: &str = "glencoesoftware.com/pathviewer/roidisplayorder";

struct Fixture {
    store: Arc<InMemoryStore>,
    image_id: ImageId,
    /// Saved ROIs: point, mask, point
    rois: Vec<Roi>,
}

impl Fixture {
    async fn new() -> Self {
        let store = InMemoryStore::new("order.example.org").unwrap();
        let image = store.add_image(Image::default()).await;
        let image_id = ImageId::new(image.details.id.unwrap()).unwrap();

        let rois = store
            .save_rois(vec![
                roi(image_id, "R1", point()),
                roi(image_id, "R2", mask()),
                roi(image_id, "R3", point()),
            ])
            .await
            .unwrap();

        Self {
            store: Arc::new(store),
            image_id,
            rois,
        }
    }

    fn first_shape_id(&self, index: usize) -> i64 {
        self.rois[index].shapes[0].details.id.unwrap()
    }

    /// Stores the display-order annotation on a shapeless ROI of the image
    async fn add_display_order(&self, body: String) {
        let mut carrier = Roi::new();
        carrier.name = Some("carrier".to_string());
        carrier.image = Some(ObjectRef::new(ObjectKind::Image, self.image_id.get()));
        carrier.link_annotation(Arc::new(
            Annotation::new(AnnotationValue::Xml(body)).with_namespace(NAMESPACE),
        ));
        self.store.save_rois(vec![carrier]).await.unwrap();
    }

    fn coordinator(&self) -> ExportCoordinator {
        ExportCoordinator::new(self.store.clone(), Arc::new(OmeXml), ExportConfig::default())
    }
}

fn roi(image_id: ImageId, name: &str, geometry: ShapeGeometry) -> Roi {
    let mut roi = Roi::new().with_shape(Shape::new(geometry));
    roi.name = Some(name.to_string());
    roi.image = Some(ObjectRef::new(ObjectKind::Image, image_id.get()));
    roi
}

fn point() -> ShapeGeometry {
    ShapeGeometry::Point { x: 1.0, y: 1.0 }
}

fn mask() -> ShapeGeometry {
    ShapeGeometry::Mask {
        x: 0.0,
        y: 0.0,
        width: 8.0,
        height: 8.0,
    }
}

fn names(slots: &[Option<Roi>]) -> Vec<Option<String>> {
    slots
        .iter()
        .map(|slot| slot.as_ref().and_then(|roi| roi.name.clone()))
        .collect()
}

#[tokio::test]
async fn test_without_display_order_masks_are_dropped() {
    let fixture = Fixture::new().await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rois.ome.xml");

    let summary = fixture
        .coordinator()
        .execute_export(fixture.image_id, &output)
        .await
        .unwrap();

    assert!(!summary.display_order_applied);
    assert_eq!(names(&summary.rois), vec![Some("R1".into()), Some("R3".into())]);

    let document = std::fs::read_to_string(&output).unwrap();
    assert_eq!(document.matches("<ROI ").count(), 2);
    assert!(!document.contains("<Mask "));
}

#[tokio::test]
async fn test_display_order_selects_and_orders_rois() {
    let fixture = Fixture::new().await;
    let body = format!(
        r#"{{"displayorder":[{}, {}, 999999]}}"#,
        fixture.first_shape_id(2),
        fixture.first_shape_id(0)
    );
    fixture.add_display_order(body).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rois.ome.xml");

    let summary = fixture
        .coordinator()
        .execute_export(fixture.image_id, &output)
        .await
        .unwrap();

    assert!(summary.display_order_applied);
    assert_eq!(
        names(&summary.rois),
        vec![Some("R3".into()), Some("R1".into()), None]
    );
    assert_eq!(summary.exported_count(), 2);
    assert_eq!(summary.gap_count(), 1);

    let document = std::fs::read_to_string(&output).unwrap();
    let r3 = document.find(r#"Name="R3""#).unwrap();
    let r1 = document.find(r#"Name="R1""#).unwrap();
    assert!(r3 < r1);
    assert!(!document.contains(r#"Name="carrier""#));
}

#[tokio::test]
async fn test_mask_named_in_display_order_is_skipped() {
    let fixture = Fixture::new().await;
    let body = format!(
        r#"{{"displayorder":[{}, {}]}}"#,
        fixture.first_shape_id(1),
        fixture.first_shape_id(0)
    );
    fixture.add_display_order(body).await;
    let dir = tempfile::tempdir().unwrap();

    let summary = fixture
        .coordinator()
        .execute_export(fixture.image_id, &dir.path().join("rois.ome.xml"))
        .await
        .unwrap();

    assert_eq!(names(&summary.rois), vec![Some("R1".into())]);
}

#[tokio::test]
async fn test_invalid_display_order_aborts_export() {
    let fixture = Fixture::new().await;
    fixture.add_display_order("not json".to_string()).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rois.ome.xml");

    let err = fixture
        .coordinator()
        .execute_export(fixture.image_id, &output)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RoiToolError::Export(ExportError::InvalidDisplayOrder { .. })
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_configured_namespace_is_used() {
    let fixture = Fixture::new().await;
    fixture
        .add_display_order(format!(r#"{{"displayorder":[{}]}}"#, fixture.first_shape_id(2)))
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        display_order_namespace: "example.org/other".to_string(),
    };
    let coordinator = ExportCoordinator::new(fixture.store.clone(), Arc::new(OmeXml), config);

    let summary = coordinator
        .execute_export(fixture.image_id, &dir.path().join("rois.ome.xml"))
        .await
        .unwrap();

    assert!(!summary.display_order_applied);
    assert_eq!(
        names(&summary.rois),
        vec![
            Some("R1".into()),
            Some("R3".into()),
            Some("carrier".into())
        ]
    );
}
