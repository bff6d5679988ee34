//! In-process store
//!
//! Holds images, ROIs and annotations in memory with the same query and save
//! semantics as the remote store: identities and update events are assigned on
//! save, a batch is validated before anything is applied, and an annotation
//! shared by several owners in one batch is persisted once.

use super::traits::RoiStore;
use crate::domain::{
    Annotation, AnnotationOwner, Details, Image, ImageId, LsidAuthority, Result, Roi,
    RoiToolError, StoreError,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug)]
struct StoreState {
    next_id: i64,
    next_event: i64,
    images: BTreeMap<i64, Image>,
    rois: BTreeMap<i64, Roi>,
    fail_next_save: Option<String>,
    logged_out: bool,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn next_event(&mut self) -> i64 {
        let event = self.next_event;
        self.next_event += 1;
        event
    }

    fn assign(&mut self, details: Details, event: i64) -> Details {
        let id = match details.id {
            Some(id) => id,
            None => self.next_id(),
        };
        Details::persisted(id, event)
    }

    /// Annotations that already have an identity are linked as they are
    fn persist_annotation(
        &mut self,
        annotation: &Arc<Annotation>,
        event: i64,
        saved: &mut HashMap<usize, Arc<Annotation>>,
    ) -> Arc<Annotation> {
        if annotation.details.is_persisted() {
            return Arc::clone(annotation);
        }
        if let Some(existing) = saved.get(&(Arc::as_ptr(annotation) as usize)) {
            return Arc::clone(existing);
        }
        let details = self.assign(annotation.details, event);
        let persisted = Arc::new(Annotation {
            details,
            ..Annotation::clone(annotation)
        });
        saved.insert(Arc::as_ptr(annotation) as usize, Arc::clone(&persisted));
        persisted
    }

    fn persist_annotations(
        &mut self,
        annotations: &[Arc<Annotation>],
        event: i64,
        saved: &mut HashMap<usize, Arc<Annotation>>,
    ) -> Vec<Arc<Annotation>> {
        annotations
            .iter()
            .map(|annotation| self.persist_annotation(annotation, event, saved))
            .collect()
    }
}

/// Store backed by process memory
///
/// # Examples
///
/// ```
/// use roitool::adapters::store::{InMemoryStore, RoiStore};
/// use roitool::domain::{Image, ImageId};
///
/// # async fn example() -> roitool::domain::Result<()> {
/// let store = InMemoryStore::new("roitool.local")?;
/// let image = store.add_image(Image::default()).await;
/// let image_id = ImageId::new(image.details.id.unwrap_or_default()).unwrap();
/// assert_eq!(store.find_images(image_id).await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    authority: LsidAuthority,
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Creates an empty store with a fresh instance UUID
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `authority` is not a valid LSID authority.
    pub fn new(authority: &str) -> Result<Self> {
        let authority = LsidAuthority::new(authority, Uuid::new_v4().to_string())
            .map_err(RoiToolError::Configuration)?;
        Ok(Self::with_authority(authority))
    }

    pub fn with_authority(authority: LsidAuthority) -> Self {
        Self {
            authority,
            state: Mutex::new(StoreState {
                next_id: 1,
                next_event: 1,
                images: BTreeMap::new(),
                rois: BTreeMap::new(),
                fail_next_save: None,
                logged_out: false,
            }),
        }
    }

    /// Persists an image with its pixels, channels, planes and annotations
    pub async fn add_image(&self, mut image: Image) -> Image {
        let mut state = self.state.lock().await;
        let event = state.next_event();

        image.details = state.assign(image.details, event);
        if let Some(pixels) = image.pixels.as_mut() {
            pixels.details = state.assign(pixels.details, event);
            for channel in &mut pixels.channels {
                channel.details = state.assign(channel.details, event);
            }
            for plane in &mut pixels.planes {
                plane.details = state.assign(plane.details, event);
            }
        }
        let mut saved = HashMap::new();
        image.annotations = state.persist_annotations(&image.annotations, event, &mut saved);

        if let Some(id) = image.details.id {
            state.images.insert(id, image.clone());
        }
        tracing::debug!(image_id = ?image.details.id, "Stored image");
        image
    }

    /// Makes the next `save_rois` call fail without applying anything
    pub async fn fail_next_save(&self, reason: impl Into<String>) {
        self.state.lock().await.fail_next_save = Some(reason.into());
    }

    pub async fn is_logged_out(&self) -> bool {
        self.state.lock().await.logged_out
    }

    /// Number of ROIs stored for every image
    pub async fn roi_count(&self) -> usize {
        self.state.lock().await.rois.len()
    }
}

#[async_trait]
impl RoiStore for InMemoryStore {
    async fn authority(&self) -> Result<LsidAuthority> {
        Ok(self.authority.clone())
    }

    async fn find_images(&self, image_id: ImageId) -> Result<Vec<Image>> {
        let state = self.state.lock().await;
        Ok(state
            .images
            .get(&image_id.get())
            .map(|image| Image {
                annotations: Vec::new(),
                ..image.clone()
            })
            .into_iter()
            .collect())
    }

    async fn find_rois(&self, image_id: ImageId) -> Result<Vec<Roi>> {
        let state = self.state.lock().await;
        let rois = state
            .rois
            .values()
            .filter(|roi| roi.image.and_then(|image| image.details.id) == Some(image_id.get()))
            .map(|roi| {
                let mut roi = roi.clone();
                roi.annotations.clear();
                for shape in &mut roi.shapes {
                    shape.annotations.clear();
                }
                roi
            })
            .collect();
        Ok(rois)
    }

    async fn find_annotations(&self, owner: AnnotationOwner) -> Result<Vec<Arc<Annotation>>> {
        let state = self.state.lock().await;
        let annotations = match owner {
            AnnotationOwner::Image(id) => state.images.get(&id).map(|image| image.annotations.clone()),
            AnnotationOwner::Roi(id) => state.rois.get(&id).map(|roi| roi.annotations.clone()),
            AnnotationOwner::Shape(id) => state
                .rois
                .values()
                .flat_map(|roi| roi.shapes.iter())
                .find(|shape| shape.details.id == Some(id))
                .map(|shape| shape.annotations.clone()),
        };
        Ok(annotations.unwrap_or_default())
    }

    async fn save_rois(&self, rois: Vec<Roi>) -> Result<Vec<Roi>> {
        let mut state = self.state.lock().await;

        if let Some(reason) = state.fail_next_save.take() {
            return Err(StoreError::SaveFailed(reason).into());
        }
        for roi in &rois {
            let image_id = roi
                .image
                .and_then(|image| image.details.id)
                .ok_or_else(|| StoreError::SaveFailed(format!("{roi} is not linked to an image")))?;
            if !state.images.contains_key(&image_id) {
                return Err(StoreError::SaveFailed(format!("image {image_id} does not exist")).into());
            }
        }

        let event = state.next_event();
        let mut saved_annotations = HashMap::new();
        let mut saved = Vec::with_capacity(rois.len());
        for mut roi in rois {
            roi.details = state.assign(roi.details, event);
            roi.annotations = state.persist_annotations(&roi.annotations, event, &mut saved_annotations);
            for shape in &mut roi.shapes {
                shape.details = state.assign(shape.details, event);
                shape.annotations =
                    state.persist_annotations(&shape.annotations, event, &mut saved_annotations);
            }
            if let Some(id) = roi.details.id {
                state.rois.insert(id, roi.clone());
            }
            saved.push(roi);
        }

        tracing::debug!(rois = saved.len(), update_event = event, "Saved ROI batch");
        Ok(saved)
    }

    async fn logout(&self) -> Result<()> {
        self.state.lock().await.logged_out = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnotationValue, ObjectKind, ObjectRef, Shape, ShapeGeometry};

    async fn store_with_image() -> (InMemoryStore, ImageId) {
        let store = InMemoryStore::new("test.local").unwrap();
        let image = store.add_image(Image::default()).await;
        let image_id = ImageId::new(image.details.id.unwrap()).unwrap();
        (store, image_id)
    }

    fn linked_roi(image_id: ImageId) -> Roi {
        let mut roi = Roi::new().with_shape(Shape::new(ShapeGeometry::Point { x: 1.0, y: 2.0 }));
        roi.image = Some(ObjectRef::new(ObjectKind::Image, image_id.get()));
        roi
    }

    #[tokio::test]
    async fn test_save_assigns_identities_with_one_update_event() {
        let (store, image_id) = store_with_image().await;
        let saved = store
            .save_rois(vec![linked_roi(image_id), linked_roi(image_id)])
            .await
            .unwrap();

        assert_eq!(saved.len(), 2);
        let events: Vec<_> = saved.iter().map(|roi| roi.details.update_event).collect();
        assert_eq!(events[0], events[1]);
        assert!(saved.iter().all(|roi| roi.details.id.is_some()));
        assert!(saved[0].shapes[0].details.is_persisted());
        assert_ne!(saved[0].details.id, saved[1].details.id);
    }

    #[tokio::test]
    async fn test_shared_annotation_saved_once() {
        let (store, image_id) = store_with_image().await;
        let tag = Arc::new(Annotation::new(AnnotationValue::Tag("shared".into())));
        let mut first = linked_roi(image_id);
        let mut second = linked_roi(image_id);
        first.link_annotation(Arc::clone(&tag));
        second.shapes[0].link_annotation(Arc::clone(&tag));

        let saved = store.save_rois(vec![first, second]).await.unwrap();
        let on_roi = &saved[0].annotations[0];
        let on_shape = &saved[1].shapes[0].annotations[0];
        assert!(Arc::ptr_eq(on_roi, on_shape));
        assert!(on_roi.details.is_persisted());
    }

    #[tokio::test]
    async fn test_unlinked_roi_rejects_whole_batch() {
        let (store, image_id) = store_with_image().await;
        let result = store.save_rois(vec![linked_roi(image_id), Roi::new()]).await;

        assert!(matches!(result, Err(RoiToolError::Store(StoreError::SaveFailed(_)))));
        assert_eq!(store.roi_count().await, 0);
    }

    #[tokio::test]
    async fn test_injected_failure_applies_nothing() {
        let (store, image_id) = store_with_image().await;
        store.fail_next_save("constraint violation").await;

        assert!(store.save_rois(vec![linked_roi(image_id)]).await.is_err());
        assert_eq!(store.roi_count().await, 0);
        assert!(store.save_rois(vec![linked_roi(image_id)]).await.is_ok());
    }

    #[tokio::test]
    async fn test_find_rois_strips_annotations_and_keeps_id_order() {
        let (store, image_id) = store_with_image().await;
        let mut roi = linked_roi(image_id);
        roi.link_annotation(Arc::new(Annotation::new(AnnotationValue::Long(3))));
        let saved = store.save_rois(vec![roi, linked_roi(image_id)]).await.unwrap();

        let found = store.find_rois(image_id).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].annotations.is_empty());
        assert_eq!(found[0].details, saved[0].details);

        let roi_id = saved[0].details.id.unwrap();
        let annotations = store.find_annotations(AnnotationOwner::Roi(roi_id)).await.unwrap();
        assert_eq!(annotations.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_image_has_no_rows() {
        let store = InMemoryStore::new("test.local").unwrap();
        let missing = ImageId::new(99).unwrap();
        assert!(store.find_images(missing).await.unwrap().is_empty());
        assert!(store.find_rois(missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_is_recorded() {
        let store = InMemoryStore::new("test.local").unwrap();
        store.logout().await.unwrap();
        assert!(store.is_logged_out().await);
    }
}
