//! Export coordinator - orchestrates one image's ROI export
//!
//! Queries the store for the image, its ROIs and every annotation reachable
//! from them, orders and filters the ROIs, then hands the projection to the
//! document writer. Nothing is written until every query has succeeded.

use crate::adapters::document::DocumentWriter;
use crate::adapters::store::RoiStore;
use crate::config::ExportConfig;
use crate::core::export::ordering::{find_display_order, order_rois};
use crate::core::export::summary::ExportSummary;
use crate::core::lsid::LsidScheme;
use crate::core::metadata::MetadataProjection;
use crate::domain::{Annotation, AnnotationOwner, Image, ImageId, Result, Roi, StoreError};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Export coordinator
pub struct ExportCoordinator {
    store: Arc<dyn RoiStore>,
    writer: Arc<dyn DocumentWriter + Send + Sync>,
    config: ExportConfig,
}

impl ExportCoordinator {
    pub fn new(
        store: Arc<dyn RoiStore>,
        writer: Arc<dyn DocumentWriter + Send + Sync>,
        config: ExportConfig,
    ) -> Self {
        Self {
            store,
            writer,
            config,
        }
    }

    /// Exports the ROIs of `image_id` to `output`
    ///
    /// 1. Fetches the image and its ROIs
    /// 2. Fetches and attaches annotations: image first, then per ROI the ROI's
    ///    own followed by its shapes'
    /// 3. Orders ROIs by the display-order annotation, if any, dropping masks
    /// 4. Writes the document
    ///
    /// # Errors
    ///
    /// Any store, identity, display-order or document error aborts the run
    /// before a file is written.
    pub async fn execute_export(&self, image_id: ImageId, output: &Path) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new(image_id, output);

        tracing::info!(image_id = %image_id, "ROI export started");

        let scheme = LsidScheme::new(&self.store.authority().await?);

        let mut images = self.store.find_images(image_id).await?;
        if images.is_empty() {
            return Err(StoreError::ImageNotFound(image_id.get()).into());
        }
        let mut rois = self.store.find_rois(image_id).await?;
        tracing::info!(image_id = %image_id, rois = rois.len(), "Fetched ROIs");

        let annotations = self.attach_annotations(&mut images, &mut rois).await?;
        summary.annotation_count = annotations.len();

        let display_order = find_display_order(&annotations, &self.config.display_order_namespace)?;
        summary.display_order_applied = display_order.is_some();
        let ordered = order_rois(rois, display_order.as_deref());

        let projection = MetadataProjection::new(&scheme, images, ordered.clone(), &annotations)?;
        self.writer.write(&projection, output)?;

        summary.rois = ordered;
        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Links fetched annotations onto their owners and returns them in
    /// export order
    async fn attach_annotations(
        &self,
        images: &mut [Image],
        rois: &mut [Roi],
    ) -> Result<Vec<Arc<Annotation>>> {
        let mut sequence = Vec::new();

        for image in images.iter_mut() {
            let Some(id) = image.details.id else {
                continue;
            };
            image.annotations = self.store.find_annotations(AnnotationOwner::Image(id)).await?;
            sequence.extend(image.annotations.iter().cloned());
        }

        for roi in rois.iter_mut() {
            match roi.details.id {
                Some(id) => {
                    roi.annotations = self.store.find_annotations(AnnotationOwner::Roi(id)).await?;
                    sequence.extend(roi.annotations.iter().cloned());
                }
                None => tracing::warn!(roi = %roi, "ROI without identity; annotations not fetched"),
            }
            for shape in roi.shapes.iter_mut() {
                let Some(id) = shape.details.id else {
                    continue;
                };
                shape.annotations = self
                    .store
                    .find_annotations(AnnotationOwner::Shape(id))
                    .await?;
                sequence.extend(shape.annotations.iter().cloned());
            }
        }

        tracing::debug!(annotations = sequence.len(), "Fetched annotations");
        Ok(sequence)
    }
}
