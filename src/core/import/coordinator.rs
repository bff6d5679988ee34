//! Import coordinator - reads one document into one image

use crate::adapters::document::DocumentReader;
use crate::adapters::store::RoiStore;
use crate::core::import::summary::ImportSummary;
use crate::core::linker::ObjectGraphLinker;
use crate::domain::{ImageId, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Import coordinator
pub struct ImportCoordinator {
    store: Arc<dyn RoiStore>,
    reader: Arc<dyn DocumentReader + Send + Sync>,
}

impl ImportCoordinator {
    pub fn new(store: Arc<dyn RoiStore>, reader: Arc<dyn DocumentReader + Send + Sync>) -> Self {
        Self { store, reader }
    }

    /// Imports the ROIs of `input` onto `image_id`
    ///
    /// The document is read and resolved completely before the store is
    /// touched; the ROIs are then saved as a single batch.
    ///
    /// # Errors
    ///
    /// Document, link and store errors are returned unchanged. A failure
    /// before the save leaves the store untouched.
    pub async fn execute_import(&self, image_id: ImageId, input: &Path) -> Result<ImportSummary> {
        let start_time = Instant::now();
        let mut summary = ImportSummary::new(image_id, input);

        tracing::info!(image_id = %image_id, input = %input.display(), "ROI import started");

        let mut linker = ObjectGraphLinker::new();
        let stats = self.reader.read(input, &mut linker)?;
        summary.containers = stats.containers;
        summary.references = stats.references;
        tracing::debug!(
            containers = stats.containers,
            references = stats.references,
            "Document read"
        );

        let graph = linker.resolve()?;
        summary.links_realized = graph.links_realized();
        tracing::info!(rois = graph.rois().len(), "ROI count");

        let committed = graph.commit(image_id, self.store.as_ref()).await?;
        summary.saved_rois = committed.into_rois();

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}
