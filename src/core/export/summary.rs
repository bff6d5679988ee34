//! Export summary and reporting

use crate::domain::{ImageId, Roi};
use std::path::PathBuf;
use std::time::Duration;

/// Result of one export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Image the ROIs were exported from
    pub image_id: ImageId,

    /// Exported ROIs in document order; `None` marks a display-order gap
    pub rois: Vec<Option<Roi>>,

    /// Annotations fetched for the image, its ROIs and their shapes
    pub annotation_count: usize,

    /// Whether a display-order annotation decided the ROI order
    pub display_order_applied: bool,

    /// Document written
    pub output: PathBuf,

    pub duration: Duration,
}

impl ExportSummary {
    pub fn new(image_id: ImageId, output: impl Into<PathBuf>) -> Self {
        Self {
            image_id,
            rois: Vec::new(),
            annotation_count: 0,
            display_order_applied: false,
            output: output.into(),
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Number of ROIs actually written
    pub fn exported_count(&self) -> usize {
        self.rois.iter().flatten().count()
    }

    /// Number of display-order entries that named no ROI
    pub fn gap_count(&self) -> usize {
        self.rois.iter().filter(|slot| slot.is_none()).count()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            image_id = %self.image_id,
            rois = self.exported_count(),
            gaps = self.gap_count(),
            annotations = self.annotation_count,
            display_order = self.display_order_applied,
            output = %self.output.display(),
            duration_ms = self.duration.as_millis() as u64,
            "Export completed"
        );
    }
}
