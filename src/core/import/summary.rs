//! Import summary and reporting

use crate::domain::{ImageId, Roi};
use std::path::PathBuf;
use std::time::Duration;

/// Result of one import run
#[derive(Debug, Clone)]
pub struct ImportSummary {
    /// Image the ROIs were linked to
    pub image_id: ImageId,

    /// Document read
    pub input: PathBuf,

    /// Container records the reader emitted
    pub containers: usize,

    /// Reference records the reader emitted
    pub references: usize,

    /// Distinct annotation links created while resolving
    pub links_realized: usize,

    /// ROIs as persisted by the store, carrying their new identities
    pub saved_rois: Vec<Roi>,

    pub duration: Duration,
}

impl ImportSummary {
    pub fn new(image_id: ImageId, input: impl Into<PathBuf>) -> Self {
        Self {
            image_id,
            input: input.into(),
            containers: 0,
            references: 0,
            links_realized: 0,
            saved_rois: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn saved_count(&self) -> usize {
        self.saved_rois.len()
    }

    /// Total shapes across the saved ROIs
    pub fn shape_count(&self) -> usize {
        self.saved_rois.iter().map(|roi| roi.shapes.len()).sum()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            image_id = %self.image_id,
            rois = self.saved_count(),
            shapes = self.shape_count(),
            links = self.links_realized,
            input = %self.input.display(),
            duration_ms = self.duration.as_millis() as u64,
            "Import completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Shape, ShapeGeometry};

    #[test]
    fn test_counts_follow_saved_rois() {
        let mut summary = ImportSummary::new(ImageId::new(3).unwrap(), "in.ome.xml");
        assert_eq!(summary.saved_count(), 0);

        summary.saved_rois = vec![
            Roi::new()
                .with_shape(Shape::new(ShapeGeometry::Point { x: 0.0, y: 0.0 }))
                .with_shape(Shape::new(ShapeGeometry::Point { x: 1.0, y: 1.0 })),
            Roi::new(),
        ];
        assert_eq!(summary.saved_count(), 2);
        assert_eq!(summary.shape_count(), 2);
    }
}
