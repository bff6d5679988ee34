//! Import command implementation

use super::{close_session, exit_code, open_session, parse_image_id, ConnectionArgs};
use crate::adapters::document::OmeXml;
use crate::config::RoiToolConfig;
use crate::core::import::ImportCoordinator;
use crate::domain::ImageId;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Image to link the imported ROIs to
    #[arg(value_parser = parse_image_id)]
    pub image_id: ImageId,

    /// OME-XML document to read
    pub path: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl ImportArgs {
    /// Execute the import command
    pub async fn execute(&self, mut config: RoiToolConfig) -> anyhow::Result<i32> {
        tracing::info!(image_id = %self.image_id, path = %self.path.display(), "Starting import command");

        let store = match open_session(&mut config, &self.connection).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!(error = %e, "Failed to open store session");
                eprintln!("Failed to connect: {e}");
                return Ok(exit_code(&e));
            }
        };

        let coordinator = ImportCoordinator::new(store.clone(), Arc::new(OmeXml));
        let result = coordinator.execute_import(self.image_id, &self.path).await;
        close_session(store.as_ref()).await;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Import failed");
                eprintln!("Import failed: {e}");
                return Ok(exit_code(&e));
            }
        };

        println!();
        println!("📊 Import Summary:");
        println!("  Image: {}", summary.image_id);
        println!("  ROIs saved: {}", summary.saved_count());
        println!("  Shapes saved: {}", summary.shape_count());
        println!("  Annotation links: {}", summary.links_realized);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        for roi in &summary.saved_rois {
            if let Some(id) = roi.details.id {
                println!("  - ROI {id}");
            }
        }
        println!();
        println!("✅ Import completed successfully!");
        Ok(0)
    }
}
