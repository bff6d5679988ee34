//! Export command implementation

use super::{close_session, exit_code, open_session, parse_image_id, ConnectionArgs};
use crate::adapters::document::OmeXml;
use crate::config::RoiToolConfig;
use crate::core::export::ExportCoordinator;
use crate::domain::ImageId;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Image whose ROIs are exported
    #[arg(value_parser = parse_image_id)]
    pub image_id: ImageId,

    /// OME-XML document to write; replaced if it exists
    pub path: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, mut config: RoiToolConfig) -> anyhow::Result<i32> {
        tracing::info!(image_id = %self.image_id, path = %self.path.display(), "Starting export command");

        let store = match open_session(&mut config, &self.connection).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!(error = %e, "Failed to open store session");
                eprintln!("Failed to connect: {e}");
                return Ok(exit_code(&e));
            }
        };

        let coordinator = ExportCoordinator::new(store.clone(), Arc::new(OmeXml), config.export);
        let result = coordinator.execute_export(self.image_id, &self.path).await;
        close_session(store.as_ref()).await;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code(&e));
            }
        };

        println!();
        println!("📊 Export Summary:");
        println!("  Image: {}", summary.image_id);
        println!("  ROIs written: {}", summary.exported_count());
        if summary.display_order_applied {
            println!("  Display order: applied ({} unmatched)", summary.gap_count());
        }
        println!("  Annotations: {}", summary.annotation_count);
        println!("  Output: {}", summary.output.display());
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!();
        println!("✅ Export completed successfully!");
        Ok(0)
    }
}
