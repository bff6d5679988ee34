//! Core logic of the ROI tool.
//!
//! # Modules
//!
//! - [`lsid`] - Identifier scheme for exported objects
//! - [`linker`] - Rebuilds linked ROIs from document records
//! - [`metadata`] - Read-only projection of exported objects for writers
//! - [`export`] - Export orchestration, ROI ordering and filtering
//! - [`import`] - Import orchestration
//!
//! # Workflows
//!
//! Import: document → reader → linker → resolved graph → store batch save.
//!
//! Export: store queries → ordered ROIs and annotations → projection → writer.
//!
//! # Example
//!
//! ```rust,no_run
//! use roitool::adapters::document::OmeXml;
//! use roitool::adapters::store::InMemoryStore;
//! use roitool::config::ExportConfig;
//! use roitool::core::export::ExportCoordinator;
//! use roitool::domain::ImageId;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new("roitool.local")?);
//! let coordinator = ExportCoordinator::new(store, Arc::new(OmeXml), ExportConfig::default());
//!
//! let summary = coordinator
//!     .execute_export(ImageId::new(1)?, Path::new("rois.ome.xml"))
//!     .await?;
//! println!("Exported {} ROIs", summary.exported_count());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod import;
pub mod linker;
pub mod lsid;
pub mod metadata;
