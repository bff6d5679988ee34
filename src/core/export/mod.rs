//! Export orchestration
//!
//! - [`ordering`] - display-order lookup and mask filtering
//! - [`coordinator`] - store queries, projection and document writing
//! - [`summary`] - run result and reporting

pub mod coordinator;
pub mod ordering;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use ordering::{find_display_order, order_rois};
pub use summary::ExportSummary;
