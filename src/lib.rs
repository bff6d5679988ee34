// roitool - ROI metadata import and export for image stores
// Copyright (c) 2025 roitool Contributors
// Licensed under the MIT License

//! # roitool - ROI import and export for image stores
//!
//! roitool moves regions of interest (ROIs), their shapes and their annotations
//! between an OME-XML document and a remote image store.
//!
//! ## Overview
//!
//! - **Import** reads a document, rebuilds the linked object graph and saves
//!   every ROI of the document onto one image as a single batch
//! - **Export** queries one image's ROIs and annotations, orders them by the
//!   viewer's display order when one is stored, and writes a document
//!
//! Exported objects are labelled with stable identifiers derived from the
//! store's authority, the object's type, id and revision.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Identifier scheme, linker, projection and orchestrators
//! - [`adapters`] - Store access and document formats
//! - [`domain`] - Domain model and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roitool::adapters::document::OmeXml;
//! use roitool::adapters::store::InMemoryStore;
//! use roitool::core::import::ImportCoordinator;
//! use roitool::domain::ImageId;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new("roitool.local")?);
//!     let coordinator = ImportCoordinator::new(store, Arc::new(OmeXml));
//!
//!     let summary = coordinator
//!         .execute_import(ImageId::new(1)?, Path::new("rois.ome.xml"))
//!         .await?;
//!     println!("Saved {} ROIs", summary.saved_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], whose error is
//! [`domain::RoiToolError`]. Nothing is retried; the first failure aborts the
//! run before a document is written or a batch is saved.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
