//! Store abstraction traits
//!
//! This module defines the trait that store adapters must implement to serve
//! the import and export orchestrators.

use crate::domain::{Annotation, AnnotationOwner, Image, ImageId, LsidAuthority, Result, Roi};
use async_trait::async_trait;
use std::sync::Arc;

/// Query and persistence surface of the remote object store
///
/// Queries run in an all-groups context: objects are visible in every group the
/// session's user belongs to. Every call is a single request/response; there is
/// no retry or caching behind this trait.
#[async_trait]
pub trait RoiStore: Send + Sync {
    /// Authority setting and store instance UUID, used to mint identifiers
    ///
    /// # Errors
    ///
    /// Returns an error if either value cannot be read.
    async fn authority(&self) -> Result<LsidAuthority>;

    /// Fetch an image with its pixels, channels and planes
    ///
    /// # Returns
    ///
    /// The matching images; empty if none is readable.
    async fn find_images(&self, image_id: ImageId) -> Result<Vec<Image>>;

    /// Fetch every ROI of an image, each with its shapes
    async fn find_rois(&self, image_id: ImageId) -> Result<Vec<Roi>>;

    /// Fetch the annotations linked to one object, in link order
    async fn find_annotations(&self, owner: AnnotationOwner) -> Result<Vec<Arc<Annotation>>>;

    /// Persist a batch of ROIs with their shapes and annotation links
    ///
    /// Either every ROI is saved or none is.
    ///
    /// # Returns
    ///
    /// The saved ROIs carrying their store-assigned identities.
    async fn save_rois(&self, rois: Vec<Roi>) -> Result<Vec<Roi>>;

    /// Close the session
    async fn logout(&self) -> Result<()>;
}
