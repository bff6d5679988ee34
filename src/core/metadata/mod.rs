//! Metadata projection facade
//!
//! A read-only, randomly indexed view over the objects of one export run. A
//! document writer walks it with plain indices and never touches the store's
//! object model.
//!
//! Every accessor is total: an out-of-range index answers `None`, and a count
//! for an out-of-range owner answers [`COUNT_UNKNOWN`]. Identifiers are minted
//! once when the projection is built, so the accessors cannot fail.
//!
//! ```
//! use roitool::core::lsid::LsidScheme;
//! use roitool::core::metadata::{MetadataProjection, RoiRetrieve, COUNT_UNKNOWN};
//! use roitool::domain::{Details, LsidAuthority, Roi, Shape, ShapeGeometry};
//!
//! let scheme = LsidScheme::new(&LsidAuthority::new("example.org", "db").unwrap());
//! let roi = Roi::new()
//!     .with_details(Details::persisted(1, 7))
//!     .with_shape(
//!         Shape::new(ShapeGeometry::Point { x: 1.0, y: 2.0 })
//!             .with_details(Details::persisted(2, 7)),
//!     );
//!
//! let projection = MetadataProjection::new(&scheme, Vec::new(), vec![Some(roi)], &[]).unwrap();
//! assert_eq!(projection.roi_count(), 1);
//! assert_eq!(projection.shape_count(0), 1);
//! assert_eq!(projection.shape_count(5), COUNT_UNKNOWN);
//! ```

mod annotation;
mod image;
mod roi;

use crate::core::lsid::LsidScheme;
use crate::domain::{
    AffineTransform, Annotation, AnnotationKind, AnnotationValue, FillRule, FontStyle, Image,
    Lsid, ModelObject, ObjectKind, Quantity, Result, Roi, ShapeGeometry,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use self::annotation::AnnotationProjection;
use self::image::ImageProjection;
use self::roi::RoiProjection;

/// Count reported for an owner index that does not exist
pub const COUNT_UNKNOWN: i32 = -1;

/// Image, pixels, channel and plane metadata
pub trait ImageRetrieve {
    fn image_count(&self) -> i32;
    fn image_id(&self, image: usize) -> Option<&str>;
    fn image_name(&self, image: usize) -> Option<&str>;
    fn image_description(&self, image: usize) -> Option<&str>;
    fn image_acquisition_date(&self, image: usize) -> Option<DateTime<Utc>>;
    fn image_annotation_ref_count(&self, image: usize) -> i32;
    fn image_annotation_ref(&self, image: usize, annotation_ref: usize) -> Option<&str>;
    fn image_roi_ref_count(&self, image: usize) -> i32;
    fn image_roi_ref(&self, image: usize, roi_ref: usize) -> Option<&str>;

    fn pixels_id(&self, image: usize) -> Option<&str>;
    fn pixels_dimension_order(&self, image: usize) -> Option<&'static str>;
    fn pixels_type(&self, image: usize) -> Option<&str>;
    fn pixels_size_x(&self, image: usize) -> Option<u32>;
    fn pixels_size_y(&self, image: usize) -> Option<u32>;
    fn pixels_size_z(&self, image: usize) -> Option<u32>;
    fn pixels_size_c(&self, image: usize) -> Option<u32>;
    fn pixels_size_t(&self, image: usize) -> Option<u32>;
    fn pixels_physical_size_x(&self, image: usize) -> Option<&Quantity>;
    fn pixels_physical_size_y(&self, image: usize) -> Option<&Quantity>;
    fn pixels_physical_size_z(&self, image: usize) -> Option<&Quantity>;
    fn pixels_time_increment(&self, image: usize) -> Option<&Quantity>;
    fn pixels_big_endian(&self, image: usize) -> Option<bool>;

    fn channel_count(&self, image: usize) -> i32;
    fn channel_id(&self, image: usize, channel: usize) -> Option<&str>;
    fn channel_name(&self, image: usize, channel: usize) -> Option<&str>;
    fn channel_color(&self, image: usize, channel: usize) -> Option<i32>;
    fn channel_fluor(&self, image: usize, channel: usize) -> Option<&str>;
    fn channel_emission_wavelength(&self, image: usize, channel: usize) -> Option<&Quantity>;
    fn channel_excitation_wavelength(&self, image: usize, channel: usize) -> Option<&Quantity>;
    fn channel_acquisition_mode(&self, image: usize, channel: usize) -> Option<&str>;
    fn channel_illumination_type(&self, image: usize, channel: usize) -> Option<&str>;
    fn channel_contrast_method(&self, image: usize, channel: usize) -> Option<&str>;
    fn channel_nd_filter(&self, image: usize, channel: usize) -> Option<f64>;
    fn channel_pinhole_size(&self, image: usize, channel: usize) -> Option<&Quantity>;
    fn channel_pockel_cell_setting(&self, image: usize, channel: usize) -> Option<i32>;
    fn channel_samples_per_pixel(&self, image: usize, channel: usize) -> Option<u32>;

    fn plane_count(&self, image: usize) -> i32;
    fn plane_the_z(&self, image: usize, plane: usize) -> Option<u32>;
    fn plane_the_c(&self, image: usize, plane: usize) -> Option<u32>;
    fn plane_the_t(&self, image: usize, plane: usize) -> Option<u32>;
    fn plane_delta_t(&self, image: usize, plane: usize) -> Option<&Quantity>;
    fn plane_exposure_time(&self, image: usize, plane: usize) -> Option<&Quantity>;
    fn plane_position_x(&self, image: usize, plane: usize) -> Option<&Quantity>;
    fn plane_position_y(&self, image: usize, plane: usize) -> Option<&Quantity>;
    fn plane_position_z(&self, image: usize, plane: usize) -> Option<&Quantity>;
}

/// ROI and shape metadata
///
/// A gap slot in the ROI list is counted by [`RoiRetrieve::roi_count`] but
/// answers `None` for its fields and [`COUNT_UNKNOWN`] for its child counts.
pub trait RoiRetrieve {
    fn roi_count(&self) -> i32;
    fn roi_id(&self, roi: usize) -> Option<&str>;
    fn roi_name(&self, roi: usize) -> Option<&str>;
    fn roi_description(&self, roi: usize) -> Option<&str>;
    fn roi_annotation_ref_count(&self, roi: usize) -> i32;
    fn roi_annotation_ref(&self, roi: usize, annotation_ref: usize) -> Option<&str>;

    fn shape_count(&self, roi: usize) -> i32;
    fn shape_type(&self, roi: usize, shape: usize) -> Option<ObjectKind>;
    fn shape_id(&self, roi: usize, shape: usize) -> Option<&str>;
    fn shape_annotation_ref_count(&self, roi: usize, shape: usize) -> i32;
    fn shape_annotation_ref(&self, roi: usize, shape: usize, annotation_ref: usize)
        -> Option<&str>;
    fn shape_geometry(&self, roi: usize, shape: usize) -> Option<&ShapeGeometry>;
    fn shape_text(&self, roi: usize, shape: usize) -> Option<&str>;
    fn shape_fill_color(&self, roi: usize, shape: usize) -> Option<i32>;
    fn shape_fill_rule(&self, roi: usize, shape: usize) -> Option<FillRule>;
    fn shape_stroke_color(&self, roi: usize, shape: usize) -> Option<i32>;
    fn shape_stroke_width(&self, roi: usize, shape: usize) -> Option<f64>;
    fn shape_stroke_dash_array(&self, roi: usize, shape: usize) -> Option<&str>;
    fn shape_font_family(&self, roi: usize, shape: usize) -> Option<&str>;
    fn shape_font_size(&self, roi: usize, shape: usize) -> Option<f64>;
    fn shape_font_style(&self, roi: usize, shape: usize) -> Option<FontStyle>;
    fn shape_locked(&self, roi: usize, shape: usize) -> Option<bool>;
    fn shape_the_z(&self, roi: usize, shape: usize) -> Option<u32>;
    fn shape_the_c(&self, roi: usize, shape: usize) -> Option<u32>;
    fn shape_the_t(&self, roi: usize, shape: usize) -> Option<u32>;
    fn shape_transform(&self, roi: usize, shape: usize) -> Option<&AffineTransform>;
}

/// Annotation metadata, indexed per annotation kind
pub trait AnnotationRetrieve {
    fn annotation_count(&self, kind: AnnotationKind) -> i32;
    fn annotation_id(&self, kind: AnnotationKind, index: usize) -> Option<&str>;
    fn annotation_namespace(&self, kind: AnnotationKind, index: usize) -> Option<&str>;
    fn annotation_description(&self, kind: AnnotationKind, index: usize) -> Option<&str>;
    fn annotation_value(&self, kind: AnnotationKind, index: usize) -> Option<&AnnotationValue>;
}

/// Everything a document writer reads
pub trait MetadataRetrieve: ImageRetrieve + RoiRetrieve + AnnotationRetrieve {}

impl<T: ImageRetrieve + RoiRetrieve + AnnotationRetrieve> MetadataRetrieve for T {}

/// Projection over one image, its ordered ROIs and the annotation sequence
#[derive(Debug)]
pub struct MetadataProjection {
    images: ImageProjection,
    rois: RoiProjection,
    annotations: AnnotationProjection,
}

impl MetadataProjection {
    /// Builds the projection and mints every identifier it will answer with
    ///
    /// Image metadata that cannot be identified is logged and left out; the
    /// ROIs and annotations must all be identifiable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ExportError::Projection`] naming the first ROI,
    /// shape or annotation without a usable identity.
    pub fn new(
        scheme: &LsidScheme,
        images: Vec<Image>,
        rois: Vec<Option<Roi>>,
        annotations: &[Arc<Annotation>],
    ) -> Result<Self> {
        let rois = RoiProjection::new(scheme, rois)?;
        let annotations = AnnotationProjection::new(scheme, annotations)?;
        let images = ImageProjection::new(scheme, images, &rois);
        Ok(Self {
            images,
            rois,
            annotations,
        })
    }
}

/// Converts an in-memory length to the `i32` count convention
fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

/// Identifiers of a link list, in link order
fn lsids_of(
    scheme: &LsidScheme,
    objects: &[Arc<Annotation>],
) -> std::result::Result<Vec<Lsid>, crate::domain::LsidError> {
    objects
        .iter()
        .map(|object| scheme.identifier_of(object.as_ref() as &dyn ModelObject))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AnnotationValue, Details, ExportError, LsidAuthority, LsidError, ObjectKind, RoiToolError,
        Shape,
    };

    fn scheme() -> LsidScheme {
        LsidScheme::new(&LsidAuthority::new("example.org", "db").unwrap())
    }

    #[test]
    fn test_gap_slot_is_counted_but_empty() {
        let roi = Roi::new()
            .with_details(Details::persisted(1, 1))
            .with_shape(
                Shape::new(ShapeGeometry::Point { x: 0.0, y: 0.0 })
                    .with_details(Details::persisted(2, 1)),
            );
        let projection =
            MetadataProjection::new(&scheme(), Vec::new(), vec![Some(roi), None], &[]).unwrap();

        assert_eq!(projection.roi_count(), 2);
        assert_eq!(projection.roi_id(0), Some("urn:lsid:example.org:db:Roi_1:1"));
        assert_eq!(projection.roi_id(1), None);
        assert_eq!(projection.shape_count(1), COUNT_UNKNOWN);
        assert_eq!(projection.roi_annotation_ref_count(1), COUNT_UNKNOWN);
    }

    #[test]
    fn test_unidentified_roi_is_a_projection_error() {
        let result = MetadataProjection::new(&scheme(), Vec::new(), vec![Some(Roi::new())], &[]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("ROI at position 0"));
        assert!(matches!(
            err,
            RoiToolError::Export(ExportError::Projection {
                subject: "ROI",
                position: 0,
                source: LsidError::UnhydratedObject {
                    kind: ObjectKind::Roi,
                    id: None,
                    ..
                },
            })
        ));
    }

    #[test]
    fn test_unidentified_annotation_keeps_identity_error() {
        let annotation = Arc::new(Annotation::new(AnnotationValue::Tag("t".to_string())).with_details(
            Details {
                id: Some(8),
                update_event: None,
            },
        ));
        let err = MetadataProjection::new(&scheme(), Vec::new(), Vec::new(), &[annotation])
            .unwrap_err();
        assert!(matches!(
            err,
            RoiToolError::Export(ExportError::Projection {
                subject: "annotation",
                source: LsidError::UnhydratedObject {
                    kind: ObjectKind::TagAnnotation,
                    id: Some(8),
                    missing: "update event",
                },
                ..
            })
        ));
    }

    #[test]
    fn test_empty_projection_is_total() {
        let projection = MetadataProjection::new(&scheme(), Vec::new(), Vec::new(), &[]).unwrap();
        assert_eq!(projection.image_count(), 0);
        assert_eq!(projection.channel_count(3), COUNT_UNKNOWN);
        assert_eq!(projection.shape_type(0, 0), None);
        assert_eq!(projection.annotation_count(AnnotationKind::Xml), 0);
        assert_eq!(projection.annotation_value(AnnotationKind::Tag, 4), None);
    }
}
