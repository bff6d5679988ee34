//! ROI and shape projection

use super::{count, lsids_of, MetadataProjection, RoiRetrieve, COUNT_UNKNOWN};
use crate::core::lsid::LsidScheme;
use crate::domain::{
    AffineTransform, ExportError, FillRule, FontStyle, Lsid, LsidError, ObjectKind, Roi, Shape,
    ShapeGeometry,
};

#[derive(Debug)]
struct ShapeEntry {
    shape: Shape,
    id: Lsid,
    annotation_refs: Vec<Lsid>,
}

#[derive(Debug)]
struct RoiEntry {
    roi: Roi,
    id: Lsid,
    annotation_refs: Vec<Lsid>,
    shapes: Vec<ShapeEntry>,
}

/// Ordered ROI slots; `None` is a gap
#[derive(Debug, Default)]
pub(super) struct RoiProjection {
    slots: Vec<Option<RoiEntry>>,
}

impl RoiProjection {
    pub(super) fn new(scheme: &LsidScheme, rois: Vec<Option<Roi>>) -> Result<Self, ExportError> {
        let slots = rois
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.map(|roi| entry(scheme, index, roi)).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { slots })
    }

    /// Identifiers of every non-gap ROI linked to the given image
    pub(super) fn ids_for_image(&self, image_id: i64) -> Vec<Lsid> {
        self.slots
            .iter()
            .flatten()
            .filter(|entry| entry.roi.image.and_then(|image| image.details.id) == Some(image_id))
            .map(|entry| entry.id.clone())
            .collect()
    }

    fn roi(&self, roi: usize) -> Option<&RoiEntry> {
        self.slots.get(roi).and_then(Option::as_ref)
    }

    fn shape(&self, roi: usize, shape: usize) -> Option<&ShapeEntry> {
        self.roi(roi).and_then(|entry| entry.shapes.get(shape))
    }
}

fn entry(scheme: &LsidScheme, index: usize, roi: Roi) -> Result<RoiEntry, ExportError> {
    let context = |source: LsidError| ExportError::Projection {
        subject: "ROI",
        position: index,
        source,
    };

    let id = scheme.identifier_of(&roi).map_err(context)?;
    let annotation_refs = lsids_of(scheme, &roi.annotations).map_err(context)?;
    let shapes = roi
        .shapes
        .iter()
        .map(|shape| {
            Ok(ShapeEntry {
                shape: shape.clone(),
                id: scheme.identifier_of(shape).map_err(context)?,
                annotation_refs: lsids_of(scheme, &shape.annotations).map_err(context)?,
            })
        })
        .collect::<Result<Vec<_>, ExportError>>()?;

    Ok(RoiEntry {
        roi,
        id,
        annotation_refs,
        shapes,
    })
}

impl RoiRetrieve for MetadataProjection {
    fn roi_count(&self) -> i32 {
        count(self.rois.slots.len())
    }

    fn roi_id(&self, roi: usize) -> Option<&str> {
        self.rois.roi(roi).map(|entry| entry.id.as_str())
    }

    fn roi_name(&self, roi: usize) -> Option<&str> {
        self.rois.roi(roi)?.roi.name.as_deref()
    }

    fn roi_description(&self, roi: usize) -> Option<&str> {
        self.rois.roi(roi)?.roi.description.as_deref()
    }

    fn roi_annotation_ref_count(&self, roi: usize) -> i32 {
        self.rois
            .roi(roi)
            .map_or(COUNT_UNKNOWN, |entry| count(entry.annotation_refs.len()))
    }

    fn roi_annotation_ref(&self, roi: usize, annotation_ref: usize) -> Option<&str> {
        self.rois
            .roi(roi)?
            .annotation_refs
            .get(annotation_ref)
            .map(Lsid::as_str)
    }

    fn shape_count(&self, roi: usize) -> i32 {
        self.rois
            .roi(roi)
            .map_or(COUNT_UNKNOWN, |entry| count(entry.shapes.len()))
    }

    fn shape_type(&self, roi: usize, shape: usize) -> Option<ObjectKind> {
        self.rois.shape(roi, shape).map(|entry| entry.shape.geometry.kind())
    }

    fn shape_id(&self, roi: usize, shape: usize) -> Option<&str> {
        self.rois.shape(roi, shape).map(|entry| entry.id.as_str())
    }

    fn shape_annotation_ref_count(&self, roi: usize, shape: usize) -> i32 {
        self.rois
            .shape(roi, shape)
            .map_or(COUNT_UNKNOWN, |entry| count(entry.annotation_refs.len()))
    }

    fn shape_annotation_ref(
        &self,
        roi: usize,
        shape: usize,
        annotation_ref: usize,
    ) -> Option<&str> {
        self.rois
            .shape(roi, shape)?
            .annotation_refs
            .get(annotation_ref)
            .map(Lsid::as_str)
    }

    fn shape_geometry(&self, roi: usize, shape: usize) -> Option<&ShapeGeometry> {
        self.rois.shape(roi, shape).map(|entry| &entry.shape.geometry)
    }

    fn shape_text(&self, roi: usize, shape: usize) -> Option<&str> {
        self.rois.shape(roi, shape)?.shape.text.as_deref()
    }

    fn shape_fill_color(&self, roi: usize, shape: usize) -> Option<i32> {
        self.rois.shape(roi, shape)?.shape.fill_color
    }

    fn shape_fill_rule(&self, roi: usize, shape: usize) -> Option<FillRule> {
        self.rois.shape(roi, shape)?.shape.fill_rule
    }

    fn shape_stroke_color(&self, roi: usize, shape: usize) -> Option<i32> {
        self.rois.shape(roi, shape)?.shape.stroke_color
    }

    fn shape_stroke_width(&self, roi: usize, shape: usize) -> Option<f64> {
        self.rois.shape(roi, shape)?.shape.stroke_width
    }

    fn shape_stroke_dash_array(&self, roi: usize, shape: usize) -> Option<&str> {
        self.rois.shape(roi, shape)?.shape.stroke_dash_array.as_deref()
    }

    fn shape_font_family(&self, roi: usize, shape: usize) -> Option<&str> {
        self.rois.shape(roi, shape)?.shape.font_family.as_deref()
    }

    fn shape_font_size(&self, roi: usize, shape: usize) -> Option<f64> {
        self.rois.shape(roi, shape)?.shape.font_size
    }

    fn shape_font_style(&self, roi: usize, shape: usize) -> Option<FontStyle> {
        self.rois.shape(roi, shape)?.shape.font_style
    }

    fn shape_locked(&self, roi: usize, shape: usize) -> Option<bool> {
        self.rois.shape(roi, shape)?.shape.locked
    }

    fn shape_the_z(&self, roi: usize, shape: usize) -> Option<u32> {
        self.rois.shape(roi, shape)?.shape.the_z
    }

    fn shape_the_c(&self, roi: usize, shape: usize) -> Option<u32> {
        self.rois.shape(roi, shape)?.shape.the_c
    }

    fn shape_the_t(&self, roi: usize, shape: usize) -> Option<u32> {
        self.rois.shape(roi, shape)?.shape.the_t
    }

    fn shape_transform(&self, roi: usize, shape: usize) -> Option<&AffineTransform> {
        self.rois.shape(roi, shape)?.shape.transform.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::lsid::LsidScheme;
    use crate::core::metadata::{MetadataProjection, RoiRetrieve, COUNT_UNKNOWN};
    use crate::domain::{
        Annotation, AnnotationValue, Details, LsidAuthority, ObjectKind, Roi, Shape,
        ShapeGeometry,
    };
    use std::sync::Arc;

    fn projection(rois: Vec<Option<Roi>>) -> MetadataProjection {
        let scheme = LsidScheme::new(&LsidAuthority::new("example.org", "db").unwrap());
        MetadataProjection::new(&scheme, Vec::new(), rois, &[]).unwrap()
    }

    fn ellipse_roi() -> Roi {
        let tag = Arc::new(
            Annotation::new(AnnotationValue::Tag("nucleus".to_string()))
                .with_details(Details::persisted(9, 3)),
        );
        let mut shape = Shape::new(ShapeGeometry::Ellipse {
            x: 5.0,
            y: 6.0,
            radius_x: 2.0,
            radius_y: 1.0,
        })
        .with_details(Details::persisted(2, 3));
        shape.stroke_width = Some(1.5);
        shape.the_z = Some(0);
        shape.link_annotation(tag);
        let mut roi = Roi::new().with_details(Details::persisted(1, 3)).with_shape(shape);
        roi.name = Some("cell".to_string());
        roi
    }

    #[test]
    fn test_shape_fields_are_projected() {
        let projection = projection(vec![Some(ellipse_roi())]);

        assert_eq!(projection.roi_name(0), Some("cell"));
        assert_eq!(projection.shape_type(0, 0), Some(ObjectKind::Ellipse));
        assert_eq!(projection.shape_stroke_width(0, 0), Some(1.5));
        assert_eq!(projection.shape_the_z(0, 0), Some(0));
        assert_eq!(projection.shape_the_t(0, 0), None);
        assert_eq!(projection.shape_annotation_ref_count(0, 0), 1);
        assert_eq!(
            projection.shape_annotation_ref(0, 0, 0),
            Some("urn:lsid:example.org:db:TagAnnotation_9:3")
        );
    }

    #[test]
    fn test_out_of_range_shape_is_absent() {
        let projection = projection(vec![Some(ellipse_roi())]);

        assert_eq!(projection.shape_id(0, 1), None);
        assert_eq!(projection.shape_annotation_ref_count(0, 1), COUNT_UNKNOWN);
        assert_eq!(projection.shape_annotation_ref(0, 0, 1), None);
        assert_eq!(projection.roi_annotation_ref_count(0), 0);
    }
}
