//! Image, pixels, channel and plane projection

use super::roi::RoiProjection;
use super::{count, ImageRetrieve, MetadataProjection, COUNT_UNKNOWN};
use crate::core::lsid::LsidScheme;
use crate::domain::{Channel, Image, Lsid, ModelObject, Pixels, PlaneInfo, Quantity};
use chrono::{DateTime, Utc};

/// Pixel data is always described in this order
const DIMENSION_ORDER: &str = "XYCZT";

#[derive(Debug)]
struct ImageEntry {
    image: Image,
    id: Option<Lsid>,
    pixels_id: Option<Lsid>,
    channel_ids: Vec<Option<Lsid>>,
    annotation_refs: Vec<Lsid>,
    roi_refs: Vec<Lsid>,
}

#[derive(Debug, Default)]
pub(super) struct ImageProjection {
    entries: Vec<ImageEntry>,
}

impl ImageProjection {
    /// Unidentifiable image metadata is logged and left out
    pub(super) fn new(scheme: &LsidScheme, images: Vec<Image>, rois: &RoiProjection) -> Self {
        let entries = images
            .into_iter()
            .map(|image| {
                let id = identify(scheme, &image);
                let pixels_id = image.pixels.as_ref().and_then(|p| identify(scheme, p));
                let channel_ids = image
                    .pixels
                    .as_ref()
                    .map(|p| p.channels.iter().map(|c| identify(scheme, c)).collect())
                    .unwrap_or_default();
                let annotation_refs = image
                    .annotations
                    .iter()
                    .filter_map(|a| identify(scheme, a.as_ref()))
                    .collect();
                let roi_refs = image
                    .details
                    .id
                    .map(|image_id| rois.ids_for_image(image_id))
                    .unwrap_or_default();
                ImageEntry {
                    image,
                    id,
                    pixels_id,
                    channel_ids,
                    annotation_refs,
                    roi_refs,
                }
            })
            .collect();
        Self { entries }
    }

    fn entry(&self, image: usize) -> Option<&ImageEntry> {
        self.entries.get(image)
    }

    fn pixels(&self, image: usize) -> Option<&Pixels> {
        self.entry(image)?.image.pixels.as_ref()
    }

    fn channel(&self, image: usize, channel: usize) -> Option<&Channel> {
        self.pixels(image)?.channels.get(channel)
    }

    fn plane(&self, image: usize, plane: usize) -> Option<&PlaneInfo> {
        self.pixels(image)?.planes.get(plane)
    }
}

fn identify(scheme: &LsidScheme, object: &dyn ModelObject) -> Option<Lsid> {
    match scheme.identifier_of(object) {
        Ok(lsid) => Some(lsid),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping image metadata identifier");
            None
        }
    }
}

impl ImageRetrieve for MetadataProjection {
    fn image_count(&self) -> i32 {
        count(self.images.entries.len())
    }

    fn image_id(&self, image: usize) -> Option<&str> {
        self.images.entry(image)?.id.as_ref().map(Lsid::as_str)
    }

    fn image_name(&self, image: usize) -> Option<&str> {
        self.images.entry(image)?.image.name.as_deref()
    }

    fn image_description(&self, image: usize) -> Option<&str> {
        self.images.entry(image)?.image.description.as_deref()
    }

    fn image_acquisition_date(&self, image: usize) -> Option<DateTime<Utc>> {
        self.images.entry(image)?.image.acquisition_date
    }

    fn image_annotation_ref_count(&self, image: usize) -> i32 {
        self.images
            .entry(image)
            .map_or(COUNT_UNKNOWN, |entry| count(entry.annotation_refs.len()))
    }

    fn image_annotation_ref(&self, image: usize, annotation_ref: usize) -> Option<&str> {
        self.images
            .entry(image)?
            .annotation_refs
            .get(annotation_ref)
            .map(Lsid::as_str)
    }

    fn image_roi_ref_count(&self, image: usize) -> i32 {
        self.images
            .entry(image)
            .map_or(COUNT_UNKNOWN, |entry| count(entry.roi_refs.len()))
    }

    fn image_roi_ref(&self, image: usize, roi_ref: usize) -> Option<&str> {
        self.images
            .entry(image)?
            .roi_refs
            .get(roi_ref)
            .map(Lsid::as_str)
    }

    fn pixels_id(&self, image: usize) -> Option<&str> {
        self.images.entry(image)?.pixels_id.as_ref().map(Lsid::as_str)
    }

    fn pixels_dimension_order(&self, image: usize) -> Option<&'static str> {
        self.images.pixels(image).map(|_| DIMENSION_ORDER)
    }

    fn pixels_type(&self, image: usize) -> Option<&str> {
        self.images.pixels(image)?.pixel_type.as_deref()
    }

    fn pixels_size_x(&self, image: usize) -> Option<u32> {
        self.images.pixels(image)?.size_x
    }

    fn pixels_size_y(&self, image: usize) -> Option<u32> {
        self.images.pixels(image)?.size_y
    }

    fn pixels_size_z(&self, image: usize) -> Option<u32> {
        self.images.pixels(image)?.size_z
    }

    fn pixels_size_c(&self, image: usize) -> Option<u32> {
        self.images.pixels(image)?.size_c
    }

    fn pixels_size_t(&self, image: usize) -> Option<u32> {
        self.images.pixels(image)?.size_t
    }

    fn pixels_physical_size_x(&self, image: usize) -> Option<&Quantity> {
        self.images.pixels(image)?.physical_size_x.as_ref()
    }

    fn pixels_physical_size_y(&self, image: usize) -> Option<&Quantity> {
        self.images.pixels(image)?.physical_size_y.as_ref()
    }

    fn pixels_physical_size_z(&self, image: usize) -> Option<&Quantity> {
        self.images.pixels(image)?.physical_size_z.as_ref()
    }

    fn pixels_time_increment(&self, image: usize) -> Option<&Quantity> {
        self.images.pixels(image)?.time_increment.as_ref()
    }

    fn pixels_big_endian(&self, image: usize) -> Option<bool> {
        self.images.pixels(image).map(|_| true)
    }

    fn channel_count(&self, image: usize) -> i32 {
        match self.images.entry(image) {
            Some(entry) => count(entry.channel_ids.len()),
            None => COUNT_UNKNOWN,
        }
    }

    fn channel_id(&self, image: usize, channel: usize) -> Option<&str> {
        self.images
            .entry(image)?
            .channel_ids
            .get(channel)?
            .as_ref()
            .map(Lsid::as_str)
    }

    fn channel_name(&self, image: usize, channel: usize) -> Option<&str> {
        self.images.channel(image, channel)?.name.as_deref()
    }

    fn channel_color(&self, image: usize, channel: usize) -> Option<i32> {
        self.images.channel(image, channel)?.color
    }

    fn channel_fluor(&self, image: usize, channel: usize) -> Option<&str> {
        self.images.channel(image, channel)?.fluor.as_deref()
    }

    fn channel_emission_wavelength(&self, image: usize, channel: usize) -> Option<&Quantity> {
        self.images
            .channel(image, channel)?
            .emission_wavelength
            .as_ref()
    }

    fn channel_excitation_wavelength(&self, image: usize, channel: usize) -> Option<&Quantity> {
        self.images
            .channel(image, channel)?
            .excitation_wavelength
            .as_ref()
    }

    fn channel_acquisition_mode(&self, image: usize, channel: usize) -> Option<&str> {
        self.images.channel(image, channel)?.acquisition_mode.as_deref()
    }

    fn channel_illumination_type(&self, image: usize, channel: usize) -> Option<&str> {
        self.images.channel(image, channel)?.illumination_type.as_deref()
    }

    fn channel_contrast_method(&self, image: usize, channel: usize) -> Option<&str> {
        self.images.channel(image, channel)?.contrast_method.as_deref()
    }

    fn channel_nd_filter(&self, image: usize, channel: usize) -> Option<f64> {
        self.images.channel(image, channel)?.nd_filter
    }

    fn channel_pinhole_size(&self, image: usize, channel: usize) -> Option<&Quantity> {
        self.images.channel(image, channel)?.pinhole_size.as_ref()
    }

    fn channel_pockel_cell_setting(&self, image: usize, channel: usize) -> Option<i32> {
        self.images.channel(image, channel)?.pockel_cell_setting
    }

    fn channel_samples_per_pixel(&self, image: usize, channel: usize) -> Option<u32> {
        self.images.channel(image, channel).map(|_| 1)
    }

    fn plane_count(&self, image: usize) -> i32 {
        match self.images.entry(image) {
            Some(entry) => count(entry.image.pixels.as_ref().map_or(0, |p| p.planes.len())),
            None => COUNT_UNKNOWN,
        }
    }

    fn plane_the_z(&self, image: usize, plane: usize) -> Option<u32> {
        self.images.plane(image, plane).map(|p| p.the_z)
    }

    fn plane_the_c(&self, image: usize, plane: usize) -> Option<u32> {
        self.images.plane(image, plane).map(|p| p.the_c)
    }

    fn plane_the_t(&self, image: usize, plane: usize) -> Option<u32> {
        self.images.plane(image, plane).map(|p| p.the_t)
    }

    fn plane_delta_t(&self, image: usize, plane: usize) -> Option<&Quantity> {
        self.images.plane(image, plane)?.delta_t.as_ref()
    }

    fn plane_exposure_time(&self, image: usize, plane: usize) -> Option<&Quantity> {
        self.images.plane(image, plane)?.exposure_time.as_ref()
    }

    fn plane_position_x(&self, image: usize, plane: usize) -> Option<&Quantity> {
        self.images.plane(image, plane)?.position_x.as_ref()
    }

    fn plane_position_y(&self, image: usize, plane: usize) -> Option<&Quantity> {
        self.images.plane(image, plane)?.position_y.as_ref()
    }

    fn plane_position_z(&self, image: usize, plane: usize) -> Option<&Quantity> {
        self.images.plane(image, plane)?.position_z.as_ref()
    }
}
