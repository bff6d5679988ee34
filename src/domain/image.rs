//! Images with their acquisition metadata

use super::annotation::Annotation;
use super::object::{Details, ModelObject, ObjectKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A measured value with its unit symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn micrometers(value: f64) -> Self {
        Self::new(value, "µm")
    }

    pub fn nanometers(value: f64) -> Self {
        Self::new(value, "nm")
    }

    pub fn seconds(value: f64) -> Self {
        Self::new(value, "s")
    }
}

/// A stored image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub details: Details,
    pub name: Option<String>,
    pub description: Option<String>,
    pub acquisition_date: Option<DateTime<Utc>>,
    /// Primary pixels set
    pub pixels: Option<Pixels>,
    #[serde(default)]
    pub annotations: Vec<Arc<Annotation>>,
}

impl ModelObject for Image {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Image
    }

    fn details(&self) -> &Details {
        &self.details
    }
}

/// Pixel description of an image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pixels {
    #[serde(default)]
    pub details: Details,
    /// e.g. `uint8`, `uint16`, `float`
    pub pixel_type: Option<String>,
    pub size_x: Option<u32>,
    pub size_y: Option<u32>,
    pub size_z: Option<u32>,
    pub size_c: Option<u32>,
    pub size_t: Option<u32>,
    pub physical_size_x: Option<Quantity>,
    pub physical_size_y: Option<Quantity>,
    pub physical_size_z: Option<Quantity>,
    pub time_increment: Option<Quantity>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub planes: Vec<PlaneInfo>,
}

impl ModelObject for Pixels {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Pixels
    }

    fn details(&self) -> &Details {
        &self.details
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub details: Details,
    pub name: Option<String>,
    /// Signed RGBA
    pub color: Option<i32>,
    pub fluor: Option<String>,
    pub emission_wavelength: Option<Quantity>,
    pub excitation_wavelength: Option<Quantity>,
    pub acquisition_mode: Option<String>,
    pub illumination_type: Option<String>,
    pub contrast_method: Option<String>,
    pub nd_filter: Option<f64>,
    pub pinhole_size: Option<Quantity>,
    pub pockel_cell_setting: Option<i32>,
}

impl ModelObject for Channel {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Channel
    }

    fn details(&self) -> &Details {
        &self.details
    }
}

/// Acquisition metadata of one plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneInfo {
    #[serde(default)]
    pub details: Details,
    pub the_z: u32,
    pub the_c: u32,
    pub the_t: u32,
    pub delta_t: Option<Quantity>,
    pub exposure_time: Option<Quantity>,
    pub position_x: Option<Quantity>,
    pub position_y: Option<Quantity>,
    pub position_z: Option<Quantity>,
}

impl ModelObject for PlaneInfo {
    fn kind(&self) -> ObjectKind {
        ObjectKind::PlaneInfo
    }

    fn details(&self) -> &Details {
        &self.details
    }
}
