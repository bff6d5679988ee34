//! OME-XML rendering

use super::{annotation_element, OmeXml, OME_NAMESPACE};
use crate::adapters::document::traits::DocumentWriter;
use crate::core::metadata::MetadataRetrieve;
use crate::domain::{
    AffineTransform, AnnotationKind, AnnotationValue, DocumentError, Quantity, Result,
    ShapeGeometry,
};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::path::{Path, PathBuf};

type XmlWriter = Writer<Vec<u8>>;
type WriteResult = std::result::Result<(), DocumentError>;

impl DocumentWriter for OmeXml {
    fn write(&self, metadata: &dyn MetadataRetrieve, path: &Path) -> Result<()> {
        let document = render(metadata)?;

        let partial = partial_path(path);
        if let Err(e) = fs::write(&partial, &document) {
            let _ = fs::remove_file(&partial);
            return Err(DocumentError::WriteFailed(format!("{}: {e}", partial.display())).into());
        }
        if let Err(e) = fs::rename(&partial, path) {
            let _ = fs::remove_file(&partial);
            return Err(DocumentError::WriteFailed(format!("{}: {e}", path.display())).into());
        }

        tracing::info!(path = %path.display(), bytes = document.len(), "Document written");
        Ok(())
    }
}

/// Sibling file the document is staged in before the final rename
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Renders the whole document in memory
pub(super) fn render(metadata: &dyn MetadataRetrieve) -> std::result::Result<Vec<u8>, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    let creator = format!("roitool {}", env!("CARGO_PKG_VERSION"));
    let mut ome = BytesStart::new("OME");
    ome.push_attribute(("xmlns", OME_NAMESPACE));
    ome.push_attribute(("Creator", creator.as_str()));
    emit(&mut writer, Event::Start(ome))?;

    for image in 0..count(metadata.image_count()) {
        write_image(&mut writer, metadata, image)?;
    }
    write_annotations(&mut writer, metadata)?;
    for roi in 0..count(metadata.roi_count()) {
        // Gap slots hold no ROI
        if metadata.roi_id(roi).is_some() {
            write_roi(&mut writer, metadata, roi)?;
        }
    }

    emit(&mut writer, Event::End(BytesEnd::new("OME")))?;
    Ok(writer.into_inner())
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> WriteResult {
    writer
        .write_event(event)
        .map_err(|e| DocumentError::WriteFailed(e.to_string()))
}

fn count(reported: i32) -> usize {
    usize::try_from(reported).unwrap_or(0)
}

fn push<V: ToString>(element: &mut BytesStart<'_>, key: &str, value: Option<V>) {
    if let Some(value) = value {
        element.push_attribute((key, value.to_string().as_str()));
    }
}

fn push_quantity(element: &mut BytesStart<'_>, key: &str, value: Option<&Quantity>) {
    if let Some(quantity) = value {
        element.push_attribute((key, quantity.value.to_string().as_str()));
        element.push_attribute((format!("{key}Unit").as_str(), quantity.unit.as_str()));
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn text_element(writer: &mut XmlWriter, name: &str, value: &str) -> WriteResult {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(value)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn reference(writer: &mut XmlWriter, name: &str, id: &str) -> WriteResult {
    let mut element = BytesStart::new(name);
    element.push_attribute(("ID", id));
    emit(writer, Event::Empty(element))
}

fn write_image(writer: &mut XmlWriter, metadata: &dyn MetadataRetrieve, image: usize) -> WriteResult {
    let Some(id) = metadata.image_id(image) else {
        tracing::warn!(image, "Image without identifier left out of the document");
        return Ok(());
    };
    let mut element = BytesStart::new("Image");
    element.push_attribute(("ID", id));
    push(&mut element, "Name", metadata.image_name(image));
    emit(writer, Event::Start(element))?;

    if let Some(date) = metadata.image_acquisition_date(image) {
        text_element(writer, "AcquisitionDate", &timestamp(&date))?;
    }
    if let Some(description) = metadata.image_description(image) {
        text_element(writer, "Description", description)?;
    }
    if let Some(pixels_id) = metadata.pixels_id(image) {
        write_pixels(writer, metadata, image, pixels_id)?;
    }
    for roi_ref in 0..count(metadata.image_roi_ref_count(image)) {
        if let Some(id) = metadata.image_roi_ref(image, roi_ref) {
            reference(writer, "ROIRef", id)?;
        }
    }
    for annotation_ref in 0..count(metadata.image_annotation_ref_count(image)) {
        if let Some(id) = metadata.image_annotation_ref(image, annotation_ref) {
            reference(writer, "AnnotationRef", id)?;
        }
    }

    emit(writer, Event::End(BytesEnd::new("Image")))
}

fn write_pixels(
    writer: &mut XmlWriter,
    metadata: &dyn MetadataRetrieve,
    image: usize,
    id: &str,
) -> WriteResult {
    let mut element = BytesStart::new("Pixels");
    element.push_attribute(("ID", id));
    push(&mut element, "DimensionOrder", metadata.pixels_dimension_order(image));
    push(&mut element, "Type", metadata.pixels_type(image));
    push(&mut element, "SizeX", metadata.pixels_size_x(image));
    push(&mut element, "SizeY", metadata.pixels_size_y(image));
    push(&mut element, "SizeZ", metadata.pixels_size_z(image));
    push(&mut element, "SizeC", metadata.pixels_size_c(image));
    push(&mut element, "SizeT", metadata.pixels_size_t(image));
    push_quantity(&mut element, "PhysicalSizeX", metadata.pixels_physical_size_x(image));
    push_quantity(&mut element, "PhysicalSizeY", metadata.pixels_physical_size_y(image));
    push_quantity(&mut element, "PhysicalSizeZ", metadata.pixels_physical_size_z(image));
    push_quantity(&mut element, "TimeIncrement", metadata.pixels_time_increment(image));
    push(&mut element, "BigEndian", metadata.pixels_big_endian(image));
    emit(writer, Event::Start(element))?;

    for channel in 0..count(metadata.channel_count(image)) {
        let Some(channel_id) = metadata.channel_id(image, channel) else {
            continue;
        };
        let mut element = BytesStart::new("Channel");
        element.push_attribute(("ID", channel_id));
        push(&mut element, "Name", metadata.channel_name(image, channel));
        push(&mut element, "SamplesPerPixel", metadata.channel_samples_per_pixel(image, channel));
        push(&mut element, "IlluminationType", metadata.channel_illumination_type(image, channel));
        push_quantity(&mut element, "PinholeSize", metadata.channel_pinhole_size(image, channel));
        push(&mut element, "AcquisitionMode", metadata.channel_acquisition_mode(image, channel));
        push(&mut element, "ContrastMethod", metadata.channel_contrast_method(image, channel));
        push_quantity(
            &mut element,
            "ExcitationWavelength",
            metadata.channel_excitation_wavelength(image, channel),
        );
        push_quantity(
            &mut element,
            "EmissionWavelength",
            metadata.channel_emission_wavelength(image, channel),
        );
        push(&mut element, "Fluor", metadata.channel_fluor(image, channel));
        push(&mut element, "NDFilter", metadata.channel_nd_filter(image, channel));
        push(
            &mut element,
            "PockelCellSetting",
            metadata.channel_pockel_cell_setting(image, channel),
        );
        push(&mut element, "Color", metadata.channel_color(image, channel));
        emit(writer, Event::Empty(element))?;
    }

    emit(writer, Event::Empty(BytesStart::new("MetadataOnly")))?;

    for plane in 0..count(metadata.plane_count(image)) {
        let mut element = BytesStart::new("Plane");
        push(&mut element, "TheZ", metadata.plane_the_z(image, plane));
        push(&mut element, "TheT", metadata.plane_the_t(image, plane));
        push(&mut element, "TheC", metadata.plane_the_c(image, plane));
        push_quantity(&mut element, "DeltaT", metadata.plane_delta_t(image, plane));
        push_quantity(&mut element, "ExposureTime", metadata.plane_exposure_time(image, plane));
        push_quantity(&mut element, "PositionX", metadata.plane_position_x(image, plane));
        push_quantity(&mut element, "PositionY", metadata.plane_position_y(image, plane));
        push_quantity(&mut element, "PositionZ", metadata.plane_position_z(image, plane));
        emit(writer, Event::Empty(element))?;
    }

    emit(writer, Event::End(BytesEnd::new("Pixels")))
}

fn write_annotations(writer: &mut XmlWriter, metadata: &dyn MetadataRetrieve) -> WriteResult {
    let total: usize = AnnotationKind::ALL
        .iter()
        .map(|kind| count(metadata.annotation_count(*kind)))
        .sum();
    if total == 0 {
        return Ok(());
    }

    emit(writer, Event::Start(BytesStart::new("StructuredAnnotations")))?;
    for kind in AnnotationKind::ALL {
        for index in 0..count(metadata.annotation_count(kind)) {
            let (Some(id), Some(value)) = (
                metadata.annotation_id(kind, index),
                metadata.annotation_value(kind, index),
            ) else {
                continue;
            };
            let name = annotation_element(kind);
            let mut element = BytesStart::new(name);
            element.push_attribute(("ID", id));
            push(&mut element, "Namespace", metadata.annotation_namespace(kind, index));
            emit(writer, Event::Start(element))?;

            if let Some(description) = metadata.annotation_description(kind, index) {
                text_element(writer, "Description", description)?;
            }
            write_value(writer, value)?;

            emit(writer, Event::End(BytesEnd::new(name)))?;
        }
    }
    emit(writer, Event::End(BytesEnd::new("StructuredAnnotations")))
}

fn write_value(writer: &mut XmlWriter, value: &AnnotationValue) -> WriteResult {
    let text = match value {
        AnnotationValue::Map(pairs) => {
            emit(writer, Event::Start(BytesStart::new("Value")))?;
            for pair in pairs {
                let mut entry = BytesStart::new("M");
                entry.push_attribute(("K", pair.key.as_str()));
                emit(writer, Event::Start(entry))?;
                emit(writer, Event::Text(BytesText::new(&pair.value)))?;
                emit(writer, Event::End(BytesEnd::new("M")))?;
            }
            return emit(writer, Event::End(BytesEnd::new("Value")));
        }
        AnnotationValue::Boolean(value) => value.to_string(),
        AnnotationValue::Double(value) => value.to_string(),
        AnnotationValue::Long(value) => value.to_string(),
        AnnotationValue::Timestamp(value) => timestamp(value),
        AnnotationValue::Comment(text)
        | AnnotationValue::Tag(text)
        | AnnotationValue::Term(text)
        | AnnotationValue::Xml(text) => text.clone(),
    };
    text_element(writer, "Value", &text)
}

fn write_roi(writer: &mut XmlWriter, metadata: &dyn MetadataRetrieve, roi: usize) -> WriteResult {
    let mut element = BytesStart::new("ROI");
    push(&mut element, "ID", metadata.roi_id(roi));
    push(&mut element, "Name", metadata.roi_name(roi));
    emit(writer, Event::Start(element))?;

    let shapes = count(metadata.shape_count(roi));
    if shapes > 0 {
        emit(writer, Event::Start(BytesStart::new("Union")))?;
        for shape in 0..shapes {
            write_shape(writer, metadata, roi, shape)?;
        }
        emit(writer, Event::End(BytesEnd::new("Union")))?;
    }
    for annotation_ref in 0..count(metadata.roi_annotation_ref_count(roi)) {
        if let Some(id) = metadata.roi_annotation_ref(roi, annotation_ref) {
            reference(writer, "AnnotationRef", id)?;
        }
    }
    if let Some(description) = metadata.roi_description(roi) {
        text_element(writer, "Description", description)?;
    }

    emit(writer, Event::End(BytesEnd::new("ROI")))
}

fn write_shape(
    writer: &mut XmlWriter,
    metadata: &dyn MetadataRetrieve,
    roi: usize,
    shape: usize,
) -> WriteResult {
    let (Some(kind), Some(geometry)) = (
        metadata.shape_type(roi, shape),
        metadata.shape_geometry(roi, shape),
    ) else {
        return Ok(());
    };
    let name = kind.to_string();
    let mut element = BytesStart::new(name.as_str());
    push(&mut element, "ID", metadata.shape_id(roi, shape));
    push(&mut element, "FillColor", metadata.shape_fill_color(roi, shape));
    push(&mut element, "FillRule", metadata.shape_fill_rule(roi, shape).map(|r| r.as_str()));
    push(&mut element, "StrokeColor", metadata.shape_stroke_color(roi, shape));
    push(&mut element, "StrokeWidth", metadata.shape_stroke_width(roi, shape));
    push(&mut element, "StrokeDashArray", metadata.shape_stroke_dash_array(roi, shape));
    push(&mut element, "Text", metadata.shape_text(roi, shape));
    push(&mut element, "FontFamily", metadata.shape_font_family(roi, shape));
    push(&mut element, "FontSize", metadata.shape_font_size(roi, shape));
    push(&mut element, "FontStyle", metadata.shape_font_style(roi, shape).map(|s| s.as_str()));
    push(&mut element, "Locked", metadata.shape_locked(roi, shape));
    push(&mut element, "TheZ", metadata.shape_the_z(roi, shape));
    push(&mut element, "TheT", metadata.shape_the_t(roi, shape));
    push(&mut element, "TheC", metadata.shape_the_c(roi, shape));
    push_geometry(&mut element, geometry);

    let transform = metadata.shape_transform(roi, shape);
    let annotation_refs = count(metadata.shape_annotation_ref_count(roi, shape));
    if transform.is_none() && annotation_refs == 0 {
        return emit(writer, Event::Empty(element));
    }

    emit(writer, Event::Start(element))?;
    if let Some(transform) = transform {
        write_transform(writer, transform)?;
    }
    for annotation_ref in 0..annotation_refs {
        if let Some(id) = metadata.shape_annotation_ref(roi, shape, annotation_ref) {
            reference(writer, "AnnotationRef", id)?;
        }
    }
    emit(writer, Event::End(BytesEnd::new(name.as_str())))
}

fn push_geometry(element: &mut BytesStart<'_>, geometry: &ShapeGeometry) {
    match geometry {
        ShapeGeometry::Rectangle {
            x,
            y,
            width,
            height,
        }
        | ShapeGeometry::Mask {
            x,
            y,
            width,
            height,
        } => {
            push(element, "X", Some(x));
            push(element, "Y", Some(y));
            push(element, "Width", Some(width));
            push(element, "Height", Some(height));
        }
        ShapeGeometry::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
        } => {
            push(element, "X", Some(x));
            push(element, "Y", Some(y));
            push(element, "RadiusX", Some(radius_x));
            push(element, "RadiusY", Some(radius_y));
        }
        ShapeGeometry::Point { x, y } | ShapeGeometry::Label { x, y } => {
            push(element, "X", Some(x));
            push(element, "Y", Some(y));
        }
        ShapeGeometry::Line {
            x1,
            y1,
            x2,
            y2,
            marker_start,
            marker_end,
        } => {
            push(element, "X1", Some(x1));
            push(element, "Y1", Some(y1));
            push(element, "X2", Some(x2));
            push(element, "Y2", Some(y2));
            push(element, "MarkerStart", marker_start.map(|m| m.as_str()));
            push(element, "MarkerEnd", marker_end.map(|m| m.as_str()));
        }
        ShapeGeometry::Polyline {
            points,
            marker_start,
            marker_end,
        } => {
            push(element, "Points", Some(points));
            push(element, "MarkerStart", marker_start.map(|m| m.as_str()));
            push(element, "MarkerEnd", marker_end.map(|m| m.as_str()));
        }
        ShapeGeometry::Polygon { points } => {
            push(element, "Points", Some(points));
        }
    }
}

fn write_transform(writer: &mut XmlWriter, transform: &AffineTransform) -> WriteResult {
    let mut element = BytesStart::new("Transform");
    push(&mut element, "A00", Some(transform.a00));
    push(&mut element, "A10", Some(transform.a10));
    push(&mut element, "A01", Some(transform.a01));
    push(&mut element, "A11", Some(transform.a11));
    push(&mut element, "A02", Some(transform.a02));
    push(&mut element, "A12", Some(transform.a12));
    emit(writer, Event::Empty(element))
}
