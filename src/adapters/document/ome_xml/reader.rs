//! OME-XML parsing into linker records

use super::{annotation_kind_of, OmeXml};
use crate::adapters::document::traits::{DocumentReader, ReadStats, RecordSink};
use crate::core::linker::{ContainerRecord, GraphObject, Indexes, ReferenceRecord};
use crate::domain::{
    AffineTransform, Annotation, AnnotationKind, AnnotationValue, DocumentError, FillRule,
    FontStyle, Lsid, MapPair, Marker, Result, Roi, RoiToolError, Shape, ShapeGeometry,
};
use chrono::{DateTime, Utc};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use std::str::FromStr;

type ParseResult<T> = std::result::Result<T, DocumentError>;

impl DocumentReader for OmeXml {
    fn read(&self, path: &Path, sink: &mut dyn RecordSink) -> Result<ReadStats> {
        let content = fs::read_to_string(path).map_err(|e| {
            RoiToolError::Io(format!("Failed to read document {}: {e}", path.display()))
        })?;
        let root = parse_tree(&content)?;
        let stats = emit_records(&root, sink)?;
        tracing::info!(
            path = %path.display(),
            containers = stats.containers,
            references = stats.references,
            "Document read"
        );
        Ok(stats)
    }
}

/// Parsed element with its attributes, text and children
#[derive(Debug, Default)]
pub(super) struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> ParseResult<Self> {
        let mut element = Element {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn required(&self, name: &'static str) -> ParseResult<&str> {
        self.attribute(name)
            .ok_or_else(|| DocumentError::MissingAttribute {
                element: self.name.clone(),
                attribute: name,
            })
    }

    fn parse<T: FromStr>(&self, name: &'static str) -> ParseResult<Option<T>> {
        self.attribute(name)
            .map(|value| {
                value.trim().parse().map_err(|_| self.invalid(name, value))
            })
            .transpose()
    }

    fn parse_required<T: FromStr>(&self, name: &'static str) -> ParseResult<T> {
        let value = self.required(name)?;
        value.trim().parse().map_err(|_| self.invalid(name, value))
    }

    /// Parses an enumerated attribute with the given lookup
    fn parse_with<T>(
        &self,
        name: &'static str,
        lookup: impl Fn(&str) -> Option<T>,
    ) -> ParseResult<Option<T>> {
        self.attribute(name)
            .map(|value| lookup(value).ok_or_else(|| self.invalid(name, value)))
            .transpose()
    }

    fn lsid(&self) -> ParseResult<Lsid> {
        let value = self.required("ID")?;
        Lsid::new(value).map_err(|_| self.invalid("ID", value))
    }

    fn invalid(&self, attribute: &'static str, value: &str) -> DocumentError {
        DocumentError::InvalidValue {
            element: self.name.clone(),
            attribute,
            value: value.to_string(),
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.as_str())
    }
}

/// Builds the element tree of a whole document
pub(super) fn parse_tree(content: &str) -> ParseResult<Element> {
    let mut reader = Reader::from_str(content);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref start) => {
                let mut element = Element::from_start(start)?;
                if element.name == "Value" && is_xml_annotation(stack.last()) {
                    let end = start.to_end().into_owned();
                    element.text = xml_body(&reader.read_text(end.name())?)?;
                    attach(&mut stack, &mut root, element)?;
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(ref start) => {
                let element = Element::from_start(start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DocumentError::Malformed("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(ref text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DocumentError::Malformed(format!(
            "unclosed element <{}>",
            stack.last().map_or("", |element| element.name.as_str())
        )));
    }
    root.ok_or_else(|| DocumentError::Malformed("document has no root element".to_string()))
}

fn is_xml_annotation(parent: Option<&Element>) -> bool {
    parent.is_some_and(|parent| annotation_kind_of(&parent.name) == Some(AnnotationKind::Xml))
}

/// Body of an XML annotation value
///
/// Markup is kept verbatim. Plain character data is unescaped like any other
/// text node.
fn xml_body(raw: &str) -> ParseResult<String> {
    if raw.contains('<') {
        return Ok(raw.to_string());
    }
    Ok(unescape(raw).map_err(quick_xml::Error::from)?.into_owned())
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> ParseResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(DocumentError::Malformed(format!(
                "second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}

/// Walks the tree top-down and feeds the sink
fn emit_records(root: &Element, sink: &mut dyn RecordSink) -> Result<ReadStats> {
    if root.name != "OME" {
        return Err(DocumentError::UnexpectedElement(root.name.clone()).into());
    }
    let mut stats = ReadStats::default();

    let images = root.children_named("Image").count();
    if images > 0 {
        tracing::debug!(images, "Skipping image metadata");
    }

    if let Some(annotations) = root.child("StructuredAnnotations") {
        let mut annotation_index = 0;
        for element in &annotations.children {
            let Some(kind) = annotation_kind_of(&element.name) else {
                tracing::debug!(element = %element.name, "Skipping unsupported annotation");
                continue;
            };
            let record = ContainerRecord::new(
                element.lsid()?,
                GraphObject::CrossCutting(parse_annotation(element, kind)?),
                Indexes::annotation(annotation_index),
            );
            sink.add_container(record)?;
            stats.containers += 1;
            annotation_index += 1;
        }
    }

    for (roi_index, element) in root.children_named("ROI").enumerate() {
        let roi_lsid = element.lsid()?;
        let roi = Roi {
            name: element.attribute("Name").map(str::to_string),
            description: element.child_text("Description").map(str::to_string),
            ..Roi::new()
        };
        sink.add_container(ContainerRecord::new(
            roi_lsid.clone(),
            GraphObject::Root(roi),
            Indexes::roi(roi_index),
        ))?;
        stats.containers += 1;

        if let Some(union) = element.child("Union") {
            for (shape_index, shape_element) in union.children.iter().enumerate() {
                let shape_lsid = shape_element.lsid()?;
                let shape = parse_shape(shape_element)?;
                sink.add_container(ContainerRecord::new(
                    shape_lsid.clone(),
                    GraphObject::Child(shape),
                    Indexes::shape(roi_index, shape_index),
                ))?;
                stats.containers += 1;
                stats.references += emit_references(shape_element, &shape_lsid, sink)?;
            }
        }
        stats.references += emit_references(element, &roi_lsid, sink)?;
    }

    Ok(stats)
}

fn emit_references(
    owner: &Element,
    owner_lsid: &Lsid,
    sink: &mut dyn RecordSink,
) -> ParseResult<usize> {
    let mut emitted = 0;
    for reference in owner.children_named("AnnotationRef") {
        sink.add_reference(ReferenceRecord::new(owner_lsid.clone(), reference.lsid()?));
        emitted += 1;
    }
    Ok(emitted)
}

fn parse_annotation(element: &Element, kind: AnnotationKind) -> ParseResult<Annotation> {
    let value_element = element.child("Value");
    let text = value_element.map_or("", |value| value.text.as_str());
    let invalid = || DocumentError::InvalidValue {
        element: format!("{}/Value", element.name),
        attribute: "text",
        value: text.to_string(),
    };

    let value = match kind {
        AnnotationKind::Boolean => AnnotationValue::Boolean(text.trim().parse().map_err(|_| invalid())?),
        AnnotationKind::Comment => AnnotationValue::Comment(text.to_string()),
        AnnotationKind::Double => AnnotationValue::Double(text.trim().parse().map_err(|_| invalid())?),
        AnnotationKind::Long => AnnotationValue::Long(text.trim().parse().map_err(|_| invalid())?),
        AnnotationKind::Map => AnnotationValue::Map(
            value_element
                .map(|value| {
                    value
                        .children_named("M")
                        .map(|entry| {
                            Ok(MapPair::new(entry.attribute("K").unwrap_or_default(), entry.text.clone()))
                        })
                        .collect::<ParseResult<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default(),
        ),
        AnnotationKind::Tag => AnnotationValue::Tag(text.to_string()),
        AnnotationKind::Term => AnnotationValue::Term(text.to_string()),
        AnnotationKind::Timestamp => AnnotationValue::Timestamp(
            DateTime::parse_from_rfc3339(text.trim())
                .map(|date| date.with_timezone(&Utc))
                .map_err(|_| invalid())?,
        ),
        AnnotationKind::Xml => AnnotationValue::Xml(text.to_string()),
    };

    let mut annotation = Annotation::new(value);
    annotation.namespace = element.attribute("Namespace").map(str::to_string);
    annotation.description = element.child_text("Description").map(str::to_string);
    Ok(annotation)
}

fn parse_shape(element: &Element) -> ParseResult<Shape> {
    let geometry = match element.name.as_str() {
        "Rectangle" => ShapeGeometry::Rectangle {
            x: element.parse_required("X")?,
            y: element.parse_required("Y")?,
            width: element.parse_required("Width")?,
            height: element.parse_required("Height")?,
        },
        "Ellipse" => ShapeGeometry::Ellipse {
            x: element.parse_required("X")?,
            y: element.parse_required("Y")?,
            radius_x: element.parse_required("RadiusX")?,
            radius_y: element.parse_required("RadiusY")?,
        },
        "Point" => ShapeGeometry::Point {
            x: element.parse_required("X")?,
            y: element.parse_required("Y")?,
        },
        "Line" => ShapeGeometry::Line {
            x1: element.parse_required("X1")?,
            y1: element.parse_required("Y1")?,
            x2: element.parse_required("X2")?,
            y2: element.parse_required("Y2")?,
            marker_start: element.parse_with("MarkerStart", Marker::parse)?,
            marker_end: element.parse_with("MarkerEnd", Marker::parse)?,
        },
        "Polyline" => ShapeGeometry::Polyline {
            points: element.required("Points")?.to_string(),
            marker_start: element.parse_with("MarkerStart", Marker::parse)?,
            marker_end: element.parse_with("MarkerEnd", Marker::parse)?,
        },
        "Polygon" => ShapeGeometry::Polygon {
            points: element.required("Points")?.to_string(),
        },
        "Label" => ShapeGeometry::Label {
            x: element.parse_required("X")?,
            y: element.parse_required("Y")?,
        },
        "Mask" => ShapeGeometry::Mask {
            x: element.parse_required("X")?,
            y: element.parse_required("Y")?,
            width: element.parse_required("Width")?,
            height: element.parse_required("Height")?,
        },
        other => return Err(DocumentError::UnexpectedElement(other.to_string())),
    };

    let mut shape = Shape::new(geometry);
    shape.text = element.attribute("Text").map(str::to_string);
    shape.fill_color = element.parse("FillColor")?;
    shape.fill_rule = element.parse_with("FillRule", FillRule::parse)?;
    shape.stroke_color = element.parse("StrokeColor")?;
    shape.stroke_width = element.parse("StrokeWidth")?;
    shape.stroke_dash_array = element.attribute("StrokeDashArray").map(str::to_string);
    shape.font_family = element.attribute("FontFamily").map(str::to_string);
    shape.font_size = element.parse("FontSize")?;
    shape.font_style = element.parse_with("FontStyle", FontStyle::parse)?;
    shape.locked = element.parse("Locked")?;
    shape.the_z = element.parse("TheZ")?;
    shape.the_c = element.parse("TheC")?;
    shape.the_t = element.parse("TheT")?;
    shape.transform = element.child("Transform").map(parse_transform).transpose()?;
    Ok(shape)
}

fn parse_transform(element: &Element) -> ParseResult<AffineTransform> {
    Ok(AffineTransform {
        a00: element.parse_required("A00")?,
        a10: element.parse_required("A10")?,
        a01: element.parse_required("A01")?,
        a11: element.parse_required("A11")?,
        a02: element.parse_required("A02")?,
        a12: element.parse_required("A12")?,
    })
}
