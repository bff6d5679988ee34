//! ROI display order and mask filtering
//!
//! A viewer may store the order it displays ROIs in as an XML annotation whose
//! body is a JSON object, e.g. `{"displayorder": [30, 10, 99]}`. Each entry is
//! the id of a ROI's first shape. ROIs whose first shape is a mask are never
//! exported.

use crate::domain::{Annotation, AnnotationValue, ExportError, Roi};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct DisplayOrderBody {
    displayorder: Vec<DisplayOrderEntry>,
}

/// One shape id as viewers write it: a number, or a number in a string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DisplayOrderEntry {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl DisplayOrderEntry {
    /// The shape id, if the entry is integral
    fn shape_id(&self) -> Option<i64> {
        match self {
            DisplayOrderEntry::Integer(id) => Some(*id),
            DisplayOrderEntry::Float(value) => integral(*value),
            DisplayOrderEntry::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(integral))
            }
        }
    }
}

fn integral(value: f64) -> Option<i64> {
    (value.fract() == 0.0 && value.abs() < i64::MAX as f64).then_some(value as i64)
}

/// Reads the display order from the first matching annotation
///
/// Only XML annotations in `namespace` are considered; scanning stops at the
/// first one.
///
/// # Errors
///
/// Returns [`ExportError::InvalidDisplayOrder`] if the matching annotation's
/// body is not a JSON object with a `displayorder` array of integral shape ids.
/// Ids may be written as integers, integral floats or numeric strings.
///
/// # Examples
///
/// ```
/// use roitool::core::export::ordering::find_display_order;
/// use roitool::domain::{Annotation, AnnotationValue};
/// use std::sync::Arc;
///
/// let order = Arc::new(
///     Annotation::new(AnnotationValue::Xml(r#"{"displayorder":[3,1]}"#.to_string()))
///         .with_namespace("example.org/order"),
/// );
/// let found = find_display_order(&[order], "example.org/order").unwrap();
/// assert_eq!(found, Some(vec![3, 1]));
/// ```
pub fn find_display_order(
    annotations: &[Arc<Annotation>],
    namespace: &str,
) -> Result<Option<Vec<i64>>, ExportError> {
    let Some(annotation) = annotations.iter().find(|annotation| {
        matches!(annotation.value, AnnotationValue::Xml(_))
            && annotation.namespace.as_deref() == Some(namespace)
    }) else {
        return Ok(None);
    };

    let invalid = |reason: String| ExportError::InvalidDisplayOrder {
        annotation_id: annotation.details.id,
        reason,
    };
    let body = annotation.xml_text().unwrap_or_default();
    let parsed: DisplayOrderBody =
        serde_json::from_str(body).map_err(|e| invalid(e.to_string()))?;
    let shape_ids = parsed
        .displayorder
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            entry
                .shape_id()
                .ok_or_else(|| invalid(format!("entry {position} is not a shape id: {entry:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        annotation_id = ?annotation.details.id,
        entries = shape_ids.len(),
        "Found ROI display order"
    );
    Ok(Some(shape_ids))
}

/// Orders and filters the ROIs of one image for export
///
/// Without a display order, ROIs keep their given order. With one, each id
/// selects the ROI whose first shape has that id; an id matching no ROI
/// becomes a `None` gap, and ROIs not named are dropped. Either way a ROI whose
/// first shape is a mask is left out. A ROI without shapes is never matched by
/// id and is exported when no display order is given.
pub fn order_rois(rois: Vec<Roi>, display_order: Option<&[i64]>) -> Vec<Option<Roi>> {
    let Some(display_order) = display_order else {
        return rois
            .into_iter()
            .filter(|roi| !first_shape_is_mask(roi))
            .map(Some)
            .collect();
    };

    let mut by_first_shape: HashMap<i64, &Roi> = HashMap::new();
    for roi in &rois {
        if let Some(id) = roi.first_shape().and_then(|shape| shape.details.id) {
            by_first_shape.entry(id).or_insert(roi);
        }
    }

    let mut ordered = Vec::with_capacity(display_order.len());
    for shape_id in display_order {
        match by_first_shape.get(shape_id) {
            Some(roi) if first_shape_is_mask(roi) => {
                tracing::debug!(shape_id, "Skipping mask ROI named in display order");
            }
            Some(roi) => ordered.push(Some((*roi).clone())),
            None => {
                tracing::debug!(shape_id, "Display order names no ROI; leaving a gap");
                ordered.push(None);
            }
        }
    }
    ordered
}

fn first_shape_is_mask(roi: &Roi) -> bool {
    roi.first_shape().is_some_and(|shape| shape.is_mask())
}
