//! Identifier scheme
//!
//! Every persisted object exported to a document is labelled with a string of the
//! form `urn:lsid:<authority>:<database-uuid>:<TypeName>_<id>:<update-event>`.
//! The same object at the same revision always gets the same string; a new
//! revision changes only the last segment. Canonical type names never contain
//! `_` or `:`, so strings of distinct objects never collide.

use crate::domain::{Lsid, LsidAuthority, LsidError, ModelObject};

/// Suffix qualifying a channel's emission filter reference
pub const EMISSION_FILTER_SUFFIX: &str = ":OMERO_EMISSION_FILTER";

/// Suffix qualifying a channel's excitation filter reference
pub const EXCITATION_FILTER_SUFFIX: &str = ":OMERO_EXCITATION_FILTER";

const REFERENCE_SUFFIXES: [&str; 2] = [EMISSION_FILTER_SUFFIX, EXCITATION_FILTER_SUFFIX];

/// Mints identifiers for one store connection
///
/// # Examples
///
/// ```
/// use roitool::core::lsid::LsidScheme;
/// use roitool::domain::{Details, LsidAuthority, Roi};
///
/// let authority = LsidAuthority::new("export.openmicroscopy.org", "6f0d2c2e").unwrap();
/// let scheme = LsidScheme::new(&authority);
/// let roi = Roi::new().with_details(Details::persisted(12, 340));
///
/// assert_eq!(
///     scheme.identifier_of(&roi).unwrap().as_str(),
///     "urn:lsid:export.openmicroscopy.org:6f0d2c2e:Roi_12:340"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LsidScheme {
    prefix: String,
}

impl LsidScheme {
    pub fn new(authority: &LsidAuthority) -> Self {
        Self {
            prefix: authority.prefix(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derives the identifier of a hydrated, concrete object
    ///
    /// # Errors
    ///
    /// - [`LsidError::InvalidObjectKind`] for an instance of the abstract root
    /// - [`LsidError::UnhydratedObject`] when the id or update event is absent
    pub fn identifier_of(&self, object: &dyn ModelObject) -> Result<Lsid, LsidError> {
        let kind = object.kind();
        let type_name = kind
            .canonical_name()
            .ok_or(LsidError::InvalidObjectKind { kind })?;

        let details = object.details();
        let id = details.id.ok_or(LsidError::UnhydratedObject {
            kind,
            id: None,
            missing: "id",
        })?;
        let update_event = details.update_event.ok_or(LsidError::UnhydratedObject {
            kind,
            id: Some(id),
            missing: "update event",
        })?;

        Ok(Lsid::from_formatted(format!(
            "{}:{}_{}:{}",
            self.prefix, type_name, id, update_event
        )))
    }
}

/// Removes a qualifying sub-role suffix from a reference identifier
///
/// Identifiers without a known suffix are returned unchanged.
pub fn strip_reference_suffix(reference: &str) -> &str {
    if REFERENCE_SUFFIXES
        .iter()
        .any(|suffix| reference.ends_with(suffix))
    {
        if let Some(split) = reference.rfind(':') {
            return &reference[..split];
        }
    }
    reference
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Annotation, AnnotationValue, Details, LsidError, ObjectKind, ObjectRef, Roi, Shape,
        ShapeGeometry,
    };
    use test_case::test_case;

    fn scheme() -> LsidScheme {
        LsidScheme::new(&LsidAuthority::new("example.org", "0c3e").unwrap())
    }

    fn point(details: Details) -> Shape {
        Shape::new(ShapeGeometry::Point { x: 0.0, y: 0.0 }).with_details(details)
    }

    #[test]
    fn test_concrete_type_name_is_used() {
        let lsid = scheme().identifier_of(&point(Details::persisted(5, 9))).unwrap();
        assert_eq!(lsid.as_str(), "urn:lsid:example.org:0c3e:Point_5:9");

        let tag = Annotation::new(AnnotationValue::Tag("t".into()))
            .with_details(Details::persisted(5, 9));
        let lsid = scheme().identifier_of(&tag).unwrap();
        assert_eq!(lsid.as_str(), "urn:lsid:example.org:0c3e:TagAnnotation_5:9");
    }

    #[test]
    fn test_abstract_root_is_rejected() {
        let root = ObjectRef {
            kind: ObjectKind::Object,
            details: Details::persisted(1, 1),
        };
        assert_eq!(
            scheme().identifier_of(&root),
            Err(LsidError::InvalidObjectKind {
                kind: ObjectKind::Object
            })
        );
    }

    #[test]
    fn test_missing_id_is_unhydrated() {
        let err = scheme().identifier_of(&Roi::new()).unwrap_err();
        assert_eq!(
            err,
            LsidError::UnhydratedObject {
                kind: ObjectKind::Roi,
                id: None,
                missing: "id"
            }
        );
    }

    #[test]
    fn test_missing_update_event_is_unhydrated() {
        let image = ObjectRef::new(ObjectKind::Image, 77);
        let err = scheme().identifier_of(&image).unwrap_err();
        assert_eq!(
            err,
            LsidError::UnhydratedObject {
                kind: ObjectKind::Image,
                id: Some(77),
                missing: "update event"
            }
        );
    }

    #[test]
    fn test_revision_changes_only_last_segment() {
        let before = scheme().identifier_of(&point(Details::persisted(5, 9))).unwrap();
        let after = scheme().identifier_of(&point(Details::persisted(5, 10))).unwrap();
        let (before_head, before_tail) = before.as_str().rsplit_once(':').unwrap();
        let (after_head, after_tail) = after.as_str().rsplit_once(':').unwrap();
        assert_eq!(before_head, after_head);
        assert_eq!((before_tail, after_tail), ("9", "10"));
    }

    #[test]
    fn test_same_id_different_kinds_differ() {
        let roi = Roi::new().with_details(Details::persisted(3, 3));
        let shape = point(Details::persisted(3, 3));
        assert_ne!(
            scheme().identifier_of(&roi).unwrap(),
            scheme().identifier_of(&shape).unwrap()
        );
    }

    #[test_case("urn:lsid:a:b:Channel_4:2:OMERO_EMISSION_FILTER", "urn:lsid:a:b:Channel_4:2" ; "emission filter")]
    #[test_case("urn:lsid:a:b:Channel_4:2:OMERO_EXCITATION_FILTER", "urn:lsid:a:b:Channel_4:2" ; "excitation filter")]
    #[test_case("urn:lsid:a:b:Channel_4:2", "urn:lsid:a:b:Channel_4:2" ; "no suffix")]
    #[test_case("Annotation:0", "Annotation:0" ; "foreign identifier")]
    fn test_strip_reference_suffix(input: &str, expected: &str) {
        assert_eq!(strip_reference_suffix(input), expected);
    }
}
