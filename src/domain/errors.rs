//! Domain error types
//!
//! This module defines the error hierarchy for roitool. Errors are domain-specific
//! and don't expose third-party types; adapters convert client and parser errors
//! into the variants below.

use super::object::ObjectKind;
use std::fmt;
use thiserror::Error;

/// Main roitool error type
///
/// This is the primary error type used throughout the application.
/// It wraps the specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum RoiToolError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Object store errors (transport, authentication, persistence)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Document read/write errors
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Object graph construction errors
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl RoiToolError {
    /// Returns true when the error came from reaching or authenticating against the store
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            RoiToolError::Store(
                StoreError::ConnectionFailed(_)
                    | StoreError::AuthenticationFailed(_)
                    | StoreError::Timeout(_)
            )
        )
    }
}

/// Identifier derivation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LsidError {
    /// The object is an instance of the abstract domain root
    #[error("cannot derive an identifier for an instance of the abstract kind {kind}")]
    InvalidObjectKind { kind: ObjectKind },

    /// The object was fetched without its identity or update event
    #[error(
        "{kind} (id: {}) has no {missing}; it was fetched without the join that hydrates it",
        .id.map_or_else(|| "none".to_string(), |id| id.to_string())
    )]
    UnhydratedObject {
        kind: ObjectKind,
        id: Option<i64>,
        missing: &'static str,
    },
}

/// Which side of a reference record failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSide {
    Target,
    Reference,
}

impl fmt::Display for ReferenceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceSide::Target => write!(f, "target"),
            ReferenceSide::Reference => write!(f, "reference"),
        }
    }
}

/// Object graph construction errors
///
/// All of these mean the input violates the graph invariants. They are never
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// A child container arrived before its parent
    #[error("{lsid} refers to roiIndex {roi_index}, which has no ROI")]
    OrphanChild { lsid: String, roi_index: usize },

    /// A container lacks a positional index required by its role
    #[error("{lsid} has no {axis} index")]
    MissingIndex { lsid: String, axis: &'static str },

    /// A reference names an identifier that no container registered
    #[error("unresolved {side} identifier {lsid}")]
    UnresolvedReference { side: ReferenceSide, lsid: String },

    /// No link function exists for the pair of kinds
    #[error("no link handler for {target} -> {reference}")]
    NoLinkHandler {
        target: ObjectKind,
        reference: ObjectKind,
    },
}

/// Object store errors
///
/// Errors that occur when talking to the remote store. These errors don't expose
/// the HTTP client's types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Login or session reuse failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested image does not exist or is not readable
    #[error("Image not found: {0}")]
    ImageNotFound(i64),

    /// The batch save was rejected; nothing was persisted
    #[error("Save failed: {0}")]
    SaveFailed(String),

    /// Invalid response body
    #[error("Invalid response from store: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// Document read/write errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Malformed markup
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// A required attribute is absent
    #[error("<{element}> is missing required attribute {attribute}")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    /// An attribute value could not be parsed
    #[error("<{element}> attribute {attribute} has invalid value {value:?}")]
    InvalidValue {
        element: String,
        attribute: &'static str,
        value: String,
    },

    /// A reference element appeared outside an owner
    #[error("<{0}> appears outside of an owning element")]
    UnexpectedElement(String),

    /// Failed to write the document
    #[error("Failed to write document: {0}")]
    WriteFailed(String),
}

/// Export-specific errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// The display-order annotation body could not be interpreted
    #[error("Invalid display order in annotation {}: {reason}",
        .annotation_id.map_or_else(|| "without id".to_string(), |id| id.to_string()))]
    InvalidDisplayOrder {
        annotation_id: Option<i64>,
        reason: String,
    },

    /// An exported ROI, shape or annotation has no derivable identifier
    #[error("Cannot identify {subject} at position {position}: {source}")]
    Projection {
        subject: &'static str,
        position: usize,
        #[source]
        source: LsidError,
    },
}

// Conversion from std::io::Error
impl From<std::io::Error> for RoiToolError {
    fn from(err: std::io::Error) -> Self {
        RoiToolError::Io(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RoiToolError {
    fn from(err: toml::de::Error) -> Self {
        RoiToolError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<quick_xml::Error> for DocumentError {
    fn from(err: quick_xml::Error) -> Self {
        DocumentError::Malformed(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DocumentError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DocumentError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roitool_error_display() {
        let err = RoiToolError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_link_error_conversion() {
        let link_err = LinkError::OrphanChild {
            lsid: "urn:lsid:x:y:Rectangle_1:2".to_string(),
            roi_index: 3,
        };
        let err: RoiToolError = link_err.into();
        assert!(matches!(err, RoiToolError::Link(LinkError::OrphanChild { .. })));
        assert!(err.to_string().contains("roiIndex 3"));
    }

    #[test]
    fn test_unhydrated_error_names_kind_and_id() {
        let err = LsidError::UnhydratedObject {
            kind: ObjectKind::Rectangle,
            id: Some(42),
            missing: "update event",
        };
        let message = err.to_string();
        assert!(message.contains("Rectangle"));
        assert!(message.contains("42"));
        assert!(message.contains("update event"));

        let err = LsidError::UnhydratedObject {
            kind: ObjectKind::Roi,
            id: None,
            missing: "id",
        };
        assert!(err.to_string().contains("id: none"));
    }

    #[test]
    fn test_unresolved_reference_names_side() {
        let err = LinkError::UnresolvedReference {
            side: ReferenceSide::Reference,
            lsid: "Annotation:9".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unresolved reference identifier Annotation:9"
        );
    }

    #[test]
    fn test_connection_failure_classification() {
        let err: RoiToolError = StoreError::AuthenticationFailed("bad password".into()).into();
        assert!(err.is_connection_failure());

        let err: RoiToolError = StoreError::SaveFailed("constraint".into()).into();
        assert!(!err.is_connection_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: RoiToolError = io_err.into();
        assert!(matches!(err, RoiToolError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: RoiToolError = toml_err.into();
        assert!(matches!(err, RoiToolError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_projection_error_keeps_identity_source() {
        let err: RoiToolError = ExportError::Projection {
            subject: "annotation",
            position: 4,
            source: LsidError::InvalidObjectKind {
                kind: ObjectKind::Object,
            },
        }
        .into();

        assert!(err.to_string().contains("annotation at position 4"));
        let source = std::error::Error::source(&err)
            .and_then(std::error::Error::source)
            .and_then(|source| source.downcast_ref::<LsidError>());
        assert!(matches!(source, Some(LsidError::InvalidObjectKind { .. })));
    }
}
