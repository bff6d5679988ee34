//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that cross the document/store boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a stored image
///
/// # Examples
///
/// ```
/// use roitool::domain::ids::ImageId;
/// use std::str::FromStr;
///
/// let image_id = ImageId::from_str("1203").unwrap();
/// assert_eq!(image_id.get(), 1203);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(i64);

impl ImageId {
    /// Creates a new ImageId; store identities are strictly positive
    pub fn new(id: i64) -> Result<Self, String> {
        if id <= 0 {
            return Err(format!("Image ID must be positive, got: {id}"));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ImageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("Invalid image ID {s:?}: {e}"))?;
        Self::new(id)
    }
}

/// Authority part of every identifier minted against one store
///
/// Built from the store-wide authority setting and the store instance UUID,
/// both fetched once per session.
///
/// # Examples
///
/// ```
/// use roitool::domain::ids::LsidAuthority;
///
/// let authority = LsidAuthority::new("export.openmicroscopy.org", "6f0d2c2e").unwrap();
/// assert_eq!(authority.prefix(), "urn:lsid:export.openmicroscopy.org:6f0d2c2e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LsidAuthority {
    authority: String,
    database_uuid: String,
}

impl LsidAuthority {
    pub fn new(
        authority: impl Into<String>,
        database_uuid: impl Into<String>,
    ) -> Result<Self, String> {
        let authority = authority.into();
        let database_uuid = database_uuid.into();
        for (label, value) in [("authority", &authority), ("database UUID", &database_uuid)] {
            if value.trim().is_empty() {
                return Err(format!("LSID {label} cannot be empty"));
            }
            if value.contains(':') {
                return Err(format!("LSID {label} cannot contain ':', got: {value}"));
            }
        }
        Ok(Self {
            authority,
            database_uuid,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn database_uuid(&self) -> &str {
        &self.database_uuid
    }

    /// `urn:lsid:<authority>:<database-uuid>`
    pub fn prefix(&self) -> String {
        format!("urn:lsid:{}:{}", self.authority, self.database_uuid)
    }
}

/// A derived object identifier
///
/// Produced by the identifier scheme on export and read back verbatim from
/// documents on import. Documents written by other tools may use any string,
/// so no format is enforced beyond non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Lsid(String);

impl Lsid {
    pub fn new(lsid: impl Into<String>) -> Result<Self, String> {
        let lsid = lsid.into();
        if lsid.trim().is_empty() {
            return Err("LSID cannot be empty".to_string());
        }
        Ok(Self(lsid))
    }

    /// Wraps a string the identifier scheme has just formatted
    pub(crate) fn from_formatted(lsid: String) -> Self {
        Self(lsid)
    }

    /// Returns the LSID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Lsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Lsid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Lsid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
