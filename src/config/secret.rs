//! Credential handling using the secrecy crate
//!
//! Passwords and session keys are held as [`SecretString`]: the memory is zeroed
//! on drop, `Debug` output is redacted, and the value is only reachable through
//! `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use roitool::config::{SecretString, SecretValue};
//! use secrecy::{ExposeSecret, Secret};
//!
//! let session_key: SecretString = Secret::new(SecretValue::from("4f1c-session".to_string()));
//! assert_eq!(session_key.expose_secret().as_ref(), "4f1c-session");
//! println!("{:?}", session_key); // Prints: Secret([REDACTED ...])
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String newtype that satisfies the traits `Secret` requires
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A zeroized, redacted string
pub type SecretString = Secret<SecretValue>;

/// Wraps a string in a [`SecretString`]
///
/// ```rust
/// use roitool::config::secret_string;
///
/// let password = secret_string("omero".to_string());
/// ```
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Wraps an optional string
#[inline]
pub fn secret_string_opt(value: Option<String>) -> Option<SecretString> {
    value.map(secret_string)
}
