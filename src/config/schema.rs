//! Configuration schema types

use crate::config::SecretString;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Root configuration, mapped from the TOML file
///
/// Every section is optional; a missing file section takes its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoiToolConfig {
    /// Store connection
    #[serde(default)]
    pub server: ServerConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RoiToolConfig {
    /// Validates the configuration
    ///
    /// Credentials are not checked here; they may still arrive from the command
    /// line. See [`ServerConfig::credentials`].
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// How to authenticate against the store
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Create a new session
    Password {
        username: String,
        password: SecretString,
    },
    /// Join an existing session; it is left open on exit
    SessionKey(SecretString),
}

/// Store server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name of the store gateway
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `https` or `http`
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default)]
    pub username: Option<String>,

    /// Stored securely in memory and zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Key of an existing session, used instead of username/password
    #[serde(default)]
    pub session_key: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification
    ///
    /// Only disable against development servers with self-signed certificates.
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("server.host cannot be empty".to_string());
        }
        if self.port == 0 {
            return Err("server.port must be > 0".to_string());
        }
        let valid_schemes = ["https", "http"];
        if !valid_schemes.contains(&self.scheme.as_str()) {
            return Err(format!(
                "Invalid server.scheme '{}'. Must be one of: {}",
                self.scheme,
                valid_schemes.join(", ")
            ));
        }
        if self.timeout_seconds == 0 {
            return Err("server.timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }

    /// `<scheme>://<host>:<port>`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Picks the credentials to log in with
    ///
    /// A session key wins over a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns an error when neither a session key nor a complete
    /// username/password pair is configured.
    pub fn credentials(&self) -> Result<Credentials, String> {
        if let Some(key) = &self.session_key {
            if !key.expose_secret().is_empty() {
                return Ok(Credentials::SessionKey(key.clone()));
            }
        }

        let username = self
            .username
            .as_deref()
            .filter(|username| !username.trim().is_empty());
        let password = self
            .password
            .as_ref()
            .filter(|password| !password.expose_secret().is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials::Password {
                username: username.to_string(),
                password: password.clone(),
            }),
            (Some(_), None) => Err("server.password is required with server.username".to_string()),
            (None, Some(_)) => Err("server.username is required with server.password".to_string()),
            (None, None) => Err(
                "either a session key or a username and password is required".to_string(),
            ),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            scheme: default_scheme(),
            username: None,
            password: None,
            session_key: None,
            timeout_seconds: default_timeout_seconds(),
            tls_verify: true,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Namespace of the XML annotation that carries the ROI display order
    #[serde(default = "default_display_order_namespace")]
    pub display_order_namespace: String,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.display_order_namespace.trim().is_empty() {
            return Err("export.display_order_namespace cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            display_order_namespace: default_display_order_namespace(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when file logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    4064
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_display_order_namespace() -> String {
    "glencoesoftware.com/pathviewer/roidisplayorder".to_string()
}

fn default_local_path() -> String {
    "/var/log/roitool".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
