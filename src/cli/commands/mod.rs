//! CLI command implementations
//!
//! Both commands share the connection flags and the session lifecycle: the
//! configuration is completed from the flags, a session is opened, the
//! coordinator runs, and the session is closed whatever the outcome.

pub mod export;
pub mod import;

use crate::adapters::store::{HttpStore, RoiStore};
use crate::config::{load_config, load_defaults, secret_string, RoiToolConfig, ServerConfig};
use crate::domain::{ImageId, Result, RoiToolError};
use clap::Args;
use std::path::Path;

/// Exit code for configuration and credential errors
pub const EXIT_CONFIGURATION: i32 = 2;

/// Exit code for an unreachable store or refused credentials
pub const EXIT_CONNECTION: i32 = 4;

/// Exit code for every other failure
pub const EXIT_FATAL: i32 = 5;

/// Store connection flags; each overrides the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Store host name
    #[arg(short, long)]
    pub server: Option<String>,

    /// Store port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// User to log in as
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password of the user
    #[arg(short = 'w', long)]
    pub password: Option<String>,

    /// Key of an existing session, used instead of username and password
    #[arg(short, long)]
    pub key: Option<String>,
}

impl ConnectionArgs {
    pub fn apply(&self, server: &mut ServerConfig) {
        if let Some(host) = &self.server {
            server.host = host.clone();
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(username) = &self.username {
            server.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            server.password = Some(secret_string(password.clone()));
        }
        if let Some(key) = &self.key {
            server.session_key = Some(secret_string(key.clone()));
        }
    }
}

/// Parses a positive image id
pub fn parse_image_id(value: &str) -> std::result::Result<ImageId, String> {
    let id: i64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not an image id"))?;
    ImageId::new(id)
}

/// Loads the configuration file, or the defaults when none is given
///
/// # Errors
///
/// Returns a configuration error if the file cannot be loaded.
pub fn load(config_path: Option<&Path>) -> Result<RoiToolConfig> {
    match config_path {
        Some(path) => load_config(path),
        None => load_defaults(),
    }
}

/// Maps a failure to the process exit code
pub fn exit_code(error: &RoiToolError) -> i32 {
    if matches!(error, RoiToolError::Configuration(_)) {
        EXIT_CONFIGURATION
    } else if error.is_connection_failure() {
        EXIT_CONNECTION
    } else {
        EXIT_FATAL
    }
}

/// Applies the flags, validates and opens a session
///
/// # Errors
///
/// Configuration errors for invalid settings or missing credentials, store
/// errors when the session cannot be opened.
pub async fn open_session(
    config: &mut RoiToolConfig,
    connection: &ConnectionArgs,
) -> Result<HttpStore> {
    connection.apply(&mut config.server);
    config
        .validate()
        .map_err(|e| RoiToolError::Configuration(format!("Configuration validation failed: {e}")))?;
    let credentials = config
        .server
        .credentials()
        .map_err(RoiToolError::Configuration)?;

    tracing::info!(server = %config.server.base_url(), "Connecting to store");
    HttpStore::connect(&config.server, credentials).await
}

/// Closes the session; a failure is logged and does not change the outcome
pub async fn close_session(store: &dyn RoiStore) {
    match store.logout().await {
        Ok(()) => tracing::debug!("Session closed"),
        Err(e) => tracing::warn!(error = %e, "Failed to close session"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoreError;
    use secrecy::ExposeSecret;

    #[test]
    fn test_flags_override_configuration() {
        let mut server = ServerConfig {
            host: "file.example.org".to_string(),
            username: Some("file-user".to_string()),
            ..Default::default()
        };
        let connection = ConnectionArgs {
            server: Some("flag.example.org".to_string()),
            port: Some(443),
            password: Some("secret".to_string()),
            ..Default::default()
        };

        connection.apply(&mut server);

        assert_eq!(server.host, "flag.example.org");
        assert_eq!(server.port, 443);
        assert_eq!(server.username.as_deref(), Some("file-user"));
        assert_eq!(
            server.password.as_ref().map(|p| p.expose_secret().as_ref().to_string()),
            Some("secret".to_string())
        );
        assert!(server.session_key.is_none());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code(&RoiToolError::Configuration("missing".into())),
            EXIT_CONFIGURATION
        );
        assert_eq!(
            exit_code(&StoreError::AuthenticationFailed("401".into()).into()),
            EXIT_CONNECTION
        );
        assert_eq!(exit_code(&StoreError::SaveFailed("x".into()).into()), EXIT_FATAL);
    }

    #[test]
    fn test_parse_image_id() {
        assert_eq!(parse_image_id("42").unwrap().get(), 42);
        assert!(parse_image_id("-1").is_err());
        assert!(parse_image_id("one").is_err());
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let mut config = RoiToolConfig::default();
        let err = open_session(&mut config, &ConnectionArgs::default())
            .await
            .err()
            .unwrap();
        assert_eq!(exit_code(&err), EXIT_CONFIGURATION);
    }
}
