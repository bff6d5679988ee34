//! Configuration management for roitool.
//!
//! roitool reads an optional TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `ROITOOL_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//!
//! Command-line flags are applied on top by the CLI layer.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! host = "omero.example.org"
//! port = 4064
//! username = "analyst"
//! password = "${ROITOOL_PASSWORD}"
//!
//! [export]
//! display_order_namespace = "glencoesoftware.com/pathviewer/roidisplayorder"
//!
//! [logging]
//! local_enabled = true
//! local_path = "/var/log/roitool"
//! local_rotation = "daily"
//! ```
//!
//! # Loading
//!
//! ```rust,no_run
//! use roitool::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("roitool.toml")?;
//! println!("Store: {}", config.server.base_url());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_defaults};
pub use schema::{Credentials, ExportConfig, LoggingConfig, RoiToolConfig, ServerConfig};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
