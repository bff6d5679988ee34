//! Logging
//!
//! Structured logging through `tracing`:
//! - human-readable console output on stderr
//! - configurable log level
//! - optional JSON file log with rotation
//!
//! # Example
//!
//! ```no_run
//! use roitool::config::LoggingConfig;
//! use roitool::logging::init_logging;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(image_id = 42, "ROI export started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use roitool::domain::RoiToolError;
/// use roitool::log_error_with_context;
///
/// let error = RoiToolError::Configuration("missing host".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
