//! Result type alias for roitool

use super::errors::RoiToolError;

/// Result type alias for roitool operations
///
/// # Examples
///
/// ```
/// use roitool::domain::result::Result;
/// use roitool::domain::errors::RoiToolError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(RoiToolError::Configuration("server.host is empty".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RoiToolError>;
