//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RoiToolConfig;
use super::secret::secret_string;
use crate::domain::errors::RoiToolError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into RoiToolConfig
/// 4. Applies environment variable overrides (ROITOOL_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read or parsed, a
/// referenced environment variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use roitool::config::loader::load_config;
///
/// let config = load_config("roitool.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RoiToolConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RoiToolError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RoiToolError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let config: RoiToolConfig = toml::from_str(&contents)
        .map_err(|e| RoiToolError::Configuration(format!("Failed to parse TOML: {e}")))?;

    finish(config)
}

/// Built-in defaults with `ROITOOL_*` overrides applied
///
/// Used when no configuration file is given.
pub fn load_defaults() -> Result<RoiToolConfig> {
    finish(RoiToolConfig::default())
}

fn finish(mut config: RoiToolConfig) -> Result<RoiToolConfig> {
    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        RoiToolError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| RoiToolError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|name| name == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RoiToolError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the ROITOOL_* prefix
///
/// Variables follow the pattern ROITOOL_<SECTION>_<KEY>, for example
/// ROITOOL_SERVER_HOST or ROITOOL_EXPORT_DISPLAY_ORDER_NAMESPACE.
fn apply_env_overrides(config: &mut RoiToolConfig) -> Result<()> {
    // Server overrides
    if let Ok(val) = std::env::var("ROITOOL_SERVER_HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("ROITOOL_SERVER_PORT") {
        config.server.port = parse_override("ROITOOL_SERVER_PORT", &val)?;
    }
    if let Ok(val) = std::env::var("ROITOOL_SERVER_SCHEME") {
        config.server.scheme = val;
    }
    if let Ok(val) = std::env::var("ROITOOL_SERVER_USERNAME") {
        config.server.username = Some(val);
    }
    if let Ok(val) = std::env::var("ROITOOL_SERVER_PASSWORD") {
        config.server.password = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("ROITOOL_SERVER_SESSION_KEY") {
        config.server.session_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("ROITOOL_SERVER_TIMEOUT_SECONDS") {
        config.server.timeout_seconds = parse_override("ROITOOL_SERVER_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("ROITOOL_SERVER_TLS_VERIFY") {
        config.server.tls_verify = val.parse().unwrap_or(true);
    }

    // Export overrides
    if let Ok(val) = std::env::var("ROITOOL_EXPORT_DISPLAY_ORDER_NAMESPACE") {
        config.export.display_order_namespace = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("ROITOOL_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("ROITOOL_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("ROITOOL_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RoiToolError::Configuration(format!("Invalid value for {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("ROITOOL_TEST_SUBST_VAR", "test_value");
        let input = "password = \"${ROITOOL_TEST_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"\n");
        std::env::remove_var("ROITOOL_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("ROITOOL_TEST_MISSING_VAR");
        let input = "password = \"${ROITOOL_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("ROITOOL_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# password = \"${ROITOOL_TEST_NEVER_SET}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-roitool.toml");
        assert!(matches!(result, Err(RoiToolError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[server]
host = "omero.example.org"
port = 4443
username = "analyst"
password = "secret"

[export]
display_order_namespace = "example.org/order"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.host, "omero.example.org");
        assert_eq!(config.server.port, 4443);
        assert_eq!(config.export.display_order_namespace, "example.org/order");
        assert!(config.server.credentials().is_ok());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[server\nhost = ").unwrap();
        temp_file.flush().unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }
}
