//! Environment variable readers.

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    /// A variable is set to a value that cannot be interpreted.
    #[error("Invalid value for environment variable {name}: {value:?}")]
    Invalid {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, EnvError> {
    std::env::var(name).map_err(|_| EnvError::MissingEnvVar(name.to_string()))
}

/// Reads an optional variable; unset, non-unicode and blank values are `None`.
pub fn optional_env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads a boolean flag. Unset means `false`.
///
/// Accepted values (case-insensitive): `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off`.
pub fn env_flag(name: &str) -> Result<bool, EnvError> {
    match optional_env_var(name) {
        None => Ok(false),
        Some(value) => parse_flag(name, &value),
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, EnvError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EnvError::Invalid {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
