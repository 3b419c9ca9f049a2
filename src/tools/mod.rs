pub mod count_r;
pub mod read_file;

use crate::errors::AppError;

/// Fetches a required, non-empty string parameter.
pub fn required_str<'a>(params: &'a serde_json::Value, name: &str) -> Result<&'a str, AppError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::MissingParameter(name.to_string()))
}
