use crate::api::AppError;

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &'static str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::validation(field, format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Like [`required`] for optional patch fields: absent stays absent.
pub fn required_if_present(field: &'static str, value: Option<&str>) -> Result<Option<String>, AppError> {
    value.map(|v| required(field, v)).transpose()
}
