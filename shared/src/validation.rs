//! Input validation functions
//!
//! Field-level rules for request types live on the types themselves via the
//! `validator` derive; the helpers here are the pieces that need custom logic.

use validator::ValidationError;

/// Maximum length of a display name
pub const MAX_NAME_LENGTH: usize = 100;

/// Check that every named field carries a non-blank value
///
/// Returns the name of the first offending field.
pub fn validate_required(fields: &[(&str, &str)]) -> Result<(), String> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(format!("{} is required", name));
        }
    }
    Ok(())
}

/// Display names must contain something other than whitespace
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("blank_name"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::new("name_too_long"));
    }
    Ok(())
}
