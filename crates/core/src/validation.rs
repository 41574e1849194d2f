//! Request validation helpers built on the `validator` crate.
//!
//! Request DTOs derive [`validator::Validate`]; handlers call
//! [`validate_request`] to turn any failures into a single
//! [`CoreError::Validation`] with a readable, deterministic message.

use validator::Validate;

use crate::error::CoreError;

/// Maximum length of short free-text fields (names, titles).
pub const MAX_NAME_LENGTH: u64 = 200;

/// Maximum length of long free-text fields (descriptions).
pub const MAX_DESCRIPTION_LENGTH: u64 = 5_000;

/// Longest accepted movie runtime in minutes.
pub const MAX_DURATION_MINUTES: i32 = 600;

/// Validate `input`, flattening all field errors into one message.
///
/// Fields are reported in alphabetical order, e.g.
/// `"email: email; title: length"`.
pub fn validate_request<T: Validate>(input: &T) -> Result<(), CoreError> {
    match input.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let mut parts: Vec<String> = errors
                .field_errors()
                .into_iter()
                .map(|(field, errs)| {
                    let reasons: Vec<String> = errs
                        .iter()
                        .map(|e| match &e.message {
                            Some(msg) => msg.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    format!("{field}: {}", reasons.join(", "))
                })
                .collect();
            parts.sort();
            Err(CoreError::Validation(parts.join("; ")))
        }
    }
}

/// Reject strings that are empty after trimming.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}
