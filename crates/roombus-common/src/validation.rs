//! Input validation utilities.
//!
//! Centralized validation helpers used by bus request handlers before a
//! payload is allowed to touch the database or the SFU.

use validator::Validate;

use crate::error::RoomBusError;

/// Validate a request payload, returning a `RoomBusError::Validation` on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), RoomBusError> {
    body.validate().map_err(|e| RoomBusError::Validation {
        message: format_validation_errors(e),
    })
}

fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a room/green-room display name.
pub fn validate_name(name: &str) -> Result<(), RoomBusError> {
    if name.trim().is_empty() {
        return Err(RoomBusError::Validation {
            message: "Name cannot be empty or whitespace only".into(),
        });
    }

    let valid = name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ' ');

    if !valid {
        return Err(RoomBusError::Validation {
            message: "Name can only contain letters, numbers, hyphens, underscores, and spaces"
                .into(),
        });
    }

    Ok(())
}
