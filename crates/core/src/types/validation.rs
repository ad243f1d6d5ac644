//! Client-side validation performed before a request is sent.
//!
//! These checks save a round trip for obvious mistakes. They are not a
//! security boundary: the backend re-validates every field.

use super::email::EmailError;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A field failed client-side validation; no request was issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Password shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Required minimum length.
        min: usize,
    },

    /// Email address is malformed.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Star rating outside 1..=5.
    #[error("Rating must be between 1 and 5 (got {0})")]
    RatingOutOfRange(i64),
}

/// Require a non-blank value.
///
/// # Errors
///
/// Returns `ValidationError::MissingField` naming `field` if `value` is blank.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Check the registration password length, counted in characters.
///
/// # Errors
///
/// Returns `ValidationError::PasswordTooShort` below [`MIN_PASSWORD_LENGTH`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}
