//! Pure input validators for task fields. No database access, no panics;
//! callers inspect the returned `Result` and decide how to surface failure.

use crate::task::{Priority, Status};
use std::str::FromStr;

/// Maximum title length in characters, after trimming.
pub const MAX_TITLE_LENGTH: usize = 200;
/// Maximum description length in characters, after trimming.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// A validation failure with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Title cannot exceed 200 characters")]
    TitleTooLong,
    #[error("Description cannot exceed 2000 characters")]
    DescriptionTooLong,
    #[error("Invalid due date")]
    InvalidDueDate,
}

/// Validates a task title: non-empty after trimming, at most
/// [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Validates a task description: at most [`MAX_DESCRIPTION_LENGTH`]
/// characters. Empty is permitted.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}

/// Validates an optional due date in milliseconds since epoch. Absent is
/// valid; a present value must be non-negative.
pub fn validate_due_date(due_date: Option<i64>) -> Result<(), ValidationError> {
    match due_date {
        Some(millis) if millis < 0 => Err(ValidationError::InvalidDueDate),
        _ => Ok(()),
    }
}

/// Membership test against the closed priority enumeration.
pub fn is_valid_priority(s: &str) -> bool {
    Priority::from_str(s).is_ok()
}

/// Membership test against the closed status enumeration.
pub fn is_valid_status(s: &str) -> bool {
    Status::from_str(s).is_ok()
}
