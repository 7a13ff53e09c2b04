//! Small field validators shared by the DTO layer.

use crate::error::CoreError;

pub const PRIORITY_LOW: &str = "low";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_URGENT: &str = "urgent";

pub const VALID_PRIORITIES: &[&str] = &[PRIORITY_LOW, PRIORITY_MEDIUM, PRIORITY_HIGH, PRIORITY_URGENT];

/// Upper bound for a single time entry.
pub const MAX_HOURS_PER_ENTRY: f64 = 24.0;

pub fn validate_priority(priority: &str) -> Result<(), CoreError> {
    if VALID_PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid priority '{priority}'. Must be one of: {}",
            VALID_PRIORITIES.join(", ")
        )))
    }
}

/// Reject empty or whitespace-only required strings.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_hours(hours: f64) -> Result<(), CoreError> {
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_HOURS_PER_ENTRY {
        return Err(CoreError::Validation(format!(
            "hours must be greater than 0 and at most {MAX_HOURS_PER_ENTRY}"
        )));
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}
