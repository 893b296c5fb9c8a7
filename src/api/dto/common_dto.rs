//! Shared DTO types used across multiple endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::GatewayError;

/// Largest page any list endpoint returns.
pub const MAX_LIMIT: u32 = 100;

/// `?limit=` query parameter for list endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Maximum number of items to return (1–100).
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Resolves the requested limit, falling back to `default`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `limit` is zero or above
    /// [`MAX_LIMIT`].
    pub fn resolve(&self, default: u32) -> Result<usize, GatewayError> {
        match self.limit {
            None => Ok(default.min(MAX_LIMIT) as usize),
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit as usize),
            Some(limit) => Err(GatewayError::InvalidRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            ))),
        }
    }
}

/// Returns `value` unchanged, or an error naming `field` if it is blank.
pub(crate) fn required_text(value: String, field: &str) -> Result<String, GatewayError> {
    if value.trim().is_empty() {
        Err(GatewayError::InvalidRequest(format!("{field} is required")))
    } else {
        Ok(value)
    }
}

/// Converts a JSON integer into a non-negative `i32`.
pub(crate) fn non_negative(value: i64, field: &str) -> Result<i32, GatewayError> {
    i32::try_from(value)
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| GatewayError::InvalidRequest(format!("{field} must be a non-negative integer")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(ListQuery::default().resolve(10).ok(), Some(10));
        assert_eq!(ListQuery { limit: Some(100) }.resolve(10).ok(), Some(100));
        assert!(ListQuery { limit: Some(0) }.resolve(10).is_err());
        assert!(ListQuery { limit: Some(101) }.resolve(10).is_err());
    }

    #[test]
    fn text_and_number_helpers() {
        assert!(required_text("  ".to_string(), "sport").is_err());
        assert_eq!(required_text("golf".to_string(), "sport").ok().as_deref(), Some("golf"));
        assert_eq!(non_negative(3, "minute").ok(), Some(3));
        assert!(non_negative(-1, "minute").is_err());
        assert!(non_negative(i64::from(i32::MAX) + 1, "minute").is_err());
    }
}
