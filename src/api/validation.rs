use axum::{Json, extract::rejection::JsonRejection};

use super::ApiError;

const MAX_QUERY_LEN: usize = 200;

pub fn validate_id(kind: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {kind} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Fails with "`field` is required" when a form field was left out.
pub fn require<T>(field: &str, value: Option<T>) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

/// Unwraps an action body, turning malformed JSON and unknown `_action`
/// values into a 400 instead of axum's default 422.
pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// Trims a free-text filter and caps its length.
pub fn validate_search_query(query: Option<&str>) -> Result<String, ApiError> {
    let trimmed = query.unwrap_or_default().trim();

    if trimmed.len() > MAX_QUERY_LEN {
        return Err(ApiError::validation(format!(
            "Search query must be {MAX_QUERY_LEN} characters or less"
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id("show", 3).unwrap(), 3);
        assert!(validate_id("show", 0).is_err());
        assert!(validate_id("show", -4).is_err());
    }

    #[test]
    fn test_require() {
        assert_eq!(require("name", Some("Dark")).unwrap(), "Dark");
        let err = require::<i32>("platform_id", None).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: platform_id is required");
    }

    #[test]
    fn test_search_query_is_trimmed_and_bounded() {
        assert_eq!(validate_search_query(Some("  office ")).unwrap(), "office");
        assert_eq!(validate_search_query(None).unwrap(), "");
        assert!(validate_search_query(Some(&"x".repeat(201))).is_err());
    }
}
