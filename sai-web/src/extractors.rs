//! Request extraction helpers
//!
//! Handlers take `Result<Json<T>, JsonRejection>` (or the `Path` equivalent)
//! and unwrap it here, so malformed input is answered with the same error
//! body as any other validation failure.

use crate::error::{ApiError, FieldError};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Json,
};
use tracing::debug;

/// Unwrap a JSON body, mapping deserialization failures to a validation error
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    result.map(|Json(value)| value).map_err(|rejection| {
        let detail = rejection.body_text();
        debug!("Rejected request body: {}", detail);

        let error = match &rejection {
            JsonRejection::JsonDataError(_) => match missing_field(&detail) {
                Some(field) => FieldError::new(field, &format!("{} is required", field)),
                None => FieldError::new("body", "request body does not match the expected format"),
            },
            JsonRejection::JsonSyntaxError(_) => {
                FieldError::new("body", "request body is not valid JSON")
            }
            JsonRejection::MissingJsonContentType(_) => {
                FieldError::new("body", "expected an application/json request body")
            }
            _ => FieldError::new("body", "request body could not be read"),
        };
        ApiError::Validation(vec![error])
    })
}

/// Unwrap a path parameter, mapping parse failures to a validation error on `name`
pub fn extract_path<T>(result: Result<Path<T>, PathRejection>, name: &str) -> Result<T, ApiError> {
    result.map(|Path(value)| value).map_err(|rejection| {
        debug!("Rejected path parameter '{}': {}", name, rejection.body_text());
        ApiError::Validation(vec![FieldError::new(name, "invalid path parameter")])
    })
}

/// Field name out of serde's "missing field `x`" message
fn missing_field(detail: &str) -> Option<&str> {
    let (_, rest) = detail.split_once("missing field `")?;
    let (field, _) = rest.split_once('`')?;
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_name() {
        assert_eq!(
            missing_field("Failed to deserialize the JSON body into the target type: missing field `password` at line 1 column 17"),
            Some("password")
        );
        assert_eq!(missing_field("invalid type: integer, expected a string"), None);
        assert_eq!(missing_field("missing field `unterminated"), None);
    }
}
