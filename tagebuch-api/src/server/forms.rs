use crate::server::extract::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::{collections::BTreeMap, fmt::Display};

/// Field-level validation errors, keyed by form field name. Sent with a 422
/// so the client can re-render the form with the prior input preserved.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Display) {
        self.0.entry(field).or_default().push(message.to_string());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A 422 body for forms that have no surrounding view context.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct FormErrorBody {
    pub errors: FieldErrors,
}

/// Runs one field's validation, collecting the error message on failure.
pub fn validated<T, E: Display>(
    errors: &mut FieldErrors,
    field: &'static str,
    result: Result<T, E>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            errors.push(field, error);
            None
        }
    }
}

pub fn unprocessable<T: Serialize>(body: T) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use crate::server::forms::{FieldErrors, validated};
    use serde_json::json;

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.push("text", "A comment may not be empty");
        errors.push("text", "Second problem");
        errors.push("title", "A title is required");

        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({
                "text": ["A comment may not be empty", "Second problem"],
                "title": ["A title is required"],
            })
        );
    }

    #[test]
    fn validated_keeps_value_or_message() {
        let mut errors = FieldErrors::new();

        let ok: Option<u8> = validated(&mut errors, "a", Ok::<_, &str>(3));
        assert_eq!(ok, Some(3));
        assert!(errors.is_empty());

        let err: Option<u8> = validated(&mut errors, "b", Err::<u8, _>("broken"));
        assert_eq!(err, None);
        assert!(!errors.is_empty());
    }
}
