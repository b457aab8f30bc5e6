use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use devcamper_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

/// Joins every field error, ordered by field name so responses are stable.
fn format_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::bad_request(anyhow!("Missing 'Content-Type: application/json' header"))
        }
        JsonRejection::JsonDataError(err) => {
            let text = err.body_text();
            match text
                .split("missing field `")
                .nth(1)
                .and_then(|s| s.split('`').next())
            {
                Some(field) => AppError::bad_request(anyhow!("{field} is required")),
                None => AppError::bad_request(anyhow!("Invalid field type in request")),
            }
        }
        JsonRejection::JsonSyntaxError(_) => AppError::bad_request(anyhow!("Malformed JSON body")),
        _ => AppError::bad_request(anyhow!("Invalid request body")),
    }
}

/// JSON body extractor that runs `validator` checks.
///
/// Undecodable bodies are rejected with 400, failed validation with 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "Please add a name"))]
        name: String,
        #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
        rating: u8,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let ValidatedJson(payload) =
            ValidatedJson::<Payload>::from_request(json_request(r#"{"name":"a","rating":5}"#), &())
                .await
                .unwrap();
        assert_eq!(payload.name, "a");
    }

    #[tokio::test]
    async fn test_validation_errors_are_unprocessable() {
        let err =
            ValidatedJson::<Payload>::from_request(json_request(r#"{"name":"","rating":11}"#), &())
                .await
                .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.error.to_string(),
            "Please add a name, Rating must be between 1 and 10"
        );
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let err = ValidatedJson::<Payload>::from_request(json_request(r#"{"name":"a"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "rating is required");
    }

    #[tokio::test]
    async fn test_syntax_error_is_bad_request() {
        let err = ValidatedJson::<Payload>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
