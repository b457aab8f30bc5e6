use devcamper_core::AppError;
use devcamper_db::Document;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

/// Reads a stored document into its typed model.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(document))
        .map_err(|e| AppError::internal(anyhow::anyhow!("stored document is malformed: {e}")))
}

/// Serializes a model or DTO into document fields. `None` fields are kept
/// as `null`, so callers skip them with `#[serde(skip_serializing_if)]`.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, AppError> {
    match serde_json::to_value(value).map_err(AppError::internal)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::internal_error(
            "value does not serialize to an object".to_string(),
        )),
    }
}

/// Rejects ids that cannot name any stored document with the generic 404.
pub fn parse_resource_id(id: &str) -> Result<&str, AppError> {
    Uuid::parse_str(id)
        .map(|_| id)
        .map_err(|_| AppError::resource_not_found())
}

/// Reads a top-level string field.
pub fn str_field<'a>(document: &'a Document, field: &str) -> Option<&'a str> {
    document.get(field).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        website: Option<String>,
    }

    #[test]
    fn test_document_conversions() {
        let document = to_document(&Sample {
            name: "x".to_string(),
            website: None,
        })
        .unwrap();
        assert_eq!(Value::Object(document.clone()), json!({"name": "x"}));
        assert_eq!(str_field(&document, "name"), Some("x"));

        let sample: Sample = from_document(document).unwrap();
        assert_eq!(sample.website, None);
    }

    #[test]
    fn test_parse_resource_id() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(parse_resource_id(&id).unwrap(), id);

        let err = parse_resource_id("5d725a1b7b292f5f8ceff788").unwrap_err();
        assert_eq!(err.status, devcamper_core::StatusCode::NOT_FOUND);
        assert_eq!(err.error.to_string(), "Resource not found");
    }

    #[test]
    fn test_malformed_document_is_internal_error() {
        let document = json!({"name": 1}).as_object().cloned().unwrap();
        let err = from_document::<Sample>(document).unwrap_err();
        assert!(err.status.is_server_error());
    }
}
