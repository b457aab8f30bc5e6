use anyhow::anyhow;
use devcamper_core::AppError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique field already holds this value.
    #[error("Duplicate field value entered")]
    Duplicate { field: String },
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("document serialization failure: {0}")]
    Serialization(String),
}

/// Unique index name to field, for the indexes created by the migrations.
const UNIQUE_INDEXES: [(&str, &str); 2] = [
    ("documents_users_email_key", "email"),
    ("documents_bootcamps_name_key", "name"),
];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            let field = db_err
                .constraint()
                .and_then(|c| UNIQUE_INDEXES.iter().find(|(name, _)| *name == c))
                .map_or("unknown", |(_, field)| *field);
            return StoreError::Duplicate {
                field: field.to_string(),
            };
        }
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { ref field } => {
                tracing::warn!(field = %field, "Duplicate key rejected");
                AppError::bad_request(err)
            }
            StoreError::Backend(_) | StoreError::Serialization(_) => {
                error!(error = %err, "Store operation failed");
                AppError::internal(anyhow!("Server Error"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcamper_core::StatusCode;

    #[test]
    fn test_duplicate_maps_to_bad_request() {
        let err: AppError = StoreError::Duplicate {
            field: "email".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "Duplicate field value entered");
    }

    #[test]
    fn test_backend_errors_are_not_leaked() {
        let err: AppError = StoreError::Backend("connection refused at 10.0.0.3".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error.to_string(), "Server Error");
    }
}
