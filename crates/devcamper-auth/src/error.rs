use devcamper_core::{AppError, StatusCode};

/// Failures of the credential operations.
///
/// Messages are deliberately generic: callers learn that authentication
/// failed, never which check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Not authorized to access this route")]
    InvalidToken,
    #[error("Not authorized to access this route")]
    ExpiredToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidOrExpiredToken,
    #[error("Failed to sign session token")]
    SigningError,
    #[error("Email could not be sent")]
    DeliveryFailed,
    #[error("Failed to process password")]
    Hashing,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::ExpiredToken | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            Self::SigningError | Self::DeliveryFailed | Self::Hashing => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::new(err.status(), err)
    }
}
