//! HS256 session tokens.
//!
//! A session token carries only the user id (`sub`), the issue time and the
//! expiry. Verification allows no clock leeway: a token is rejected from the
//! second after `exp`.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use devcamper_config::JwtConfig;

use crate::claims::SessionClaims;
use crate::error::AuthError;

/// Issues a session token for `subject`, valid for `JWT_EXPIRE` seconds.
///
/// # Errors
///
/// [`AuthError::SigningError`] if no signing secret is configured or encoding
/// fails.
pub fn issue_session_token(subject: &str, jwt_config: &JwtConfig) -> Result<String, AuthError> {
    issue_session_token_at(subject, jwt_config, Utc::now().timestamp())
}

/// Issues a session token as if the current time were `now` (Unix seconds).
pub fn issue_session_token_at(
    subject: &str,
    jwt_config: &JwtConfig,
    now: i64,
) -> Result<String, AuthError> {
    if jwt_config.secret.is_empty() {
        return Err(AuthError::SigningError);
    }

    let claims = SessionClaims {
        sub: subject.to_string(),
        iat: now,
        exp: now.saturating_add(jwt_config.expire_secs),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|_| AuthError::SigningError)
}

/// Verifies a session token and returns its subject.
///
/// # Errors
///
/// - [`AuthError::ExpiredToken`] once the token is past `exp`
/// - [`AuthError::InvalidToken`] for a bad signature, a malformed token or a
///   missing secret
pub fn verify_session_token(token: &str, jwt_config: &JwtConfig) -> Result<String, AuthError> {
    if jwt_config.secret.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims.sub)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            expire_secs: 3600,
            cookie_expire_days: 30,
            secure_cookies: false,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let config = get_test_jwt_config();
        let token = issue_session_token("user-123", &config).unwrap();
        assert!(!token.is_empty());
        assert_eq!(verify_session_token(&token, &config).unwrap(), "user-123");
    }

    #[test]
    fn test_expiry_is_issue_time_plus_configured_lifetime() {
        let config = get_test_jwt_config();
        let now = Utc::now().timestamp();
        let token = issue_session_token_at("user-123", &config, now).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(config.secret.as_bytes()),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp, now + 3600);
    }

    #[test]
    fn test_empty_secret_cannot_sign() {
        let config = JwtConfig {
            secret: String::new(),
            ..get_test_jwt_config()
        };
        assert_eq!(
            issue_session_token("user-123", &config),
            Err(AuthError::SigningError)
        );
    }

    #[test]
    fn test_expired_token() {
        let config = get_test_jwt_config();
        let issued = Utc::now().timestamp() - 7200;
        let token = issue_session_token_at("user-123", &config, issued).unwrap();
        assert_eq!(
            verify_session_token(&token, &config),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn test_malformed_token() {
        let config = get_test_jwt_config();
        assert_eq!(
            verify_session_token("invalid-token", &config),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let config = get_test_jwt_config();
        let token = issue_session_token("user-123", &config).unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            ..get_test_jwt_config()
        };
        assert_eq!(
            verify_session_token(&token, &wrong_config),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_tampered_payload() {
        let config = get_test_jwt_config();
        let token = issue_session_token("user-123", &config).unwrap();
        let other = issue_session_token("admin-999", &config).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(
            verify_session_token(&forged, &config),
            Err(AuthError::InvalidToken)
        );
    }
}
