//! Session token claims.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by a session token.
///
/// Only the subject is embedded. Role and profile data are read from the
/// user record on every request so changes take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionClaims {
    /// User ID (subject claim)
    pub sub: String,
    /// Token issued-at timestamp (Unix seconds)
    pub iat: i64,
    /// Token expiration timestamp (Unix seconds)
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize() {
        let claims = SessionClaims {
            sub: "5d7a514b5d2c12c7449be042".to_string(),
            iat: 1_700_000_000,
            exp: 1_702_592_000,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert_eq!(
            serialized,
            r#"{"sub":"5d7a514b5d2c12c7449be042","iat":1700000000,"exp":1702592000}"#
        );
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"user-456","iat":9999999900,"exp":9999999999}"#;
        let claims: SessionClaims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user-456");
        assert_eq!(claims.exp, 9999999999);
    }
}
