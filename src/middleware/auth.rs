use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use devcamper_auth::{AuthError, verify_session_token};
use devcamper_core::AppError;
use tracing::debug;

use crate::modules::users::model::{User, UserRole};
use crate::modules::users::service::UserService;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Extractor that verifies the session token and loads the user it names.
///
/// The token is read from `Authorization: Bearer <token>` first, then from
/// the `token` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::Admin
    }

    /// Admins may act on anything; everyone else only on what they own.
    pub fn can_modify(&self, owner_id: Option<&str>) -> bool {
        self.is_admin() || owner_id == Some(self.id())
    }
}

/// The raw session token carried by a request, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AuthError::InvalidToken)?;
        let subject = verify_session_token(&token, &state.jwt_config)?;

        // A user deleted after the token was issued is just an invalid token.
        let user = UserService::find_user(state.store.as_ref(), &subject)
            .await?
            .ok_or_else(|| {
                debug!(user.id = %subject, "Session subject no longer exists");
                AuthError::InvalidToken
            })?;

        Ok(AuthUser(user))
    }
}
