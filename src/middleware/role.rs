//! Role-based authorization.
//!
//! Two forms of the same check:
//! 1. `require_roles` middleware, layered onto whole routers
//! 2. Extractors (`RequirePublisher`, `RequireReviewer`) for single handlers

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use devcamper_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::state::AppState;

/// Fails with 403 unless the user holds one of `allowed_roles`.
pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    if !allowed_roles.contains(&auth_user.role()) {
        return Err(AppError::forbidden(format!(
            "User role {} is not authorized to access this route",
            auth_user.role()
        )));
    }
    Ok(())
}

/// Middleware that authenticates the request and checks its role.
///
/// ```rust,ignore
/// let users = init_users_router()
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
/// ```
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    check_any_role(&auth_user, allowed_roles)?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &[UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Publishers and admins: bootcamp and course management.
#[derive(Debug, Clone)]
pub struct RequirePublisher(pub AuthUser);

impl FromRequestParts<AppState> for RequirePublisher {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_any_role(&auth_user, &[UserRole::Publisher, UserRole::Admin])?;
        Ok(RequirePublisher(auth_user))
    }
}

/// Regular users and admins: writing reviews.
#[derive(Debug, Clone)]
pub struct RequireReviewer(pub AuthUser);

impl FromRequestParts<AppState> for RequireReviewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_any_role(&auth_user, &[UserRole::User, UserRole::Admin])?;
        Ok(RequireReviewer(auth_user))
    }
}
