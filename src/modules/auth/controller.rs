use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use devcamper_config::JwtConfig;
use devcamper_core::AppError;
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use super::model::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
    UpdateDetailsRequest, UpdatePasswordRequest,
};
use super::service::AuthService;
use crate::middleware::auth::{AuthUser, TOKEN_COOKIE};
use crate::modules::users::model::User;
use crate::state::AppState;
use crate::utils::response::{DataResponse, ErrorResponse};
use crate::validator::ValidatedJson;

/// Sets the `token` cookie alongside the JSON token body.
fn token_response(
    jar: CookieJar,
    token: String,
    jwt_config: &JwtConfig,
) -> (CookieJar, Json<TokenResponse>) {
    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(jwt_config.secure_cookies)
        .expires(OffsetDateTime::now_utc() + Duration::days(jwt_config.cookie_expire_days));

    (jar.add(cookie), Json(TokenResponse::new(token)))
}

/// `{scheme}://{host}/api/v1/auth/resetpassword`
fn reset_base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");

    format!("{scheme}://{host}/api/v1/auth/resetpassword")
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered; token also set as cookie", body = TokenResponse),
        (status = 400, description = "Duplicate email or admin role requested", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let token = AuthService::register(state.store.as_ref(), dto, &state.jwt_config).await?;
    Ok(token_response(jar, token, &state.jwt_config))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; token also set as cookie", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let token = AuthService::login(state.store.as_ref(), dto, &state.jwt_config).await?;
    Ok(token_response(jar, token, &state.jwt_config))
}

/// Log out by overwriting the `token` cookie
#[utoipa::path(
    get,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Cookie cleared")
    ),
    tag = "Authentication"
)]
#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<DataResponse<Map<String, Value>>>) {
    let cookie = Cookie::build((TOKEN_COOKIE, "none"))
        .path("/")
        .http_only(true)
        .expires(OffsetDateTime::now_utc() + Duration::seconds(10));

    (jar.add(cookie), Json(DataResponse::new(Map::new())))
}

/// Get the logged-in user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = DataResponse<User>),
        (status = 401, description = "Not authorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(auth_user), fields(user.id = %auth_user.id()))]
pub async fn get_me(auth_user: AuthUser) -> Json<DataResponse<User>> {
    Json(DataResponse::new(auth_user.0))
}

/// Update name and email of the logged-in user
#[utoipa::path(
    put,
    path = "/api/v1/auth/updatedetails",
    request_body = UpdateDetailsRequest,
    responses(
        (status = 200, description = "Updated user", body = DataResponse<User>),
        (status = 400, description = "Email already in use", body = ErrorResponse),
        (status = 401, description = "Not authorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn update_details(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateDetailsRequest>,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user = AuthService::update_details(state.store.as_ref(), auth_user.id(), dto).await?;
    Ok(Json(DataResponse::new(user)))
}

/// Change the password of the logged-in user
#[utoipa::path(
    put,
    path = "/api/v1/auth/updatepassword",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed; new token issued", body = TokenResponse),
        (status = 401, description = "Current password is incorrect", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn update_password(
    State(state): State<AppState>,
    jar: CookieJar,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdatePasswordRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let token =
        AuthService::update_password(state.store.as_ref(), auth_user.id(), dto, &state.jwt_config)
            .await?;
    Ok(token_response(jar, token, &state.jwt_config))
}

/// Email a password reset link
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgotpassword",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = DataResponse<String>),
        (status = 500, description = "Email could not be sent", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, headers, dto))]
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<DataResponse<String>>, AppError> {
    AuthService::forgot_password(
        state.store.as_ref(),
        state.mailer.as_ref(),
        dto,
        &reset_base_url(&headers),
    )
    .await?;
    Ok(Json(DataResponse::new("Email sent".to_string())))
}

/// Set a new password with a reset token
#[utoipa::path(
    put,
    path = "/api/v1/auth/resetpassword/{reset_token}",
    params(("reset_token" = String, Path, description = "Raw reset token from the email")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset; token also set as cookie", body = TokenResponse),
        (status = 400, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(reset_token): Path<String>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let token =
        AuthService::reset_password(state.store.as_ref(), &reset_token, dto, &state.jwt_config)
            .await?;
    Ok(token_response(jar, token, &state.jwt_config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_reset_base_url() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("api.devcamper.io"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(
            reset_base_url(&headers),
            "https://api.devcamper.io/api/v1/auth/resetpassword"
        );
        assert_eq!(
            reset_base_url(&HeaderMap::new()),
            "http://localhost/api/v1/auth/resetpassword"
        );
    }
}
