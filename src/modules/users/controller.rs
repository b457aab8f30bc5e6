use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use devcamper_core::query::RawParams;
use devcamper_core::{AppError, ResultEnvelope};
use serde_json::{Map, Value};
use tracing::instrument;

use super::model::{CreateUserDto, UpdateUserDto, User};
use super::service::UserService;
use crate::state::AppState;
use crate::utils::response::{DataResponse, ErrorResponse, PaginatedResponse, deleted};
use crate::validator::ValidatedJson;

/// List users (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ("select" = Option<String>, Query, description = "Comma-separated fields to return"),
        ("sort" = Option<String>, Query, description = "Comma-separated sort fields, `-` for descending"),
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Paginated users", body = PaginatedResponse),
        (status = 400, description = "Malformed query", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, params))]
pub async fn get_users(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ResultEnvelope<Value>>, AppError> {
    let raw = RawParams::from_pairs(params);
    let body = UserService::list_users(state.store.as_ref(), &raw, state.list_options()).await?;
    Ok(Json(body))
}

/// Get a single user (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = DataResponse<User>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user = UserService::get_user(state.store.as_ref(), &id).await?;
    Ok(Json(DataResponse::new(user)))
}

/// Create a user (admin)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = DataResponse<User>),
        (status = 400, description = "Duplicate email", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<DataResponse<User>>), AppError> {
    let user = UserService::create_user(state.store.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// Update a user (admin)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "Updated user", body = DataResponse<User>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user = UserService::update_user(state.store.as_ref(), &id, dto).await?;
    Ok(Json(DataResponse::new(user)))
}

/// Delete a user (admin)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Map<String, Value>>>, AppError> {
    UserService::delete_user(state.store.as_ref(), &id).await?;
    Ok(Json(deleted()))
}
