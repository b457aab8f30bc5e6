use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use devcamper_core::query::RawParams;
use devcamper_core::{AppError, ResultEnvelope};
use serde_json::{Map, Value};
use tracing::instrument;

use super::model::{Review, CreateReviewDto, UpdateReviewDto};
use super::service::ReviewService;
use crate::middleware::role::RequireReviewer;
use crate::state::AppState;
use crate::utils::response::{
    DataResponse, ErrorResponse, ListResponse, PaginatedResponse, deleted,
};
use crate::validator::ValidatedJson;

/// List reviews with their bootcamp's name and description
#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    params(
        ("select" = Option<String>, Query, description = "Comma-separated fields to return"),
        ("sort" = Option<String>, Query, description = "Comma-separated sort fields, `-` for descending"),
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Page size (default 25)")
    ),
    responses(
        (status = 200, description = "Paginated reviews", body = PaginatedResponse),
        (status = 400, description = "Malformed query", body = ErrorResponse)
    ),
    tag = "Reviews"
)]
#[instrument(skip(state, params))]
pub async fn get_reviews(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ResultEnvelope<Value>>, AppError> {
    let raw = RawParams::from_pairs(params);
    let body = ReviewService::list_reviews(state.store.as_ref(), &raw, state.list_options()).await?;
    Ok(Json(body))
}

/// List the reviews of one bootcamp
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/{id}/reviews",
    params(("id" = String, Path, description = "Bootcamp id")),
    responses(
        (status = 200, description = "Reviews of the bootcamp", body = ListResponse<Review>),
        (status = 404, description = "Malformed bootcamp id", body = ErrorResponse)
    ),
    tag = "Reviews"
)]
#[instrument(skip(state))]
pub async fn get_bootcamp_reviews(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
) -> Result<Json<ListResponse<Review>>, AppError> {
    let reviews = ReviewService::bootcamp_reviews(state.store.as_ref(), &bootcamp_id).await?;
    Ok(Json(ListResponse::new(reviews)))
}

/// Get a single review
#[utoipa::path(
    get,
    path = "/api/v1/reviews/{id}",
    params(("id" = String, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review with its bootcamp summary", body = DataResponse<Review>),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "Reviews"
)]
#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Review>>, AppError> {
    let review = ReviewService::get_review(state.store.as_ref(), &id).await?;
    Ok(Json(DataResponse::new(review)))
}

/// Review a bootcamp (users and admins, once per bootcamp)
#[utoipa::path(
    post,
    path = "/api/v1/bootcamps/{id}/reviews",
    params(("id" = String, Path, description = "Bootcamp id")),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = DataResponse<Review>),
        (status = 400, description = "Bootcamp already reviewed by this user", body = ErrorResponse),
        (status = 403, description = "Role not allowed", body = ErrorResponse),
        (status = 404, description = "Bootcamp not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn add_review(
    State(state): State<AppState>,
    RequireReviewer(auth_user): RequireReviewer,
    Path(bootcamp_id): Path<String>,
    ValidatedJson(dto): ValidatedJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<DataResponse<Review>>), AppError> {
    let review =
        ReviewService::add_review(state.store.as_ref(), &auth_user, &bootcamp_id, dto).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(review))))
}

/// Update a review (author or admin)
#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}",
    params(("id" = String, Path, description = "Review id")),
    request_body = UpdateReviewDto,
    responses(
        (status = 200, description = "Updated review", body = DataResponse<Review>),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn update_review(
    State(state): State<AppState>,
    RequireReviewer(auth_user): RequireReviewer,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateReviewDto>,
) -> Result<Json<DataResponse<Review>>, AppError> {
    let review = ReviewService::update_review(state.store.as_ref(), &auth_user, &id, dto).await?;
    Ok(Json(DataResponse::new(review)))
}

/// Delete a review (author or admin)
#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    params(("id" = String, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
#[instrument(skip(state, auth_user), fields(user.id = %auth_user.id()))]
pub async fn delete_review(
    State(state): State<AppState>,
    RequireReviewer(auth_user): RequireReviewer,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Map<String, Value>>>, AppError> {
    ReviewService::delete_review(state.store.as_ref(), &auth_user, &id).await?;
    Ok(Json(deleted()))
}
