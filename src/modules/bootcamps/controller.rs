use anyhow::anyhow;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use devcamper_core::query::RawParams;
use devcamper_core::{AppError, ResultEnvelope};
use serde_json::{Map, Value};
use tracing::instrument;

use super::model::{Bootcamp, CreateBootcampDto, UpdateBootcampDto};
use super::service::BootcampService;
use crate::middleware::role::RequirePublisher;
use crate::state::AppState;
use crate::utils::response::{
    DataResponse, ErrorResponse, ListResponse, PaginatedResponse, deleted,
};
use crate::validator::ValidatedJson;

/// List bootcamps with filtering, projection, sorting and pagination
///
/// Any non-reserved query key filters on that field; `field[gt|gte|lt|lte|in]`
/// compares. Each bootcamp carries its `courses`.
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps",
    params(
        ("select" = Option<String>, Query, description = "Comma-separated fields to return"),
        ("sort" = Option<String>, Query, description = "Comma-separated sort fields, `-` for descending"),
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Page size (default 25)")
    ),
    responses(
        (status = 200, description = "Paginated bootcamps", body = PaginatedResponse),
        (status = 400, description = "Malformed query", body = ErrorResponse)
    ),
    tag = "Bootcamps"
)]
#[instrument(skip(state, params))]
pub async fn get_bootcamps(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ResultEnvelope<Value>>, AppError> {
    let raw = RawParams::from_pairs(params);
    let body =
        BootcampService::list_bootcamps(state.store.as_ref(), &raw, state.list_options()).await?;
    Ok(Json(body))
}

/// Get a single bootcamp
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = String, Path, description = "Bootcamp id")),
    responses(
        (status = 200, description = "Bootcamp", body = DataResponse<Bootcamp>),
        (status = 404, description = "Bootcamp not found", body = ErrorResponse)
    ),
    tag = "Bootcamps"
)]
#[instrument(skip(state))]
pub async fn get_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Bootcamp>>, AppError> {
    let bootcamp = BootcampService::get_bootcamp(state.store.as_ref(), &id).await?;
    Ok(Json(DataResponse::new(bootcamp)))
}

/// Create a bootcamp
#[utoipa::path(
    post,
    path = "/api/v1/bootcamps",
    request_body = CreateBootcampDto,
    responses(
        (status = 201, description = "Bootcamp created", body = DataResponse<Bootcamp>),
        (status = 400, description = "Duplicate name or publisher already owns a bootcamp", body = ErrorResponse),
        (status = 403, description = "Role not allowed", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bootcamps"
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn create_bootcamp(
    State(state): State<AppState>,
    RequirePublisher(auth_user): RequirePublisher,
    ValidatedJson(dto): ValidatedJson<CreateBootcampDto>,
) -> Result<(StatusCode, Json<DataResponse<Bootcamp>>), AppError> {
    let bootcamp = BootcampService::create_bootcamp(
        state.store.as_ref(),
        state.geocoder.as_ref(),
        &auth_user,
        dto,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(bootcamp))))
}

/// Update a bootcamp (owner or admin)
#[utoipa::path(
    put,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = String, Path, description = "Bootcamp id")),
    request_body = UpdateBootcampDto,
    responses(
        (status = 200, description = "Updated bootcamp", body = DataResponse<Bootcamp>),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Bootcamp not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bootcamps"
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn update_bootcamp(
    State(state): State<AppState>,
    RequirePublisher(auth_user): RequirePublisher,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateBootcampDto>,
) -> Result<Json<DataResponse<Bootcamp>>, AppError> {
    let bootcamp = BootcampService::update_bootcamp(
        state.store.as_ref(),
        state.geocoder.as_ref(),
        &auth_user,
        &id,
        dto,
    )
    .await?;
    Ok(Json(DataResponse::new(bootcamp)))
}

/// Delete a bootcamp with its courses and reviews (owner or admin)
#[utoipa::path(
    delete,
    path = "/api/v1/bootcamps/{id}",
    params(("id" = String, Path, description = "Bootcamp id")),
    responses(
        (status = 200, description = "Bootcamp deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Bootcamp not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bootcamps"
)]
#[instrument(skip(state, auth_user), fields(user.id = %auth_user.id()))]
pub async fn delete_bootcamp(
    State(state): State<AppState>,
    RequirePublisher(auth_user): RequirePublisher,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Map<String, Value>>>, AppError> {
    BootcampService::delete_bootcamp(state.store.as_ref(), &auth_user, &id).await?;
    Ok(Json(deleted()))
}

/// Bootcamps within a radius of a zipcode
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/radius/{zipcode}/{distance}",
    params(
        ("zipcode" = String, Path, description = "Zipcode at the center"),
        ("distance" = f64, Path, description = "Radius in miles")
    ),
    responses(
        (status = 200, description = "Bootcamps in range", body = ListResponse<Bootcamp>),
        (status = 400, description = "Invalid distance", body = ErrorResponse),
        (status = 404, description = "Zipcode could not be located", body = ErrorResponse)
    ),
    tag = "Bootcamps"
)]
#[instrument(skip(state))]
pub async fn get_bootcamps_in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> Result<Json<ListResponse<Bootcamp>>, AppError> {
    let distance: f64 = distance
        .parse()
        .map_err(|_| AppError::bad_request(anyhow!("Distance must be a number of miles")))?;
    let bootcamps = BootcampService::bootcamps_in_radius(
        state.store.as_ref(),
        state.geocoder.as_ref(),
        &zipcode,
        distance,
    )
    .await?;
    Ok(Json(ListResponse::new(bootcamps)))
}
