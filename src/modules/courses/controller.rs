use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use devcamper_core::query::RawParams;
use devcamper_core::{AppError, ResultEnvelope};
use serde_json::{Map, Value};
use tracing::instrument;

use super::model::{Course, CreateCourseDto, UpdateCourseDto};
use super::service::CourseService;
use crate::middleware::role::RequirePublisher;
use crate::state::AppState;
use crate::utils::response::{
    DataResponse, ErrorResponse, ListResponse, PaginatedResponse, deleted,
};
use crate::validator::ValidatedJson;

/// List courses with their bootcamp's name and description
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(
        ("select" = Option<String>, Query, description = "Comma-separated fields to return"),
        ("sort" = Option<String>, Query, description = "Comma-separated sort fields, `-` for descending"),
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Page size (default 25)")
    ),
    responses(
        (status = 200, description = "Paginated courses", body = PaginatedResponse),
        (status = 400, description = "Malformed query", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state, params))]
pub async fn get_courses(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ResultEnvelope<Value>>, AppError> {
    let raw = RawParams::from_pairs(params);
    let body = CourseService::list_courses(state.store.as_ref(), &raw, state.list_options()).await?;
    Ok(Json(body))
}

/// List the courses of one bootcamp
#[utoipa::path(
    get,
    path = "/api/v1/bootcamps/{id}/courses",
    params(("id" = String, Path, description = "Bootcamp id")),
    responses(
        (status = 200, description = "Courses of the bootcamp", body = ListResponse<Course>),
        (status = 404, description = "Malformed bootcamp id", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_bootcamp_courses(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
) -> Result<Json<ListResponse<Course>>, AppError> {
    let courses = CourseService::bootcamp_courses(state.store.as_ref(), &bootcamp_id).await?;
    Ok(Json(ListResponse::new(courses)))
}

/// Get a single course
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course with its bootcamp summary", body = DataResponse<Course>),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Course>>, AppError> {
    let course = CourseService::get_course(state.store.as_ref(), &id).await?;
    Ok(Json(DataResponse::new(course)))
}

/// Add a course to a bootcamp (bootcamp owner or admin)
#[utoipa::path(
    post,
    path = "/api/v1/bootcamps/{id}/courses",
    params(("id" = String, Path, description = "Bootcamp id")),
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = DataResponse<Course>),
        (status = 403, description = "Not the bootcamp owner", body = ErrorResponse),
        (status = 404, description = "Bootcamp not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn add_course(
    State(state): State<AppState>,
    RequirePublisher(auth_user): RequirePublisher,
    Path(bootcamp_id): Path<String>,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<DataResponse<Course>>), AppError> {
    let course =
        CourseService::add_course(state.store.as_ref(), &auth_user, &bootcamp_id, dto).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(course))))
}

/// Update a course (owner or admin)
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Updated course", body = DataResponse<Course>),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, auth_user, dto), fields(user.id = %auth_user.id()))]
pub async fn update_course(
    State(state): State<AppState>,
    RequirePublisher(auth_user): RequirePublisher,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<DataResponse<Course>>, AppError> {
    let course = CourseService::update_course(state.store.as_ref(), &auth_user, &id, dto).await?;
    Ok(Json(DataResponse::new(course)))
}

/// Delete a course (owner or admin)
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, auth_user), fields(user.id = %auth_user.id()))]
pub async fn delete_course(
    State(state): State<AppState>,
    RequirePublisher(auth_user): RequirePublisher,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Map<String, Value>>>, AppError> {
    CourseService::delete_course(state.store.as_ref(), &auth_user, &id).await?;
    Ok(Json(deleted()))
}
