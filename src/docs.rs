use devcamper_core::{PageLink, PaginationMeta};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::model::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
    UpdateDetailsRequest, UpdatePasswordRequest,
};
use crate::modules::bootcamps::model::{Bootcamp, Career, CreateBootcampDto, UpdateBootcampDto};
use crate::modules::courses::model::{Course, CreateCourseDto, MinimumSkill, UpdateCourseDto};
use crate::modules::reviews::model::{CreateReviewDto, Review, UpdateReviewDto};
use crate::modules::users::model::{CreateUserDto, UpdateUserDto, User, UserRole};
use crate::utils::geocoder::GeoLocation;
use crate::utils::response::{ErrorResponse, PaginatedResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::get_me,
        crate::modules::auth::controller::update_details,
        crate::modules::auth::controller::update_password,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::bootcamps::controller::get_bootcamps,
        crate::modules::bootcamps::controller::get_bootcamp,
        crate::modules::bootcamps::controller::create_bootcamp,
        crate::modules::bootcamps::controller::update_bootcamp,
        crate::modules::bootcamps::controller::delete_bootcamp,
        crate::modules::bootcamps::controller::get_bootcamps_in_radius,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_bootcamp_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::add_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::reviews::controller::get_reviews,
        crate::modules::reviews::controller::get_bootcamp_reviews,
        crate::modules::reviews::controller::get_review,
        crate::modules::reviews::controller::add_review,
        crate::modules::reviews::controller::update_review,
        crate::modules::reviews::controller::delete_review,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
    ),
    components(
        schemas(
            User,
            UserRole,
            CreateUserDto,
            UpdateUserDto,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UpdateDetailsRequest,
            UpdatePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            Bootcamp,
            Career,
            GeoLocation,
            CreateBootcampDto,
            UpdateBootcampDto,
            Course,
            MinimumSkill,
            CreateCourseDto,
            UpdateCourseDto,
            Review,
            CreateReviewDto,
            UpdateReviewDto,
            PaginationMeta,
            PageLink,
            PaginatedResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, sessions and password reset"),
        (name = "Bootcamps", description = "Bootcamp directory"),
        (name = "Courses", description = "Courses offered by bootcamps"),
        (name = "Reviews", description = "Bootcamp reviews"),
        (name = "Users", description = "User administration (admin only)")
    ),
    info(
        title = "DevCamper API",
        version = "1.0.0",
        description = "Bootcamp directory API with filtering, pagination, cookie or bearer sessions and password reset by email.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
