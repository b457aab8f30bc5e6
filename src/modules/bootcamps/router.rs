use axum::{Router, routing::get};

use super::controller::{
    create_bootcamp, delete_bootcamp, get_bootcamp, get_bootcamps, get_bootcamps_in_radius,
    update_bootcamp,
};
use crate::modules::courses::init_bootcamp_courses_router;
use crate::modules::reviews::init_bootcamp_reviews_router;
use crate::state::AppState;

pub fn init_bootcamps_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_bootcamps).post(create_bootcamp))
        .route("/radius/{zipcode}/{distance}", get(get_bootcamps_in_radius))
        .route(
            "/{id}",
            get(get_bootcamp).put(update_bootcamp).delete(delete_bootcamp),
        )
        .nest("/{id}/courses", init_bootcamp_courses_router())
        .nest("/{id}/reviews", init_bootcamp_reviews_router())
}
