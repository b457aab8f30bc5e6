//! Request extractors and middleware for authentication and authorization.
//!
//! - [`auth`]: `AuthUser`, resolved from a bearer header or the `token` cookie
//! - [`role`]: role checks as router middleware or per-handler extractors
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//! use crate::middleware::role::RequirePublisher;
//!
//! async fn get_me(auth_user: AuthUser) -> impl IntoResponse { /* ... */ }
//!
//! async fn create_bootcamp(RequirePublisher(auth_user): RequirePublisher) -> impl IntoResponse {
//!     // only publishers and admins get here
//! }
//! ```

pub mod auth;
pub mod role;
