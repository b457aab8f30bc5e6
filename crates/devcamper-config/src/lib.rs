//! # DevCamper Config
//!
//! Configuration types for the DevCamper API, loaded from environment
//! variables (a `.env` file is read by the binaries before any of these run).
//!
//! - [`jwt`]: session token signing and cookie settings
//! - [`cors`]: allowed origins
//! - [`email`]: SMTP settings for password reset mail
//! - [`query`]: list endpoint page sizes
//! - [`geocoder`]: address geocoding service
//! - [`server`]: bind address and store selection
//!
//! # Example
//!
//! ```ignore
//! use devcamper_config::{JwtConfig, QueryConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let query_config = QueryConfig::from_env();
//! ```

pub mod cors;
pub mod email;
pub mod geocoder;
pub mod jwt;
pub mod query;
pub mod server;

pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use geocoder::GeocoderConfig;
pub use jwt::JwtConfig;
pub use query::QueryConfig;
pub use server::{ServerConfig, StoreBackend};

use std::env;
use std::str::FromStr;

/// Reads and parses an environment variable, falling back when it is unset
/// or unparseable.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}
