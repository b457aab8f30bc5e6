//! Session token configuration.
//!
//! - `JWT_SECRET`: HS256 signing secret. Signing fails while it is empty.
//! - `JWT_EXPIRE`: token lifetime in seconds (default: 30 days)
//! - `JWT_COOKIE_EXPIRE`: `token` cookie lifetime in days (default: 30)
//! - `APP_ENV`: `production` marks the cookie `Secure`

use std::env;

use crate::env_or;

const THIRTY_DAYS_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub expire_secs: i64,
    pub cookie_expire_days: i64,
    pub secure_cookies: bool,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET").unwrap_or_default(),
            expire_secs: env_or("JWT_EXPIRE", THIRTY_DAYS_SECS),
            cookie_expire_days: env_or("JWT_COOKIE_EXPIRE", 30),
            secure_cookies: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        }
    }
}
