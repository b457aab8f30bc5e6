//! # DevCamper Auth
//!
//! Credential primitives for the DevCamper API.
//!
//! - [`claims`]: session token claims
//! - [`jwt`]: issuing and verifying HS256 session tokens
//! - [`password`]: bcrypt hashing and verification
//! - [`reset`]: single-use password reset tokens
//! - [`error`]: the [`AuthError`] taxonomy and its HTTP mapping
//!
//! Session tokens are stateless: nothing here is persisted, and a token stays
//! valid until it expires. Reset tokens are handed out raw once and only their
//! SHA-256 digest is stored.
//!
//! # Example
//!
//! ```ignore
//! use devcamper_auth::{issue_session_token, verify_session_token};
//! use devcamper_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = issue_session_token(&user_id, &config)?;
//! let subject = verify_session_token(&token, &config)?;
//! ```

pub mod claims;
pub mod error;
pub mod jwt;
pub mod password;
pub mod reset;

pub use claims::SessionClaims;
pub use error::AuthError;
pub use jwt::{issue_session_token, issue_session_token_at, verify_session_token};
pub use password::{BCRYPT_COST, hash_password, verify_password};
pub use reset::{RESET_TOKEN_TTL_MINUTES, ResetToken, create_reset_token, hash_reset_token};
