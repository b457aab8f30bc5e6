//! Store-backed credential operations.
//!
//! The primitives (bcrypt, HS256 tokens, reset token digests) live in
//! `devcamper_auth`; this module applies them to user documents. Every
//! failure that could reveal whether an account exists collapses into one
//! [`AuthError`] per operation.

use chrono::{DateTime, Utc};
use devcamper_auth::{
    AuthError, create_reset_token, hash_password, hash_reset_token, verify_password,
};
use devcamper_core::AppError;
use devcamper_core::query::{Comparison, Filter, FilterValue};
use devcamper_db::{Collection, Document, DocumentStore, Update};
use tracing::{instrument, warn};

use crate::modules::users::model::User;
use crate::utils::documents::{from_document, str_field};
use crate::utils::mailer::{Mailer, OutgoingEmail};

pub const PASSWORD_FIELD: &str = "password";
pub const RESET_TOKEN_FIELD: &str = "resetPasswordToken";
pub const RESET_EXPIRE_FIELD: &str = "resetPasswordExpire";

/// Loads the user with `email` together with its stored credential fields.
pub async fn find_by_email(
    store: &dyn DocumentStore,
    email: &str,
) -> Result<Option<Document>, AppError> {
    let filter = Filter::new().eq("email", email.to_lowercase());
    Ok(store.find_one(Collection::Users, &filter).await?)
}

/// Checks an email/password pair.
#[instrument(skip(store, password), fields(user.email = %email))]
pub async fn authenticate(
    store: &dyn DocumentStore,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let Some(document) = find_by_email(store, email).await? else {
        return Err(AuthError::InvalidCredentials.into());
    };

    let hash = str_field(&document, PASSWORD_FIELD).unwrap_or_default();
    if !verify_password(password, hash) {
        return Err(AuthError::InvalidCredentials.into());
    }

    from_document(document)
}

/// Replaces the password of `user_id` after checking the current one.
#[instrument(skip(store, current_password, new_password), fields(user.id = %user_id))]
pub async fn change_password(
    store: &dyn DocumentStore,
    user_id: &str,
    current_password: &str,
    new_password: &str,
) -> Result<User, AppError> {
    let document = store
        .find_by_id(Collection::Users, user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    let hash = str_field(&document, PASSWORD_FIELD).unwrap_or_default();
    if !verify_password(current_password, hash) {
        return Err(AppError::unauthorized("Password is incorrect".to_string()));
    }

    let update = Update::default().set(PASSWORD_FIELD, hash_password(new_password)?);
    let updated = store
        .update_by_id(Collection::Users, user_id, update)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    from_document(updated)
}

/// Issues a reset token for `user_id` and delivers the link built by
/// `reset_url` over `mailer`.
///
/// Only the digest and expiry are stored. When delivery fails both fields
/// are removed again so no live token exists that the user never received.
#[instrument(skip(store, mailer, reset_url), fields(user.id = %user_id))]
pub async fn start_password_reset(
    store: &dyn DocumentStore,
    mailer: &dyn Mailer,
    user_id: &str,
    email: &str,
    reset_url: impl Fn(&str) -> String,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let token = create_reset_token(now);

    let update = Update::default()
        .set(RESET_TOKEN_FIELD, token.hash.clone())
        .set(RESET_EXPIRE_FIELD, token.expires_at_ms);
    store
        .update_by_id(Collection::Users, user_id, update)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    let message = OutgoingEmail {
        to: email.to_string(),
        subject: "Password reset token".to_string(),
        text: format!(
            "You are receiving this email because you (or someone else) has requested \
             the reset of a password. Please make a PUT request to:\n\n{}",
            reset_url(&token.raw)
        ),
    };

    if let Err(e) = mailer.send(message).await {
        warn!(error = %e, "Reset email delivery failed; clearing reset token");

        let rollback = Update::default()
            .unset(RESET_TOKEN_FIELD)
            .unset(RESET_EXPIRE_FIELD);
        store
            .update_by_id(Collection::Users, user_id, rollback)
            .await?;

        return Err(AuthError::DeliveryFailed.into());
    }

    Ok(())
}

/// Redeems a raw reset token and sets `new_password`.
///
/// The token is matched by digest and must expire after `now`. Matching,
/// setting the password and clearing both reset fields happen in one
/// conditional update, so a token can be redeemed at most once.
#[instrument(skip(store, raw_token, new_password))]
pub async fn consume_reset_token(
    store: &dyn DocumentStore,
    raw_token: &str,
    new_password: &str,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    let filter = Filter::new()
        .eq(RESET_TOKEN_FIELD, hash_reset_token(raw_token))
        .and(
            RESET_EXPIRE_FIELD,
            Comparison::Gt(FilterValue::Integer(now.timestamp_millis())),
        );

    let update = Update::default()
        .set(PASSWORD_FIELD, hash_password(new_password)?)
        .unset(RESET_TOKEN_FIELD)
        .unset(RESET_EXPIRE_FIELD);

    let updated = store
        .update_one(Collection::Users, &filter, update)
        .await?
        .ok_or(AuthError::InvalidOrExpiredToken)?;

    from_document(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use devcamper_auth::RESET_TOKEN_TTL_MINUTES;
    use devcamper_core::StatusCode;
    use devcamper_db::MemoryStore;
    use std::sync::Mutex;

    use crate::modules::users::model::UserRole;
    use crate::modules::users::service::UserService;
    use crate::utils::mailer::MailError;

    #[derive(Default)]
    struct CapturingMailer {
        fail: bool,
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for CapturingMailer {
        async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Transport("connection refused".to_string()));
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    impl CapturingMailer {
        fn raw_token(&self) -> String {
            let sent = self.sent.lock().unwrap();
            let text = &sent.last().unwrap().text;
            text.rsplit('/').next().unwrap().to_string()
        }
    }

    async fn store_with_user() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = UserService::insert_user(&store, "Jane", "jane@gmail.com", "123456", UserRole::User)
            .await
            .unwrap();
        (store, user)
    }

    fn reset_url(raw: &str) -> String {
        format!("http://localhost/api/v1/auth/resetpassword/{raw}")
    }

    #[tokio::test]
    async fn test_authenticate_collapses_failures() {
        let (store, user) = store_with_user().await;

        let ok = authenticate(&store, "JANE@gmail.com", "123456").await.unwrap();
        assert_eq!(ok.id, user.id);

        let wrong_password = authenticate(&store, "jane@gmail.com", "nope").await.unwrap_err();
        let unknown = authenticate(&store, "who@gmail.com", "123456").await.unwrap_err();
        assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.error.to_string(), unknown.error.to_string());
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use() {
        let (store, user) = store_with_user().await;
        let mailer = CapturingMailer::default();
        let now = Utc::now();

        start_password_reset(&store, &mailer, &user.id, &user.email, reset_url, now)
            .await
            .unwrap();
        let raw = mailer.raw_token();

        let stored = store.find_by_id(Collection::Users, &user.id).await.unwrap().unwrap();
        assert_ne!(str_field(&stored, RESET_TOKEN_FIELD), Some(raw.as_str()));

        consume_reset_token(&store, &raw, "new-password", now).await.unwrap();
        assert!(authenticate(&store, "jane@gmail.com", "new-password").await.is_ok());

        let stored = store.find_by_id(Collection::Users, &user.id).await.unwrap().unwrap();
        assert!(!stored.contains_key(RESET_TOKEN_FIELD));
        assert!(!stored.contains_key(RESET_EXPIRE_FIELD));

        let second = consume_reset_token(&store, &raw, "other-password", now)
            .await
            .unwrap_err();
        assert_eq!(second.status, StatusCode::BAD_REQUEST);
        assert_eq!(second.error.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn test_reset_token_expiry_boundary() {
        let ttl = Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        let issued = Utc::now();
        let expiry = issued + ttl;

        for (now, succeeds) in [
            (expiry - Duration::milliseconds(1), true),
            (expiry + Duration::milliseconds(1), false),
        ] {
            let (store, user) = store_with_user().await;
            let mailer = CapturingMailer::default();
            start_password_reset(&store, &mailer, &user.id, &user.email, reset_url, issued)
                .await
                .unwrap();

            let result = consume_reset_token(&store, &mailer.raw_token(), "new-password", now).await;
            assert_eq!(result.is_ok(), succeeds);
        }
    }

    #[tokio::test]
    async fn test_failed_delivery_rolls_back_token() {
        let (store, user) = store_with_user().await;
        let mailer = CapturingMailer {
            fail: true,
            ..Default::default()
        };

        let err = start_password_reset(&store, &mailer, &user.id, &user.email, reset_url, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error.to_string(), "Email could not be sent");

        let stored = store.find_by_id(Collection::Users, &user.id).await.unwrap().unwrap();
        assert!(!stored.contains_key(RESET_TOKEN_FIELD));
        assert!(!stored.contains_key(RESET_EXPIRE_FIELD));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let (store, user) = store_with_user().await;

        let err = change_password(&store, &user.id, "wrong", "abcdef").await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        change_password(&store, &user.id, "123456", "abcdef").await.unwrap();
        assert!(authenticate(&store, "jane@gmail.com", "abcdef").await.is_ok());
    }
}
