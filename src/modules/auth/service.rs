use chrono::Utc;
use devcamper_auth::{AuthError, issue_session_token};
use devcamper_config::JwtConfig;
use devcamper_core::AppError;
use devcamper_db::{Collection, DocumentStore, Update};
use tracing::{info, instrument};

use super::credentials;
use super::model::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdateDetailsRequest, UpdatePasswordRequest,
};
use crate::metrics::{track_login, track_password_reset, track_user_registered};
use crate::modules::users::model::{User, UserRole};
use crate::modules::users::service::UserService;
use crate::utils::documents::{from_document, str_field, to_document};
use crate::utils::mailer::Mailer;

pub struct AuthService;

impl AuthService {
    fn session_token(user: &User, jwt_config: &JwtConfig) -> Result<String, AppError> {
        Ok(issue_session_token(&user.id, jwt_config)?)
    }

    #[instrument(skip(store, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn register(
        store: &dyn DocumentStore,
        dto: RegisterRequest,
        jwt_config: &JwtConfig,
    ) -> Result<String, AppError> {
        let role = dto.role.unwrap_or_default();
        if role == UserRole::Admin {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Role admin cannot be registered"
            )));
        }

        let user = UserService::insert_user(store, &dto.name, &dto.email, &dto.password, role).await?;
        track_user_registered(role.as_str());
        info!(user.id = %user.id, user.role = %role, "User registered");

        Self::session_token(&user, jwt_config)
    }

    #[instrument(skip(store, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn login(
        store: &dyn DocumentStore,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<String, AppError> {
        let user = match credentials::authenticate(store, &dto.email, &dto.password).await {
            Ok(user) => user,
            Err(e) => {
                track_login(false);
                return Err(e);
            }
        };
        track_login(true);

        Self::session_token(&user, jwt_config)
    }

    #[instrument(skip(store, dto), fields(user.id = %user_id))]
    pub async fn update_details(
        store: &dyn DocumentStore,
        user_id: &str,
        mut dto: UpdateDetailsRequest,
    ) -> Result<User, AppError> {
        dto.email = dto.email.map(|e| e.to_lowercase());

        let update = Update::default().merge(to_document(&dto)?);
        let updated = store
            .update_by_id(Collection::Users, user_id, update)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        from_document(updated)
    }

    #[instrument(skip(store, dto, jwt_config), fields(user.id = %user_id))]
    pub async fn update_password(
        store: &dyn DocumentStore,
        user_id: &str,
        dto: UpdatePasswordRequest,
        jwt_config: &JwtConfig,
    ) -> Result<String, AppError> {
        let user = credentials::change_password(
            store,
            user_id,
            &dto.current_password,
            &dto.new_password,
        )
        .await?;

        Self::session_token(&user, jwt_config)
    }

    /// Mails a reset link when the address belongs to a user.
    ///
    /// Unknown addresses succeed silently, so the response does not reveal
    /// which emails are registered.
    #[instrument(skip(store, mailer, dto, reset_base_url))]
    pub async fn forgot_password(
        store: &dyn DocumentStore,
        mailer: &dyn Mailer,
        dto: ForgotPasswordRequest,
        reset_base_url: &str,
    ) -> Result<(), AppError> {
        let Some(document) = credentials::find_by_email(store, &dto.email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };

        let user_id = str_field(&document, "_id").unwrap_or_default().to_string();
        let email = str_field(&document, "email").unwrap_or(&dto.email).to_string();

        let result = credentials::start_password_reset(
            store,
            mailer,
            &user_id,
            &email,
            |raw| format!("{reset_base_url}/{raw}"),
            Utc::now(),
        )
        .await;

        match &result {
            Ok(()) => track_password_reset("requested"),
            Err(_) => track_password_reset("delivery_failed"),
        }
        result
    }

    #[instrument(skip(store, raw_token, dto, jwt_config))]
    pub async fn reset_password(
        store: &dyn DocumentStore,
        raw_token: &str,
        dto: ResetPasswordRequest,
        jwt_config: &JwtConfig,
    ) -> Result<String, AppError> {
        let user =
            credentials::consume_reset_token(store, raw_token, &dto.password, Utc::now()).await?;
        track_password_reset("completed");
        info!(user.id = %user.id, "Password reset completed");

        Self::session_token(&user, jwt_config)
    }
}
