use anyhow::anyhow;
use devcamper_auth::hash_password;
use devcamper_core::query::{CompileOptions, RawParams};
use devcamper_core::{AppError, ResultEnvelope};
use devcamper_db::{Collection, DocumentStore, Update, advanced_results};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::model::{CreateUserDto, HIDDEN_USER_FIELDS, UpdateUserDto, User, UserRole};
use crate::utils::documents::{from_document, parse_resource_id, to_document};

#[derive(Serialize)]
struct NewUser<'a> {
    name: &'a str,
    email: String,
    role: UserRole,
    password: String,
}

pub struct UserService;

impl UserService {
    fn not_found(id: &str) -> AppError {
        AppError::not_found(anyhow!("No user with the id of {id}"))
    }

    #[instrument(skip(store, raw, options), fields(db.operation = "list_users"))]
    pub async fn list_users(
        store: &dyn DocumentStore,
        raw: &RawParams,
        options: CompileOptions,
    ) -> Result<ResultEnvelope<Value>, AppError> {
        let options = options.with_hidden_fields(HIDDEN_USER_FIELDS);
        advanced_results(store, Collection::Users, raw, &options).await
    }

    /// Looks a user up by id; `None` when the id names no user.
    #[instrument(skip(store), fields(db.operation = "find_user"))]
    pub async fn find_user(store: &dyn DocumentStore, id: &str) -> Result<Option<User>, AppError> {
        store
            .find_by_id(Collection::Users, id)
            .await?
            .map(from_document)
            .transpose()
    }

    #[instrument(skip(store), fields(db.operation = "get_user"))]
    pub async fn get_user(store: &dyn DocumentStore, id: &str) -> Result<User, AppError> {
        let id = parse_resource_id(id)?;
        Self::find_user(store, id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Inserts a user with a freshly hashed password.
    #[instrument(skip(store, password), fields(db.operation = "insert_user", user.email = %email))]
    pub async fn insert_user(
        store: &dyn DocumentStore,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(password)?;

        let document = to_document(&NewUser {
            name,
            email: email.to_lowercase(),
            role,
            password: hashed_password,
        })?;

        let stored = store.insert(Collection::Users, document).await?;
        from_document(stored)
    }

    #[instrument(skip(store, dto), fields(db.operation = "create_user"))]
    pub async fn create_user(store: &dyn DocumentStore, dto: CreateUserDto) -> Result<User, AppError> {
        Self::insert_user(
            store,
            &dto.name,
            &dto.email,
            &dto.password,
            dto.role.unwrap_or_default(),
        )
        .await
    }

    #[instrument(skip(store, dto), fields(db.operation = "update_user"))]
    pub async fn update_user(
        store: &dyn DocumentStore,
        id: &str,
        mut dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let id = parse_resource_id(id)?;
        dto.email = dto.email.map(|e| e.to_lowercase());

        let update = Update::default().merge(to_document(&dto)?);
        let updated = store
            .update_by_id(Collection::Users, id, update)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        from_document(updated)
    }

    #[instrument(skip(store), fields(db.operation = "delete_user"))]
    pub async fn delete_user(store: &dyn DocumentStore, id: &str) -> Result<(), AppError> {
        let id = parse_resource_id(id)?;
        if !store.delete_by_id(Collection::Users, id).await? {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}
