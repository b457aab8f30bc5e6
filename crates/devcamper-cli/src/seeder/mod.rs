//! Imports fixture data into a store and clears it again.

mod fixtures;

use std::path::PathBuf;
use std::time::Instant;

use devcamper::modules::bootcamps::model::DEFAULT_PHOTO;
use devcamper::modules::courses::service::CourseService;
use devcamper::modules::reviews::service::ReviewService;
use devcamper::modules::users::model::{User, UserRole};
use devcamper::modules::users::service::UserService;
use devcamper::utils::geocoder::Geocoder;
use devcamper::utils::slug::slugify;
use devcamper_auth::{AuthError, hash_password};
use devcamper_core::AppError;
use devcamper_core::query::Filter;
use devcamper_db::{Collection, Document, DocumentStore, StoreError};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

pub use fixtures::Fixtures;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid fixture: {0}")]
    InvalidFixture(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{}", .0.error)]
    App(AppError),
}

impl From<AppError> for SeedError {
    fn from(err: AppError) -> Self {
        SeedError::App(err)
    }
}

/// Documents written per collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub bootcamps: usize,
    pub courses: usize,
    pub reviews: usize,
}

/// Replaces each user's plain-text `password` with its bcrypt hash.
fn hash_user_passwords(users: Vec<Document>) -> Result<Vec<Document>, SeedError> {
    users
        .into_par_iter()
        .map(|mut user| {
            let password = user
                .get("password")
                .and_then(Value::as_str)
                .ok_or_else(|| SeedError::InvalidFixture("user without a password".to_string()))?;
            let hashed = hash_password(password)?;
            user.insert("password".to_string(), Value::String(hashed));

            if let Some(email) = user.get("email").and_then(Value::as_str) {
                let email = email.to_lowercase();
                user.insert("email".to_string(), Value::String(email));
            }
            Ok(user)
        })
        .collect()
}

/// Fills in what the API derives when a bootcamp is created: slug, photo
/// and, when the fixture has none, a geocoded location.
async fn prepare_bootcamp(geocoder: &dyn Geocoder, mut bootcamp: Document) -> Document {
    if !bootcamp.contains_key("slug")
        && let Some(name) = bootcamp.get("name").and_then(Value::as_str)
    {
        let slug = slugify(name);
        bootcamp.insert("slug".to_string(), Value::String(slug));
    }
    bootcamp
        .entry("photo")
        .or_insert_with(|| Value::String(DEFAULT_PHOTO.to_string()));

    if bootcamp.contains_key("location") {
        return bootcamp;
    }
    let Some(address) = bootcamp.get("address").and_then(Value::as_str) else {
        return bootcamp;
    };
    match geocoder.geocode(address).await {
        Ok(Some(location)) => match serde_json::to_value(location) {
            Ok(location) => {
                bootcamp.insert("location".to_string(), location);
                bootcamp.remove("address");
            }
            Err(e) => warn!(error = %e, "Could not serialize location"),
        },
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Geocoding failed; keeping address"),
    }
    bootcamp
}

async fn insert_all(
    store: &dyn DocumentStore,
    collection: Collection,
    documents: Vec<Document>,
) -> Result<usize, SeedError> {
    let count = documents.len();
    for document in documents {
        store.insert(collection, document).await?;
    }
    info!(collection = %collection, count, "Imported documents");
    Ok(count)
}

/// Imports fixtures in dependency order, then recomputes each bootcamp's
/// average cost and rating.
pub async fn import(
    store: &dyn DocumentStore,
    geocoder: &dyn Geocoder,
    fixtures: Fixtures,
) -> Result<SeedSummary, SeedError> {
    let start = Instant::now();

    let users = tokio::task::block_in_place(|| hash_user_passwords(fixtures.users))?;

    let mut bootcamps = Vec::with_capacity(fixtures.bootcamps.len());
    for bootcamp in fixtures.bootcamps {
        bootcamps.push(prepare_bootcamp(geocoder, bootcamp).await);
    }
    let bootcamp_ids: Vec<String> = bootcamps
        .iter()
        .filter_map(|b| b.get("_id").and_then(Value::as_str).map(str::to_string))
        .collect();

    let summary = SeedSummary {
        users: insert_all(store, Collection::Users, users).await?,
        bootcamps: insert_all(store, Collection::Bootcamps, bootcamps).await?,
        courses: insert_all(store, Collection::Courses, fixtures.courses).await?,
        reviews: insert_all(store, Collection::Reviews, fixtures.reviews).await?,
    };

    for bootcamp_id in &bootcamp_ids {
        CourseService::refresh_average_cost(store, bootcamp_id).await?;
        ReviewService::refresh_average_rating(store, bootcamp_id).await?;
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Seed import finished");
    Ok(summary)
}

/// Deletes every document in every collection.
pub async fn destroy(store: &dyn DocumentStore) -> Result<u64, SeedError> {
    let mut removed = 0;
    for collection in [
        Collection::Reviews,
        Collection::Courses,
        Collection::Bootcamps,
        Collection::Users,
    ] {
        let count = store.delete_many(collection, &Filter::new()).await?;
        info!(collection = %collection, count, "Deleted documents");
        removed += count;
    }
    Ok(removed)
}

/// Admins cannot register through the API; this is how the first one exists.
pub async fn create_admin(
    store: &dyn DocumentStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, SeedError> {
    if password.len() < 6 {
        return Err(SeedError::InvalidFixture(
            "password must be at least 6 characters".to_string(),
        ));
    }
    let user = UserService::insert_user(store, name, email, password, UserRole::Admin).await?;
    info!(user.id = %user.id, "Admin created");
    Ok(user)
}
