use anyhow::anyhow;
use devcamper_core::query::{CompileOptions, Filter, RawParams};
use devcamper_core::{AppError, ResultEnvelope};
use devcamper_db::{Collection, DocumentStore, FindQuery, Update, advanced_results, expand};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::model::{CreateReviewDto, NewReview, Review, UpdateReviewDto, average_rating};
use crate::metrics::track_resource_created;
use crate::middleware::auth::AuthUser;
use crate::modules::bootcamps::model::{Bootcamp, bootcamp_summary};
use crate::utils::documents::{from_document, parse_resource_id, to_document};

pub struct ReviewService;

impl ReviewService {
    fn not_found(id: &str) -> AppError {
        AppError::not_found(anyhow!("No review found with the id of {id}"))
    }

    #[instrument(skip(store, raw, options), fields(db.operation = "list_reviews"))]
    pub async fn list_reviews(
        store: &dyn DocumentStore,
        raw: &RawParams,
        options: CompileOptions,
    ) -> Result<ResultEnvelope<Value>, AppError> {
        let options = options.with_expand(bootcamp_summary());
        advanced_results(store, Collection::Reviews, raw, &options).await
    }

    #[instrument(skip(store), fields(db.operation = "bootcamp_reviews"))]
    pub async fn bootcamp_reviews(
        store: &dyn DocumentStore,
        bootcamp_id: &str,
    ) -> Result<Vec<Review>, AppError> {
        let bootcamp_id = parse_resource_id(bootcamp_id)?;
        let query = FindQuery::new(Filter::new().eq("bootcamp", bootcamp_id));
        store
            .find(Collection::Reviews, &query)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    #[instrument(skip(store), fields(db.operation = "get_review"))]
    pub async fn get_review(store: &dyn DocumentStore, id: &str) -> Result<Review, AppError> {
        let id = parse_resource_id(id)?;
        let document = store
            .find_by_id(Collection::Reviews, id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        let mut documents = [document];
        expand(store, &bootcamp_summary(), &mut documents).await?;
        let [document] = documents;
        from_document(document)
    }

    /// Loads a review that `auth_user` wrote, or any review for an admin.
    async fn get_authored_review(
        store: &dyn DocumentStore,
        id: &str,
        auth_user: &AuthUser,
    ) -> Result<Review, AppError> {
        let id = parse_resource_id(id)?;
        let review: Review = store
            .find_by_id(Collection::Reviews, id)
            .await?
            .ok_or_else(|| Self::not_found(id))
            .and_then(from_document)?;

        if !auth_user.can_modify(Some(&review.user)) {
            return Err(AppError::forbidden(format!(
                "User {} is not authorized to modify review {}",
                auth_user.id(),
                review.id
            )));
        }
        Ok(review)
    }

    /// One review per user per bootcamp.
    #[instrument(skip(store, auth_user, dto), fields(db.operation = "add_review", user.id = %auth_user.id()))]
    pub async fn add_review(
        store: &dyn DocumentStore,
        auth_user: &AuthUser,
        bootcamp_id: &str,
        dto: CreateReviewDto,
    ) -> Result<Review, AppError> {
        let bootcamp_id = parse_resource_id(bootcamp_id)?;
        let bootcamp: Bootcamp = store
            .find_by_id(Collection::Bootcamps, bootcamp_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("No bootcamp with the id of {bootcamp_id}")))
            .and_then(from_document)?;

        let existing = Filter::new()
            .eq("bootcamp", bootcamp.id.as_str())
            .eq("user", auth_user.id());
        if store.count(Collection::Reviews, &existing).await? > 0 {
            return Err(AppError::bad_request(anyhow!(
                "User {} has already reviewed bootcamp {}",
                auth_user.id(),
                bootcamp.id
            )));
        }

        let new_review = NewReview {
            title: dto.title,
            text: dto.text,
            rating: dto.rating,
            bootcamp: bootcamp.id.clone(),
            user: auth_user.id().to_string(),
        };
        let stored = store
            .insert(Collection::Reviews, to_document(&new_review)?)
            .await?;
        let review: Review = from_document(stored)?;

        Self::refresh_average_rating(store, &bootcamp.id).await?;
        track_resource_created("review");
        info!(review.id = %review.id, bootcamp.id = %bootcamp.id, "Review created");
        Ok(review)
    }

    #[instrument(skip(store, auth_user, dto), fields(db.operation = "update_review", user.id = %auth_user.id()))]
    pub async fn update_review(
        store: &dyn DocumentStore,
        auth_user: &AuthUser,
        id: &str,
        dto: UpdateReviewDto,
    ) -> Result<Review, AppError> {
        let review = Self::get_authored_review(store, id, auth_user).await?;

        let updated: Review = store
            .update_by_id(
                Collection::Reviews,
                &review.id,
                Update::default().merge(to_document(&dto)?),
            )
            .await?
            .ok_or_else(|| Self::not_found(&review.id))
            .and_then(from_document)?;

        if dto.rating.is_some()
            && let Some(bootcamp_id) = updated.bootcamp_id()
        {
            Self::refresh_average_rating(store, bootcamp_id).await?;
        }
        Ok(updated)
    }

    #[instrument(skip(store, auth_user), fields(db.operation = "delete_review", user.id = %auth_user.id()))]
    pub async fn delete_review(
        store: &dyn DocumentStore,
        auth_user: &AuthUser,
        id: &str,
    ) -> Result<(), AppError> {
        let review = Self::get_authored_review(store, id, auth_user).await?;
        store.delete_by_id(Collection::Reviews, &review.id).await?;

        if let Some(bootcamp_id) = review.bootcamp_id() {
            Self::refresh_average_rating(store, bootcamp_id).await?;
        }
        info!(review.id = %review.id, "Review deleted");
        Ok(())
    }

    /// Recomputes the bootcamp's `averageRating` from its reviews.
    pub async fn refresh_average_rating(
        store: &dyn DocumentStore,
        bootcamp_id: &str,
    ) -> Result<(), AppError> {
        let query = FindQuery::new(Filter::new().eq("bootcamp", bootcamp_id));
        let ratings: Vec<f64> = store
            .find(Collection::Reviews, &query)
            .await?
            .iter()
            .filter_map(|review| review.get("rating").and_then(Value::as_f64))
            .collect();

        let update = match average_rating(&ratings) {
            Some(rating) => Update::default().set("averageRating", rating),
            None => Update::default().unset("averageRating"),
        };
        store
            .update_by_id(Collection::Bootcamps, bootcamp_id, update)
            .await?;
        debug!(bootcamp.id = %bootcamp_id, reviews = ratings.len(), "Average rating refreshed");
        Ok(())
    }
}
