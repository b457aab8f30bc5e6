use anyhow::anyhow;
use devcamper_core::query::{CompileOptions, Expand, Filter, RawParams};
use devcamper_core::{AppError, ResultEnvelope};
use devcamper_db::{Collection, DocumentStore, FindQuery, Update, advanced_results};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::model::{Bootcamp, CreateBootcampDto, DEFAULT_PHOTO, NewBootcamp, UpdateBootcampDto};
use crate::metrics::track_resource_created;
use crate::middleware::auth::AuthUser;
use crate::utils::documents::{from_document, parse_resource_id, to_document};
use crate::utils::geocoder::{GeoLocation, Geocoder};
use crate::utils::slug::slugify;

pub struct BootcampService;

impl BootcampService {
    fn not_found(id: &str) -> AppError {
        AppError::not_found(anyhow!("Bootcamp not found with id of {id}"))
    }

    /// Geocoding failures leave the bootcamp without a location.
    async fn locate(geocoder: &dyn Geocoder, address: &str) -> Option<GeoLocation> {
        match geocoder.geocode(address).await {
            Ok(location) => location,
            Err(e) => {
                warn!(error = %e, "Geocoding failed; storing address without location");
                None
            }
        }
    }

    #[instrument(skip(store, raw, options), fields(db.operation = "list_bootcamps"))]
    pub async fn list_bootcamps(
        store: &dyn DocumentStore,
        raw: &RawParams,
        options: CompileOptions,
    ) -> Result<ResultEnvelope<Value>, AppError> {
        let options = options.with_expand(Expand::reverse("courses", "courses", "bootcamp"));
        advanced_results(store, Collection::Bootcamps, raw, &options).await
    }

    #[instrument(skip(store), fields(db.operation = "get_bootcamp"))]
    pub async fn get_bootcamp(store: &dyn DocumentStore, id: &str) -> Result<Bootcamp, AppError> {
        let id = parse_resource_id(id)?;
        let document = store
            .find_by_id(Collection::Bootcamps, id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        from_document(document)
    }

    /// Loads a bootcamp and checks that `auth_user` may change it.
    pub async fn get_owned_bootcamp(
        store: &dyn DocumentStore,
        id: &str,
        auth_user: &AuthUser,
    ) -> Result<Bootcamp, AppError> {
        let bootcamp = Self::get_bootcamp(store, id).await?;
        if !auth_user.can_modify(Some(&bootcamp.user)) {
            return Err(AppError::forbidden(format!(
                "User {} is not authorized to modify bootcamp {}",
                auth_user.id(),
                bootcamp.id
            )));
        }
        Ok(bootcamp)
    }

    /// Publishers own at most one bootcamp; admins are not limited.
    #[instrument(skip(store, geocoder, auth_user, dto), fields(db.operation = "create_bootcamp", user.id = %auth_user.id()))]
    pub async fn create_bootcamp(
        store: &dyn DocumentStore,
        geocoder: &dyn Geocoder,
        auth_user: &AuthUser,
        dto: CreateBootcampDto,
    ) -> Result<Bootcamp, AppError> {
        if !auth_user.is_admin() {
            let owned = Filter::new().eq("user", auth_user.id());
            if store.count(Collection::Bootcamps, &owned).await? > 0 {
                return Err(AppError::bad_request(anyhow!(
                    "The user with ID {} has already published a bootcamp",
                    auth_user.id()
                )));
            }
        }

        let location = Self::locate(geocoder, &dto.address).await;
        let address = location.is_none().then_some(dto.address);

        let new_bootcamp = NewBootcamp {
            slug: slugify(&dto.name),
            name: dto.name,
            description: dto.description,
            website: dto.website,
            phone: dto.phone,
            email: dto.email,
            address,
            location,
            careers: dto.careers,
            photo: DEFAULT_PHOTO.to_string(),
            housing: dto.housing.unwrap_or(false),
            job_assistance: dto.job_assistance.unwrap_or(false),
            job_guarantee: dto.job_guarantee.unwrap_or(false),
            accept_gi: dto.accept_gi.unwrap_or(false),
            user: auth_user.id().to_string(),
        };

        let stored = store
            .insert(Collection::Bootcamps, to_document(&new_bootcamp)?)
            .await?;
        let bootcamp: Bootcamp = from_document(stored)?;

        track_resource_created("bootcamp");
        info!(bootcamp.id = %bootcamp.id, "Bootcamp created");
        Ok(bootcamp)
    }

    #[instrument(skip(store, geocoder, auth_user, dto), fields(db.operation = "update_bootcamp", user.id = %auth_user.id()))]
    pub async fn update_bootcamp(
        store: &dyn DocumentStore,
        geocoder: &dyn Geocoder,
        auth_user: &AuthUser,
        id: &str,
        dto: UpdateBootcampDto,
    ) -> Result<Bootcamp, AppError> {
        let bootcamp = Self::get_owned_bootcamp(store, id, auth_user).await?;

        let mut update = Update::default().merge(to_document(&dto)?);
        if let Some(name) = &dto.name {
            update = update.set("slug", slugify(name));
        }
        if let Some(address) = &dto.address {
            update = match Self::locate(geocoder, address).await {
                Some(location) => update
                    .set("location", serde_json::to_value(location).map_err(AppError::internal)?)
                    .unset("address"),
                None => update.unset("location"),
            };
        }

        let updated = store
            .update_by_id(Collection::Bootcamps, &bootcamp.id, update)
            .await?
            .ok_or_else(|| Self::not_found(&bootcamp.id))?;
        from_document(updated)
    }

    /// Deletes the bootcamp with its courses and reviews.
    #[instrument(skip(store, auth_user), fields(db.operation = "delete_bootcamp", user.id = %auth_user.id()))]
    pub async fn delete_bootcamp(
        store: &dyn DocumentStore,
        auth_user: &AuthUser,
        id: &str,
    ) -> Result<(), AppError> {
        let bootcamp = Self::get_owned_bootcamp(store, id, auth_user).await?;

        let children = Filter::new().eq("bootcamp", bootcamp.id.as_str());
        let courses = store.delete_many(Collection::Courses, &children).await?;
        let reviews = store.delete_many(Collection::Reviews, &children).await?;
        store.delete_by_id(Collection::Bootcamps, &bootcamp.id).await?;

        info!(
            bootcamp.id = %bootcamp.id,
            courses_deleted = courses,
            reviews_deleted = reviews,
            "Bootcamp deleted"
        );
        Ok(())
    }

    /// Bootcamps within `distance` miles of the geocoded `zipcode`.
    #[instrument(skip(store, geocoder), fields(db.operation = "bootcamps_in_radius"))]
    pub async fn bootcamps_in_radius(
        store: &dyn DocumentStore,
        geocoder: &dyn Geocoder,
        zipcode: &str,
        distance: f64,
    ) -> Result<Vec<Bootcamp>, AppError> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(AppError::bad_request(anyhow!(
                "Distance must be a non-negative number of miles"
            )));
        }

        let center = geocoder
            .geocode(zipcode)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::not_found(anyhow!("Could not locate zipcode {zipcode}")))?;

        let documents = store
            .find(Collection::Bootcamps, &FindQuery::new(Filter::new()))
            .await?;

        let mut bootcamps = Vec::new();
        for document in documents {
            let bootcamp: Bootcamp = from_document(document)?;
            let within = bootcamp
                .location
                .as_ref()
                .is_some_and(|location| center.distance_miles(location) <= distance);
            if within {
                bootcamps.push(bootcamp);
            }
        }
        Ok(bootcamps)
    }
}
