use anyhow::anyhow;
use devcamper_core::query::{CompileOptions, Filter, RawParams};
use devcamper_core::{AppError, ResultEnvelope};
use devcamper_db::{Collection, DocumentStore, FindQuery, Update, advanced_results, expand};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::model::{Course, CreateCourseDto, NewCourse, UpdateCourseDto, average_cost};
use crate::metrics::track_resource_created;
use crate::middleware::auth::AuthUser;
use crate::modules::bootcamps::model::{Bootcamp, bootcamp_summary};
use crate::utils::documents::{from_document, parse_resource_id, to_document};

pub struct CourseService;

impl CourseService {
    fn not_found(id: &str) -> AppError {
        AppError::not_found(anyhow!("No course with the id of {id}"))
    }

    #[instrument(skip(store, raw, options), fields(db.operation = "list_courses"))]
    pub async fn list_courses(
        store: &dyn DocumentStore,
        raw: &RawParams,
        options: CompileOptions,
    ) -> Result<ResultEnvelope<Value>, AppError> {
        let options = options.with_expand(bootcamp_summary());
        advanced_results(store, Collection::Courses, raw, &options).await
    }

    /// Every course of one bootcamp, in insertion order.
    #[instrument(skip(store), fields(db.operation = "bootcamp_courses"))]
    pub async fn bootcamp_courses(
        store: &dyn DocumentStore,
        bootcamp_id: &str,
    ) -> Result<Vec<Course>, AppError> {
        let bootcamp_id = parse_resource_id(bootcamp_id)?;
        let query = FindQuery::new(Filter::new().eq("bootcamp", bootcamp_id));
        store
            .find(Collection::Courses, &query)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    #[instrument(skip(store), fields(db.operation = "get_course"))]
    pub async fn get_course(store: &dyn DocumentStore, id: &str) -> Result<Course, AppError> {
        let id = parse_resource_id(id)?;
        let document = store
            .find_by_id(Collection::Courses, id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        let mut documents = [document];
        expand(store, &bootcamp_summary(), &mut documents).await?;
        let [document] = documents;
        from_document(document)
    }

    async fn get_owned_course(
        store: &dyn DocumentStore,
        id: &str,
        auth_user: &AuthUser,
    ) -> Result<Course, AppError> {
        let id = parse_resource_id(id)?;
        let document = store
            .find_by_id(Collection::Courses, id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        let course: Course = from_document(document)?;

        if !auth_user.can_modify(Some(&course.user)) {
            return Err(AppError::forbidden(format!(
                "User {} is not authorized to modify course {}",
                auth_user.id(),
                course.id
            )));
        }
        Ok(course)
    }

    /// Only the bootcamp's owner (or an admin) adds courses to it.
    #[instrument(skip(store, auth_user, dto), fields(db.operation = "add_course", user.id = %auth_user.id()))]
    pub async fn add_course(
        store: &dyn DocumentStore,
        auth_user: &AuthUser,
        bootcamp_id: &str,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        let bootcamp_id = parse_resource_id(bootcamp_id)?;
        let bootcamp: Bootcamp = store
            .find_by_id(Collection::Bootcamps, bootcamp_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("No bootcamp with the id of {bootcamp_id}")))
            .and_then(from_document)?;

        if !auth_user.can_modify(Some(&bootcamp.user)) {
            return Err(AppError::forbidden(format!(
                "User {} is not authorized to add a course to bootcamp {}",
                auth_user.id(),
                bootcamp.id
            )));
        }

        let new_course = NewCourse {
            title: dto.title,
            description: dto.description,
            weeks: dto.weeks,
            tuition: dto.tuition,
            minimum_skill: dto.minimum_skill,
            scholarship_available: dto.scholarship_available.unwrap_or(false),
            bootcamp: bootcamp.id.clone(),
            user: auth_user.id().to_string(),
        };
        let stored = store
            .insert(Collection::Courses, to_document(&new_course)?)
            .await?;
        let course: Course = from_document(stored)?;

        Self::refresh_average_cost(store, &bootcamp.id).await?;
        track_resource_created("course");
        info!(course.id = %course.id, bootcamp.id = %bootcamp.id, "Course created");
        Ok(course)
    }

    #[instrument(skip(store, auth_user, dto), fields(db.operation = "update_course", user.id = %auth_user.id()))]
    pub async fn update_course(
        store: &dyn DocumentStore,
        auth_user: &AuthUser,
        id: &str,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let course = Self::get_owned_course(store, id, auth_user).await?;

        let updated = store
            .update_by_id(
                Collection::Courses,
                &course.id,
                Update::default().merge(to_document(&dto)?),
            )
            .await?
            .ok_or_else(|| Self::not_found(&course.id))?;
        let updated: Course = from_document(updated)?;

        if dto.tuition.is_some()
            && let Some(bootcamp_id) = updated.bootcamp_id()
        {
            Self::refresh_average_cost(store, bootcamp_id).await?;
        }
        Ok(updated)
    }

    #[instrument(skip(store, auth_user), fields(db.operation = "delete_course", user.id = %auth_user.id()))]
    pub async fn delete_course(
        store: &dyn DocumentStore,
        auth_user: &AuthUser,
        id: &str,
    ) -> Result<(), AppError> {
        let course = Self::get_owned_course(store, id, auth_user).await?;
        store.delete_by_id(Collection::Courses, &course.id).await?;

        if let Some(bootcamp_id) = course.bootcamp_id() {
            Self::refresh_average_cost(store, bootcamp_id).await?;
        }
        info!(course.id = %course.id, "Course deleted");
        Ok(())
    }

    /// Recomputes the bootcamp's `averageCost` from its courses' tuition.
    /// A bootcamp without courses has no average cost.
    pub async fn refresh_average_cost(
        store: &dyn DocumentStore,
        bootcamp_id: &str,
    ) -> Result<(), AppError> {
        let query = FindQuery::new(Filter::new().eq("bootcamp", bootcamp_id));
        let tuitions: Vec<f64> = store
            .find(Collection::Courses, &query)
            .await?
            .iter()
            .filter_map(|course| course.get("tuition").and_then(Value::as_f64))
            .collect();

        let update = match average_cost(&tuitions) {
            Some(cost) => Update::default().set("averageCost", cost),
            None => Update::default().unset("averageCost"),
        };
        store
            .update_by_id(Collection::Bootcamps, bootcamp_id, update)
            .await?;
        debug!(bootcamp.id = %bootcamp_id, courses = tuitions.len(), "Average cost refreshed");
        Ok(())
    }
}
