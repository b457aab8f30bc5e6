use chrono::{DateTime, Utc};
use devcamper_core::query::{Expand, Projection};
use devcamper_core::serde::rfc3339_millis;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::geocoder::GeoLocation;

pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

/// Replaces a `bootcamp` id with the bootcamp's name and description.
pub fn bootcamp_summary() -> Expand {
    Expand::reference("bootcamp", "bootcamps").select(Projection::fields(["name", "description"]))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum Career {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Mobile Development")]
    MobileDevelopment,
    #[serde(rename = "UI/UX")]
    UiUx,
    #[serde(rename = "Data Science")]
    DataScience,
    Business,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Kept only while the address could not be geocoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    pub careers: Vec<Career>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
    pub user: String,
    #[serde(with = "rfc3339_millis")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBootcampDto {
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description can not be more than 500 characters"
    ))]
    pub description: String,
    #[validate(url(message = "Please use a valid URL with HTTP or HTTPS"))]
    pub website: Option<String>,
    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: String,
    #[validate(length(min = 1, message = "Please add at least one career"))]
    pub careers: Vec<Career>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBootcampDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description can not be more than 500 characters"
    ))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Please use a valid URL with HTTP or HTTPS"))]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Please add at least one career"))]
    pub careers: Option<Vec<Career>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_assistance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_guarantee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_gi: Option<bool>,
}

/// The stored shape of a new bootcamp, before `_id` and `createdAt`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewBootcamp {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    pub careers: Vec<Career>,
    pub photo: String,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_career_names() {
        assert_eq!(serde_json::to_value(Career::UiUx).unwrap(), "UI/UX");
        let career: Career = serde_json::from_value(json!("Web Development")).unwrap();
        assert_eq!(career, Career::WebDevelopment);
        assert!(serde_json::from_value::<Career>(json!("Cooking")).is_err());
    }

    #[test]
    fn test_defaults_on_read() {
        let bootcamp: Bootcamp = serde_json::from_value(json!({
            "_id": "b1",
            "name": "Devworks Bootcamp",
            "slug": "devworks-bootcamp",
            "description": "d",
            "careers": ["Business"],
            "user": "u1",
            "createdAt": "2024-01-01T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(bootcamp.photo, DEFAULT_PHOTO);
        assert!(!bootcamp.accept_gi);

        let out = serde_json::to_value(&bootcamp).unwrap();
        assert!(out.get("averageCost").is_none());
    }

    #[test]
    fn test_create_dto_validation() {
        let dto: CreateBootcampDto = serde_json::from_value(json!({
            "name": "x".repeat(51),
            "description": "d",
            "address": "Boston MA",
            "careers": []
        }))
        .unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("careers"));
    }
}
