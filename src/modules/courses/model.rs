use chrono::{DateTime, Utc};
use devcamper_core::serde::rfc3339_millis;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MinimumSkill {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub weeks: String,
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    #[serde(default)]
    pub scholarship_available: bool,
    /// The bootcamp id, or `{_id, name, description}` when expanded.
    #[schema(value_type = Object)]
    pub bootcamp: Value,
    pub user: String,
    #[serde(with = "rfc3339_millis")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// The bootcamp id, expanded or not.
    pub fn bootcamp_id(&self) -> Option<&str> {
        match &self.bootcamp {
            Value::String(id) => Some(id),
            Value::Object(summary) => summary.get("_id").and_then(Value::as_str),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseDto {
    #[validate(length(min = 1, message = "Please add a course title"))]
    pub title: String,
    #[validate(length(min = 1, message = "Please add a description"))]
    pub description: String,
    #[validate(length(min = 1, message = "Please add number of weeks"))]
    pub weeks: String,
    #[validate(range(min = 0.0, message = "Please add a tuition cost"))]
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    pub scholarship_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Please add a course title"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Please add a description"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Please add number of weeks"))]
    pub weeks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Please add a tuition cost"))]
    pub tuition: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_skill: Option<MinimumSkill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scholarship_available: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewCourse {
    pub title: String,
    pub description: String,
    pub weeks: String,
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    pub scholarship_available: bool,
    pub bootcamp: String,
    pub user: String,
}

/// Average tuition rounded up to the next multiple of ten.
pub fn average_cost(tuitions: &[f64]) -> Option<f64> {
    if tuitions.is_empty() {
        return None;
    }
    let average = tuitions.iter().sum::<f64>() / tuitions.len() as f64;
    Some((average / 10.0).ceil() * 10.0)
}
