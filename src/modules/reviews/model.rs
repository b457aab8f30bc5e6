use chrono::{DateTime, Utc};
use devcamper_core::serde::rfc3339_millis;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub text: String,
    pub rating: u8,
    /// The bootcamp id, or `{_id, name, description}` when expanded.
    #[schema(value_type = Object)]
    pub bootcamp: Value,
    pub user: String,
    #[serde(with = "rfc3339_millis")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn bootcamp_id(&self) -> Option<&str> {
        match &self.bootcamp {
            Value::String(id) => Some(id),
            Value::Object(summary) => summary.get("_id").and_then(Value::as_str),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReviewDto {
    #[validate(length(min = 1, max = 100, message = "Please add a title for the review"))]
    pub title: String,
    #[validate(length(min = 1, message = "Please add some text"))]
    pub text: String,
    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Please add a title for the review"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Please add some text"))]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: Option<u8>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewReview {
    pub title: String,
    pub text: String,
    pub rating: u8,
    pub bootcamp: String,
    pub user: String,
}

pub fn average_rating(ratings: &[f64]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[8.0, 10.0, 3.0]), Some(7.0));
    }

    #[test]
    fn test_rating_bounds() {
        let dto: CreateReviewDto =
            serde_json::from_value(json!({"title": "Great", "text": "Learned a lot", "rating": 11}))
                .unwrap();
        assert!(dto.validate().is_err());

        let dto = CreateReviewDto { rating: 10, ..dto };
        assert!(dto.validate().is_ok());

        let update = UpdateReviewDto {
            rating: Some(0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_title_length_limit() {
        let dto = CreateReviewDto {
            title: "x".repeat(101),
            text: "t".to_string(),
            rating: 5,
        };
        assert!(dto.validate().is_err());
    }
}
