use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// `{success: true, data}` body of single-record endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body of a successful delete: `{success: true, data: {}}`.
pub fn deleted() -> DataResponse<Map<String, Value>> {
    DataResponse::new(Map::new())
}

/// `{success, count, data}` body of unpaginated lists.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// The `{success, count, pagination, data}` body of advanced-results lists,
/// for the API docs.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct PaginatedResponse {
    pub success: bool,
    pub count: usize,
    #[schema(value_type = Object)]
    pub pagination: Value,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_count_matches_data() {
        let body = serde_json::to_value(ListResponse::new(vec![1, 2, 3])).unwrap();
        assert_eq!(body, json!({"success": true, "count": 3, "data": [1, 2, 3]}));
    }

    #[test]
    fn test_deleted_body() {
        let body = serde_json::to_value(deleted()).unwrap();
        assert_eq!(body, json!({"success": true, "data": {}}));
    }
}
