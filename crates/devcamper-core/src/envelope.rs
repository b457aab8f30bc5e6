//! The `{success, count, pagination, data}` body returned by list endpoints.

use serde::Serialize;

use crate::pagination::PaginationMeta;

/// A page of records plus its pagination metadata.
///
/// `count` is always the number of records in `data`; callers cannot set it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope<T> {
    success: bool,
    count: usize,
    pagination: PaginationMeta,
    data: Vec<T>,
}

impl<T> ResultEnvelope<T> {
    pub fn build(records: Vec<T>, pagination: PaginationMeta) -> Self {
        Self {
            success: true,
            count: records.len(),
            pagination,
            data: records,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn pagination(&self) -> &PaginationMeta {
        &self.pagination
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::paginate;
    use serde_json::json;

    #[test]
    fn test_count_is_derived_from_records() {
        let meta = paginate(3, 1, 25).unwrap();
        let envelope = ResultEnvelope::build(vec!["a", "b", "c"], meta);
        assert_eq!(envelope.count(), 3);
        assert!(envelope.success());
    }

    #[test]
    fn test_serialized_keys() {
        let meta = paginate(25, 3, 10).unwrap();
        let envelope = ResultEnvelope::build(vec![json!({"name": "Devworks"})], meta);

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "success": true,
                "count": 1,
                "pagination": {"prev": {"page": 2, "limit": 10}},
                "data": [{"name": "Devworks"}]
            })
        );
    }

    #[test]
    fn test_empty_page() {
        let meta = paginate(0, 1, 25).unwrap();
        let envelope: ResultEnvelope<serde_json::Value> = ResultEnvelope::build(Vec::new(), meta);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["count"], 0);
        assert_eq!(value["pagination"], json!({}));
        assert_eq!(value["data"], json!([]));
    }
}
