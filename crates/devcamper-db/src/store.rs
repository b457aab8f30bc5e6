//! The store interface shared by every backend.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use devcamper_core::query::{Filter, FilterValue, QueryDescriptor, SortKey};
use devcamper_core::serde::rfc3339_millis;

use crate::collection::Collection;
use crate::error::StoreError;

pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Filter matching the document with `_id == id`.
pub fn id_filter(id: &str) -> Filter {
    Filter::new().eq(ID_FIELD, FilterValue::Text(id.to_string()))
}

/// A filtered, sorted, windowed read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }
}

impl From<&QueryDescriptor> for FindQuery {
    fn from(descriptor: &QueryDescriptor) -> Self {
        Self {
            filter: descriptor.filter.clone(),
            sort: descriptor.sort.clone(),
            skip: descriptor.skip,
            limit: Some(descriptor.limit),
        }
    }
}

/// Field-level changes applied in one atomic write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub set: Document,
    pub unset: Vec<String>,
}

impl Update {
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    pub fn merge(mut self, fields: Document) -> Self {
        self.set.extend(fields);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// `_id` and `createdAt` are immutable once stored.
    pub(crate) fn sanitized(mut self) -> Self {
        self.set.remove(ID_FIELD);
        self.set.remove(CREATED_AT_FIELD);
        self.unset
            .retain(|field| field != ID_FIELD && field != CREATED_AT_FIELD);
        self
    }

    pub(crate) fn apply(&self, document: &mut Document) {
        for (key, value) in &self.set {
            document.insert(key.clone(), value.clone());
        }
        for key in &self.unset {
            document.remove(key);
        }
    }
}

/// Assigns `_id` and `createdAt` to a new document when absent.
pub(crate) fn prepare_insert(mut document: Document) -> Result<(Uuid, Document), StoreError> {
    let id = match document.get(ID_FIELD) {
        Some(Value::String(raw)) => Uuid::parse_str(raw)
            .map_err(|_| StoreError::Serialization(format!("`{ID_FIELD}` must be a UUID")))?,
        Some(_) => {
            return Err(StoreError::Serialization(format!(
                "`{ID_FIELD}` must be a UUID string"
            )));
        }
        None => Uuid::new_v4(),
    };

    document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    document
        .entry(CREATED_AT_FIELD)
        .or_insert_with(|| Value::String(rfc3339_millis::format(&Utc::now())));

    Ok((id, document))
}

/// Ids are UUIDs; anything else cannot name a stored document.
pub(crate) fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

/// A collection-oriented document store.
///
/// Every write is atomic per document. `update_one` is a conditional
/// update: the match and the write happen as one step, so two concurrent
/// callers can never both update the same matching document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError>;

    async fn find(
        &self,
        collection: Collection,
        query: &FindQuery,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    async fn insert(&self, collection: Collection, document: Document)
    -> Result<Document, StoreError>;

    /// Applies `update` to the first document matching `filter` and returns
    /// it as stored after the write.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: Update,
    ) -> Result<Option<Document>, StoreError>;

    async fn delete_many(&self, collection: Collection, filter: &Filter)
    -> Result<u64, StoreError>;

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        if parse_id(id).is_none() {
            return Ok(None);
        }
        self.find_one(collection, &id_filter(id)).await
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        update: Update,
    ) -> Result<Option<Document>, StoreError> {
        if parse_id(id).is_none() {
            return Ok(None);
        }
        self.update_one(collection, &id_filter(id), update).await
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        if parse_id(id).is_none() {
            return Ok(false);
        }
        Ok(self.delete_many(collection, &id_filter(id)).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepare_insert_assigns_id_and_timestamp() {
        let (id, document) = prepare_insert(Map::new()).unwrap();
        assert_eq!(document[ID_FIELD], json!(id.to_string()));
        let created = document[CREATED_AT_FIELD].as_str().unwrap();
        assert!(created.ends_with('Z'));
        assert_eq!(created.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn test_prepare_insert_keeps_supplied_id() {
        let id = Uuid::new_v4();
        let document = json!({"_id": id.to_string(), "createdAt": "2020-01-01T00:00:00.000Z"});
        let (assigned, document) =
            prepare_insert(document.as_object().cloned().unwrap()).unwrap();
        assert_eq!(assigned, id);
        assert_eq!(document[CREATED_AT_FIELD], "2020-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_prepare_insert_rejects_bad_id() {
        let document = json!({"_id": "5d713995b721c3bb38c1f5d0"});
        let result = prepare_insert(document.as_object().cloned().unwrap());
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_update_cannot_touch_identity() {
        let update = Update::default()
            .set(ID_FIELD, "other")
            .set("name", "x")
            .unset(CREATED_AT_FIELD)
            .sanitized();
        assert_eq!(update.set.len(), 1);
        assert!(update.unset.is_empty());
    }
}
