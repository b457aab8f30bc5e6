use std::collections::HashMap;
use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use devcamper_core::query::{Filter, SortDirection, SortKey, compare_values, lookup};

use crate::collection::Collection;
use crate::error::StoreError;
use crate::store::{Document, DocumentStore, FindQuery, ID_FIELD, Update, prepare_insert};

/// An in-process store.
///
/// Documents keep their insertion order, which breaks ties between equal
/// sort keys. Every write runs under a single write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_documents(documents: &mut [&Document], sort: &[SortKey]) {
    documents.sort_by(|a, b| {
        for key in sort {
            let ordering = compare_values(lookup(a, &key.field), lookup(b, &key.field));
            let ordering = match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Finds a unique field of `candidate` already held by another document.
fn unique_conflict(
    collection: Collection,
    documents: &[Document],
    candidate: &Document,
) -> Option<String> {
    let candidate_id = candidate.get(ID_FIELD);

    collection
        .unique_fields()
        .iter()
        .find(|field| {
            let Some(value) = candidate.get(**field) else {
                return false;
            };
            documents
                .iter()
                .any(|other| other.get(ID_FIELD) != candidate_id && other.get(**field) == Some(value))
        })
        .map(|field| field.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(&collection)
            .map_or(0, |docs| docs.iter().filter(|d| filter.matches(d)).count());
        Ok(count as u64)
    }

    async fn find(
        &self,
        collection: Collection,
        query: &FindQuery,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = documents
            .iter()
            .filter(|d| query.filter.matches(d))
            .collect();
        sort_documents(&mut matched, &query.sort);

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<Document, StoreError> {
        let (id, document) = prepare_insert(document)?;

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();

        if documents
            .iter()
            .any(|d| d.get(ID_FIELD) == document.get(ID_FIELD))
        {
            return Err(StoreError::Duplicate {
                field: ID_FIELD.to_string(),
            });
        }
        if let Some(field) = unique_conflict(collection, documents, &document) {
            return Err(StoreError::Duplicate { field });
        }

        debug!(collection = %collection, document.id = %id, "Inserted document");
        documents.push(document.clone());
        Ok(document)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: Update,
    ) -> Result<Option<Document>, StoreError> {
        let update = update.sanitized();

        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(index) = documents.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };

        let mut updated = documents[index].clone();
        update.apply(&mut updated);

        if let Some(field) = unique_conflict(collection, documents, &updated) {
            return Err(StoreError::Duplicate { field });
        }

        documents[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(0);
        };

        let before = documents.len();
        documents.retain(|d| !filter.matches(d));
        Ok((before - documents.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcamper_core::query::{Comparison, FilterValue};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (name, cost) in [("Alpha", 9000), ("Bravo", 12000), ("Charlie", 8000), ("Delta", 12000)] {
            store
                .insert(
                    Collection::Bootcamps,
                    doc(json!({"name": name, "averageCost": cost, "careers": ["Business"]})),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_assigns_identity() {
        let store = MemoryStore::new();
        let inserted = store
            .insert(Collection::Users, doc(json!({"email": "a@b.io"})))
            .await
            .unwrap();
        let id = inserted[ID_FIELD].as_str().unwrap();

        let found = store.find_by_id(Collection::Users, id).await.unwrap();
        assert_eq!(found, Some(inserted));
    }

    #[tokio::test]
    async fn test_unique_fields_are_enforced() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, doc(json!({"email": "a@b.io"})))
            .await
            .unwrap();
        let result = store
            .insert(Collection::Users, doc(json!({"email": "a@b.io"})))
            .await;
        assert!(matches!(result, Err(StoreError::Duplicate { field }) if field == "email"));
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_windows() {
        let store = seeded().await;
        let query = FindQuery {
            filter: Filter::new().and("averageCost", Comparison::Gte(FilterValue::Integer(9000))),
            sort: vec![SortKey::desc("averageCost"), SortKey::asc("name")],
            skip: 1,
            limit: Some(2),
        };

        let names: Vec<String> = store
            .find(Collection::Bootcamps, &query)
            .await
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Delta", "Alpha"]);

        let total = store
            .count(Collection::Bootcamps, &query.filter)
            .await
            .unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_equal_sort_keys_keep_insertion_order() {
        let store = seeded().await;
        let query = FindQuery::new(Filter::new().eq("averageCost", 12000i64))
            .sort(vec![SortKey::desc("averageCost")]);
        let names: Vec<String> = store
            .find(Collection::Bootcamps, &query)
            .await
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Bravo", "Delta"]);
    }

    #[tokio::test]
    async fn test_update_one_sets_and_unsets() {
        let store = MemoryStore::new();
        let inserted = store
            .insert(
                Collection::Users,
                doc(json!({"email": "a@b.io", "resetPasswordToken": "h", "resetPasswordExpire": 1})),
            )
            .await
            .unwrap();

        let updated = store
            .update_one(
                Collection::Users,
                &Filter::new().eq("resetPasswordToken", "h"),
                Update::default()
                    .set("password", "new-hash")
                    .unset("resetPasswordToken")
                    .unset("resetPasswordExpire"),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated[ID_FIELD], inserted[ID_FIELD]);
        assert_eq!(updated["password"], "new-hash");
        assert!(!updated.contains_key("resetPasswordToken"));
        assert!(!updated.contains_key("resetPasswordExpire"));
    }

    #[tokio::test]
    async fn test_conditional_update_succeeds_once_under_contention() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(Collection::Users, doc(json!({"email": "a@b.io", "resetPasswordToken": "h"})))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update_one(
                        Collection::Users,
                        &Filter::new().eq("resetPasswordToken", "h"),
                        Update::default().unset("resetPasswordToken"),
                    )
                    .await
                    .unwrap()
                    .is_some()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_update_rejects_unique_conflict() {
        let store = seeded().await;
        let result = store
            .update_one(
                Collection::Bootcamps,
                &Filter::new().eq("name", "Alpha"),
                Update::default().set("name", "Bravo"),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_delete_many_and_by_id() {
        let store = seeded().await;
        let removed = store
            .delete_many(Collection::Bootcamps, &Filter::new().eq("averageCost", 12000i64))
            .await
            .unwrap();
        assert_eq!(removed, 2);

        assert!(!store
            .delete_by_id(Collection::Bootcamps, "not-a-uuid")
            .await
            .unwrap());
        assert_eq!(
            store.count(Collection::Bootcamps, &Filter::new()).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_malformed_id_finds_nothing() {
        let store = seeded().await;
        assert_eq!(
            store.find_by_id(Collection::Bootcamps, "123").await.unwrap(),
            None
        );
    }
}
