//! Resolves related documents into fetched results.
//!
//! Expansion runs one extra `find` per request, not one per document.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use devcamper_core::query::{Comparison, Expand, Filter, FilterValue, Relation};

use crate::collection::Collection;
use crate::error::StoreError;
use crate::store::{Document, DocumentStore, FindQuery, ID_FIELD};

fn related_collection(expansion: &Expand) -> Result<Collection, StoreError> {
    Collection::from_name(&expansion.collection)
        .ok_or_else(|| StoreError::Backend(format!("unknown collection `{}`", expansion.collection)))
}

fn id_of(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// The id held by a top-level reference field.
fn reference_of<'a>(document: &'a Document, path: &str) -> Option<&'a str> {
    document.get(path).and_then(Value::as_str)
}

/// Replaces `expansion.path` in each document with the related document(s).
///
/// - [`Relation::Reference`]: `path` holds an id; it becomes the referenced
///   document, or `null` when that document no longer exists.
/// - [`Relation::Reverse`]: `path` becomes the array of documents whose
///   `foreign_field` holds this document's id.
pub async fn expand(
    store: &dyn DocumentStore,
    expansion: &Expand,
    documents: &mut [Document],
) -> Result<(), StoreError> {
    if documents.is_empty() {
        return Ok(());
    }
    let collection = related_collection(expansion)?;

    match &expansion.relation {
        Relation::Reference => {
            let ids: Vec<FilterValue> = documents
                .iter()
                .filter_map(|d| reference_of(d, &expansion.path))
                .map(|id| FilterValue::Text(id.to_string()))
                .collect();
            if ids.is_empty() {
                return Ok(());
            }

            let filter = Filter::new().and(ID_FIELD, Comparison::In(ids));
            let related: HashMap<String, Document> = store
                .find(collection, &FindQuery::new(filter))
                .await?
                .into_iter()
                .filter_map(|d| {
                    let id = id_of(&d)?.to_string();
                    Some((id, d))
                })
                .collect();

            debug!(collection = %collection, resolved = related.len(), "Expanded references");

            for document in documents.iter_mut() {
                let Some(id) = reference_of(document, &expansion.path) else {
                    continue;
                };
                let replacement = related
                    .get(id)
                    .map(|d| Value::Object(expansion.select.apply(d.clone())))
                    .unwrap_or(Value::Null);
                document.insert(expansion.path.clone(), replacement);
            }
        }
        Relation::Reverse { foreign_field } => {
            let ids: Vec<FilterValue> = documents
                .iter()
                .filter_map(id_of)
                .map(|id| FilterValue::Text(id.to_string()))
                .collect();

            let filter = Filter::new().and(foreign_field.clone(), Comparison::In(ids));
            let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
            for related in store.find(collection, &FindQuery::new(filter)).await? {
                if let Some(owner) = related.get(foreign_field).and_then(Value::as_str) {
                    grouped
                        .entry(owner.to_string())
                        .or_default()
                        .push(Value::Object(expansion.select.apply(related.clone())));
                }
            }

            debug!(collection = %collection, owners = grouped.len(), "Expanded reverse relation");

            for document in documents.iter_mut() {
                let children = id_of(document)
                    .and_then(|id| grouped.remove(id))
                    .unwrap_or_default();
                document.insert(expansion.path.clone(), Value::Array(children));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use devcamper_core::query::Projection;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn fixture() -> (MemoryStore, Document, Document) {
        let store = MemoryStore::new();
        let bootcamp = store
            .insert(
                Collection::Bootcamps,
                doc(json!({"name": "Devworks", "description": "Full stack", "averageCost": 10000})),
            )
            .await
            .unwrap();
        let other = store
            .insert(Collection::Bootcamps, doc(json!({"name": "ModernTech"})))
            .await
            .unwrap();
        for title in ["Front End", "Back End"] {
            store
                .insert(
                    Collection::Courses,
                    doc(json!({"title": title, "bootcamp": bootcamp[ID_FIELD]})),
                )
                .await
                .unwrap();
        }
        (store, bootcamp, other)
    }

    #[tokio::test]
    async fn test_reference_expansion_with_projection() {
        let (store, bootcamp, _) = fixture().await;
        let mut courses = store
            .find(Collection::Courses, &FindQuery::default())
            .await
            .unwrap();

        let expansion = Expand::reference("bootcamp", "bootcamps")
            .select(Projection::fields(["name", "description"]));
        expand(&store, &expansion, &mut courses).await.unwrap();

        for course in &courses {
            assert_eq!(
                course["bootcamp"],
                json!({"_id": bootcamp[ID_FIELD], "name": "Devworks", "description": "Full stack"})
            );
        }
    }

    #[tokio::test]
    async fn test_reverse_expansion_groups_children() {
        let (store, bootcamp, other) = fixture().await;
        let mut bootcamps = store
            .find(Collection::Bootcamps, &FindQuery::default())
            .await
            .unwrap();

        let expansion = Expand::reverse("courses", "courses", "bootcamp");
        expand(&store, &expansion, &mut bootcamps).await.unwrap();

        for b in &bootcamps {
            let expected = if b[ID_FIELD] == bootcamp[ID_FIELD] { 2 } else { 0 };
            assert_eq!(b["courses"].as_array().unwrap().len(), expected);
        }
        assert!(bootcamps.iter().any(|b| b[ID_FIELD] == other[ID_FIELD]));
    }

    #[tokio::test]
    async fn test_reference_paths_are_top_level() {
        let (store, bootcamp, _) = fixture().await;
        let nested = doc(json!({"meta": {"bootcamp": bootcamp[ID_FIELD]}}));
        let mut documents = vec![nested.clone()];

        expand(&store, &Expand::reference("meta.bootcamp", "bootcamps"), &mut documents)
            .await
            .unwrap();
        assert_eq!(documents[0], nested);

        let mut documents = vec![doc(json!({"meta.bootcamp": bootcamp[ID_FIELD]}))];
        expand(&store, &Expand::reference("meta.bootcamp", "bootcamps"), &mut documents)
            .await
            .unwrap();
        assert_eq!(documents[0]["meta.bootcamp"]["name"], "Devworks");
    }

    #[tokio::test]
    async fn test_dangling_reference_becomes_null() {
        let store = MemoryStore::new();
        let mut courses = vec![doc(json!({
            "_id": uuid::Uuid::new_v4().to_string(),
            "bootcamp": uuid::Uuid::new_v4().to_string()
        }))];
        expand(&store, &Expand::reference("bootcamp", "bootcamps"), &mut courses)
            .await
            .unwrap();
        assert_eq!(courses[0]["bootcamp"], Value::Null);
    }
}
