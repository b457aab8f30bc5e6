//! The list pipeline shared by every collection endpoint.

use serde_json::Value;
use tracing::{debug, instrument};

use devcamper_core::query::{CompileOptions, RawParams, compile};
use devcamper_core::{AppError, ResultEnvelope, paginate};

use crate::collection::Collection;
use crate::expand::expand;
use crate::store::{DocumentStore, FindQuery};

/// Compiles `raw`, runs the filtered count and the windowed fetch, resolves
/// the configured expansion and wraps the page in a [`ResultEnvelope`].
///
/// The pagination links are computed from the count of documents matching
/// the filter, not the size of the whole collection.
#[instrument(skip(store, raw, options), fields(db.collection = %collection))]
pub async fn advanced_results(
    store: &dyn DocumentStore,
    collection: Collection,
    raw: &RawParams,
    options: &CompileOptions,
) -> Result<ResultEnvelope<Value>, AppError> {
    let descriptor = compile(raw, options)?;

    debug!(
        filter = %descriptor.filter.to_json(),
        page = descriptor.page,
        limit = descriptor.limit,
        "Compiled list query"
    );

    let total = store.count(collection, &descriptor.filter).await?;
    let documents = store.find(collection, &FindQuery::from(&descriptor)).await?;

    let mut documents: Vec<_> = documents
        .into_iter()
        .map(|d| descriptor.shape(d))
        .collect();

    if let Some(expansion) = &descriptor.expand {
        expand(store, expansion, &mut documents).await?;
    }

    let meta = paginate(total, descriptor.page, descriptor.limit)?;

    debug!(total = total, returned = documents.len(), "List query complete");

    Ok(ResultEnvelope::build(
        documents.into_iter().map(Value::Object).collect(),
        meta,
    ))
}
