//! PostgreSQL-backed document store.
//!
//! All collections share the `documents` table: one row per document with
//! the JSON body in a `jsonb` column. Filters are rendered with bound
//! parameters only; field paths are bound as `text[]` and operands as
//! `jsonb`, so no client input is ever spliced into SQL text.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, error, instrument};

use devcamper_core::query::{Clause, Comparison, Filter, FilterValue, SortDirection, SortKey};

use crate::collection::Collection;
use crate::error::StoreError;
use crate::store::{Document, DocumentStore, FindQuery, Update, parse_id, prepare_insert};

/// Connects to PostgreSQL.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, StoreError> {
    PgPool::connect(database_url).await.map_err(|e| {
        error!(error = %e, "Failed to connect to database");
        StoreError::from(e)
    })
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_db_pool(database_url).await?))
    }

    /// Applies the bundled migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn path_of(clause: &Clause) -> Vec<String> {
    clause.path().into_iter().map(str::to_string).collect()
}

fn push_path(qb: &mut QueryBuilder<'_, Postgres>, path: Vec<String>) {
    qb.push("(data #> ");
    qb.push_bind(path);
    qb.push("::text[])");
}

/// The field as text when it holds a `jsonb` string, NULL otherwise.
fn push_string(qb: &mut QueryBuilder<'_, Postgres>, path: Vec<String>) {
    qb.push("(CASE WHEN jsonb_typeof");
    push_path(qb, path.clone());
    qb.push(" = 'string' THEN data #>> ");
    qb.push_bind(path);
    qb.push("::text[] END)");
}

/// String bounds compare bytewise (`COLLATE "C"`), as the memory store does.
fn push_range(
    qb: &mut QueryBuilder<'_, Postgres>,
    path: Vec<String>,
    op: &str,
    bound: &FilterValue,
) {
    match bound {
        FilterValue::Integer(_) | FilterValue::Float { .. } => {
            qb.push("(jsonb_typeof");
            push_path(qb, path.clone());
            qb.push(" = ");
            qb.push_bind("number");
            qb.push(" AND ");
            push_path(qb, path);
            qb.push(format!(" {op} "));
            qb.push_bind(Json(bound.to_json()));
            qb.push(")");
        }
        FilterValue::Text(text) => {
            push_string(qb, path);
            qb.push(format!(" COLLATE \"C\" {op} "));
            qb.push_bind(text.clone());
        }
        FilterValue::Bool(_) => {
            qb.push("FALSE");
        }
    }
}

/// `field @> form` for any of `forms`.
fn push_contains_any(qb: &mut QueryBuilder<'_, Postgres>, path: Vec<String>, forms: Vec<Value>) {
    if let [form] = forms.as_slice() {
        push_path(qb, path);
        qb.push(" @> ");
        qb.push_bind(Json(form.clone()));
        return;
    }

    qb.push("EXISTS (SELECT 1 FROM jsonb_array_elements(");
    qb.push_bind(Json(Value::Array(forms)));
    qb.push(") AS member(value) WHERE ");
    push_path(qb, path);
    qb.push(" @> member.value)");
}

/// Renders one clause as a boolean SQL expression.
///
/// Equality uses `jsonb` containment, which also matches an array field
/// holding the value as an element. Numbers and booleans also match the
/// string they were written as. Range comparisons only hold between values
/// of the same `jsonb` type.
fn push_clause(qb: &mut QueryBuilder<'_, Postgres>, clause: &Clause) {
    let path = path_of(clause);

    match &clause.comparison {
        Comparison::Eq(value) => push_contains_any(qb, path, value.equality_forms()),
        Comparison::In(values) => {
            let forms = values.iter().flat_map(FilterValue::equality_forms).collect();
            push_contains_any(qb, path, forms);
        }
        Comparison::Gt(bound) => push_range(qb, path, ">", bound),
        Comparison::Gte(bound) => push_range(qb, path, ">=", bound),
        Comparison::Lt(bound) => push_range(qb, path, "<", bound),
        Comparison::Lte(bound) => push_range(qb, path, "<=", bound),
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, collection: Collection, filter: &Filter) {
    qb.push(" WHERE collection = ");
    qb.push_bind(collection.name());
    for clause in filter.clauses() {
        qb.push(" AND ");
        push_clause(qb, clause);
    }
}

/// Orders as `compare_values` does: missing values first, then strings
/// (bytewise), numbers, booleans, arrays and objects.
fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: &[SortKey]) {
    qb.push(" ORDER BY ");
    for key in sort {
        let path: Vec<String> = key.field.split('.').map(str::to_string).collect();
        let direction = match key.direction {
            SortDirection::Ascending => " ASC, ",
            SortDirection::Descending => " DESC, ",
        };

        qb.push("(CASE jsonb_typeof");
        push_path(qb, path.clone());
        qb.push(
            " WHEN 'string' THEN 1 WHEN 'number' THEN 2 WHEN 'boolean' THEN 3 \
             WHEN 'array' THEN 4 WHEN 'object' THEN 5 ELSE 0 END)",
        );
        qb.push(direction);
        push_string(qb, path.clone());
        qb.push(" COLLATE \"C\"");
        qb.push(direction);
        push_path(qb, path);
        qb.push(direction);
    }
    qb.push("seq ASC");
}

pub(crate) fn count_query(collection: Collection, filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) AS total FROM documents");
    push_where(&mut qb, collection, filter);
    qb
}

pub(crate) fn find_query(collection: Collection, query: &FindQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT data FROM documents");
    push_where(&mut qb, collection, &query.filter);
    push_order(&mut qb, &query.sort);

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if query.skip > 0 {
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(query.skip).unwrap_or(i64::MAX));
    }
    qb
}

/// Locks the first matching row and rewrites it in one statement.
pub(crate) fn update_query(
    collection: Collection,
    filter: &Filter,
    update: Update,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE documents SET data = (data || ");
    qb.push_bind(Json(Value::Object(update.set)));
    qb.push(") - ");
    qb.push_bind(update.unset);
    qb.push("::text[] WHERE id = (SELECT id FROM documents");
    push_where(&mut qb, collection, filter);
    qb.push(" ORDER BY seq ASC LIMIT 1 FOR UPDATE) RETURNING data");
    qb
}

pub(crate) fn delete_query(collection: Collection, filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("DELETE FROM documents");
    push_where(&mut qb, collection, filter);
    qb
}

fn into_document(value: Json<Value>) -> Result<Document, StoreError> {
    match value.0 {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Serialization(format!(
            "stored document is not an object: {other}"
        ))),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    #[instrument(skip(self, filter), fields(db.operation = "SELECT", db.collection = %collection))]
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let row = count_query(collection, filter)
            .build()
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    #[instrument(skip(self, query), fields(db.operation = "SELECT", db.collection = %collection))]
    async fn find(
        &self,
        collection: Collection,
        query: &FindQuery,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = find_query(collection, query)
            .build()
            .fetch_all(&self.pool)
            .await?;

        debug!(returned = rows.len(), "Fetched documents");

        rows.into_iter()
            .map(|row| into_document(row.try_get::<Json<Value>, _>("data")?))
            .collect()
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let query = FindQuery {
            filter: filter.clone(),
            sort: Vec::new(),
            skip: 0,
            limit: Some(1),
        };
        Ok(self.find(collection, &query).await?.into_iter().next())
    }

    #[instrument(skip(self, id), fields(db.operation = "SELECT", db.collection = %collection))]
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.name())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(data,)| into_document(data)).transpose()
    }

    #[instrument(skip(self, document), fields(db.operation = "INSERT", db.collection = %collection))]
    async fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<Document, StoreError> {
        let (id, document) = prepare_insert(document)?;

        let (data,): (Json<Value>,) = sqlx::query_as(
            "INSERT INTO documents (id, collection, data) VALUES ($1, $2, $3) RETURNING data",
        )
        .bind(id)
        .bind(collection.name())
        .bind(Json(Value::Object(document)))
        .fetch_one(&self.pool)
        .await?;

        into_document(data)
    }

    #[instrument(skip(self, filter, update), fields(db.operation = "UPDATE", db.collection = %collection))]
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: Update,
    ) -> Result<Option<Document>, StoreError> {
        let row = update_query(collection, filter, update.sanitized())
            .build()
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| into_document(row.try_get::<Json<Value>, _>("data")?))
            .transpose()
    }

    #[instrument(skip(self, filter), fields(db.operation = "DELETE", db.collection = %collection))]
    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        let result = delete_query(collection, filter)
            .build()
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_filter() -> Filter {
        Filter::new()
            .eq("careers", "Web Development")
            .and("averageCost", Comparison::Lte(FilterValue::Integer(10000)))
    }

    #[test]
    fn test_count_sql_binds_everything() {
        let qb = count_query(Collection::Bootcamps, &scenario_filter());
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) AS total FROM documents WHERE collection = $1 \
             AND (data #> $2::text[]) @> $3 \
             AND (jsonb_typeof(data #> $4::text[]) = $5 AND (data #> $6::text[]) <= $7)"
        );
    }

    #[test]
    fn test_find_sql_orders_and_windows() {
        let query = FindQuery {
            filter: Filter::new(),
            sort: vec![SortKey::desc("name")],
            skip: 2,
            limit: Some(2),
        };
        let qb = find_query(Collection::Bootcamps, &query);
        assert_eq!(
            qb.sql(),
            "SELECT data FROM documents WHERE collection = $1 \
             ORDER BY (CASE jsonb_typeof(data #> $2::text[]) \
             WHEN 'string' THEN 1 WHEN 'number' THEN 2 WHEN 'boolean' THEN 3 \
             WHEN 'array' THEN 4 WHEN 'object' THEN 5 ELSE 0 END) DESC, \
             (CASE WHEN jsonb_typeof(data #> $3::text[]) = 'string' THEN data #>> $4::text[] END) \
             COLLATE \"C\" DESC, (data #> $5::text[]) DESC, seq ASC LIMIT $6 OFFSET $7"
        );
    }

    #[test]
    fn test_string_range_sql_is_bytewise() {
        let filter = Filter::new().and("name", Comparison::Lt(FilterValue::from("alpha")));
        let qb = count_query(Collection::Bootcamps, &filter);
        assert!(qb.sql().ends_with(
            " AND (CASE WHEN jsonb_typeof(data #> $2::text[]) = 'string' \
             THEN data #>> $3::text[] END) COLLATE \"C\" < $4"
        ));
    }

    #[test]
    fn test_numeric_equality_also_matches_its_text() {
        let filter = Filter::new().eq("weeks", FilterValue::parse("8"));
        let qb = count_query(Collection::Courses, &filter);
        assert!(qb.sql().ends_with(
            " AND EXISTS (SELECT 1 FROM jsonb_array_elements($2) AS member(value) \
             WHERE (data #> $3::text[]) @> member.value)"
        ));
    }

    #[test]
    fn test_in_sql_uses_array_membership() {
        let filter = Filter::new().and(
            "careers",
            Comparison::In(vec!["Business".into(), "UI/UX".into()]),
        );
        let qb = count_query(Collection::Bootcamps, &filter);
        assert!(qb.sql().contains(
            "EXISTS (SELECT 1 FROM jsonb_array_elements($2) AS member(value) \
             WHERE (data #> $3::text[]) @> member.value)"
        ));
    }

    #[test]
    fn test_boolean_range_matches_nothing() {
        let filter = Filter::new().and("housing", Comparison::Gt(FilterValue::Bool(true)));
        let qb = count_query(Collection::Bootcamps, &filter);
        assert!(qb.sql().ends_with(" AND FALSE"));
    }

    #[test]
    fn test_update_sql_is_single_conditional_statement() {
        let filter = Filter::new().eq("resetPasswordToken", "abc");
        let update = Update::default()
            .set("password", "hash")
            .unset("resetPasswordToken");
        let qb = update_query(Collection::Users, &filter, update);
        assert_eq!(
            qb.sql(),
            "UPDATE documents SET data = (data || $1) - $2::text[] \
             WHERE id = (SELECT id FROM documents WHERE collection = $3 \
             AND (data #> $4::text[]) @> $5 ORDER BY seq ASC LIMIT 1 FOR UPDATE) RETURNING data"
        );
    }

    #[test]
    fn test_hostile_field_names_stay_in_binds() {
        let filter = Filter::new().eq("name'); DROP TABLE documents; --", "x");
        let qb = delete_query(Collection::Bootcamps, &filter);
        assert!(!qb.sql().contains("DROP"));
    }
}
