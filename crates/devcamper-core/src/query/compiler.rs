use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    QueryError, RawParams,
    filter::{Clause, Comparison, Filter, FilterValue, Operator},
};

/// Keys that drive the query shape instead of filtering.
pub const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

/// Page size used when the request does not supply a usable `limit`.
pub const DEFAULT_LIMIT: u64 = 25;

const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Which top-level fields of a document are returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    Fields(Vec<String>),
}

impl Projection {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fields(fields.into_iter().map(Into::into).collect())
    }

    /// Applies the projection. `_id` is always kept.
    pub fn apply(&self, document: Map<String, Value>) -> Map<String, Value> {
        match self {
            Self::All => document,
            Self::Fields(fields) => document
                .into_iter()
                .filter(|(key, _)| key == ID_FIELD || fields.iter().any(|f| f == key))
                .collect(),
        }
    }
}

/// How an expanded relation is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// The document holds the id of one related document under `path`.
    Reference,
    /// Related documents hold this document's id under `foreign_field`.
    Reverse { foreign_field: String },
}

/// A relation to resolve into the result documents after the fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expand {
    pub path: String,
    pub collection: String,
    pub relation: Relation,
    pub select: Projection,
}

impl Expand {
    pub fn reference(path: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            collection: collection.into(),
            relation: Relation::Reference,
            select: Projection::All,
        }
    }

    pub fn reverse(
        path: impl Into<String>,
        collection: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            collection: collection.into(),
            relation: Relation::Reverse {
                foreign_field: foreign_field.into(),
            },
            select: Projection::All,
        }
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.select = projection;
        self
    }
}

/// Per-resource knobs for [`compile`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub reserved: Vec<String>,
    pub default_limit: u64,
    pub max_limit: Option<u64>,
    pub default_sort: Vec<SortKey>,
    pub hidden_fields: Vec<String>,
    pub expand: Option<Expand>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            reserved: RESERVED_KEYS.iter().map(|k| k.to_string()).collect(),
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
            default_sort: vec![SortKey::desc("createdAt")],
            hidden_fields: Vec::new(),
            expand: None,
        }
    }
}

impl CompileOptions {
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub fn with_max_limit(mut self, max: Option<u64>) -> Self {
        self.max_limit = max.filter(|m| *m > 0);
        self
    }

    pub fn with_hidden_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expand(mut self, expand: Expand) -> Self {
        self.expand = Some(expand);
        self
    }

    fn is_reserved(&self, key: &str) -> bool {
        self.reserved.iter().any(|r| r == key)
    }

    fn is_hidden(&self, field: &str) -> bool {
        let root = field.split('.').next().unwrap_or(field);
        self.hidden_fields.iter().any(|h| h == field || h == root)
    }
}

/// The compiled, bounded form of a list request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub filter: Filter,
    pub projection: Projection,
    pub sort: Vec<SortKey>,
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
    pub expand: Option<Expand>,
    pub hidden_fields: Vec<String>,
}

impl QueryDescriptor {
    /// Projects a fetched document and removes hidden fields.
    pub fn shape(&self, document: Map<String, Value>) -> Map<String, Value> {
        let mut document = self.projection.apply(document);
        for hidden in &self.hidden_fields {
            document.remove(hidden);
        }
        document
    }
}

/// Compiles raw request parameters into a [`QueryDescriptor`].
pub fn compile(raw: &RawParams, options: &CompileOptions) -> Result<QueryDescriptor, QueryError> {
    let mut filter = Filter::new();

    for (key, values) in raw.iter() {
        if options.is_reserved(key) {
            continue;
        }

        let values: Vec<&str> = values
            .iter()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            continue;
        }

        let (field, operator) = split_operator(key);
        if options.is_hidden(field) {
            return Err(QueryError::MalformedQuery(format!(
                "cannot filter on `{field}`"
            )));
        }

        let comparison = build_comparison(key, operator, &values)?;
        filter.push(Clause::new(field, comparison));
    }

    let projection = parse_select(raw.first("select"), options);
    let sort = parse_sort(raw.first("sort"), options)?;

    let page = positive(raw.first("page")).unwrap_or(1);
    let mut limit = positive(raw.first("limit")).unwrap_or(options.default_limit);
    if let Some(max) = options.max_limit {
        limit = limit.min(max);
    }

    let skip = (page - 1).checked_mul(limit).ok_or_else(|| {
        QueryError::MalformedQuery(format!("page {page} is out of range"))
    })?;

    Ok(QueryDescriptor {
        filter,
        projection,
        sort,
        page,
        limit,
        skip,
        expand: options.expand.clone(),
        hidden_fields: options.hidden_fields.clone(),
    })
}

/// `field[op]` with a whitelisted operator splits; anything else is a plain
/// equality on the key as written.
fn split_operator(key: &str) -> (&str, Operator) {
    if let Some(body) = key.strip_suffix(']')
        && let Some((field, token)) = body.split_once('[')
        && !field.is_empty()
        && let Some(op) = Operator::from_token(token)
    {
        return (field, op);
    }
    (key, Operator::Eq)
}

fn build_comparison(key: &str, operator: Operator, values: &[&str]) -> Result<Comparison, QueryError> {
    if operator == Operator::In {
        return Ok(Comparison::In(
            values.iter().map(|v| FilterValue::parse(v)).collect(),
        ));
    }

    let [value] = values else {
        return Err(QueryError::MalformedQuery(format!(
            "`{key}` takes a single value"
        )));
    };
    let value = FilterValue::parse(value);

    Ok(match operator {
        Operator::Eq => Comparison::Eq(value),
        Operator::Gt => Comparison::Gt(value),
        Operator::Gte => Comparison::Gte(value),
        Operator::Lt => Comparison::Lt(value),
        Operator::Lte => Comparison::Lte(value),
        Operator::In => Comparison::In(vec![value]),
    })
}

fn parse_select(raw: Option<&str>, options: &CompileOptions) -> Projection {
    let fields: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty() && !options.is_hidden(f))
        .map(str::to_string)
        .collect();

    if fields.is_empty() {
        Projection::All
    } else {
        Projection::Fields(fields)
    }
}

fn parse_sort(raw: Option<&str>, options: &CompileOptions) -> Result<Vec<SortKey>, QueryError> {
    let mut keys = Vec::new();

    for part in raw.unwrap_or_default().split(',').map(str::trim) {
        let key = match part.strip_prefix('-') {
            Some(field) => SortKey::desc(field),
            None => SortKey::asc(part),
        };
        if key.field.is_empty() {
            continue;
        }
        if options.is_hidden(&key.field) {
            return Err(QueryError::MalformedQuery(format!(
                "cannot sort on `{}`",
                key.field
            )));
        }
        keys.push(key);
    }

    if keys.is_empty() {
        keys = options.default_sort.clone();
    }
    Ok(keys)
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        RawParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_compiles_list_request() {
        let raw = params(&[
            ("careers", "Web Development"),
            ("averageCost[lte]", "10000"),
            ("select", "name,careers"),
            ("sort", "-name"),
            ("page", "2"),
            ("limit", "2"),
        ]);

        let descriptor = compile(&raw, &CompileOptions::default()).unwrap();

        assert_eq!(
            descriptor.filter.to_json(),
            json!({"careers": "Web Development", "averageCost": {"lte": 10000}})
        );
        assert_eq!(descriptor.projection, Projection::fields(["name", "careers"]));
        assert_eq!(descriptor.sort, vec![SortKey::desc("name")]);
        assert_eq!(descriptor.page, 2);
        assert_eq!(descriptor.skip, 2);
        assert_eq!(descriptor.limit, 2);
    }

    #[test]
    fn test_defaults_when_absent() {
        let descriptor = compile(&RawParams::new(), &CompileOptions::default()).unwrap();
        assert!(descriptor.filter.is_empty());
        assert_eq!(descriptor.projection, Projection::All);
        assert_eq!(descriptor.sort, vec![SortKey::desc("createdAt")]);
        assert_eq!(descriptor.page, 1);
        assert_eq!(descriptor.limit, DEFAULT_LIMIT);
        assert_eq!(descriptor.skip, 0);
    }

    #[test]
    fn test_invalid_page_and_limit_fall_back_to_defaults() {
        for (page, limit) in [("0", "0"), ("-3", "-1"), ("abc", "ten"), ("", "")] {
            let raw = params(&[("page", page), ("limit", limit)]);
            let descriptor = compile(&raw, &CompileOptions::default()).unwrap();
            assert_eq!(descriptor.page, 1, "page={page}");
            assert_eq!(descriptor.limit, DEFAULT_LIMIT, "limit={limit}");
        }
    }

    #[test]
    fn test_limit_is_clamped_to_max() {
        let raw = params(&[("limit", "100000")]);
        let options = CompileOptions::default().with_max_limit(Some(100));
        let descriptor = compile(&raw, &options).unwrap();
        assert_eq!(descriptor.limit, 100);
    }

    #[test]
    fn test_skip_overflow_is_rejected() {
        let raw = params(&[("page", &u64::MAX.to_string()), ("limit", "50")]);
        let result = compile(&raw, &CompileOptions::default());
        assert!(matches!(result, Err(QueryError::MalformedQuery(_))));
    }

    #[test]
    fn test_unknown_operator_is_literal_field() {
        let raw = params(&[("name[$where]", "1"), ("name[ne]", "x")]);
        let descriptor = compile(&raw, &CompileOptions::default()).unwrap();

        let fields: Vec<&str> = descriptor
            .filter
            .clauses()
            .iter()
            .map(|c| c.field.as_str())
            .collect();
        assert_eq!(fields, vec!["name[$where]", "name[ne]"]);
        assert!(descriptor
            .filter
            .clauses()
            .iter()
            .all(|c| c.comparison.operator() == Operator::Eq));
    }

    #[test]
    fn test_operator_like_values_stay_literal() {
        let raw = params(&[("name", "{\"$gt\":\"\"}")]);
        let descriptor = compile(&raw, &CompileOptions::default()).unwrap();
        assert_eq!(
            descriptor.filter.clauses()[0].comparison,
            Comparison::Eq(FilterValue::Text("{\"$gt\":\"\"}".to_string()))
        );
    }

    #[test]
    fn test_numeric_looking_value_matches_text_field() {
        let raw = params(&[("weeks", "8")]);
        let descriptor = compile(&raw, &CompileOptions::default()).unwrap();

        assert_eq!(
            descriptor.filter.clauses()[0].comparison,
            Comparison::Eq(FilterValue::Integer(8))
        );
        let as_text = json!({"weeks": "8"});
        let as_number = json!({"weeks": 8});
        assert!(descriptor.filter.matches(as_text.as_object().unwrap()));
        assert!(descriptor.filter.matches(as_number.as_object().unwrap()));
    }

    #[test]
    fn test_in_collects_all_values() {
        let raw = params(&[("careers[in]", "Business"), ("careers[in]", "UI/UX")]);
        let descriptor = compile(&raw, &CompileOptions::default()).unwrap();
        assert_eq!(
            descriptor.filter.clauses()[0].comparison,
            Comparison::In(vec!["Business".into(), "UI/UX".into()])
        );
    }

    #[test]
    fn test_repeated_scalar_operator_is_rejected() {
        let raw = params(&[("averageCost[lte]", "1"), ("averageCost[lte]", "2")]);
        let result = compile(&raw, &CompileOptions::default());
        assert!(matches!(result, Err(QueryError::MalformedQuery(_))));
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let raw = params(&[("careers", ""), ("housing", "true")]);
        let descriptor = compile(&raw, &CompileOptions::default()).unwrap();
        assert_eq!(descriptor.filter.len(), 1);
    }

    #[test]
    fn test_clause_count_matches_filter_params() {
        let cases: Vec<Vec<(&str, &str)>> = vec![
            vec![],
            vec![("a", "1")],
            vec![("a", "1"), ("b[gt]", "2"), ("c[in]", "x")],
            vec![("a", "1"), ("a[lt]", "9"), ("weird[key", "v"), ("d.e", "f")],
        ];

        for case in cases {
            let raw = params(&case);
            let descriptor = compile(&raw, &CompileOptions::default()).unwrap();
            assert_eq!(descriptor.filter.len(), raw.len());
        }
    }

    #[test]
    fn test_hidden_fields_cannot_be_queried() {
        let options = CompileOptions::default().with_hidden_fields(["password"]);

        let result = compile(&params(&[("password[gt]", "")]), &options);
        assert!(result.is_ok(), "empty values never reach the field check");

        let result = compile(&params(&[("password", "x")]), &options);
        assert!(matches!(result, Err(QueryError::MalformedQuery(_))));

        let result = compile(&params(&[("sort", "-password")]), &options);
        assert!(matches!(result, Err(QueryError::MalformedQuery(_))));

        let descriptor = compile(&params(&[("select", "name,password")]), &options).unwrap();
        assert_eq!(descriptor.projection, Projection::fields(["name"]));
    }

    #[test]
    fn test_shape_projects_and_strips_hidden() {
        let options = CompileOptions::default().with_hidden_fields(["password"]);
        let descriptor = compile(&params(&[("select", "name")]), &options).unwrap();

        let document = json!({"_id": "1", "name": "A", "email": "a@x.io", "password": "h"});
        let shaped = descriptor.shape(document.as_object().cloned().unwrap());
        assert_eq!(Value::Object(shaped), json!({"_id": "1", "name": "A"}));

        let descriptor = compile(&RawParams::new(), &options).unwrap();
        let shaped = descriptor.shape(document.as_object().cloned().unwrap());
        assert!(!shaped.contains_key("password"));
    }

    #[test]
    fn test_multi_key_sort() {
        let raw = params(&[("sort", "careers,-averageCost, ,")]);
        let descriptor = compile(&raw, &CompileOptions::default()).unwrap();
        assert_eq!(
            descriptor.sort,
            vec![SortKey::asc("careers"), SortKey::desc("averageCost")]
        );
    }
}
