//! Structured filter predicates.
//!
//! A [`Filter`] is a conjunction of [`Clause`]s. Each clause applies one
//! [`Comparison`] to one field. The operator set is closed: nothing a client
//! sends can produce an operator outside [`Operator`].

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// A typed literal taken from the query string.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    /// A decimal with the text it was written as (`4.50`).
    Float { value: f64, raw: String },
    Bool(bool),
}

impl FilterValue {
    /// Types a raw query-string value.
    ///
    /// Canonical integers (`42`, `-7`; not `007` or `+5`), plain decimals
    /// (`4.5`) and `true`/`false` are typed; everything else stays text.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }

        if let Ok(n) = raw.parse::<i64>()
            && n.to_string() == raw
        {
            return Self::Integer(n);
        }

        if is_plain_decimal(raw)
            && let Ok(f) = raw.parse::<f64>()
            && f.is_finite()
        {
            return Self::Float {
                value: f,
                raw: raw.to_string(),
            };
        }

        Self::Text(raw.to_string())
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::Number((*n).into()),
            Self::Float { value, .. } => Number::from_f64(*value).map_or(Value::Null, Value::Number),
            Self::Bool(b) => Value::Bool(*b),
        }
    }

    /// Values an equality on this literal accepts: the typed value and,
    /// for numbers and booleans, the text it was written as. A string field
    /// holding `"8"` still matches `weeks=8`.
    pub fn equality_forms(&self) -> Vec<Value> {
        let text = match self {
            Self::Text(_) => None,
            Self::Integer(n) => Some(n.to_string()),
            Self::Float { raw, .. } => Some(raw.clone()),
            Self::Bool(b) => Some(b.to_string()),
        };
        std::iter::once(self.to_json())
            .chain(text.map(Value::String))
            .collect()
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn is_plain_decimal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let Some((whole, fraction)) = digits.split_once('.') else {
        return false;
    };
    !whole.is_empty()
        && !fraction.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
        && (whole == "0" || !whole.starts_with('0'))
}

/// The closed set of comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Operator {
    /// Recognises a bracketed operator token from the query string.
    ///
    /// `eq` is implied by a plain key and is not accepted here.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operator applied to one operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(FilterValue),
    Gt(FilterValue),
    Gte(FilterValue),
    Lt(FilterValue),
    Lte(FilterValue),
    In(Vec<FilterValue>),
}

impl Comparison {
    pub fn operator(&self) -> Operator {
        match self {
            Self::Eq(_) => Operator::Eq,
            Self::Gt(_) => Operator::Gt,
            Self::Gte(_) => Operator::Gte,
            Self::Lt(_) => Operator::Lt,
            Self::Lte(_) => Operator::Lte,
            Self::In(_) => Operator::In,
        }
    }

    pub fn operand_json(&self) -> Value {
        match self {
            Self::Eq(v) | Self::Gt(v) | Self::Gte(v) | Self::Lt(v) | Self::Lte(v) => v.to_json(),
            Self::In(values) => Value::Array(values.iter().map(FilterValue::to_json).collect()),
        }
    }

    /// Evaluates the comparison against a document value.
    ///
    /// `eq` and `in` also match when the document value is an array holding
    /// a matching element, or a string equal to the literal's text. Ordering operators only compare numbers with
    /// numbers and strings with strings.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Self::Eq(expected) => expected
                .equality_forms()
                .iter()
                .any(|form| contains_equal(actual, form)),
            Self::In(members) => members
                .iter()
                .flat_map(FilterValue::equality_forms)
                .any(|form| contains_equal(actual, &form)),
            Self::Gt(bound) => ordered(actual, bound).is_some_and(Ordering::is_gt),
            Self::Gte(bound) => ordered(actual, bound).is_some_and(Ordering::is_ge),
            Self::Lt(bound) => ordered(actual, bound).is_some_and(Ordering::is_lt),
            Self::Lte(bound) => ordered(actual, bound).is_some_and(Ordering::is_le),
        }
    }
}

fn contains_equal(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => {
            json_equal(actual, expected) || items.iter().any(|item| json_equal(item, expected))
        }
        other => json_equal(other, expected),
    }
}

fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn ordered(actual: &Value, bound: &FilterValue) -> Option<Ordering> {
    match (actual, bound.to_json()) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        // Bytewise, like `COLLATE "C"` in the PostgreSQL store.
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

/// A single field predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    pub comparison: Comparison,
}

impl Clause {
    pub fn new(field: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            field: field.into(),
            comparison,
        }
    }

    /// Dotted paths address nested objects (`location.city`).
    pub fn path(&self) -> Vec<&str> {
        self.field.split('.').collect()
    }

    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        lookup(document, &self.field).is_some_and(|actual| self.comparison.matches(actual))
    }
}

/// Resolves a dotted field path inside a document.
pub fn lookup<'a>(document: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    let mut segments = field.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    match current {
        Value::Null => None,
        other => Some(other),
    }
}

/// Orders two optional document values for sorting.
///
/// Missing values sort first, then strings, numbers, booleans, arrays and
/// objects (the PostgreSQL `jsonb` type order).
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A conjunction of clauses. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn and(mut self, field: impl Into<String>, comparison: Comparison) -> Self {
        self.clauses.push(Clause::new(field, comparison));
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.and(field, Comparison::Eq(value.into()))
    }

    /// Appends every clause of `other`.
    pub fn merge(mut self, other: Filter) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        self.clauses.iter().all(|clause| clause.matches(document))
    }

    /// Renders the filter as a document-store style JSON object.
    ///
    /// A field with a single equality renders as its bare value; any other
    /// combination renders as an operator object.
    pub fn to_json(&self) -> Value {
        let mut grouped: Map<String, Value> = Map::new();

        for clause in &self.clauses {
            let operand = clause.comparison.operand_json();
            let op = clause.comparison.operator();

            if !grouped.contains_key(&clause.field) {
                let rendered = if op == Operator::Eq {
                    operand
                } else {
                    let mut ops = Map::new();
                    ops.insert(op.as_str().to_string(), operand);
                    Value::Object(ops)
                };
                grouped.insert(clause.field.clone(), rendered);
                continue;
            }

            match grouped.get_mut(&clause.field) {
                None => {}
                Some(Value::Object(ops)) if !ops.is_empty() && is_operator_object(ops) => {
                    ops.insert(op.as_str().to_string(), operand);
                }
                Some(existing) => {
                    let previous = existing.take();
                    let mut ops = Map::new();
                    ops.insert(Operator::Eq.as_str().to_string(), previous);
                    ops.insert(op.as_str().to_string(), operand);
                    *existing = Value::Object(ops);
                }
            }
        }

        Value::Object(grouped)
    }
}

fn is_operator_object(ops: &Map<String, Value>) -> bool {
    ops.keys().all(|key| {
        Operator::from_token(key).is_some() || key == Operator::Eq.as_str()
    })
}
