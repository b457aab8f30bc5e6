use std::collections::BTreeMap;

use serde_json::Value;

use super::QueryError;

/// Raw query parameters: every key maps to one or more string values.
///
/// Keys are kept in a `BTreeMap` so the compiled filter has a stable clause
/// order regardless of how the client ordered its query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    values: BTreeMap<String, Vec<String>>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from decoded query-string pairs. Repeated keys accumulate.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.push(key, value);
        }
        params
    }

    /// Parses a structured filter document.
    ///
    /// Accepts a JSON object whose values are scalars, arrays of scalars, or
    /// one level of operator objects:
    ///
    /// ```json
    /// { "careers": "Business", "averageCost": { "lte": 10000 }, "page": 2 }
    /// ```
    ///
    /// Operator objects are flattened to the `field[op]` key form, so the
    /// result compiles exactly like the equivalent query string.
    pub fn from_json(document: &str) -> Result<Self, QueryError> {
        let value: Value = serde_json::from_str(document)
            .map_err(|e| QueryError::MalformedQuery(format!("invalid filter document: {e}")))?;

        let Value::Object(object) = value else {
            return Err(QueryError::MalformedQuery(
                "filter document must be a JSON object".to_string(),
            ));
        };

        let mut params = Self::new();
        for (key, value) in object {
            match value {
                Value::Object(operators) => {
                    for (op, operand) in operators {
                        params.push_json(format!("{key}[{op}]"), operand)?;
                    }
                }
                other => params.push_json(key, other)?,
            }
        }
        Ok(params)
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    fn push_json(&mut self, key: String, value: Value) -> Result<(), QueryError> {
        match value {
            Value::Array(items) => {
                for item in items {
                    let scalar = scalar_to_string(&key, item)?;
                    self.push(key.clone(), scalar);
                }
                Ok(())
            }
            other => {
                let scalar = scalar_to_string(&key, other)?;
                self.push(key, scalar);
                Ok(())
            }
        }
    }

    /// First value for `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

fn scalar_to_string(key: &str, value: Value) -> Result<String, QueryError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(QueryError::MalformedQuery(
            format!("unsupported value for `{key}`"),
        )),
    }
}
