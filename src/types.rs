use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Values that can be bound as query parameters or read back from a row.
///
/// One enum is shared between parameter binding and result extraction so
/// helper code never branches on driver types:
/// ```rust
/// use sql_gateway::prelude::*;
///
/// let args = vec![
///     Value::Int(1),
///     Value::Text("alice".into()),
///     Value::Bool(true),
/// ];
/// # let _ = args;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let Value::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let Value::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let Value::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let Value::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Parameters attached to a query request.
///
/// Positional parameters bind to `?` markers by left-to-right order; named
/// parameters bind `@identifier` tokens by map lookup. `None` means the SQL
/// carries no bound values at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    /// No parameters.
    #[default]
    None,
    /// Already-positional argument list; passed through unchanged.
    Positional(Vec<Value>),
    /// Named `@identifier` bindings, rewritten to positional markers.
    Named(HashMap<String, Value>),
}

impl Params {
    /// Build named parameters from `(name, value)` pairs. Names are stored
    /// without the `@` prefix.
    #[must_use]
    pub fn named<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Params::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build positional parameters from a value list.
    #[must_use]
    pub fn positional<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Params::Positional(values.into_iter().collect())
    }
}

/// A SQL string and its parameters bundled together.
///
/// Transaction and batch entries use this shape:
/// ```rust
/// use sql_gateway::prelude::*;
///
/// let entry = QueryAndParams::new(
///     "INSERT INTO t (id, name) VALUES (?, ?)",
///     Params::positional([Value::Int(1), Value::Text("alice".into())]),
/// );
/// # let _ = entry;
/// ```
#[derive(Debug, Clone)]
pub struct QueryAndParams {
    /// The SQL query string
    pub query: String,
    /// The parameters to be bound to the query
    pub params: Params,
}

impl QueryAndParams {
    /// Create a new `QueryAndParams` with the given query string and parameters.
    pub fn new(query: impl Into<String>, params: Params) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }

    /// Create a new `QueryAndParams` with no parameters.
    pub fn new_without_params(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: Params::None,
        }
    }
}
