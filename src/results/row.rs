use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Value;

/// A row from a query result.
///
/// Column names are shared across all rows of one result set; a per-set index
/// cache avoids repeated string comparisons on name lookups.
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row (shared across the result set).
    pub column_names: Arc<Vec<String>>,
    /// The values for this row, in column order.
    pub values: Vec<Value>,
    #[doc(hidden)]
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Create a new row. Builds the name→index cache once per call; use
    /// [`Row::with_index_cache`] when constructing many rows of one set.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        let cache = Arc::new(Self::build_index(&column_names));
        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Create a row reusing a shared name→index cache.
    #[must_use]
    pub fn with_index_cache(
        column_names: Arc<Vec<String>>,
        values: Vec<Value>,
        cache: Arc<HashMap<String, usize>>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Build the shared name→index cache for a column list.
    #[must_use]
    pub fn build_index(column_names: &[String]) -> HashMap<String, usize> {
        column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect()
    }

    /// Get the index of a column by name.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }
        // Fall back to linear search
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&Value> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// First value in field order; scalar shaping is positional, so callers
    /// order their SELECT column list accordingly.
    #[must_use]
    pub fn first_value(&self) -> Option<&Value> {
        self.values.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new(
            Arc::new(vec!["a".to_string(), "b".to_string()]),
            vec![Value::Int(1), Value::Int(2)],
        )
    }

    #[test]
    fn lookups_by_name_and_index_agree() {
        let row = sample();
        assert_eq!(row.get("a"), Some(&Value::Int(1)));
        assert_eq!(row.get("b"), row.get_by_index(1));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn first_value_is_field_order_positional() {
        let row = sample();
        assert_eq!(row.first_value(), Some(&Value::Int(1)));
    }
}
