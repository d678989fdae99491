use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::{Params, Value};

/// One compiled scanner for every `@identifier` token. Caller text is never
/// spliced into a pattern, so crafted parameter names cannot reach the regex
/// engine.
static NAMED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("named-token pattern is valid"));

/// A rewritten SQL string paired with its positional argument list.
///
/// Invariant: for named input, the number of markers introduced by the
/// rewrite equals `args.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    /// SQL with only positional markers remaining (for bound tokens).
    pub sql: String,
    /// Arguments in left-to-right marker order.
    pub args: Vec<Value>,
}

/// Rewrite a query so only positional markers remain, producing the ordered
/// argument list alongside.
///
/// - `Params::None` passes the SQL through with no arguments.
/// - `Params::Positional` is already positional and passes through unchanged;
///   marker/argument count agreement is the caller's responsibility.
/// - `Params::Named` replaces each `@identifier` occurrence that is present in
///   the map with `?`, pushing the mapped value once per occurrence in global
///   left-to-right order. Tokens absent from the map are left untouched so
///   partial binding stays possible; a leftover literal surfaces as a driver
///   error, not a local one.
///
/// The input is never mutated; the rewrite builds a new string.
#[must_use]
pub fn bind(sql: &str, params: &Params) -> BoundQuery {
    match params {
        Params::None => BoundQuery {
            sql: sql.to_string(),
            args: Vec::new(),
        },
        Params::Positional(values) => BoundQuery {
            sql: sql.to_string(),
            args: values.clone(),
        },
        Params::Named(map) => {
            // Fast path: nothing to scan.
            if map.is_empty() || !sql.contains('@') {
                return BoundQuery {
                    sql: sql.to_string(),
                    args: Vec::new(),
                };
            }

            let mut args = Vec::new();
            let mut replaced = 0usize;
            let rewritten = NAMED_TOKEN.replace_all(sql, |caps: &Captures<'_>| {
                let token = &caps[0];
                match map.get(&token[1..]) {
                    Some(value) => {
                        args.push(value.clone());
                        replaced += 1;
                        "?".to_string()
                    }
                    None => token.to_string(),
                }
            });
            debug_assert_eq!(replaced, args.len());

            BoundQuery {
                sql: rewritten.into_owned(),
                args,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, Value)]) -> Params {
        Params::named(pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())))
    }

    #[test]
    fn passes_through_without_params() {
        let bound = bind("SELECT 1", &Params::None);
        assert_eq!(bound.sql, "SELECT 1");
        assert!(bound.args.is_empty());
    }

    #[test]
    fn empty_named_map_short_circuits() {
        let bound = bind("SELECT * FROM t WHERE id = @id", &named(&[]));
        assert_eq!(bound.sql, "SELECT * FROM t WHERE id = @id");
        assert!(bound.args.is_empty());
    }

    #[test]
    fn positional_input_is_idempotent() {
        let params = Params::positional([Value::Int(1), Value::Text("x".into())]);
        let bound = bind("SELECT * FROM t WHERE a = ? AND b = ?", &params);
        assert_eq!(bound.sql, "SELECT * FROM t WHERE a = ? AND b = ?");
        assert_eq!(
            bound.args,
            vec![Value::Int(1), Value::Text("x".into())]
        );
    }

    #[test]
    fn rewrites_named_tokens_in_occurrence_order() {
        let params = named(&[("name", Value::Text("alice".into())), ("id", Value::Int(7))]);
        let bound = bind(
            "SELECT * FROM users WHERE id = @id AND name = @name OR parent = @id",
            &params,
        );
        assert_eq!(
            bound.sql,
            "SELECT * FROM users WHERE id = ? AND name = ? OR parent = ?"
        );
        // Order follows occurrences in the original text, not map order.
        assert_eq!(
            bound.args,
            vec![Value::Int(7), Value::Text("alice".into()), Value::Int(7)]
        );
    }

    #[test]
    fn repeated_token_pushes_value_per_occurrence() {
        let params = named(&[("v", Value::Int(3))]);
        let bound = bind("SELECT @v + @v + @v", &params);
        assert_eq!(bound.sql, "SELECT ? + ? + ?");
        assert_eq!(bound.args, vec![Value::Int(3); 3]);
    }

    #[test]
    fn unbound_token_is_left_untouched() {
        let params = named(&[("id", Value::Int(1))]);
        let bound = bind("UPDATE t SET a = @missing WHERE id = @id", &params);
        assert_eq!(bound.sql, "UPDATE t SET a = @missing WHERE id = ?");
        assert_eq!(bound.args, vec![Value::Int(1)]);
    }

    #[test]
    fn longer_identifier_is_not_clobbered_by_prefix() {
        let params = named(&[("user", Value::Int(1)), ("user_id", Value::Int(2))]);
        let bound = bind("SELECT @user, @user_id", &params);
        assert_eq!(bound.sql, "SELECT ?, ?");
        assert_eq!(bound.args, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn sql_without_at_sign_skips_scanning() {
        let params = named(&[("id", Value::Int(1))]);
        let bound = bind("SELECT 1", &params);
        assert_eq!(bound.sql, "SELECT 1");
        assert!(bound.args.is_empty());
    }
}
