use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

/// Result-shaping category detected from a statement's leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Anything else, including empty input. Not an error: the router warns
    /// and takes the row-returning path.
    Unknown,
}

// Cache keys use a truncated prefix so otherwise-identical query shapes with
// differing trailing literals share an entry.
const CACHE_KEY_LEN: usize = 100;
const CACHE_CAPACITY: usize = 1000;

static CLASSIFY_CACHE: LazyLock<Mutex<HashMap<String, StatementKind>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Classify a SQL string by its leading keyword.
///
/// Pure over its input: the prefix-keyed cache is a speedup only, and once it
/// reaches capacity new shapes are classified uncached rather than evicting.
#[must_use]
pub fn classify(sql: &str) -> StatementKind {
    let key = prefix_key(sql);

    {
        let cache = match CLASSIFY_CACHE.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(kind) = cache.get(key) {
            return *kind;
        }
    }

    let kind = classify_uncached(sql);

    let mut cache = match CLASSIFY_CACHE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if cache.len() < CACHE_CAPACITY {
        cache.insert(key.to_string(), kind);
    }
    kind
}

// Keyed on the trimmed prefix: keywords sit at the start of the trimmed
// text, so statements sharing a key always share a leading keyword no
// matter how much whitespace precedes them.
fn prefix_key(sql: &str) -> &str {
    let sql = sql.trim_start();
    match sql.char_indices().nth(CACHE_KEY_LEN) {
        Some((idx, _)) => &sql[..idx],
        None => sql,
    }
}

fn classify_uncached(sql: &str) -> StatementKind {
    let keyword: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    match keyword.to_ascii_uppercase().as_str() {
        "SELECT" => StatementKind::Select,
        "INSERT" => StatementKind::Insert,
        "UPDATE" => StatementKind::Update,
        "DELETE" => StatementKind::Delete,
        _ => StatementKind::Unknown,
    }
}
