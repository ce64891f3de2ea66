//! Predicate evaluation and result shaping for `find`.
//!
//! A query is a JSON object. Each entry names a field of the candidate
//! element — dot-paths reach into nested values — and either a literal to
//! deep-compare against or an operator object:
//!
//! `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`, `$exists`.
//!
//! Comparisons are numeric for numbers and lexicographic for strings;
//! other type pairings never match an ordering operator.

use crate::path;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// Structured options for `find`: sort, then skip, then limit, then
/// select, in that order.
#[derive(Clone, Default)]
pub struct FindOptions {
    /// Sort specification: an object of `field: 1 | -1` entries applied
    /// in insertion order for multi-field sorts.
    pub sort: Option<Value>,
    /// Opaque comparator; takes precedence over `sort` when set.
    pub sort_with: Option<Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>>,
    /// Matches to drop from the front.
    pub skip: usize,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Fields to project; absent fields are omitted from the result.
    pub select: Option<Vec<String>>,
}

impl FindOptions {
    /// Creates empty options (no sort, skip 0, no limit, no projection).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sort specification.
    #[must_use]
    pub fn sort(mut self, spec: Value) -> Self {
        self.sort = Some(spec);
        self
    }

    /// Sets an opaque comparator.
    #[must_use]
    pub fn sort_with(
        mut self,
        cmp: impl Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort_with = Some(Arc::new(cmp));
        self
    }

    /// Sets the number of matches to skip.
    #[must_use]
    pub const fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the projected fields.
    #[must_use]
    pub fn select(mut self, fields: Vec<String>) -> Self {
        self.select = Some(fields);
        self
    }
}

impl std::fmt::Debug for FindOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindOptions")
            .field("sort", &self.sort)
            .field("sort_with", &self.sort_with.as_ref().map(|_| "comparator"))
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .field("select", &self.select)
            .finish()
    }
}

/// Returns whether `item` satisfies `query`. Non-object queries match
/// nothing; the empty object matches everything.
#[must_use]
pub(crate) fn matches(item: &Value, query: &Value) -> bool {
    let Value::Object(conditions) = query else {
        return false;
    };
    conditions.iter().all(|(key, condition)| {
        let field = path::get(item, &path::parse(key));
        check_condition(field, condition)
    })
}

fn check_condition(value: Option<&Value>, condition: &Value) -> bool {
    if let Value::Object(spec) = condition {
        if spec.keys().any(|k| k.starts_with('$')) {
            return spec.iter().all(|(op, target)| match_operator(value, op, target));
        }
    }
    match value {
        Some(v) => v == condition,
        None => condition.is_null(),
    }
}

fn match_operator(value: Option<&Value>, op: &str, target: &Value) -> bool {
    let Some(v) = value else {
        return op == "$exists" && target == &Value::Bool(false);
    };

    match op {
        "$eq" => v == target,
        "$ne" => v != target,
        "$gt" => compare(v, target) == Some(Ordering::Greater),
        "$gte" => matches!(compare(v, target), Some(Ordering::Greater | Ordering::Equal)),
        "$lt" => compare(v, target) == Some(Ordering::Less),
        "$lte" => matches!(compare(v, target), Some(Ordering::Less | Ordering::Equal)),
        "$in" => matches!(target, Value::Array(options) if options.contains(v)),
        "$nin" => matches!(target, Value::Array(options) if !options.contains(v)),
        "$exists" => target == &Value::Bool(true),
        _ => false,
    }
}

/// Orders two values: numerically for numbers, lexicographically for
/// strings; any other pairing is unordered.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64()?.partial_cmp(&y.as_f64()?)
            } else {
                Some(x.as_i64()?.cmp(&y.as_i64()?))
            }
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Clones the elements of a collection value: array items in order, or
/// object values in insertion order. Anything else is empty.
#[must_use]
pub(crate) fn collection_items(collection: &Value) -> Vec<Value> {
    match collection {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Applies sort, skip, limit and projection, in that order.
#[must_use]
pub(crate) fn apply_options(mut items: Vec<Value>, options: &FindOptions) -> Vec<Value> {
    if let Some(cmp) = &options.sort_with {
        items.sort_by(|a, b| cmp(a, b));
    } else if let Some(spec) = &options.sort {
        items.sort_by(|a, b| sort_order(a, b, spec));
    }

    let limited: Vec<Value> = items
        .into_iter()
        .skip(options.skip)
        .take(options.limit.unwrap_or(usize::MAX))
        .collect();

    match &options.select {
        Some(fields) if !fields.is_empty() => {
            limited.iter().map(|item| project(item, fields)).collect()
        }
        _ => limited,
    }
}

fn sort_order(a: &Value, b: &Value, spec: &Value) -> Ordering {
    let Value::Object(fields) = spec else {
        return Ordering::Equal;
    };
    for (key, direction) in fields {
        let segments = path::parse(key);
        let va = path::get(a, &segments);
        let vb = path::get(b, &segments);

        let ordering = match (va, vb) {
            (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            let descending = direction.as_i64().unwrap_or(1) < 0;
            return if descending { ordering.reverse() } else { ordering };
        }
    }
    Ordering::Equal
}

fn project(item: &Value, fields: &[String]) -> Value {
    let mut out = Value::Object(Map::new());
    for field in fields {
        let segments = path::parse(field);
        if let Some(value) = path::get(item, &segments) {
            // Projection targets are freshly created objects, so this
            // cannot hit a type mismatch.
            let _ = path::set(&mut out, field, &segments, value.clone());
        }
    }
    out
}
