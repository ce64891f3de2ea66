//! Path resolution over the document tree.
//!
//! A path is a dot-separated addressing expression: `users.u1.email`.
//! Backslash escapes the following character, so `a\.b` is the single
//! object key `a.b`. The empty string addresses the root.
//!
//! Segments are applied positionally: against an object any segment is a
//! key (numeric ones included); against an array a segment must be a
//! decimal index in `[0, len]`, where `len` appends. Writes create missing
//! intermediates as objects, never as arrays.
//!
//! The `check_set` / `check_unset` pre-flights report exactly the errors
//! the mutating forms would raise without touching the document, so the
//! store can append to the WAL first and then apply infallibly.

use crate::error::{EngineError, EngineResult};
use serde_json::{Map, Value};

/// Splits a path string into segments, honoring backslash escapes.
///
/// The empty string produces no segments (the root position).
#[must_use]
pub fn parse(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Resolves `segments` against `root` read-only.
///
/// Returns `None` on any missing intermediate, on an out-of-range array
/// index, or on a non-numeric segment against an array. Reads never fail
/// with a type error.
#[must_use]
pub fn get<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            Value::Array(arr) => {
                let idx: usize = segment.parse().ok()?;
                current = arr.get(idx)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Returns whether every segment resolves. A terminal JSON `null` counts
/// as present.
#[must_use]
pub fn has(root: &Value, segments: &[String]) -> bool {
    get(root, segments).is_some()
}

/// Read-only pre-flight for [`set`]: raises the same errors `set` would,
/// without mutating the document.
pub fn check_set(root: &Value, path: &str, segments: &[String], value: &Value) -> EngineResult<()> {
    if segments.is_empty() {
        if !value.is_object() {
            return Err(EngineError::path_type_mismatch(
                path,
                "root replacement must be an object",
            ));
        }
        return Ok(());
    }

    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        match current {
            Value::Object(map) => match map.get(segment) {
                // Missing keys switch to create mode: everything deeper is
                // a fresh object, so no further conflict is possible.
                Some(next) if !is_last => current = next,
                _ => return Ok(()),
            },
            Value::Array(arr) => {
                let idx = parse_index(segment, arr.len(), path)?;
                if is_last || idx == arr.len() {
                    return Ok(());
                }
                current = &arr[idx];
            }
            // A scalar intermediate is overwritten by a fresh object.
            _ => return Ok(()),
        }
    }
    Ok(())
}

/// Writes `value` at `segments`, creating missing intermediates as
/// objects. Against an array the final segment replaces in place, or
/// appends when it equals the current length.
///
/// # Errors
///
/// `PathTypeMismatch` on a non-numeric or out-of-range segment against an
/// array, or when the root is replaced by a non-object. The document is
/// untouched on error.
pub fn set(root: &mut Value, path: &str, segments: &[String], value: Value) -> EngineResult<()> {
    check_set(root, path, segments, &value)?;

    if segments.is_empty() {
        *root = value;
        return Ok(());
    }

    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;

        if !current.is_object() && !current.is_array() {
            *current = Value::Object(Map::new());
        }

        match current {
            Value::Object(map) => {
                if is_last {
                    map.insert(segment.clone(), value);
                    return Ok(());
                }
                current = map
                    .entry(segment.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
            }
            Value::Array(arr) => {
                // Validated by check_set above.
                let idx = parse_index(segment, arr.len(), path)?;
                if is_last {
                    if idx == arr.len() {
                        arr.push(value);
                    } else {
                        arr[idx] = value;
                    }
                    return Ok(());
                }
                if idx == arr.len() {
                    arr.push(Value::Object(Map::new()));
                }
                current = &mut arr[idx];
            }
            _ => unreachable!("scalar replaced with object above"),
        }
    }
    Ok(())
}

/// Read-only pre-flight for [`unset`]: returns whether a value would be
/// removed, raising the same errors `unset` would.
pub fn check_unset(root: &Value, path: &str, segments: &[String]) -> EngineResult<bool> {
    if segments.is_empty() {
        return Ok(true);
    }

    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => {
                    if is_last {
                        return Ok(true);
                    }
                    current = next;
                }
                None => return Ok(false),
            },
            Value::Array(arr) => {
                let idx: usize = segment.parse().map_err(|_| {
                    EngineError::path_type_mismatch(
                        path,
                        format!("non-numeric segment '{segment}' against an array"),
                    )
                })?;
                match arr.get(idx) {
                    Some(next) => {
                        if is_last {
                            return Ok(true);
                        }
                        current = next;
                    }
                    None => return Ok(false),
                }
            }
            _ => return Ok(false),
        }
    }
    Ok(false)
}

/// Removes the value at `segments`. Returns whether a value was present.
/// The empty path resets the root to an empty object.
///
/// # Errors
///
/// `PathTypeMismatch` on a non-numeric segment against an array. Missing
/// intermediates are not an error; they yield `false`.
pub fn unset(root: &mut Value, path: &str, segments: &[String]) -> EngineResult<bool> {
    if segments.is_empty() {
        *root = Value::Object(Map::new());
        return Ok(true);
    }

    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        match current {
            Value::Object(map) => {
                if is_last {
                    // shift_remove keeps the insertion order of the
                    // remaining keys intact.
                    return Ok(map.shift_remove(segment).is_some());
                }
                match map.get_mut(segment) {
                    Some(next) => current = next,
                    None => return Ok(false),
                }
            }
            Value::Array(arr) => {
                let idx: usize = segment.parse().map_err(|_| {
                    EngineError::path_type_mismatch(
                        path,
                        format!("non-numeric segment '{segment}' against an array"),
                    )
                })?;
                if is_last {
                    if idx < arr.len() {
                        arr.remove(idx);
                        return Ok(true);
                    }
                    return Ok(false);
                }
                match arr.get_mut(idx) {
                    Some(next) => current = next,
                    None => return Ok(false),
                }
            }
            _ => return Ok(false),
        }
    }
    Ok(false)
}

fn parse_index(segment: &str, len: usize, path: &str) -> EngineResult<usize> {
    let idx: usize = segment.parse().map_err(|_| {
        EngineError::path_type_mismatch(
            path,
            format!("non-numeric segment '{segment}' against an array"),
        )
    })?;
    if idx > len {
        return Err(EngineError::path_type_mismatch(
            path,
            format!("index {idx} out of bounds for array of length {len}"),
        ));
    }
    Ok(idx)
}
