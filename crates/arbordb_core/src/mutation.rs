//! Mutation records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single logical change to the document.
///
/// Higher-level operations (`push`, `pull`, `add`, batch `Push`) are
/// lowered to `Set` against the containing path after a read-modify step
/// under the store's single-writer discipline, so the WAL only ever
/// records these two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// Write `value` at `path`, creating intermediates as needed.
    Set {
        /// Dot-separated target path; empty string addresses the root.
        path: String,
        /// The value to store.
        value: Value,
    },
    /// Remove the value at `path`.
    Delete {
        /// Dot-separated target path; empty string resets the root.
        path: String,
    },
}

impl Mutation {
    /// Returns the target path of the mutation.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Set { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// One operation of a [`batch`](crate::Store::batch).
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    /// Write `value` at `path`.
    Set {
        /// Target path.
        path: String,
        /// The value to store.
        value: Value,
    },
    /// Remove the value at `path`.
    Delete {
        /// Target path.
        path: String,
    },
    /// Append each item not already deep-equal present in the array at
    /// `path`, creating the array when missing.
    Push {
        /// Target path of the array.
        path: String,
        /// Items to append.
        items: Vec<Value>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_roundtrips_through_json() {
        let op = Mutation::Set {
            path: "users.u1".into(),
            value: json!({"name": "Ada"}),
        };
        let encoded = serde_json::to_string(&op).unwrap();
        assert!(encoded.contains("\"type\":\"set\""));

        let decoded: Mutation = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, op);
    }

    #[test]
    fn delete_roundtrips_through_json() {
        let op = Mutation::Delete {
            path: "users.u1".into(),
        };
        let decoded: Mutation =
            serde_json::from_str(&serde_json::to_string(&op).unwrap()).unwrap();
        assert_eq!(decoded, op);
    }

    #[test]
    fn path_accessor() {
        let set = Mutation::Set {
            path: "a.b".into(),
            value: json!(1),
        };
        let del = Mutation::Delete { path: "c".into() };
        assert_eq!(set.path(), "a.b");
        assert_eq!(del.path(), "c");
    }
}
