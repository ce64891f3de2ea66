//! WAL record type.

use crate::mutation::Mutation;
use serde::{Deserialize, Serialize};

/// One committed mutation in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Sequence number, monotonically increasing from 1 within one
    /// snapshot generation.
    pub seq: u64,
    /// The recorded mutation.
    pub op: Mutation,
}

impl WalEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(seq: u64, op: Mutation) -> Self {
        Self { seq, op }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape_is_seq_and_op() {
        let entry = WalEntry::new(
            3,
            Mutation::Set {
                path: "a".into(),
                value: json!(1),
            },
        );
        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded["seq"], json!(3));
        assert_eq!(encoded["op"]["type"], json!("set"));
    }

    #[test]
    fn roundtrip() {
        let entry = WalEntry::new(1, Mutation::Delete { path: "x.y".into() });
        let bytes = serde_json::to_vec(&entry).unwrap();
        assert_eq!(serde_json::from_slice::<WalEntry>(&bytes).unwrap(), entry);
    }
}
