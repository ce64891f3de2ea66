//! End-to-end tests against the public store API.
//!
//! The store only accepts canonical files inside the process working
//! directory, so every test works in a temporary directory created under
//! the current one.

use arbordb_core::{
    BatchOp, Config, EncryptionKey, EngineError, Event, FindOptions, IndexDefinition, Store,
};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn workdir() -> TempDir {
    tempfile::Builder::new()
        .prefix(".arbordb-test-")
        .tempdir_in(".")
        .expect("tempdir in working directory")
}

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("data.json")
}

fn fast() -> Config {
    Config::new().save_delay(Duration::from_millis(5))
}

#[test]
fn basic_round_trip() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast()).unwrap();
    let handle = store.set("user.name", json!("John Doe")).unwrap();
    assert_eq!(store.get("user.name").unwrap(), Some(json!("John Doe")));
    handle.wait().unwrap();
    store.close().unwrap();

    let store = Store::open(&path, fast()).unwrap();
    assert_eq!(store.get("user.name").unwrap(), Some(json!("John Doe")));
    store.close().unwrap();
}

#[test]
fn sequences_of_mutations_survive_reopen() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast()).unwrap();
    store.set("a.b", json!([1, 2])).unwrap();
    store.set("a.c", json!({"x": true})).unwrap();
    store.delete("a.b").unwrap();
    store.push("log", vec![json!("one"), json!("two")]).unwrap();
    store.pull("log", vec![json!("one")]).unwrap();
    let expected = store.get("").unwrap().unwrap();
    store.add("count", 5.0).unwrap().wait().unwrap();
    store.close().unwrap();

    let store = Store::open(&path, fast()).unwrap();
    let root = store.get("").unwrap().unwrap();
    assert_eq!(root.get("a"), expected.get("a"));
    assert_eq!(root.get("log"), Some(&json!(["two"])));
    assert_eq!(root.get("count"), Some(&json!(5)));
    store.close().unwrap();
}

#[test]
fn read_your_writes_before_any_snapshot() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), Config::new().save_delay(Duration::from_secs(600)))
        .unwrap();

    store.set("k", json!(1)).unwrap();
    assert_eq!(store.get("k").unwrap(), Some(json!(1)));
    assert!(store.has("k").unwrap());
    store.close().unwrap();
}

#[test]
fn unique_index_violation_leaves_document_unchanged() {
    let dir = workdir();
    let config = fast().index(IndexDefinition::new("user-email", "users", "email").unique());
    let store = Store::open(store_path(&dir), config).unwrap();

    store
        .set("users.user1", json!({"email": "test@example.com"}))
        .unwrap();

    let err = store
        .set("users.user2", json!({"email": "test@example.com"}))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::UniqueIndexViolation { ref index, .. } if index == "user-email"
    ));

    assert_eq!(
        store.get("").unwrap().unwrap(),
        json!({"users": {"user1": {"email": "test@example.com"}}})
    );
    store.close().unwrap();
}

#[test]
fn find_by_index_tracks_mutations() {
    let dir = workdir();
    let config = fast().index(IndexDefinition::new("user-email", "users", "email").unique());
    let store = Store::open(store_path(&dir), config).unwrap();

    store
        .set("users.u1", json!({"email": "a@x.io", "name": "Ada"}))
        .unwrap();
    assert_eq!(
        store.find_by_index("user-email", &json!("a@x.io")).unwrap(),
        Some(json!({"email": "a@x.io", "name": "Ada"}))
    );

    store.set("users.u1.email", json!("b@x.io")).unwrap();
    assert_eq!(store.find_by_index("user-email", &json!("a@x.io")).unwrap(), None);
    assert_eq!(
        store.find_by_index("user-email", &json!("b@x.io")).unwrap(),
        Some(json!({"email": "b@x.io", "name": "Ada"}))
    );

    store.delete("users.u1").unwrap();
    assert_eq!(store.find_by_index("user-email", &json!("b@x.io")).unwrap(), None);
    store.close().unwrap();
}

#[test]
fn indices_rebuild_on_open() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast()).unwrap();
    store
        .set("users.u1", json!({"email": "a@x.io"}))
        .unwrap()
        .wait()
        .unwrap();
    store.close().unwrap();

    let config = fast().index(IndexDefinition::new("user-email", "users", "email").unique());
    let store = Store::open(&path, config).unwrap();
    assert_eq!(
        store.find_by_index("user-email", &json!("a@x.io")).unwrap(),
        Some(json!({"email": "a@x.io"}))
    );
    store.close().unwrap();
}

#[test]
fn open_fails_on_preexisting_unique_duplicates() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast()).unwrap();
    store
        .transaction(|mut root| {
            root["users"] = json!({
                "u1": {"email": "dup@x.io"},
                "u2": {"email": "dup@x.io"},
            });
            Some(root)
        })
        .unwrap()
        .1
        .wait()
        .unwrap();
    store.close().unwrap();

    let config = fast().index(IndexDefinition::new("user-email", "users", "email").unique());
    let err = Store::open(&path, config).unwrap_err();
    assert!(matches!(err, EngineError::UniqueIndexViolation { .. }));
}

#[test]
fn transaction_moves_funds_atomically() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    store
        .set("accounts", json!({"a": 100, "b": 200}))
        .unwrap();

    let (root, handle) = store
        .transaction(|mut root| {
            let a = root["accounts"]["a"].as_i64()?;
            let b = root["accounts"]["b"].as_i64()?;
            root["accounts"]["a"] = json!(a - 50);
            root["accounts"]["b"] = json!(b + 50);
            Some(root)
        })
        .unwrap();

    assert_eq!(root["accounts"], json!({"a": 50, "b": 250}));
    handle.wait().unwrap();
    assert_eq!(
        store.get("accounts").unwrap(),
        Some(json!({"a": 50, "b": 250}))
    );
    store.close().unwrap();
}

#[test]
fn transaction_without_new_root_aborts() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    store.set("accounts", json!({"a": 100})).unwrap();

    let err = store.transaction(|_| None).unwrap_err();
    assert!(matches!(err, EngineError::TransactionAborted));
    assert_eq!(store.get("accounts").unwrap(), Some(json!({"a": 100})));
    store.close().unwrap();
}

#[test]
fn transaction_draft_mutations_do_not_leak() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    store.set("n", json!(1)).unwrap();

    let err = store
        .transaction(|mut root| {
            root["n"] = json!(999);
            None
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::TransactionAborted));
    assert_eq!(store.get("n").unwrap(), Some(json!(1)));
    store.close().unwrap();
}

#[test]
fn batch_applies_in_order() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    store
        .set("accounts", json!({"a": 100, "b": 200}))
        .unwrap();

    let handle = store
        .batch(vec![
            BatchOp::Set {
                path: "accounts.c".into(),
                value: json!(300),
            },
            BatchOp::Delete {
                path: "accounts.b".into(),
            },
            BatchOp::Push {
                path: "log".into(),
                items: vec![json!("batch_op")],
            },
        ])
        .unwrap();
    handle.wait().unwrap();

    assert_eq!(
        store.get("").unwrap().unwrap(),
        json!({"accounts": {"a": 100, "c": 300}, "log": ["batch_op"]})
    );
    store.close().unwrap();
}

#[test]
fn crash_recovery_replays_wal_entries() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast()).unwrap();
    store.set("base", json!(1)).unwrap().wait().unwrap();
    store.close().unwrap();

    // Simulate a crash after two acknowledged mutations: frames that a
    // killed process left behind without a snapshot.
    let wal_path = PathBuf::from(format!("{}.wal", path.display()));
    let mut bytes = Vec::new();
    for (seq, op) in [
        (1u64, json!({"type": "set", "path": "after.crash", "value": 42})),
        (2u64, json!({"type": "delete", "path": "base"})),
    ] {
        let payload = json!({"seq": seq, "op": op}).to_string().into_bytes();
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&payload);
    }
    // A torn append: header promising more bytes than exist.
    bytes.extend_from_slice(&99u32.to_be_bytes());
    bytes.extend_from_slice(b"torn");
    fs::write(&wal_path, &bytes).unwrap();

    let store = Store::open(&path, fast()).unwrap();
    assert_eq!(store.get("after.crash").unwrap(), Some(json!(42)));
    assert_eq!(store.get("base").unwrap(), None);
    store.close().unwrap();
}

#[test]
fn garbage_wal_tail_is_truncated_at_last_good_boundary() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast()).unwrap();
    store.set("keep", json!(true)).unwrap().wait().unwrap();
    store.close().unwrap();

    let wal_path = PathBuf::from(format!("{}.wal", path.display()));
    let payload = json!({"seq": 1, "op": {"type": "set", "path": "wal.entry", "value": 1}})
        .to_string()
        .into_bytes();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&payload);
    // A complete frame whose payload is not a WAL record.
    bytes.extend_from_slice(&7u32.to_be_bytes());
    bytes.extend_from_slice(b"not-wal");
    fs::write(&wal_path, &bytes).unwrap();

    let store = Store::open(&path, fast()).unwrap();
    assert_eq!(store.get("wal.entry").unwrap(), Some(json!(1)));
    assert_eq!(store.get("keep").unwrap(), Some(json!(true)));
    store.close().unwrap();

    // The tail past the last good frame is gone.
    let truncated = fs::read(&wal_path).unwrap();
    assert!(truncated.len() <= 4 + payload.len());
}

#[test]
fn resolved_mutations_survive_without_close() {
    let dir = workdir();
    let path = store_path(&dir);

    {
        let store = Store::open(&path, fast()).unwrap();
        store.set("durable", json!("yes")).unwrap().wait().unwrap();
        // Dropped without close: recovery owns whatever was in flight.
    }

    let store = Store::open(&path, fast()).unwrap();
    assert_eq!(store.get("durable").unwrap(), Some(json!("yes")));
    store.close().unwrap();
}

#[test]
fn coalescing_produces_one_snapshot_for_a_burst() {
    let dir = workdir();
    let store = Store::open(
        store_path(&dir),
        Config::new().save_delay(Duration::from_millis(40)),
    )
    .unwrap();
    let events = store.subscribe();

    let handles: Vec<_> = (0..10)
        .map(|i| store.set(&format!("burst.k{i}"), json!(i)).unwrap())
        .collect();
    for handle in &handles {
        handle.wait().unwrap();
    }

    let writes = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, Event::Write { .. }))
        .count();
    assert_eq!(writes, 1);
    store.close().unwrap();
}

#[test]
fn events_announce_ready_and_writes() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    let events = store.subscribe();

    store.set("k", json!(1)).unwrap().wait().unwrap();

    let seen = events.drain();
    // Ready fired before this subscriber attached; writes flow to it.
    assert!(seen.contains(&Event::Write { generation: 1 }));
    store.close().unwrap();
}

#[test]
fn encryption_produces_an_envelope_on_disk() {
    let dir = workdir();
    let path = store_path(&dir);
    let key = EncryptionKey::from_bytes(&[7u8; 32]).unwrap();

    let store = Store::open(&path, fast().key(key.clone())).unwrap();
    store
        .set("data", json!({"secret": "my secret"}))
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(
        store.get("data").unwrap(),
        Some(json!({"secret": "my secret"}))
    );
    store.close().unwrap();

    let on_disk: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert!(on_disk.get("iv").is_some());
    assert!(on_disk.get("tag").is_some());
    assert!(on_disk.get("content").is_some());
    assert!(!fs::read_to_string(&path).unwrap().contains("my secret"));

    let store = Store::open(&path, fast().key(key)).unwrap();
    assert_eq!(
        store.get("data").unwrap(),
        Some(json!({"secret": "my secret"}))
    );
    store.close().unwrap();
}

#[test]
fn wrong_key_is_terminal_at_open() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(
        &path,
        fast().key(EncryptionKey::from_bytes(&[1u8; 32]).unwrap()),
    )
    .unwrap();
    store.set("k", json!(1)).unwrap().wait().unwrap();
    store.close().unwrap();

    let err = Store::open(
        &path,
        fast().key(EncryptionKey::from_bytes(&[2u8; 32]).unwrap()),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::DecryptionFailed { .. }));
}

#[test]
fn encrypted_wal_holds_no_plaintext() {
    let dir = workdir();
    let path = store_path(&dir);
    let key = EncryptionKey::from_bytes(&[9u8; 32]).unwrap();

    let store = Store::open(
        &path,
        Config::new()
            .save_delay(Duration::from_secs(600))
            .key(key.clone()),
    )
    .unwrap();
    store.set("vault.combination", json!("12-34-56")).unwrap();

    let wal_bytes = fs::read(format!("{}.wal", path.display())).unwrap();
    let wal_text = String::from_utf8_lossy(&wal_bytes);
    assert!(!wal_text.contains("combination"));
    assert!(!wal_text.contains("12-34-56"));
    store.close().unwrap();

    let store = Store::open(&path, fast().key(key)).unwrap();
    assert_eq!(
        store.get("vault.combination").unwrap(),
        Some(json!("12-34-56"))
    );
    store.close().unwrap();
}

#[test]
fn push_is_deduplicating_and_pull_removes_all_matches() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();

    store.push("xs", vec![json!({"id": 1}), json!({"id": 2})]).unwrap();
    store.push("xs", vec![json!({"id": 1})]).unwrap();
    assert_eq!(
        store.get("xs").unwrap(),
        Some(json!([{"id": 1}, {"id": 2}]))
    );

    store.set("ys", json!([1, 2, 1, 3, 1])).unwrap();
    store.pull("ys", vec![json!(1)]).unwrap();
    assert_eq!(store.get("ys").unwrap(), Some(json!([2, 3])));

    let err = store.pull("missing", vec![json!(1)]).unwrap_err();
    assert!(matches!(err, EngineError::PathTypeMismatch { .. }));
    store.close().unwrap();
}

#[test]
fn add_handles_absent_integer_and_float_targets() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();

    store.add("counter", 2.0).unwrap();
    store.add("counter", 3.0).unwrap();
    assert_eq!(store.get("counter").unwrap(), Some(json!(5)));

    store.set("ratio", json!(1.5)).unwrap();
    store.add("ratio", 0.25).unwrap();
    assert_eq!(store.get("ratio").unwrap(), Some(json!(1.75)));

    store.set("label", json!("text")).unwrap();
    assert!(matches!(
        store.add("label", 1.0),
        Err(EngineError::PathTypeMismatch { .. })
    ));
    store.close().unwrap();
}

#[test]
fn find_supports_queries_options_and_object_collections() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    store
        .set(
            "people",
            json!([
                {"name": "Ada", "age": 36, "city": "London"},
                {"name": "Brian", "age": 70, "city": "NYC"},
                {"name": "Chris", "age": 36, "city": "Oslo"},
                {"name": "Dana", "age": 25, "city": "London"},
            ]),
        )
        .unwrap();

    let results = store
        .find(
            "people",
            &json!({"age": {"$gte": 30}}),
            &FindOptions::new()
                .sort(json!({"age": 1, "name": -1}))
                .select(vec!["name".into()]),
        )
        .unwrap();
    assert_eq!(
        results,
        vec![
            json!({"name": "Chris"}),
            json!({"name": "Ada"}),
            json!({"name": "Brian"}),
        ]
    );

    let first = store
        .find_one("people", &json!({"city": "London"}))
        .unwrap();
    assert_eq!(first.unwrap()["name"], json!("Ada"));

    let custom = store
        .find_where("people", |p| p["name"].as_str() == Some("Dana"), &FindOptions::new())
        .unwrap();
    assert_eq!(custom.len(), 1);

    store
        .set("keyed", json!({"x": {"n": 1}, "y": {"n": 2}}))
        .unwrap();
    let from_object = store
        .find("keyed", &json!({"n": {"$gt": 1}}), &FindOptions::new())
        .unwrap();
    assert_eq!(from_object, vec![json!({"n": 2})]);
    store.close().unwrap();
}

#[test]
fn paginate_is_skip_and_limit() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    let items: Vec<Value> = (0..9).map(|i| json!({"n": i})).collect();
    store.set("items", Value::Array(items)).unwrap();

    let page2 = store.paginate("items", 2, 4).unwrap();
    assert_eq!(page2, vec![json!({"n": 4}), json!({"n": 5}), json!({"n": 6}), json!({"n": 7})]);
    let page3 = store.paginate("items", 3, 4).unwrap();
    assert_eq!(page3, vec![json!({"n": 8})]);
    store.close().unwrap();
}

#[test]
fn snapshot_copy_duplicates_current_state() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    store.set("k", json!("v")).unwrap();

    let copy = store.snapshot_copy("backup").unwrap();
    assert!(copy.display().to_string().ends_with(".backup"));
    let copied: Value = serde_json::from_slice(&fs::read(&copy).unwrap()).unwrap();
    assert_eq!(copied, json!({"k": "v"}));
    store.close().unwrap();
}

#[test]
fn validator_rejection_leaves_document_unchanged() {
    let dir = workdir();
    let config = fast().validator(std::sync::Arc::new(|root: &Value| {
        if root.get("forbidden").is_some() {
            Err(vec!["forbidden key".to_string()])
        } else {
            Ok(())
        }
    }));
    let store = Store::open(store_path(&dir), config).unwrap();

    store.set("ok", json!(1)).unwrap();
    let err = store.set("forbidden", json!(true)).unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed { .. }));
    assert_eq!(store.get("").unwrap().unwrap(), json!({"ok": 1}));
    store.close().unwrap();
}

#[test]
fn queue_threshold_forces_application() {
    let dir = workdir();
    let store = Store::open(
        store_path(&dir),
        Config::new()
            .save_delay(Duration::from_secs(600))
            .queue_limit(3),
    )
    .unwrap();

    // Independent subtrees keep these buffered until the cap trips.
    store.set("a", json!(1)).unwrap();
    store.set("b", json!(2)).unwrap();
    store.set("c", json!(3)).unwrap();
    store.set("d", json!(4)).unwrap();

    assert_eq!(
        store.get("").unwrap().unwrap(),
        json!({"a": 1, "b": 2, "c": 3, "d": 4})
    );
    store.close().unwrap();
}

#[test]
fn wal_can_be_disabled() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast().use_wal(false)).unwrap();
    store.set("k", json!(1)).unwrap().wait().unwrap();
    store.close().unwrap();

    assert!(!PathBuf::from(format!("{}.wal", path.display())).exists());
    let store = Store::open(&path, fast().use_wal(false)).unwrap();
    assert_eq!(store.get("k").unwrap(), Some(json!(1)));
    store.close().unwrap();
}

#[test]
fn indentation_is_two_spaces_and_compact_mode_exists() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast()).unwrap();
    store.set("a", json!(1)).unwrap().wait().unwrap();
    store.close().unwrap();
    assert!(fs::read_to_string(&path).unwrap().contains("\n  \"a\": 1"));

    let compact_path = dir.path().join("compact.json");
    let store = Store::open(&compact_path, fast().indented(false)).unwrap();
    store.set("a", json!(1)).unwrap().wait().unwrap();
    store.close().unwrap();
    assert_eq!(fs::read_to_string(&compact_path).unwrap(), "{\"a\":1}");
}

#[test]
fn second_open_is_locked_out() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, fast()).unwrap();
    let err = Store::open(&path, fast()).unwrap_err();
    assert!(matches!(err, EngineError::LockUnavailable { .. }));

    store.close().unwrap();
    let reopened = Store::open(&path, fast()).unwrap();
    reopened.close().unwrap();
}

#[test]
fn operations_after_close_fail() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    store.close().unwrap();
    store.close().unwrap(); // idempotent

    assert!(matches!(
        store.get("k"),
        Err(EngineError::EngineClosed)
    ));
    assert!(matches!(
        store.set("k", json!(1)),
        Err(EngineError::EngineClosed)
    ));
}

#[test]
fn close_persists_pending_mutations() {
    let dir = workdir();
    let path = store_path(&dir);

    let store = Store::open(&path, Config::new().save_delay(Duration::from_secs(600))).unwrap();
    store.set("pending", json!(true)).unwrap();
    store.close().unwrap();

    let store = Store::open(&path, fast()).unwrap();
    assert_eq!(store.get("pending").unwrap(), Some(json!(true)));
    store.close().unwrap();
}

#[test]
fn escaping_paths_are_rejected() {
    let err = Store::open("../escape.json", fast()).unwrap_err();
    assert!(matches!(err, EngineError::PathEscape { .. }));
}

#[test]
fn escaped_dots_address_literal_keys() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();

    store.set(r"files.a\.json", json!("content")).unwrap();
    assert_eq!(store.get(r"files.a\.json").unwrap(), Some(json!("content")));
    assert_eq!(
        store.get("files").unwrap(),
        Some(json!({"a.json": "content"}))
    );
    store.close().unwrap();
}

#[test]
fn corrupt_plaintext_snapshot_recovers_to_empty_root() {
    let dir = workdir();
    let path = store_path(&dir);
    fs::write(&path, b"{definitely not json").unwrap();

    let store = Store::open(&path, fast()).unwrap();
    assert!(store.init_error().is_some());
    assert_eq!(store.get("").unwrap(), Some(json!({})));
    store.set("fresh", json!(1)).unwrap().wait().unwrap();
    store.close().unwrap();

    let store = Store::open(&path, fast()).unwrap();
    assert!(store.init_error().is_none());
    assert_eq!(store.get("fresh").unwrap(), Some(json!(1)));
    store.close().unwrap();
}

#[test]
fn leftover_temp_snapshot_is_promoted() {
    let dir = workdir();
    let path = store_path(&dir);

    // A crash between temp write and rename: only the temp file exists.
    fs::write(
        PathBuf::from(format!("{}.tmp", path.display())),
        serde_json::to_vec(&json!({"recovered": true})).unwrap(),
    )
    .unwrap();

    let store = Store::open(&path, fast()).unwrap();
    assert_eq!(store.get("recovered").unwrap(), Some(json!(true)));
    store.close().unwrap();
}

#[test]
fn clear_resets_to_empty_object() {
    let dir = workdir();
    let store = Store::open(store_path(&dir), fast()).unwrap();
    store.set("a.b.c", json!(1)).unwrap();

    store.clear().unwrap().wait().unwrap();
    assert_eq!(store.get("").unwrap(), Some(json!({})));
    store.close().unwrap();
}
