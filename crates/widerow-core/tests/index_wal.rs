mod common;

use common::*;
use widerow_core::{
    index::{IndexOp, IndexWal, WalEntry},
    model::EntityKind,
    test_support::Article,
    value::{Value, ValueKind},
};

fn article_wal(store: std::sync::Arc<widerow_core::store::MemoryStore>) -> IndexWal<widerow_core::store::MemoryStore> {
    let schema = Article::metadata().schema().unwrap();
    IndexWal::new(store, schema.index_family(), schema.wal_family())
}

fn rating_entry(id: i64, rating: f64, op: IndexOp) -> WalEntry {
    WalEntry {
        property: "rating".to_string(),
        value: Value::Double(rating).encode(ValueKind::Double).unwrap(),
        primary_key: int_key(id),
        op,
    }
}

#[test]
fn recorded_mutations_are_immediately_visible_and_confirmed() {
    let store = store_with_schema();
    let wal = article_wal(store);
    let entry = rating_entry(1, 4.5, IndexOp::Add);

    wal.record(&entry).unwrap();

    assert_eq!(wal.lookup("rating", &entry.value).unwrap(), vec![int_key(1)]);
    assert!(wal.pending(&int_key(1)).unwrap().is_empty());
}

#[test]
fn staged_but_unapplied_entries_replay_to_convergence() {
    let store = store_with_schema();
    let wal = article_wal(store);
    let entry = rating_entry(1, 4.5, IndexOp::Add);

    // Simulate a crash after stage, before apply.
    wal.stage(&entry).unwrap();
    assert!(wal.lookup("rating", &entry.value).unwrap().is_empty());
    assert_eq!(wal.pending(&int_key(1)).unwrap(), vec![entry.clone()]);

    assert_eq!(wal.replay(&int_key(1)).unwrap(), 1);
    assert_eq!(wal.lookup("rating", &entry.value).unwrap(), vec![int_key(1)]);

    // Replay after convergence is a no-op.
    assert_eq!(wal.replay(&int_key(1)).unwrap(), 0);
}

#[test]
fn replaying_an_already_applied_entry_is_idempotent() {
    let store = store_with_schema();
    let wal = article_wal(store);
    let entry = rating_entry(1, 4.5, IndexOp::Add);

    // Simulate a crash after apply, before confirm.
    wal.stage(&entry).unwrap();
    wal.apply(&entry).unwrap();

    assert_eq!(wal.replay(&int_key(1)).unwrap(), 1);
    assert_eq!(
        wal.lookup("rating", &entry.value).unwrap(),
        vec![int_key(1)],
        "second application converges instead of duplicating"
    );
    assert!(wal.pending(&int_key(1)).unwrap().is_empty());
}

#[test]
fn removals_unindex_the_primary_key() {
    let store = store_with_schema();
    let wal = article_wal(store);
    let add = rating_entry(1, 4.5, IndexOp::Add);

    wal.record(&add).unwrap();
    wal.record(&rating_entry(1, 4.5, IndexOp::Remove)).unwrap();

    assert!(wal.lookup("rating", &add.value).unwrap().is_empty());
}

#[test]
fn index_rows_hold_every_matching_primary_key() {
    let store = store_with_schema();
    let wal = article_wal(store);

    wal.record(&rating_entry(2, 3.0, IndexOp::Add)).unwrap();
    wal.record(&rating_entry(1, 3.0, IndexOp::Add)).unwrap();

    let value = Value::Double(3.0).encode(ValueKind::Double).unwrap();
    let keys = wal.lookup("rating", &value).unwrap();
    assert_eq!(keys, vec![int_key(1), int_key(2)], "key-byte order");
}
