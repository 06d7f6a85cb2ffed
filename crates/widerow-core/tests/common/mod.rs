#![allow(dead_code)]

use std::sync::Arc;
use widerow_core::{
    codec::ColumnCodec,
    model::{EntityKind, MetadataRegistry},
    schema::SchemaReconciler,
    store::{Column, MemoryStore, Mutation, StoreClient},
    test_support::{Article, PlainNote},
    value::{Value, ValueKind},
};

/// Fresh store with every fixture family reconciled into existence.
pub fn store_with_schema() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let registry = MetadataRegistry::builder()
        .register::<Article>()
        .unwrap()
        .register::<PlainNote>()
        .unwrap()
        .build()
        .unwrap();
    SchemaReconciler::new(store.clone())
        .reconcile(&registry)
        .unwrap();
    store
}

pub fn int_key(id: i64) -> Vec<u8> {
    Value::Int(id).encode(ValueKind::Int).unwrap()
}

pub fn insert(store: &MemoryStore, family: &str, key: Vec<u8>, name: Vec<u8>, value: Vec<u8>) {
    store
        .mutate(&[Mutation::Insert {
            family: family.to_string(),
            key,
            column: Column::new(name, value),
        }])
        .unwrap();
}

pub fn seed_article_scalar(store: &MemoryStore, id: i64, property: &str, value: &Value) {
    let meta = Article::metadata();
    let codec = ColumnCodec::new(meta);
    let pm = meta.property(property).unwrap();
    insert(
        store,
        meta.family(),
        int_key(id),
        codec.property_name(pm).unwrap(),
        codec.encode_value(pm, value).unwrap(),
    );
}

pub fn seed_article_tag(store: &MemoryStore, id: i64, index: u64, tag: &str) {
    let meta = Article::metadata();
    let codec = ColumnCodec::new(meta);
    let pm = meta.property("tags").unwrap();
    insert(
        store,
        meta.family(),
        int_key(id),
        codec.element_name(pm, &Value::BigInt(index.into())).unwrap(),
        codec.encode_value(pm, &Value::Text(tag.to_string())).unwrap(),
    );
}

pub fn seed_article_attr(store: &MemoryStore, id: i64, key: &str, value: &str) {
    let meta = Article::metadata();
    let codec = ColumnCodec::new(meta);
    let pm = meta.property("attrs").unwrap();
    insert(
        store,
        meta.family(),
        int_key(id),
        codec
            .element_name(pm, &Value::Text(key.to_string()))
            .unwrap(),
        codec
            .encode_value(pm, &Value::Text(value.to_string()))
            .unwrap(),
    );
}

pub fn seed_article_unmapped(store: &MemoryStore, id: i64, key: &str, value: &[u8]) {
    let meta = Article::metadata();
    let codec = ColumnCodec::new(meta);
    insert(
        store,
        meta.family(),
        int_key(id),
        codec.unmapped_name(&Value::Text(key.to_string())).unwrap(),
        codec
            .encode_unmapped_value(&Value::Bytes(value.to_vec()))
            .unwrap(),
    );
}

/// Overwrite one mapped scalar column with raw bytes, bypassing the value
/// codec. Used to stage undecodable stored values.
pub fn corrupt_article_scalar(store: &MemoryStore, id: i64, property: &str, bytes: Vec<u8>) {
    let meta = Article::metadata();
    let codec = ColumnCodec::new(meta);
    let pm = meta.property(property).unwrap();
    insert(
        store,
        meta.family(),
        int_key(id),
        codec.property_name(pm).unwrap(),
        bytes,
    );
}

/// One fully-populated article row.
pub fn seed_full_article(store: &MemoryStore, id: i64) {
    seed_article_scalar(store, id, "title", &Value::Text(format!("article {id}")));
    seed_article_scalar(store, id, "rating", &Value::Double(4.5));
    seed_article_scalar(store, id, "views", &Value::Int(12));
    seed_article_tag(store, id, 0, "first");
    seed_article_tag(store, id, 1, "second");
    seed_article_attr(store, id, "lang", "en");
    seed_article_attr(store, id, "topic", "storage");
    seed_article_unmapped(store, id, "legacy", b"blob");
}

pub fn seed_plain_note(store: &MemoryStore, id: i64, body: &str, created_at: i64) {
    let meta = PlainNote::metadata();
    let codec = ColumnCodec::new(meta);
    let body_pm = meta.property("body").unwrap();
    let created_pm = meta.property("created_at").unwrap();
    insert(
        store,
        meta.family(),
        int_key(id),
        codec.property_name(body_pm).unwrap(),
        codec
            .encode_value(body_pm, &Value::Text(body.to_string()))
            .unwrap(),
    );
    insert(
        store,
        meta.family(),
        int_key(id),
        codec.property_name(created_pm).unwrap(),
        codec
            .encode_value(created_pm, &Value::Timestamp(created_at))
            .unwrap(),
    );
}

pub fn seed_plain_note_html(store: &MemoryStore, id: i64, html: &str) {
    let meta = PlainNote::metadata();
    let codec = ColumnCodec::new(meta);
    let pm = meta.property("body_html").unwrap();
    insert(
        store,
        meta.family(),
        int_key(id),
        codec.property_name(pm).unwrap(),
        codec
            .encode_value(pm, &Value::Text(html.to_string()))
            .unwrap(),
    );
}
