//! Entity fixtures used across unit and integration tests.

use crate::{
    error::InternalError,
    model::{
        entity::{EntityKind, EntityMetadata, KeyMetadata, UnmappedMetadata},
        property::{IndexKind, PropertyMetadata},
    },
    track::DirtyTracker,
    value::{Value, ValueError, ValueKind},
};
use std::{collections::BTreeMap, sync::OnceLock};

fn expect_text(value: Value) -> Result<String, ValueError> {
    match value {
        Value::Text(text) => Ok(text),
        other => Err(ValueError::KindMismatch {
            expected: ValueKind::Text,
            found: other.kind_name(),
        }),
    }
}

///
/// Article
///
/// Exercises the whole mapping surface: a hash-indexed scalar, a
/// range-indexed scalar, a counter, a list, a sorted map, and an unmapped
/// container. Setters mark their tracking bit; the counter getter marks on
/// read.
///

pub struct Article {
    id: i64,
    title: String,
    rating: f64,
    views: i64,
    tags: Vec<Option<String>>,
    attrs: BTreeMap<String, String>,
    extra: BTreeMap<String, Vec<u8>>,
    tracker: DirtyTracker,
}

impl Article {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        Self::metadata().mark_dirty(self, "title");
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn set_rating(&mut self, rating: f64) {
        self.rating = rating;
        Self::metadata().mark_dirty(self, "rating");
    }

    /// Counter access dirties the property even on read.
    pub fn views(&self) -> i64 {
        Self::metadata().mark_dirty(self, "views");
        self.views
    }

    pub fn tags(&self) -> &[Option<String>] {
        &self.tags
    }

    pub fn set_tags(&mut self, tags: Vec<Option<String>>) {
        self.tags = tags;
        Self::metadata().mark_dirty(self, "tags");
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
        Self::metadata().mark_dirty(self, "attrs");
    }

    pub fn extra(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: BTreeMap<String, Vec<u8>>) {
        self.extra = extra;
        self.tracker.mark_unmapped();
    }

    fn build_metadata() -> EntityMetadata<Self> {
        EntityMetadata::builder("Article", "article")
            .key(KeyMetadata {
                name: "id",
                kind: ValueKind::Int,
                get: |a: &Self| Some(Value::Int(a.id)),
                set: |a, v| match v {
                    Value::Int(id) => {
                        a.id = id;
                        Ok(())
                    }
                    other => Err(ValueError::KindMismatch {
                        expected: ValueKind::Int,
                        found: other.kind_name(),
                    }),
                },
            })
            .property(PropertyMetadata::scalar(
                "title",
                "title",
                ValueKind::Text,
                IndexKind::Hash,
                |a| Some(Value::Text(a.title.clone())),
                |a, v| {
                    a.title = expect_text(v)?;
                    Ok(())
                },
            ))
            .property(PropertyMetadata::scalar(
                "rating",
                "rating",
                ValueKind::Double,
                IndexKind::Range,
                |a| Some(Value::Double(a.rating)),
                |a, v| match v {
                    Value::Double(rating) => {
                        a.rating = rating;
                        Ok(())
                    }
                    other => Err(ValueError::KindMismatch {
                        expected: ValueKind::Double,
                        found: other.kind_name(),
                    }),
                },
            ))
            .property(PropertyMetadata::scalar(
                "views",
                "views",
                ValueKind::Counter,
                IndexKind::None,
                |a| Some(Value::Int(a.views)),
                |a, v| match v {
                    Value::Int(views) => {
                        a.views = views;
                        Ok(())
                    }
                    other => Err(ValueError::KindMismatch {
                        expected: ValueKind::Counter,
                        found: other.kind_name(),
                    }),
                },
            ))
            .property(PropertyMetadata::list(
                "tags",
                "tags",
                ValueKind::Text,
                |a| {
                    a.tags
                        .iter()
                        .map(|slot| slot.clone().map(Value::Text))
                        .collect()
                },
                |a, items| {
                    a.tags = items
                        .into_iter()
                        .map(|slot| slot.map(expect_text).transpose())
                        .collect::<Result<_, _>>()?;
                    Ok(())
                },
            ))
            .property(PropertyMetadata::map(
                "attrs",
                "attrs",
                ValueKind::Text,
                ValueKind::Text,
                true,
                |a| {
                    a.attrs
                        .iter()
                        .map(|(k, v)| (Value::Text(k.clone()), Value::Text(v.clone())))
                        .collect()
                },
                |a, entries| {
                    a.attrs = entries
                        .into_iter()
                        .map(|(k, v)| Ok((expect_text(k)?, expect_text(v)?)))
                        .collect::<Result<_, ValueError>>()?;
                    Ok(())
                },
            ))
            .unmapped(UnmappedMetadata {
                key_kind: ValueKind::Text,
                value_kind: ValueKind::Bytes,
                get: |a| {
                    a.extra
                        .iter()
                        .map(|(k, v)| (Value::Text(k.clone()), Value::Bytes(v.clone())))
                        .collect()
                },
                set: |a, entries| {
                    a.extra = entries
                        .into_iter()
                        .map(|(k, v)| match v {
                            Value::Bytes(bytes) => Ok((expect_text(k)?, bytes)),
                            other => Err(ValueError::KindMismatch {
                                expected: ValueKind::Bytes,
                                found: other.kind_name(),
                            }),
                        })
                        .collect::<Result<_, _>>()?;
                    Ok(())
                },
            })
            .build()
            .expect("article metadata")
    }
}

impl EntityKind for Article {
    fn metadata() -> &'static EntityMetadata<Self> {
        static META: OnceLock<EntityMetadata<Article>> = OnceLock::new();
        META.get_or_init(Self::build_metadata)
    }

    fn create() -> Result<Self, InternalError> {
        Ok(Self {
            id: 0,
            title: String::new(),
            rating: 0.0,
            views: 0,
            tags: Vec::new(),
            attrs: BTreeMap::new(),
            extra: BTreeMap::new(),
            tracker: DirtyTracker::new(Self::metadata().property_count()),
        })
    }

    fn tracker(&self) -> &DirtyTracker {
        &self.tracker
    }
}

///
/// PlainNote
///
/// Scalar-only entity with no collections and no unmapped container, so
/// its family stores bare column names. `body` and `body_html` share a
/// name prefix, which bare-name paging has to survive.
///

pub struct PlainNote {
    id: i64,
    body: String,
    body_html: String,
    created_at: i64,
    tracker: DirtyTracker,
}

impl PlainNote {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        Self::metadata().mark_dirty(self, "body");
    }

    pub fn body_html(&self) -> &str {
        &self.body_html
    }

    pub fn set_body_html(&mut self, body_html: impl Into<String>) {
        self.body_html = body_html.into();
        Self::metadata().mark_dirty(self, "body_html");
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn set_created_at(&mut self, created_at: i64) {
        self.created_at = created_at;
        Self::metadata().mark_dirty(self, "created_at");
    }

    fn build_metadata() -> EntityMetadata<Self> {
        EntityMetadata::builder("PlainNote", "plain_note")
            .key(KeyMetadata {
                name: "id",
                kind: ValueKind::Int,
                get: |n: &Self| Some(Value::Int(n.id)),
                set: |n, v| match v {
                    Value::Int(id) => {
                        n.id = id;
                        Ok(())
                    }
                    other => Err(ValueError::KindMismatch {
                        expected: ValueKind::Int,
                        found: other.kind_name(),
                    }),
                },
            })
            .property(PropertyMetadata::scalar(
                "body",
                "body",
                ValueKind::Text,
                IndexKind::None,
                |n| Some(Value::Text(n.body.clone())),
                |n, v| {
                    n.body = expect_text(v)?;
                    Ok(())
                },
            ))
            .property(PropertyMetadata::scalar(
                "body_html",
                "body_html",
                ValueKind::Text,
                IndexKind::None,
                |n| Some(Value::Text(n.body_html.clone())),
                |n, v| {
                    n.body_html = expect_text(v)?;
                    Ok(())
                },
            ))
            .property(PropertyMetadata::scalar(
                "created_at",
                "created_at",
                ValueKind::Timestamp,
                IndexKind::None,
                |n| Some(Value::Timestamp(n.created_at)),
                |n, v| match v {
                    Value::Timestamp(at) => {
                        n.created_at = at;
                        Ok(())
                    }
                    other => Err(ValueError::KindMismatch {
                        expected: ValueKind::Timestamp,
                        found: other.kind_name(),
                    }),
                },
            ))
            .build()
            .expect("plain note metadata")
    }
}

impl EntityKind for PlainNote {
    fn metadata() -> &'static EntityMetadata<Self> {
        static META: OnceLock<EntityMetadata<PlainNote>> = OnceLock::new();
        META.get_or_init(Self::build_metadata)
    }

    fn create() -> Result<Self, InternalError> {
        Ok(Self {
            id: 0,
            body: String::new(),
            body_html: String::new(),
            created_at: 0,
            tracker: DirtyTracker::new(Self::metadata().property_count()),
        })
    }

    fn tracker(&self) -> &DirtyTracker {
        &self.tracker
    }
}
