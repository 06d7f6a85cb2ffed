//! Facade crate: the public surface of the widerow workspace.
//!
//! Downstream code depends on this crate and pulls the runtime in through
//! [`prelude`]; `widerow-core` stays an implementation detail.

pub use widerow_core as core;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ for traits brings them into scope without name conflicts
///

pub mod prelude {
    pub use crate::core::{
        error::{ErrorClass, ErrorOrigin, InternalError},
        index::{IndexOp, IndexWal, WalEntry},
        load::{EntityDao, PropertyRef, PropertySelect, DEFAULT_COLUMN_PAGE_SIZE},
        model::{
            EntityKind, EntityMetadata, KeyMetadata, MetadataRegistry, PropertyMetadata,
            UnmappedMetadata,
        },
        schema::{ReconcileReport, SchemaReconciler},
        store::{MemoryStore, SchemaClient as _, StoreClient as _},
        track::DirtyTracker,
        value::{Value, ValueKind},
    };
}
