//! Object persistence over a wide-column store.
//!
//! Entities map to rows of a column family: scalar properties become
//! plainly-named columns, collections become runs of composite-named
//! columns, and the whole row reconstructs through transparently paged
//! slice reads. Change tracking keeps writes column-granular, explicit
//! indexes stay consistent through a write-ahead protocol, and declared
//! schema is reconciled against the store at startup.

pub mod codec;
pub mod error;
pub mod index;
pub mod load;
pub mod model;
pub mod schema;
pub mod store;
pub mod test_support;
pub mod track;
pub mod value;

pub use error::{ErrorClass, ErrorOrigin, InternalError};
pub use load::{
    EntityDao, PlanError, PropertyRef, PropertySelect, DEFAULT_COLUMN_PAGE_SIZE,
};
pub use model::{
    EntityKind, EntityMetadata, KeyMetadata, MetadataRegistry, PropertyMetadata, UnmappedMetadata,
};
pub use track::DirtyTracker;
pub use value::{Value, ValueError, ValueKind};
