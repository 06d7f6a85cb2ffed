pub mod entity;
pub mod property;
pub mod registry;

pub use entity::{
    EntityKind, EntityMetadata, EntityMetadataBuilder, KeyMetadata, ModelError, UnmappedMetadata,
};
pub use property::{FieldKind, IndexKind, PropertyAccess, PropertyMetadata};
pub use registry::{EntitySchema, MetadataRegistry, RegistryBuilder, RegistryError};
