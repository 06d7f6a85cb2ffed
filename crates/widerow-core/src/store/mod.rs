pub mod client;
pub mod memory;
pub mod schema;

pub use client::{Column, ColumnSelect, Mutation, SchemaClient, StoreClient, StoreError};
pub use memory::MemoryStore;
pub use schema::{
    CompactionPolicy, Comparator, Compression, FamilyDefinition, FamilySettings,
    DEFAULT_GC_GRACE_SECONDS,
};
