use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    store::schema::FamilyDefinition,
};
use thiserror::Error as ThisError;

///
/// Column
///
/// One stored column: encoded name and encoded value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl Column {
    #[must_use]
    pub const fn new(name: Vec<u8>, value: Vec<u8>) -> Self {
        Self { name, value }
    }
}

///
/// ColumnSelect
///
/// Which columns of a row a read should return. `Range` is a byte-ordered
/// name slice: inclusive start, exclusive end, empty bound meaning
/// unbounded, at most `count` columns. `Names` fetches exactly the listed
/// names, omitting absent ones.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ColumnSelect {
    Range {
        start: Vec<u8>,
        end: Vec<u8>,
        count: usize,
    },
    Names(Vec<Vec<u8>>),
}

impl ColumnSelect {
    /// A full-row range read returning at most `count` columns.
    #[must_use]
    pub const fn first_page(count: usize) -> Self {
        Self::Range {
            start: Vec::new(),
            end: Vec::new(),
            count,
        }
    }
}

///
/// Mutation
///
/// One column-level write. Batches handed to [`StoreClient::mutate`] are
/// applied together but are not atomic across rows.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mutation {
    Insert {
        family: String,
        key: Vec<u8>,
        column: Column,
    },
    Delete {
        family: String,
        key: Vec<u8>,
        name: Vec<u8>,
    },
}

///
/// StoreError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("unknown column family '{family}'")]
    UnknownFamily { family: String },

    #[error("column family '{family}' already exists")]
    FamilyExists { family: String },

    #[error("store backend error: {message}")]
    Backend { message: String },
}

impl From<StoreError> for InternalError {
    fn from(err: StoreError) -> Self {
        let class = match &err {
            StoreError::UnknownFamily { .. } => ErrorClass::NotFound,
            StoreError::FamilyExists { .. } => ErrorClass::InvalidArgument,
            StoreError::Backend { .. } => ErrorClass::Internal,
        };
        Self::new(class, ErrorOrigin::Store, err.to_string())
    }
}

///
/// StoreClient
///
/// Row/column access against a wide-column store. Implementations are
/// shared behind `Arc` across concurrent loads.
///

pub trait StoreClient: Send + Sync {
    /// Read columns of one row. A missing row reads as an empty column set.
    fn get_slice(
        &self,
        family: &str,
        key: &[u8],
        select: &ColumnSelect,
    ) -> Result<Vec<Column>, StoreError>;

    /// Read columns of many rows at once. Returns only rows that exist,
    /// ordered by their key bytes; the selector applies per row.
    fn multiget_slice(
        &self,
        family: &str,
        keys: &[Vec<u8>],
        select: &ColumnSelect,
    ) -> Result<Vec<(Vec<u8>, Vec<Column>)>, StoreError>;

    /// Apply a batch of column writes.
    fn mutate(&self, mutations: &[Mutation]) -> Result<(), StoreError>;
}

///
/// SchemaClient
///
/// Family-level schema access, used by the reconciler.
///

pub trait SchemaClient: Send + Sync {
    fn describe_family(&self, name: &str) -> Result<Option<FamilyDefinition>, StoreError>;

    fn create_family(&self, definition: &FamilyDefinition) -> Result<(), StoreError>;

    /// Replace the mutable settings of an existing family. The comparator
    /// in `definition` must match the stored one; implementations reject
    /// attempts to change it.
    fn alter_family(&self, definition: &FamilyDefinition) -> Result<(), StoreError>;
}
