use crate::{
    codec::composite::{self, Bound},
    error::InternalError,
    store::client::{Column, ColumnSelect, Mutation, StoreClient},
};
use std::sync::Arc;
use tracing::debug;

///
/// IndexOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexOp {
    Add,
    Remove,
}

impl IndexOp {
    const fn as_byte(self) -> u8 {
        match self {
            Self::Add => 0x00,
            Self::Remove => 0x01,
        }
    }

    fn try_from_byte(byte: u8) -> Result<Self, InternalError> {
        match byte {
            0x00 => Ok(Self::Add),
            0x01 => Ok(Self::Remove),
            other => Err(InternalError::codec_corruption(format!(
                "invalid index op byte {other:#04x}"
            ))),
        }
    }
}

///
/// WalEntry
///
/// One intended index mutation: add or remove `primary_key` under the
/// order-encoded `value` of indexed property `property`. Stored in the WAL
/// family under the owning row's primary key, named by the composite of
/// (property, value, op) so an entry is self-describing and idempotent to
/// re-apply.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WalEntry {
    pub property: String,
    pub value: Vec<u8>,
    pub primary_key: Vec<u8>,
    pub op: IndexOp,
}

impl WalEntry {
    fn wal_column_name(&self) -> Result<Vec<u8>, InternalError> {
        composite::encode(&[
            (self.property.as_bytes(), Bound::Exact),
            (&self.value, Bound::Exact),
            (&[self.op.as_byte()], Bound::Exact),
        ])
        .map_err(InternalError::from)
    }

    fn from_wal_column(primary_key: &[u8], column: &Column) -> Result<Self, InternalError> {
        let components = composite::decode(&column.name).map_err(InternalError::from)?;
        let [property, value, op] = components.as_slice() else {
            return Err(InternalError::codec_corruption(format!(
                "index wal entry with {} name components",
                components.len()
            )));
        };
        let property = std::str::from_utf8(property)
            .map_err(|_| {
                InternalError::codec_corruption("index wal property name is not utf-8".to_string())
            })?
            .to_string();
        if op.len() != 1 {
            return Err(InternalError::codec_corruption(
                "index wal op component is not a single byte".to_string(),
            ));
        }
        let op_byte = op[0];

        Ok(Self {
            property,
            value: value.to_vec(),
            primary_key: primary_key.to_vec(),
            op: IndexOp::try_from_byte(op_byte)?,
        })
    }

    /// Row key of this entry's target in the index family: the composite of
    /// (property, value), which byte-orders index rows by property then by
    /// the value's semantic order.
    fn index_row_key(&self) -> Result<Vec<u8>, InternalError> {
        composite::encode(&[
            (self.property.as_bytes(), Bound::Exact),
            (&self.value, Bound::Exact),
        ])
        .map_err(InternalError::from)
    }
}

///
/// IndexWal
///
/// Write-ahead protocol for explicit index tables. Every index mutation is
/// staged in the WAL family, applied to the index family, then confirmed
/// (the WAL entry deleted). A crash between any two steps leaves entries
/// that [`IndexWal::replay`] re-applies; application is idempotent, so
/// replaying an already-applied entry converges instead of corrupting.
///
/// Between stage and confirm the index may briefly disagree with the data
/// row; readers of explicit indexes tolerate entries whose rows no longer
/// match and re-check against the row.
///

pub struct IndexWal<C> {
    client: Arc<C>,
    index_family: String,
    wal_family: String,
}

impl<C: StoreClient> IndexWal<C> {
    #[must_use]
    pub fn new(client: Arc<C>, index_family: String, wal_family: String) -> Self {
        Self {
            client,
            index_family,
            wal_family,
        }
    }

    /// Stage an intended mutation. Durable before the index is touched.
    pub fn stage(&self, entry: &WalEntry) -> Result<(), InternalError> {
        self.client
            .mutate(&[Mutation::Insert {
                family: self.wal_family.clone(),
                key: entry.primary_key.clone(),
                column: Column::new(entry.wal_column_name()?, Vec::new()),
            }])
            .map_err(InternalError::from)
    }

    /// Apply a staged mutation to the index family. Idempotent: adding an
    /// existing column or deleting a missing one is a no-op.
    pub fn apply(&self, entry: &WalEntry) -> Result<(), InternalError> {
        let row_key = entry.index_row_key()?;
        let mutation = match entry.op {
            IndexOp::Add => Mutation::Insert {
                family: self.index_family.clone(),
                key: row_key,
                column: Column::new(entry.primary_key.clone(), Vec::new()),
            },
            IndexOp::Remove => Mutation::Delete {
                family: self.index_family.clone(),
                key: row_key,
                name: entry.primary_key.clone(),
            },
        };
        self.client.mutate(&[mutation]).map_err(InternalError::from)
    }

    /// Confirm an applied mutation by deleting its WAL entry.
    pub fn confirm(&self, entry: &WalEntry) -> Result<(), InternalError> {
        self.client
            .mutate(&[Mutation::Delete {
                family: self.wal_family.clone(),
                key: entry.primary_key.clone(),
                name: entry.wal_column_name()?,
            }])
            .map_err(InternalError::from)
    }

    /// Full protocol for one mutation: stage, apply, confirm.
    pub fn record(&self, entry: &WalEntry) -> Result<(), InternalError> {
        self.stage(entry)?;
        self.apply(entry)?;
        self.confirm(entry)
    }

    /// Unconfirmed entries staged under one primary key.
    pub fn pending(&self, primary_key: &[u8]) -> Result<Vec<WalEntry>, InternalError> {
        let mut entries = Vec::new();
        let mut start = Vec::new();
        // WAL rows are tiny; paging still applies for uniformity.
        loop {
            let columns = self
                .client
                .get_slice(
                    &self.wal_family,
                    primary_key,
                    &ColumnSelect::Range {
                        start,
                        end: Vec::new(),
                        count: crate::load::DEFAULT_COLUMN_PAGE_SIZE,
                    },
                )
                .map_err(InternalError::from)?;

            let full_page = columns.len() == crate::load::DEFAULT_COLUMN_PAGE_SIZE;
            let last_name = columns.last().map(|column| column.name.clone());
            for column in &columns {
                entries.push(WalEntry::from_wal_column(primary_key, column)?);
            }

            match last_name {
                Some(last) if full_page => start = composite::next_page_start(&last),
                _ => return Ok(entries),
            }
        }
    }

    /// Re-apply and confirm every pending entry for one primary key.
    /// Returns the number of entries replayed.
    pub fn replay(&self, primary_key: &[u8]) -> Result<usize, InternalError> {
        let entries = self.pending(primary_key)?;
        for entry in &entries {
            debug!(
                property = %entry.property,
                op = ?entry.op,
                "replaying index wal entry"
            );
            self.apply(entry)?;
            self.confirm(entry)?;
        }
        Ok(entries.len())
    }

    /// Primary keys currently indexed under one exact property value.
    pub fn lookup(&self, property: &str, value: &[u8]) -> Result<Vec<Vec<u8>>, InternalError> {
        let row_key = composite::encode(&[
            (property.as_bytes(), Bound::Exact),
            (value, Bound::Exact),
        ])
        .map_err(InternalError::from)?;

        let mut keys = Vec::new();
        let mut start = Vec::new();
        loop {
            let columns = self
                .client
                .get_slice(
                    &self.index_family,
                    &row_key,
                    &ColumnSelect::Range {
                        start,
                        end: Vec::new(),
                        count: crate::load::DEFAULT_COLUMN_PAGE_SIZE,
                    },
                )
                .map_err(InternalError::from)?;

            let full_page = columns.len() == crate::load::DEFAULT_COLUMN_PAGE_SIZE;
            let last_name = columns.last().map(|column| column.name.clone());
            keys.extend(columns.into_iter().map(|column| column.name));

            match last_name {
                // Index column names are raw primary keys, not composite
                // names, so the successor must not skip byte extensions.
                Some(last) if full_page => start = composite::next_raw_start(&last),
                _ => return Ok(keys),
            }
        }
    }
}
