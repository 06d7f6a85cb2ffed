pub mod bulk;
pub mod planner;
mod row;

pub use planner::{LoadPlan, LoadPlanner, PlanError, PropertyRef, PropertySelect};

use crate::{
    codec::{composite, ColumnCodec},
    error::InternalError,
    model::entity::EntityKind,
    store::client::{ColumnSelect, StoreClient},
    value::Value,
};
use row::RowLoader;
use std::{marker::PhantomData, sync::Arc};

/// Column page size used by range reads unless overridden on the dao.
pub const DEFAULT_COLUMN_PAGE_SIZE: usize = 100;

///
/// EntityDao
///
/// Load entry point for one entity type against a shared store client.
/// Range reads are transparently paged: a result of `page_size` columns is
/// treated as possibly-truncated and continued from the successor of the
/// last returned name, so callers never observe page boundaries.
///

pub struct EntityDao<E: EntityKind, C: StoreClient> {
    client: Arc<C>,
    page_size: usize,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityKind, C: StoreClient> EntityDao<E, C> {
    #[must_use]
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            page_size: DEFAULT_COLUMN_PAGE_SIZE,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Load one entity in full. `None` when the row does not exist.
    pub fn load(&self, key: &Value) -> Result<Option<E>, InternalError> {
        self.load_with(key, &PropertySelect::All)
    }

    /// Load one entity under a property selection.
    pub fn load_with(
        &self,
        key: &Value,
        select: &PropertySelect,
    ) -> Result<Option<E>, InternalError> {
        let meta = E::metadata();
        let codec = ColumnCodec::new(meta);
        let plan = LoadPlanner::new(meta)
            .resolve(select)
            .map_err(InternalError::from)?;
        let key_bytes = codec.key_bytes(key)?;

        let mut loader = RowLoader::new()?;
        match plan {
            LoadPlan::Full => {
                self.page_range(meta.family(), &key_bytes, Vec::new(), Vec::new(), &mut loader)?;
            }
            LoadPlan::Partial { names, ranges } => {
                if !names.is_empty() {
                    let columns = self
                        .client
                        .get_slice(meta.family(), &key_bytes, &ColumnSelect::Names(names))
                        .map_err(InternalError::from)?;
                    loader.absorb(&columns)?;
                }
                for (start, end) in ranges {
                    self.page_range(meta.family(), &key_bytes, start, end, &mut loader)?;
                }
            }
        }

        if loader.is_empty() {
            return Ok(None);
        }
        loader.finish(key).map(Some)
    }

    /// Drive one name range to exhaustion, feeding every page into the
    /// loader. A short page ends the range; a full page continues from the
    /// successor of its last name, still bounded by the original end.
    fn page_range(
        &self,
        family: &str,
        key: &[u8],
        mut start: Vec<u8>,
        end: Vec<u8>,
        loader: &mut RowLoader<E>,
    ) -> Result<(), InternalError> {
        loop {
            let select = ColumnSelect::Range {
                start,
                end: end.clone(),
                count: self.page_size,
            };
            let columns = self
                .client
                .get_slice(family, key, &select)
                .map_err(InternalError::from)?;

            let full_page = columns.len() == self.page_size;
            let last_name = columns.last().map(|column| column.name.clone());
            loader.absorb(&columns)?;

            match last_name {
                Some(last) if full_page => start = Self::next_start(&last),
                _ => return Ok(()),
            }
        }
    }

    /// Successor of the last returned column name. Composite names admit
    /// the exact byte-increment; bare physical names are not prefix-free,
    /// so only the zero-extension is safe.
    fn next_start(last: &[u8]) -> Vec<u8> {
        if E::metadata().use_composite() {
            composite::next_page_start(last)
        } else {
            composite::next_raw_start(last)
        }
    }

    pub(crate) const fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub(crate) const fn page_size(&self) -> usize {
        self.page_size
    }
}
