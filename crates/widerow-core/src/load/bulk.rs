use crate::{
    codec::ColumnCodec,
    error::InternalError,
    load::{
        planner::{LoadPlan, LoadPlanner, PropertySelect},
        row::RowLoader,
        EntityDao,
    },
    model::entity::EntityKind,
    store::client::{Column, ColumnSelect, StoreClient},
    value::Value,
};
use std::collections::HashMap;

///
/// Bulk loading.
///
/// Many keys are fetched in one multiget and fanned back out to their
/// request positions through a key-bytes index, so results stay aligned
/// with the input order even though the store answers in key order and
/// omits absent rows. A duplicated input key materializes at its first
/// position only.
///

impl<E: EntityKind, C: StoreClient> EntityDao<E, C> {
    /// Load many entities; absent rows are dropped and no input-order
    /// guarantee is made.
    pub fn load_many(
        &self,
        keys: &[Value],
        select: &PropertySelect,
    ) -> Result<Vec<E>, InternalError> {
        Ok(self
            .load_many_ordered(keys, select)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Load many entities, position-aligned with `keys`: absent rows come
    /// back as `None` in their slot.
    pub fn load_many_ordered(
        &self,
        keys: &[Value],
        select: &PropertySelect,
    ) -> Result<Vec<Option<E>>, InternalError> {
        let meta = E::metadata();
        let codec = ColumnCodec::new(meta);
        let plan = LoadPlanner::new(meta)
            .resolve(select)
            .map_err(InternalError::from)?;

        let mut encoded = Vec::with_capacity(keys.len());
        let mut positions: HashMap<Vec<u8>, usize> = HashMap::new();
        for (position, key) in keys.iter().enumerate() {
            let key_bytes = codec.key_bytes(key)?;
            positions.entry(key_bytes.clone()).or_insert(position);
            encoded.push(key_bytes);
        }

        let mut loaders: HashMap<usize, RowLoader<E>> = HashMap::new();
        match plan {
            LoadPlan::Full => {
                self.multiget_range(
                    meta.family(),
                    &encoded,
                    Vec::new(),
                    Vec::new(),
                    &positions,
                    &mut loaders,
                )?;
            }
            LoadPlan::Partial { names, ranges } => {
                if !names.is_empty() {
                    let rows = self
                        .client()
                        .multiget_slice(meta.family(), &encoded, &ColumnSelect::Names(names))
                        .map_err(InternalError::from)?;
                    for (key_bytes, columns) in rows {
                        absorb_at(&positions, &mut loaders, &key_bytes, &columns)?;
                    }
                }
                for (start, end) in ranges {
                    self.multiget_range(
                        meta.family(),
                        &encoded,
                        start,
                        end,
                        &positions,
                        &mut loaders,
                    )?;
                }
            }
        }

        let mut results: Vec<Option<E>> = Vec::with_capacity(keys.len());
        results.resize_with(keys.len(), || None);
        for (position, loader) in loaders {
            if !loader.is_empty() {
                results[position] = Some(loader.finish(&keys[position])?);
            }
        }
        Ok(results)
    }

    /// Multiget one name range across all keys, then finish any row whose
    /// first page came back full with per-row continuation reads.
    fn multiget_range(
        &self,
        family: &str,
        keys: &[Vec<u8>],
        start: Vec<u8>,
        end: Vec<u8>,
        positions: &HashMap<Vec<u8>, usize>,
        loaders: &mut HashMap<usize, RowLoader<E>>,
    ) -> Result<(), InternalError> {
        let select = ColumnSelect::Range {
            start,
            end: end.clone(),
            count: self.page_size(),
        };
        let rows = self
            .client()
            .multiget_slice(family, keys, &select)
            .map_err(InternalError::from)?;

        for (key_bytes, columns) in rows {
            let full_page = columns.len() == self.page_size();
            let last_name = columns.last().map(|column| column.name.clone());
            absorb_at(positions, loaders, &key_bytes, &columns)?;

            if let Some(last) = last_name {
                if full_page {
                    self.continue_row(family, &key_bytes, last, &end, positions, loaders)?;
                }
            }
        }
        Ok(())
    }

    fn continue_row(
        &self,
        family: &str,
        key_bytes: &[u8],
        mut last_name: Vec<u8>,
        end: &[u8],
        positions: &HashMap<Vec<u8>, usize>,
        loaders: &mut HashMap<usize, RowLoader<E>>,
    ) -> Result<(), InternalError> {
        loop {
            let select = ColumnSelect::Range {
                start: Self::next_start(&last_name),
                end: end.to_vec(),
                count: self.page_size(),
            };
            let columns = self
                .client()
                .get_slice(family, key_bytes, &select)
                .map_err(InternalError::from)?;

            let full_page = columns.len() == self.page_size();
            let next_last = columns.last().map(|column| column.name.clone());
            absorb_at(positions, loaders, key_bytes, &columns)?;

            match next_last {
                Some(next) if full_page => last_name = next,
                _ => return Ok(()),
            }
        }
    }
}

fn absorb_at<E: EntityKind>(
    positions: &HashMap<Vec<u8>, usize>,
    loaders: &mut HashMap<usize, RowLoader<E>>,
    key_bytes: &[u8],
    columns: &[Column],
) -> Result<(), InternalError> {
    // Rows the store answers for keys we never asked about would indicate a
    // client bug; there is nowhere to put them.
    let Some(&position) = positions.get(key_bytes) else {
        return Err(InternalError::load_invariant(
            "multiget returned a row for an unrequested key".to_string(),
        ));
    };

    let loader = match loaders.entry(position) {
        std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
        std::collections::hash_map::Entry::Vacant(entry) => entry.insert(RowLoader::new()?),
    };
    loader.absorb(columns)
}
