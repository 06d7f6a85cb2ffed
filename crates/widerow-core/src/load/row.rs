use crate::{
    codec::{ColumnCodec, DecodedName},
    error::InternalError,
    model::{entity::EntityKind, property::FieldKind},
    store::client::Column,
    value::Value,
};
use std::collections::HashMap;
use tracing::debug;

///
/// RowLoader
///
/// Reconstructs one entity from its stored columns, fed page by page.
/// Scalars are applied as they arrive; collection elements accumulate in
/// per-property caches and are written back as one snapshot at the end, so
/// a collection split across pages reconstructs identically to one read in
/// a single page.
///
/// Columns whose names resolve to no property are routed to the unmapped
/// container when the entity has one, otherwise skipped with a log line.
/// A recognized property with an undecodable name or value aborts the row.
///

pub(crate) struct RowLoader<E: EntityKind> {
    entity: E,
    lists: HashMap<&'static str, Vec<Option<Value>>>,
    maps: HashMap<&'static str, Vec<(Value, Value)>>,
    unmapped: Vec<(Value, Value)>,
    column_count: usize,
}

impl<E: EntityKind> RowLoader<E> {
    pub(crate) fn new() -> Result<Self, InternalError> {
        Ok(Self {
            entity: E::create()?,
            lists: HashMap::new(),
            maps: HashMap::new(),
            unmapped: Vec::new(),
            column_count: 0,
        })
    }

    /// True when no column has been absorbed; such a row is absent.
    pub(crate) const fn is_empty(&self) -> bool {
        self.column_count == 0
    }

    /// Absorb one page of columns.
    pub(crate) fn absorb(&mut self, columns: &[Column]) -> Result<(), InternalError> {
        let meta = E::metadata();
        let codec = ColumnCodec::new(meta);

        for column in columns {
            self.column_count += 1;
            let decoded = match codec.decode_name(&column.name) {
                Ok(decoded) => decoded,
                Err(err) if err.aborts_row() => return Err(err.into()),
                Err(err) => {
                    debug!(entity = meta.entity_name(), "skipping column: {err:?}");
                    continue;
                }
            };

            match decoded {
                DecodedName::Property {
                    property: pm,
                    element: None,
                } => {
                    let value = codec.decode_value(pm, &column.value)?;
                    meta.set_scalar(&mut self.entity, pm, value)?;
                }
                DecodedName::Property {
                    property: pm,
                    element: Some(element),
                } => {
                    let value = codec.decode_value(pm, &column.value)?;
                    match pm.kind {
                        FieldKind::List => {
                            let index = list_index(meta.entity_name(), pm.name, &element)?;
                            let items = self.lists.entry(pm.name).or_default();
                            if index >= items.len() {
                                items.resize(index, None);
                                items.push(Some(value));
                            } else {
                                items[index] = Some(value);
                            }
                        }
                        FieldKind::Map { .. } | FieldKind::SortedMap { .. } => {
                            self.maps.entry(pm.name).or_default().push((element, value));
                        }
                        FieldKind::Simple => {
                            return Err(InternalError::load_invariant(format!(
                                "{}.{} decoded with an element key",
                                meta.entity_name(),
                                pm.name
                            )));
                        }
                    }
                }
                DecodedName::Unmapped { key } => {
                    // Unmapped columns are best-effort; a value that fails
                    // to decode is skipped, never failing the row.
                    match codec.decode_unmapped_value(&column.value) {
                        Ok(value) => self.unmapped.push((key, value)),
                        Err(err) => {
                            debug!(
                                entity = meta.entity_name(),
                                "skipping unmapped column: {err}"
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Write back collection snapshots, set the key, and hand out a clean
    /// (untracked) entity.
    pub(crate) fn finish(mut self, key: &Value) -> Result<E, InternalError> {
        let meta = E::metadata();

        for (name, items) in self.lists.drain() {
            let pm = meta.property(name).ok_or_else(|| {
                InternalError::load_invariant(format!("cached list for unknown property {name}"))
            })?;
            meta.set_list(&mut self.entity, pm, items)?;
        }
        for (name, entries) in self.maps.drain() {
            let pm = meta.property(name).ok_or_else(|| {
                InternalError::load_invariant(format!("cached map for unknown property {name}"))
            })?;
            meta.set_map(&mut self.entity, pm, entries)?;
        }
        if !self.unmapped.is_empty() {
            let unmapped = meta.unmapped().ok_or_else(|| {
                InternalError::load_invariant(
                    "unmapped columns cached without a container".to_string(),
                )
            })?;
            (unmapped.set)(&mut self.entity, self.unmapped).map_err(|err| {
                InternalError::load_invariant(format!(
                    "{} unmapped accessor rejected decoded entries: {err}",
                    meta.entity_name()
                ))
            })?;
        }

        meta.set_key(&mut self.entity, key.clone())?;

        // A freshly loaded entity is clean; setters mark from here on.
        self.entity.tracker().clear();
        Ok(self.entity)
    }
}

fn list_index(entity: &str, property: &str, element: &Value) -> Result<usize, InternalError> {
    let Value::BigInt(index) = element else {
        return Err(InternalError::load_invariant(format!(
            "{entity}.{property} list element key is not an integer"
        )));
    };
    usize::try_from(index).map_err(|_| {
        InternalError::codec_corruption(format!(
            "{entity}.{property} list index {index} exceeds addressable range"
        ))
    })
}
