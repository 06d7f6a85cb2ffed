use crate::{
    codec::ColumnCodec,
    error::InternalError,
    model::{
        property::{PropertyAccess, PropertyMetadata},
        registry::EntitySchema,
    },
    store::schema::{CompactionPolicy, Comparator, Compression},
    track::DirtyTracker,
    value::{Value, ValueError, ValueKind},
};
use std::{collections::HashMap, fmt};
use thiserror::Error as ThisError;

///
/// EntityKind
///
/// Implemented by every mapped type. Metadata is built once per type and
/// handed out as a `'static` reference; instances carry their own change
/// tracker and are constructed fallibly (a failing constructor indicates a
/// mismapped type, surfaced as a configuration error).
///

pub trait EntityKind: Sized + 'static {
    fn metadata() -> &'static EntityMetadata<Self>;

    fn create() -> Result<Self, InternalError>;

    fn tracker(&self) -> &DirtyTracker;
}

///
/// KeyMetadata
///
/// The key property. Keys are materialized from the row key, never from
/// stored columns.
///

pub struct KeyMetadata<E> {
    pub name: &'static str,
    pub kind: ValueKind,
    pub get: fn(&E) -> Option<Value>,
    pub set: fn(&mut E, Value) -> Result<(), ValueError>,
}

///
/// UnmappedMetadata
///
/// Accessor for the optional unmapped-field container: a map property that
/// captures columns whose names resolve to no mapped property.
///

pub struct UnmappedMetadata<E> {
    pub key_kind: ValueKind,
    pub value_kind: ValueKind,
    pub get: fn(&E) -> Vec<(Value, Value)>,
    pub set: fn(&mut E, Vec<(Value, Value)>) -> Result<(), ValueError>,
}

///
/// ModelError
/// Errors surfaced while building entity metadata (a one-time, startup-side
/// step; all of these indicate a mapping bug, not runtime input).
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("entity '{entity}' has no key property")]
    MissingKey { entity: &'static str },

    #[error("entity '{entity}' has no mapped properties")]
    NoProperties { entity: &'static str },

    #[error("duplicate property name '{name}'")]
    DuplicateName { name: &'static str },

    #[error("duplicate physical column name '{name}'")]
    DuplicatePhysicalName { name: &'static str },

    #[error("key property '{name}' collides with a mapped property")]
    KeyNameCollision { name: &'static str },
}

impl From<ModelError> for InternalError {
    fn from(err: ModelError) -> Self {
        Self::model_unsupported(err.to_string())
    }
}

///
/// EntityMetadata
///
/// Per-type mapping: family name, key property, ordered property set
/// (ascending lexical name order, which also defines change-tracking bit
/// positions), optional unmapped handler, composite-column policy, and the
/// schema-level declarations negotiated with the store. Immutable after
/// build.
///

pub struct EntityMetadata<E> {
    entity_name: &'static str,
    family: &'static str,
    key: KeyMetadata<E>,
    properties: Vec<PropertyMetadata<E>>,
    by_name: HashMap<&'static str, usize>,
    by_physical: HashMap<&'static str, usize>,
    unmapped: Option<UnmappedMetadata<E>>,
    use_composite: bool,
    compression: Option<Compression>,
    compaction: CompactionPolicy,
}

// The accessor tables are fn pointers; summarize instead of dumping them.
impl<E> fmt::Debug for EntityMetadata<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("entity_name", &self.entity_name)
            .field("family", &self.family)
            .field("properties", &self.properties.len())
            .field("use_composite", &self.use_composite)
            .finish_non_exhaustive()
    }
}

impl<E> EntityMetadata<E> {
    #[must_use]
    pub fn builder(entity_name: &'static str, family: &'static str) -> EntityMetadataBuilder<E> {
        EntityMetadataBuilder {
            entity_name,
            family,
            key: None,
            properties: Vec::new(),
            unmapped: None,
            force_composite: false,
            compression: None,
            compaction: CompactionPolicy::SizeTiered,
        }
    }

    #[must_use]
    pub const fn entity_name(&self) -> &'static str {
        self.entity_name
    }

    #[must_use]
    pub const fn family(&self) -> &'static str {
        self.family
    }

    #[must_use]
    pub const fn key(&self) -> &KeyMetadata<E> {
        &self.key
    }

    #[must_use]
    pub const fn use_composite(&self) -> bool {
        self.use_composite
    }

    #[must_use]
    pub const fn unmapped(&self) -> Option<&UnmappedMetadata<E>> {
        self.unmapped.as_ref()
    }

    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyMetadata<E>> {
        self.properties.iter()
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata<E>> {
        self.by_name.get(name).map(|&i| &self.properties[i])
    }

    #[must_use]
    pub fn property_by_physical(&self, physical: &str) -> Option<&PropertyMetadata<E>> {
        self.by_physical.get(physical).map(|&i| &self.properties[i])
    }

    /// Type-erased schema declaration for the registry / reconciler.
    pub fn schema(&self) -> Result<EntitySchema, InternalError> {
        let codec = ColumnCodec::new(self);
        let mut hash_indexed = Vec::new();
        for pm in &self.properties {
            if pm.index == super::property::IndexKind::Hash && !pm.is_collection() {
                hash_indexed.push(codec.property_name(pm).map_err(InternalError::from)?);
            }
        }

        Ok(EntitySchema {
            entity_name: self.entity_name.to_string(),
            family: self.family.to_string(),
            comparator: if self.use_composite {
                Comparator::Composite
            } else {
                Comparator::Bytes
            },
            compression: self.compression,
            compaction: self.compaction,
            hash_indexed,
            has_range_indexes: self
                .properties
                .iter()
                .any(|pm| pm.index == super::property::IndexKind::Range),
        })
    }

    // ------------------------------------------------------------------
    // Accessor dispatch (used by the loaders and the write path)
    // ------------------------------------------------------------------

    pub fn set_scalar(
        &self,
        entity: &mut E,
        pm: &PropertyMetadata<E>,
        value: Value,
    ) -> Result<(), InternalError> {
        match pm.access {
            PropertyAccess::Scalar { set, .. } => set(entity, value).map_err(|err| {
                InternalError::model_invariant(format!(
                    "{}.{} scalar accessor rejected decoded value: {err}",
                    self.entity_name, pm.name
                ))
            }),
            _ => Err(InternalError::model_invariant(format!(
                "{}.{} is not a scalar property",
                self.entity_name, pm.name
            ))),
        }
    }

    pub fn list_snapshot(
        &self,
        entity: &E,
        pm: &PropertyMetadata<E>,
    ) -> Result<Vec<Option<Value>>, InternalError> {
        match pm.access {
            PropertyAccess::List { get, .. } => Ok(get(entity)),
            _ => Err(InternalError::model_invariant(format!(
                "{}.{} is not a list property",
                self.entity_name, pm.name
            ))),
        }
    }

    pub fn set_list(
        &self,
        entity: &mut E,
        pm: &PropertyMetadata<E>,
        items: Vec<Option<Value>>,
    ) -> Result<(), InternalError> {
        match pm.access {
            PropertyAccess::List { set, .. } => set(entity, items).map_err(|err| {
                InternalError::model_invariant(format!(
                    "{}.{} list accessor rejected decoded values: {err}",
                    self.entity_name, pm.name
                ))
            }),
            _ => Err(InternalError::model_invariant(format!(
                "{}.{} is not a list property",
                self.entity_name, pm.name
            ))),
        }
    }

    pub fn map_snapshot(
        &self,
        entity: &E,
        pm: &PropertyMetadata<E>,
    ) -> Result<Vec<(Value, Value)>, InternalError> {
        match pm.access {
            PropertyAccess::Map { get, .. } => Ok(get(entity)),
            _ => Err(InternalError::model_invariant(format!(
                "{}.{} is not a map property",
                self.entity_name, pm.name
            ))),
        }
    }

    pub fn set_map(
        &self,
        entity: &mut E,
        pm: &PropertyMetadata<E>,
        entries: Vec<(Value, Value)>,
    ) -> Result<(), InternalError> {
        match pm.access {
            PropertyAccess::Map { set, .. } => set(entity, entries).map_err(|err| {
                InternalError::model_invariant(format!(
                    "{}.{} map accessor rejected decoded entries: {err}",
                    self.entity_name, pm.name
                ))
            }),
            _ => Err(InternalError::model_invariant(format!(
                "{}.{} is not a map property",
                self.entity_name, pm.name
            ))),
        }
    }

    pub fn set_key(&self, entity: &mut E, key: Value) -> Result<(), InternalError> {
        (self.key.set)(entity, key).map_err(|err| {
            InternalError::model_invariant(format!(
                "{} key accessor rejected decoded key: {err}",
                self.entity_name
            ))
        })
    }
}

impl<E: EntityKind> EntityMetadata<E> {
    /// Mark one property's change-tracking bit. Called by entity setters
    /// (and by counter getters, which dirty on read).
    pub fn mark_dirty(&self, entity: &E, name: &str) {
        if let Some(pm) = self.property(name) {
            entity.tracker().mark(pm.dirty_bit);
        }
    }

    /// Names of all properties whose tracking bits are set, used by the
    /// write path to build a minimal column-level write.
    #[must_use]
    pub fn dirty_properties(&self, entity: &E) -> Vec<&'static str> {
        self.properties
            .iter()
            .filter(|pm| entity.tracker().is_dirty(pm.dirty_bit))
            .map(|pm| pm.name)
            .collect()
    }
}

///
/// EntityMetadataBuilder
///
/// One-time, single-threaded build step; the result is read-only and safe
/// for unbounded concurrent readers.
///

pub struct EntityMetadataBuilder<E> {
    entity_name: &'static str,
    family: &'static str,
    key: Option<KeyMetadata<E>>,
    properties: Vec<PropertyMetadata<E>>,
    unmapped: Option<UnmappedMetadata<E>>,
    force_composite: bool,
    compression: Option<Compression>,
    compaction: CompactionPolicy,
}

impl<E> EntityMetadataBuilder<E> {
    #[must_use]
    pub fn key(mut self, key: KeyMetadata<E>) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyMetadata<E>) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn unmapped(mut self, unmapped: UnmappedMetadata<E>) -> Self {
        self.unmapped = Some(unmapped);
        self
    }

    /// Force composite column names even without collection properties.
    #[must_use]
    pub const fn composite_columns(mut self) -> Self {
        self.force_composite = true;
        self
    }

    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    #[must_use]
    pub const fn compaction(mut self, compaction: CompactionPolicy) -> Self {
        self.compaction = compaction;
        self
    }

    pub fn build(self) -> Result<EntityMetadata<E>, ModelError> {
        let key = self.key.ok_or(ModelError::MissingKey {
            entity: self.entity_name,
        })?;

        if self.properties.is_empty() {
            return Err(ModelError::NoProperties {
                entity: self.entity_name,
            });
        }

        let mut properties = self.properties;
        properties.sort_by(|a, b| a.name.cmp(b.name));

        let mut by_name = HashMap::new();
        let mut by_physical = HashMap::new();
        for (i, pm) in properties.iter_mut().enumerate() {
            pm.dirty_bit = i;
            if pm.name == key.name {
                return Err(ModelError::KeyNameCollision { name: pm.name });
            }
            if by_name.insert(pm.name, i).is_some() {
                return Err(ModelError::DuplicateName { name: pm.name });
            }
            if by_physical.insert(pm.physical, i).is_some() {
                return Err(ModelError::DuplicatePhysicalName { name: pm.physical });
            }
        }

        let use_composite =
            self.force_composite || properties.iter().any(PropertyMetadata::is_collection);

        Ok(EntityMetadata {
            entity_name: self.entity_name,
            family: self.family,
            key,
            properties,
            by_name,
            by_physical,
            unmapped: self.unmapped,
            use_composite,
            compression: self.compression,
            compaction: self.compaction,
        })
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::property::IndexKind;

    struct Probe;

    fn scalar(name: &'static str, physical: &'static str) -> PropertyMetadata<Probe> {
        PropertyMetadata::scalar(
            name,
            physical,
            ValueKind::Text,
            IndexKind::None,
            |_| None,
            |_, _| Ok(()),
        )
    }

    fn probe_key() -> KeyMetadata<Probe> {
        KeyMetadata {
            name: "id",
            kind: ValueKind::Int,
            get: |_| None,
            set: |_, _| Ok(()),
        }
    }

    #[test]
    fn build_assigns_dirty_bits_in_lexical_name_order() {
        let meta = EntityMetadata::builder("Probe", "probe")
            .key(probe_key())
            .property(scalar("zeta", "z"))
            .property(scalar("alpha", "a"))
            .build()
            .unwrap();

        assert_eq!(meta.property("alpha").unwrap().dirty_bit(), 0);
        assert_eq!(meta.property("zeta").unwrap().dirty_bit(), 1);
        assert!(!meta.use_composite());
    }

    #[test]
    fn build_rejects_duplicate_physical_names() {
        let err = EntityMetadata::builder("Probe", "probe")
            .key(probe_key())
            .property(scalar("a", "col"))
            .property(scalar("b", "col"))
            .build()
            .unwrap_err();

        assert_eq!(err, ModelError::DuplicatePhysicalName { name: "col" });
    }

    #[test]
    fn build_requires_key_and_properties() {
        let err = EntityMetadata::<Probe>::builder("Probe", "probe")
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::MissingKey { entity: "Probe" });

        let err = EntityMetadata::<Probe>::builder("Probe", "probe")
            .key(probe_key())
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::NoProperties { entity: "Probe" });
    }

    #[test]
    fn collections_imply_composite_columns() {
        let meta = EntityMetadata::builder("Probe", "probe")
            .key(probe_key())
            .property(scalar("a", "a"))
            .property(PropertyMetadata::list(
                "tags",
                "tags",
                ValueKind::Text,
                |_| Vec::new(),
                |_, _| Ok(()),
            ))
            .build()
            .unwrap();

        assert!(meta.use_composite());
    }
}
