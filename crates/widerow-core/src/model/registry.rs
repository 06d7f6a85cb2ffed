use crate::{
    error::InternalError,
    model::entity::EntityKind,
    store::schema::{CompactionPolicy, Comparator, Compression, FamilyDefinition, FamilySettings},
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error as ThisError;

/// Column-family name suffix for a range-index table.
pub const INDEX_FAMILY_SUFFIX: &str = "_idx";

/// Column-family name suffix for an index write-ahead log.
pub const INDEX_WAL_FAMILY_SUFFIX: &str = "_idxwal";

///
/// EntitySchema
///
/// Type-erased schema declaration of one registered entity, produced from
/// its metadata. This is what the reconciler and the index layer consume;
/// it carries no accessors and is freely shareable.
///

#[derive(Clone, Debug)]
pub struct EntitySchema {
    pub entity_name: String,
    pub family: String,
    pub comparator: Comparator,
    pub compression: Option<Compression>,
    pub compaction: CompactionPolicy,
    /// Encoded column names the store should hash-index natively.
    pub hash_indexed: Vec<Vec<u8>>,
    pub has_range_indexes: bool,
}

impl EntitySchema {
    #[must_use]
    pub fn index_family(&self) -> String {
        format!("{}{INDEX_FAMILY_SUFFIX}", self.family)
    }

    #[must_use]
    pub fn wal_family(&self) -> String {
        format!("{}{INDEX_WAL_FAMILY_SUFFIX}", self.family)
    }

    /// Every column family this entity requires: its data family, plus an
    /// index table and index WAL when any property is range-indexed.
    #[must_use]
    pub fn family_definitions(&self) -> Vec<FamilyDefinition> {
        let mut definitions = vec![FamilyDefinition {
            name: self.family.clone(),
            comparator: self.comparator,
            settings: FamilySettings {
                compression: self.compression,
                compaction: self.compaction,
                hash_indexed: self.hash_indexed.clone(),
                ..FamilySettings::default()
            },
        }];

        if self.has_range_indexes {
            definitions.push(FamilyDefinition {
                name: self.index_family(),
                comparator: Comparator::Bytes,
                settings: FamilySettings {
                    compression: self.compression,
                    ..FamilySettings::default()
                },
            });
            // WAL entries are deleted as soon as the index write is
            // confirmed; zero grace and leveled compaction keep the family
            // from accumulating tombstone garbage.
            definitions.push(FamilyDefinition {
                name: self.wal_family(),
                comparator: Comparator::Bytes,
                settings: FamilySettings {
                    gc_grace_seconds: 0,
                    compaction: CompactionPolicy::Leveled,
                    ..FamilySettings::default()
                },
            });
        }

        definitions
    }
}

///
/// RegistryError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum RegistryError {
    #[error("column family '{family}' is declared by more than one entity")]
    DuplicateFamily { family: String },
}

///
/// MetadataRegistry
///
/// The full set of registered entity schemas, built once at startup and
/// shared read-only. Family names are unique across the registry.
///

#[derive(Debug)]
pub struct MetadataRegistry {
    schemas: Vec<EntitySchema>,
    by_family: HashMap<String, usize>,
}

impl MetadataRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            schemas: Vec::new(),
        }
    }

    pub fn schemas(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.iter()
    }

    #[must_use]
    pub fn schema_for_family(&self, family: &str) -> Option<&EntitySchema> {
        self.by_family.get(family).map(|&i| &self.schemas[i])
    }

    /// Flat list of every column family the registered entities require,
    /// in registration order.
    #[must_use]
    pub fn family_definitions(&self) -> Vec<FamilyDefinition> {
        self.schemas
            .iter()
            .flat_map(EntitySchema::family_definitions)
            .collect()
    }
}

///
/// RegistryBuilder
///

pub struct RegistryBuilder {
    schemas: Vec<EntitySchema>,
}

impl RegistryBuilder {
    pub fn register<E: EntityKind>(mut self) -> Result<Self, InternalError> {
        self.schemas.push(E::metadata().schema()?);
        Ok(self)
    }

    pub fn build(self) -> Result<Arc<MetadataRegistry>, RegistryError> {
        let mut by_family = HashMap::new();
        for (i, schema) in self.schemas.iter().enumerate() {
            if by_family.insert(schema.family.clone(), i).is_some() {
                return Err(RegistryError::DuplicateFamily {
                    family: schema.family.clone(),
                });
            }
        }

        Ok(Arc::new(MetadataRegistry {
            schemas: self.schemas,
            by_family,
        }))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(family: &str, range_indexed: bool) -> EntitySchema {
        EntitySchema {
            entity_name: "Probe".to_string(),
            family: family.to_string(),
            comparator: Comparator::Bytes,
            compression: None,
            compaction: CompactionPolicy::SizeTiered,
            hash_indexed: Vec::new(),
            has_range_indexes: range_indexed,
        }
    }

    #[test]
    fn range_indexed_entities_declare_index_and_wal_families() {
        let definitions = schema("probe", true).family_definitions();
        let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["probe", "probe_idx", "probe_idxwal"]);

        let wal = &definitions[2];
        assert_eq!(wal.settings.gc_grace_seconds, 0);
        assert_eq!(wal.settings.compaction, CompactionPolicy::Leveled);
    }

    #[test]
    fn unindexed_entities_declare_only_their_data_family() {
        let definitions = schema("probe", false).family_definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "probe");
    }

    #[test]
    fn duplicate_families_are_rejected() {
        let builder = RegistryBuilder {
            schemas: vec![schema("probe", false), schema("probe", false)],
        };
        assert_eq!(
            builder.build().unwrap_err(),
            RegistryError::DuplicateFamily {
                family: "probe".to_string()
            }
        );
    }
}
