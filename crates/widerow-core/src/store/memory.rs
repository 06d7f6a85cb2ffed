use crate::store::{
    client::{Column, ColumnSelect, Mutation, SchemaClient, StoreClient, StoreError},
    schema::FamilyDefinition,
};
use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::RwLock,
};

///
/// MemoryStore
///
/// In-process wide-column store used by tests and embedded setups. Rows are
/// key-ordered, columns are name-byte-ordered, reads reflect all prior
/// writes. Families must be created (normally by the schema reconciler)
/// before use.
///

#[derive(Default)]
pub struct MemoryStore {
    families: RwLock<HashMap<String, FamilyState>>,
}

struct FamilyState {
    definition: FamilyDefinition,
    rows: BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_family<T>(
        &self,
        family: &str,
        f: impl FnOnce(&FamilyState) -> T,
    ) -> Result<T, StoreError> {
        let families = self.families.read().expect("store lock poisoned");
        families
            .get(family)
            .map(f)
            .ok_or_else(|| StoreError::UnknownFamily {
                family: family.to_string(),
            })
    }

    fn select_columns(row: &BTreeMap<Vec<u8>, Vec<u8>>, select: &ColumnSelect) -> Vec<Column> {
        match select {
            ColumnSelect::Range { start, end, count } => {
                let lower = Bound::Included(start.clone());
                let upper = if end.is_empty() {
                    Bound::Unbounded
                } else {
                    Bound::Excluded(end.clone())
                };
                row.range((lower, upper))
                    .take(*count)
                    .map(|(name, value)| Column::new(name.clone(), value.clone()))
                    .collect()
            }
            ColumnSelect::Names(names) => names
                .iter()
                .filter_map(|name| {
                    row.get(name)
                        .map(|value| Column::new(name.clone(), value.clone()))
                })
                .collect(),
        }
    }
}

impl StoreClient for MemoryStore {
    fn get_slice(
        &self,
        family: &str,
        key: &[u8],
        select: &ColumnSelect,
    ) -> Result<Vec<Column>, StoreError> {
        self.with_family(family, |state| {
            state
                .rows
                .get(key)
                .map(|row| Self::select_columns(row, select))
                .unwrap_or_default()
        })
    }

    fn multiget_slice(
        &self,
        family: &str,
        keys: &[Vec<u8>],
        select: &ColumnSelect,
    ) -> Result<Vec<(Vec<u8>, Vec<Column>)>, StoreError> {
        // Requested keys are answered in byte order, duplicates collapsed,
        // absent rows omitted, like a storage-side multiget.
        let mut wanted: Vec<&Vec<u8>> = keys.iter().collect();
        wanted.sort();
        wanted.dedup();

        self.with_family(family, |state| {
            wanted
                .into_iter()
                .filter_map(|key| {
                    state
                        .rows
                        .get(key)
                        .map(|row| (key.clone(), Self::select_columns(row, select)))
                })
                .collect()
        })
    }

    fn mutate(&self, mutations: &[Mutation]) -> Result<(), StoreError> {
        let mut families = self.families.write().expect("store lock poisoned");
        for mutation in mutations {
            let family = match mutation {
                Mutation::Insert { family, .. } | Mutation::Delete { family, .. } => family,
            };
            let state = families
                .get_mut(family)
                .ok_or_else(|| StoreError::UnknownFamily {
                    family: family.clone(),
                })?;

            match mutation {
                Mutation::Insert { key, column, .. } => {
                    state
                        .rows
                        .entry(key.clone())
                        .or_default()
                        .insert(column.name.clone(), column.value.clone());
                }
                Mutation::Delete { key, name, .. } => {
                    if let Some(row) = state.rows.get_mut(key) {
                        row.remove(name);
                        if row.is_empty() {
                            state.rows.remove(key);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl SchemaClient for MemoryStore {
    fn describe_family(&self, name: &str) -> Result<Option<FamilyDefinition>, StoreError> {
        let families = self.families.read().expect("store lock poisoned");
        Ok(families.get(name).map(|state| state.definition.clone()))
    }

    fn create_family(&self, definition: &FamilyDefinition) -> Result<(), StoreError> {
        let mut families = self.families.write().expect("store lock poisoned");
        if families.contains_key(&definition.name) {
            return Err(StoreError::FamilyExists {
                family: definition.name.clone(),
            });
        }
        families.insert(
            definition.name.clone(),
            FamilyState {
                definition: definition.clone(),
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn alter_family(&self, definition: &FamilyDefinition) -> Result<(), StoreError> {
        let mut families = self.families.write().expect("store lock poisoned");
        let state = families
            .get_mut(&definition.name)
            .ok_or_else(|| StoreError::UnknownFamily {
                family: definition.name.clone(),
            })?;
        if state.definition.comparator != definition.comparator {
            return Err(StoreError::Backend {
                message: format!(
                    "family '{}' comparator is immutable ({} != {})",
                    definition.name, state.definition.comparator, definition.comparator
                ),
            });
        }
        state.definition.settings = definition.settings.clone();
        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::Comparator;

    fn store_with_family(name: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_family(&FamilyDefinition {
                name: name.to_string(),
                comparator: Comparator::Bytes,
                settings: Default::default(),
            })
            .unwrap();
        store
    }

    fn insert(store: &MemoryStore, key: &[u8], name: &[u8], value: &[u8]) {
        store
            .mutate(&[Mutation::Insert {
                family: "cf".to_string(),
                key: key.to_vec(),
                column: Column::new(name.to_vec(), value.to_vec()),
            }])
            .unwrap();
    }

    #[test]
    fn range_reads_are_name_ordered_and_counted() {
        let store = store_with_family("cf");
        insert(&store, b"row", b"c", b"3");
        insert(&store, b"row", b"a", b"1");
        insert(&store, b"row", b"b", b"2");

        let columns = store
            .get_slice("cf", b"row", &ColumnSelect::first_page(2))
            .unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, b"a");
        assert_eq!(columns[1].name, b"b");

        let rest = store
            .get_slice(
                "cf",
                b"row",
                &ColumnSelect::Range {
                    start: b"b\x00".to_vec(),
                    end: Vec::new(),
                    count: 10,
                },
            )
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, b"c");
    }

    #[test]
    fn multiget_returns_present_rows_in_key_order() {
        let store = store_with_family("cf");
        insert(&store, b"b", b"n", b"1");
        insert(&store, b"a", b"n", b"2");

        let rows = store
            .multiget_slice(
                "cf",
                &[b"b".to_vec(), b"missing".to_vec(), b"a".to_vec()],
                &ColumnSelect::first_page(10),
            )
            .unwrap();
        let keys: Vec<&[u8]> = rows.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![b"a".as_slice(), b"b".as_slice()]);
    }

    #[test]
    fn deleting_the_last_column_drops_the_row() {
        let store = store_with_family("cf");
        insert(&store, b"row", b"n", b"1");
        store
            .mutate(&[Mutation::Delete {
                family: "cf".to_string(),
                key: b"row".to_vec(),
                name: b"n".to_vec(),
            }])
            .unwrap();

        let rows = store
            .multiget_slice("cf", &[b"row".to_vec()], &ColumnSelect::first_page(10))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn unknown_family_is_an_error() {
        let store = MemoryStore::new();
        let err = store
            .get_slice("nope", b"row", &ColumnSelect::first_page(1))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::UnknownFamily {
                family: "nope".to_string()
            }
        );
    }

    #[test]
    fn comparator_cannot_be_altered() {
        let store = store_with_family("cf");
        let err = store
            .alter_family(&FamilyDefinition {
                name: "cf".to_string(),
                comparator: Comparator::Composite,
                settings: Default::default(),
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend { .. }));
    }
}
