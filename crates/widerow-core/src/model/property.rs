use crate::value::{Value, ValueError, ValueKind};

///
/// FieldKind
///
/// Shape of a mapped property. Collections are stored as runs of
/// composite-named columns inside the owning row; their presence forces
/// composite column names for the whole entity.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Simple,
    List,
    Map { key: ValueKind },
    SortedMap { key: ValueKind },
}

impl FieldKind {
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        !matches!(self, Self::Simple)
    }

    /// Kind of the collection element key: arbitrary-precision index for
    /// lists, the declared key kind for maps.
    #[must_use]
    pub const fn element_key_kind(&self) -> Option<ValueKind> {
        match self {
            Self::Simple => None,
            Self::List => Some(ValueKind::BigInt),
            Self::Map { key } | Self::SortedMap { key } => Some(*key),
        }
    }
}

///
/// IndexKind
///
/// Index classification of a property. Hash indexes are maintained natively
/// by the store; range indexes are explicit index tables kept consistent
/// through the index WAL protocol.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexKind {
    None,
    Hash,
    Range,
}

///
/// PropertyAccess
///
/// Compile-time-registered typed accessor table for one property. Variant
/// matches the field kind: scalars move single values, collections move
/// whole snapshots (the loader merges element columns into a snapshot and
/// writes it back once per row).
///
/// List slots are `Option<Value>` because sparse lists reconstruct with
/// null placeholders for never-written indices.
///

pub enum PropertyAccess<E> {
    Scalar {
        get: fn(&E) -> Option<Value>,
        set: fn(&mut E, Value) -> Result<(), ValueError>,
    },
    List {
        get: fn(&E) -> Vec<Option<Value>>,
        set: fn(&mut E, Vec<Option<Value>>) -> Result<(), ValueError>,
    },
    Map {
        get: fn(&E) -> Vec<(Value, Value)>,
        set: fn(&mut E, Vec<(Value, Value)>) -> Result<(), ValueError>,
    },
}

///
/// PropertyMetadata
///
/// One mapped property: logical name, physical column name, field and value
/// kinds, index classification, typed accessors, and its change-tracking
/// bit position (assigned at metadata build time).
///

pub struct PropertyMetadata<E> {
    pub name: &'static str,
    pub physical: &'static str,
    pub kind: FieldKind,
    pub value_kind: ValueKind,
    pub index: IndexKind,
    pub access: PropertyAccess<E>,
    pub(crate) dirty_bit: usize,
}

impl<E> PropertyMetadata<E> {
    #[must_use]
    pub fn scalar(
        name: &'static str,
        physical: &'static str,
        value_kind: ValueKind,
        index: IndexKind,
        get: fn(&E) -> Option<Value>,
        set: fn(&mut E, Value) -> Result<(), ValueError>,
    ) -> Self {
        Self {
            name,
            physical,
            kind: FieldKind::Simple,
            value_kind,
            index,
            access: PropertyAccess::Scalar { get, set },
            dirty_bit: 0,
        }
    }

    #[must_use]
    pub fn list(
        name: &'static str,
        physical: &'static str,
        value_kind: ValueKind,
        get: fn(&E) -> Vec<Option<Value>>,
        set: fn(&mut E, Vec<Option<Value>>) -> Result<(), ValueError>,
    ) -> Self {
        Self {
            name,
            physical,
            kind: FieldKind::List,
            value_kind,
            index: IndexKind::None,
            access: PropertyAccess::List { get, set },
            dirty_bit: 0,
        }
    }

    #[must_use]
    pub fn map(
        name: &'static str,
        physical: &'static str,
        key_kind: ValueKind,
        value_kind: ValueKind,
        sorted: bool,
        get: fn(&E) -> Vec<(Value, Value)>,
        set: fn(&mut E, Vec<(Value, Value)>) -> Result<(), ValueError>,
    ) -> Self {
        Self {
            name,
            physical,
            kind: if sorted {
                FieldKind::SortedMap { key: key_kind }
            } else {
                FieldKind::Map { key: key_kind }
            },
            value_kind,
            index: IndexKind::None,
            access: PropertyAccess::Map { get, set },
            dirty_bit: 0,
        }
    }

    /// Position of this property's bit in the entity's change tracker.
    #[must_use]
    pub const fn dirty_bit(&self) -> usize {
        self.dirty_bit
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }
}
