use derive_more::Display;

///
/// Comparator
///
/// Column-name ordering declared on a family. `Bytes` compares raw name
/// bytes; `Composite` is declared for families storing composite names.
/// Both orders agree on the names this crate produces (the composite
/// encoding is order-preserving under byte comparison), but the declared
/// comparator is part of a family's identity and can never be altered.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Comparator {
    Bytes,
    Composite,
}

///
/// Compression
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Compression {
    Lz4,
    Snappy,
    Deflate,
}

///
/// CompactionPolicy
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum CompactionPolicy {
    SizeTiered,
    Leveled,
}

/// Default tombstone grace period, matching the conventional ten days.
pub const DEFAULT_GC_GRACE_SECONDS: u32 = 864_000;

///
/// FamilySettings
///
/// The mutable portion of a family definition: everything the reconciler
/// may alter in place on an existing family.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FamilySettings {
    pub compression: Option<Compression>,
    pub compaction: CompactionPolicy,
    pub gc_grace_seconds: u32,
    /// Encoded column names the store hash-indexes natively.
    pub hash_indexed: Vec<Vec<u8>>,
}

impl Default for FamilySettings {
    fn default() -> Self {
        Self {
            compression: None,
            compaction: CompactionPolicy::SizeTiered,
            gc_grace_seconds: DEFAULT_GC_GRACE_SECONDS,
            hash_indexed: Vec::new(),
        }
    }
}

///
/// FamilyDefinition
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FamilyDefinition {
    pub name: String,
    pub comparator: Comparator,
    pub settings: FamilySettings,
}
