pub mod composite;

use crate::{
    error::InternalError,
    model::{
        entity::EntityMetadata,
        property::PropertyMetadata,
    },
    value::Value,
};
use composite::{Bound, CompositeError};

impl From<CompositeError> for InternalError {
    fn from(err: CompositeError) -> Self {
        Self::codec_corruption(err.to_string())
    }
}

///
/// DecodedName
///
/// Resolution of one stored column name against an entity's metadata:
/// either a mapped property (with the element key for collection members)
/// or an unmapped column routed to the entity's catch-all container.
///

pub enum DecodedName<'a, E> {
    Property {
        property: &'a PropertyMetadata<E>,
        element: Option<Value>,
    },
    Unmapped {
        key: Value,
    },
}

impl<E> std::fmt::Debug for DecodedName<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property { property, element } => f
                .debug_struct("Property")
                .field("name", &property.name)
                .field("element", element)
                .finish(),
            Self::Unmapped { key } => f.debug_struct("Unmapped").field("key", key).finish(),
        }
    }
}

///
/// NameDecodeError
///
/// A name that resolves to no property is skippable: other writers may map
/// columns this entity does not. A name that resolves to a known property
/// but carries an undecodable element key is row corruption and aborts the
/// load.
///

#[derive(Debug)]
pub enum NameDecodeError {
    Unrecognized { reason: String },
    Corrupt { message: String },
}

impl NameDecodeError {
    #[must_use]
    pub const fn aborts_row(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

impl From<NameDecodeError> for InternalError {
    fn from(err: NameDecodeError) -> Self {
        match err {
            NameDecodeError::Unrecognized { reason } => Self::codec_corruption(reason),
            NameDecodeError::Corrupt { message } => Self::codec_corruption(message),
        }
    }
}

///
/// ColumnCodec
///
/// Bidirectional mapping between an entity's properties and stored column
/// names/values. Families with collection properties (or an explicit
/// opt-in) use composite names; all others use bare UTF-8 physical names.
/// The two shapes never mix within one family.
///

pub struct ColumnCodec<'a, E> {
    meta: &'a EntityMetadata<E>,
}

impl<'a, E> ColumnCodec<'a, E> {
    #[must_use]
    pub const fn new(meta: &'a EntityMetadata<E>) -> Self {
        Self { meta }
    }

    /// Stored name of a scalar property, or of a collection property's
    /// name component (never stored alone for collections).
    pub fn property_name(&self, pm: &PropertyMetadata<E>) -> Result<Vec<u8>, CompositeError> {
        if self.meta.use_composite() {
            composite::encode(&[(pm.physical.as_bytes(), Bound::Exact)])
        } else {
            Ok(pm.physical.as_bytes().to_vec())
        }
    }

    /// Stored name of one collection element: the property's physical name
    /// followed by the order-encoded element key.
    pub fn element_name(
        &self,
        pm: &PropertyMetadata<E>,
        element_key: &Value,
    ) -> Result<Vec<u8>, InternalError> {
        let key_kind = pm.kind.element_key_kind().ok_or_else(|| {
            InternalError::model_invariant(format!(
                "{}.{} is not a collection property",
                self.meta.entity_name(),
                pm.name
            ))
        })?;
        let key_bytes = element_key.encode(key_kind).map_err(|err| {
            InternalError::invalid_argument(
                crate::error::ErrorOrigin::Codec,
                format!("element key for {}.{}: {err}", self.meta.entity_name(), pm.name),
            )
        })?;

        composite::encode(&[
            (pm.physical.as_bytes(), Bound::Exact),
            (&key_bytes, Bound::Exact),
        ])
        .map_err(InternalError::from)
    }

    /// Stored name of an unmapped column.
    pub fn unmapped_name(&self, key: &Value) -> Result<Vec<u8>, InternalError> {
        let unmapped = self.meta.unmapped().ok_or_else(|| {
            InternalError::model_invariant(format!(
                "{} has no unmapped-field container",
                self.meta.entity_name()
            ))
        })?;
        let key_bytes = key.encode(unmapped.key_kind).map_err(|err| {
            InternalError::invalid_argument(
                crate::error::ErrorOrigin::Codec,
                format!("unmapped column key for {}: {err}", self.meta.entity_name()),
            )
        })?;

        if self.meta.use_composite() {
            composite::encode(&[(&key_bytes, Bound::Exact)]).map_err(InternalError::from)
        } else {
            Ok(key_bytes)
        }
    }

    /// Half-open name range covering every element of one collection
    /// property: from the bare name component to its `After` bound, which
    /// sorts past all element names.
    pub fn collection_range(
        &self,
        pm: &PropertyMetadata<E>,
    ) -> Result<(Vec<u8>, Vec<u8>), InternalError> {
        if !pm.is_collection() {
            return Err(InternalError::model_invariant(format!(
                "{}.{} is not a collection property",
                self.meta.entity_name(),
                pm.name
            )));
        }
        let start = composite::encode(&[(pm.physical.as_bytes(), Bound::Exact)])?;
        let end = composite::encode(&[(pm.physical.as_bytes(), Bound::After)])?;
        Ok((start, end))
    }

    /// Resolve one stored column name.
    pub fn decode_name(&self, name: &[u8]) -> Result<DecodedName<'a, E>, NameDecodeError> {
        if self.meta.use_composite() {
            self.decode_composite_name(name)
        } else {
            self.decode_bare_name(name)
        }
    }

    fn decode_bare_name(&self, name: &[u8]) -> Result<DecodedName<'a, E>, NameDecodeError> {
        if let Ok(physical) = std::str::from_utf8(name) {
            if let Some(pm) = self.meta.property_by_physical(physical) {
                return Ok(DecodedName::Property {
                    property: pm,
                    element: None,
                });
            }
        }
        self.decode_unmapped(name)
    }

    fn decode_composite_name(&self, name: &[u8]) -> Result<DecodedName<'a, E>, NameDecodeError> {
        let components = composite::decode(name).map_err(|err| NameDecodeError::Unrecognized {
            reason: format!("undecodable composite name: {err}"),
        })?;

        let pm = std::str::from_utf8(components[0])
            .ok()
            .and_then(|physical| self.meta.property_by_physical(physical));

        let Some(pm) = pm else {
            // Writers with a wider mapping may store collections this
            // entity never mapped; the leading component is the unmapped
            // key no matter how many components follow it.
            return self.decode_unmapped(components[0]);
        };

        match (pm.kind.element_key_kind(), components.len()) {
            (None, 1) => Ok(DecodedName::Property {
                property: pm,
                element: None,
            }),
            (Some(key_kind), 2) => {
                let element =
                    Value::decode(key_kind, components[1]).map_err(|err| {
                        NameDecodeError::Corrupt {
                            message: format!(
                                "element key of {}.{}: {err}",
                                self.meta.entity_name(),
                                pm.name
                            ),
                        }
                    })?;
                Ok(DecodedName::Property {
                    property: pm,
                    element: Some(element),
                })
            }
            (_, arity) => Err(NameDecodeError::Corrupt {
                message: format!(
                    "{}.{} stored with {arity} name components",
                    self.meta.entity_name(),
                    pm.name
                ),
            }),
        }
    }

    fn decode_unmapped(&self, key_bytes: &[u8]) -> Result<DecodedName<'a, E>, NameDecodeError> {
        let Some(unmapped) = self.meta.unmapped() else {
            return Err(NameDecodeError::Unrecognized {
                reason: format!(
                    "column resolves to no property of {} (no unmapped container)",
                    self.meta.entity_name()
                ),
            });
        };
        match Value::decode(unmapped.key_kind, key_bytes) {
            Ok(key) => Ok(DecodedName::Unmapped { key }),
            Err(err) => Err(NameDecodeError::Unrecognized {
                reason: format!(
                    "unmapped column name does not decode as {}: {err}",
                    unmapped.key_kind
                ),
            }),
        }
    }

    /// Encode a property value for storage.
    pub fn encode_value(
        &self,
        pm: &PropertyMetadata<E>,
        value: &Value,
    ) -> Result<Vec<u8>, InternalError> {
        value.encode(pm.value_kind).map_err(|err| {
            InternalError::invalid_argument(
                crate::error::ErrorOrigin::Codec,
                format!("{}.{}: {err}", self.meta.entity_name(), pm.name),
            )
        })
    }

    /// Decode a stored property value. Failure is row corruption.
    pub fn decode_value(
        &self,
        pm: &PropertyMetadata<E>,
        bytes: &[u8],
    ) -> Result<Value, InternalError> {
        Value::decode(pm.value_kind, bytes).map_err(|err| {
            InternalError::codec_corruption(format!(
                "stored value of {}.{}: {err}",
                self.meta.entity_name(),
                pm.name
            ))
        })
    }

    /// Decode a stored unmapped-column value.
    pub fn decode_unmapped_value(&self, bytes: &[u8]) -> Result<Value, InternalError> {
        let unmapped = self.meta.unmapped().ok_or_else(|| {
            InternalError::model_invariant(format!(
                "{} has no unmapped-field container",
                self.meta.entity_name()
            ))
        })?;
        Value::decode(unmapped.value_kind, bytes).map_err(|err| {
            InternalError::codec_corruption(format!(
                "unmapped column value of {}: {err}",
                self.meta.entity_name()
            ))
        })
    }

    /// Encode an unmapped-column value for storage.
    pub fn encode_unmapped_value(&self, value: &Value) -> Result<Vec<u8>, InternalError> {
        let unmapped = self.meta.unmapped().ok_or_else(|| {
            InternalError::model_invariant(format!(
                "{} has no unmapped-field container",
                self.meta.entity_name()
            ))
        })?;
        value.encode(unmapped.value_kind).map_err(|err| {
            InternalError::invalid_argument(
                crate::error::ErrorOrigin::Codec,
                format!("unmapped column value for {}: {err}", self.meta.entity_name()),
            )
        })
    }

    /// Encode an entity key into row-key bytes.
    pub fn key_bytes(&self, key: &Value) -> Result<Vec<u8>, InternalError> {
        key.encode(self.meta.key().kind).map_err(|err| {
            InternalError::invalid_argument(
                crate::error::ErrorOrigin::Codec,
                format!("{} key: {err}", self.meta.entity_name()),
            )
        })
    }
}

///
/// TESTS
///
