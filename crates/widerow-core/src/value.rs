use derive_more::Display;
use num_bigint::{BigInt, Sign};
use thiserror::Error as ThisError;

///
/// Value
///
/// Typed column value. Every mapped property declares a [`ValueKind`] and
/// round-trips through the matching byte encoding.
///
/// Encodings used as composite-name components (element keys, index keys)
/// must be order-preserving: the byte-lexicographic order of two encodings,
/// compared after their length prefix, equals the semantic order of the
/// values. Integers are big-endian with the sign bit flipped; doubles use
/// the standard total-order bit transform; big integers are minimal-length
/// big-endian magnitudes, so the (length, bytes) pair orders numerically.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(i64),
}

impl Value {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Encode this value under the declared kind.
    pub fn encode(&self, kind: ValueKind) -> Result<Vec<u8>, ValueError> {
        match (kind, self) {
            (ValueKind::Bool, Self::Bool(v)) => Ok(vec![u8::from(*v)]),
            (ValueKind::Int | ValueKind::Counter, Self::Int(v))
            | (ValueKind::Timestamp, Self::Timestamp(v)) => Ok(encode_i64(*v).to_vec()),
            (ValueKind::BigInt, Self::BigInt(v)) => {
                let (sign, magnitude) = v.to_bytes_be();
                if sign == Sign::Minus {
                    return Err(ValueError::NegativeBigInt);
                }
                Ok(magnitude)
            }
            (ValueKind::Double, Self::Double(v)) => Ok(encode_f64(*v).to_vec()),
            (ValueKind::Text, Self::Text(v)) => Ok(v.as_bytes().to_vec()),
            (ValueKind::Bytes, Self::Bytes(v)) => Ok(v.clone()),
            (expected, found) => Err(ValueError::KindMismatch {
                expected,
                found: found.kind_name(),
            }),
        }
    }

    /// Decode bytes under the declared kind.
    pub fn decode(kind: ValueKind, bytes: &[u8]) -> Result<Self, ValueError> {
        match kind {
            ValueKind::Bool => match bytes {
                [0] => Ok(Self::Bool(false)),
                [1] => Ok(Self::Bool(true)),
                _ => Err(ValueError::InvalidBool { len: bytes.len() }),
            },
            ValueKind::Int | ValueKind::Counter => Ok(Self::Int(decode_i64(kind, bytes)?)),
            ValueKind::Timestamp => Ok(Self::Timestamp(decode_i64(kind, bytes)?)),
            ValueKind::BigInt => Ok(Self::BigInt(BigInt::from_bytes_be(Sign::Plus, bytes))),
            ValueKind::Double => {
                let raw: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| ValueError::InvalidLength {
                        kind,
                        len: bytes.len(),
                    })?;
                Ok(Self::Double(decode_f64(raw)))
            }
            ValueKind::Text => {
                let text = std::str::from_utf8(bytes).map_err(|_| ValueError::InvalidUtf8)?;
                Ok(Self::Text(text.to_string()))
            }
            ValueKind::Bytes => Ok(Self::Bytes(bytes.to_vec())),
        }
    }
}

///
/// ValueKind
///
/// Codec selector for a property or collection key. `Counter` carries an
/// [`Value::Int`] payload; the distinct kind exists because counter
/// accessors dirty their tracking bit on read as well as write.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ValueKind {
    Bool,
    Int,
    BigInt,
    Double,
    Text,
    Bytes,
    Timestamp,
    Counter,
}

///
/// ValueError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ValueError {
    #[error("expected a {expected} value, found {found}")]
    KindMismatch {
        expected: ValueKind,
        found: &'static str,
    },

    #[error("invalid byte length for {kind}: {len}")]
    InvalidLength { kind: ValueKind, len: usize },

    #[error("invalid bool encoding ({len} bytes)")]
    InvalidBool { len: usize },

    #[error("text value is not utf-8")]
    InvalidUtf8,

    #[error("negative big integers are not encodable")]
    NegativeBigInt,
}

// Sign-flipped big-endian, so byte order equals numeric order.
const fn encode_i64(v: i64) -> [u8; 8] {
    ((v as u64) ^ (1 << 63)).to_be_bytes()
}

fn decode_i64(kind: ValueKind, bytes: &[u8]) -> Result<i64, ValueError> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| ValueError::InvalidLength {
        kind,
        len: bytes.len(),
    })?;
    Ok((u64::from_be_bytes(raw) ^ (1 << 63)) as i64)
}

// Total-order transform: positive doubles get the sign bit set, negative
// doubles are fully inverted.
const fn encode_f64(v: f64) -> [u8; 8] {
    let bits = v.to_bits();
    let ordered = if bits & (1 << 63) == 0 {
        bits | (1 << 63)
    } else {
        !bits
    };
    ordered.to_be_bytes()
}

const fn decode_f64(raw: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(raw);
    let bits = if ordered & (1 << 63) != 0 {
        ordered & !(1 << 63)
    } else {
        !ordered
    };
    f64::from_bits(bits)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_encoding_round_trips_and_orders() {
        let inputs = [i64::MIN, -1, 0, 1, 42, i64::MAX];
        let mut encoded: Vec<Vec<u8>> = Vec::new();

        for v in inputs {
            let bytes = Value::Int(v).encode(ValueKind::Int).unwrap();
            assert_eq!(Value::decode(ValueKind::Int, &bytes).unwrap(), Value::Int(v));
            encoded.push(bytes);
        }

        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted, "encoded order must match numeric order");
    }

    #[test]
    fn double_encoding_round_trips_and_orders() {
        let inputs = [f64::NEG_INFINITY, -3.5, -0.0, 0.0, 1.25, f64::INFINITY];
        let mut encoded: Vec<Vec<u8>> = Vec::new();

        for v in inputs {
            let bytes = Value::Double(v).encode(ValueKind::Double).unwrap();
            match Value::decode(ValueKind::Double, &bytes).unwrap() {
                Value::Double(back) => assert_eq!(back.to_bits(), v.to_bits()),
                other => panic!("unexpected decode: {other:?}"),
            }
            encoded.push(bytes);
        }

        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn bigint_encoding_is_minimal_and_rejects_negatives() {
        let zero = Value::BigInt(BigInt::from(0u32))
            .encode(ValueKind::BigInt)
            .unwrap();
        assert_eq!(zero, vec![0]);

        let big = Value::BigInt(BigInt::from(256u32))
            .encode(ValueKind::BigInt)
            .unwrap();
        assert_eq!(big, vec![1, 0]);
        assert_eq!(
            Value::decode(ValueKind::BigInt, &big).unwrap(),
            Value::BigInt(BigInt::from(256u32))
        );

        let err = Value::BigInt(BigInt::from(-1))
            .encode(ValueKind::BigInt)
            .unwrap_err();
        assert_eq!(err, ValueError::NegativeBigInt);
    }

    #[test]
    fn counter_kind_carries_int_payload() {
        let bytes = Value::Int(7).encode(ValueKind::Counter).unwrap();
        assert_eq!(
            Value::decode(ValueKind::Counter, &bytes).unwrap(),
            Value::Int(7)
        );
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let err = Value::Text("x".into()).encode(ValueKind::Int).unwrap_err();
        assert!(matches!(err, ValueError::KindMismatch { .. }));
    }
}
