use thiserror::Error as ThisError;

///
/// Composite column-name encoding.
///
/// A composite name is a sequence of components, each encoded as a 2-byte
/// big-endian length, the component bytes, and one bound byte. A name
/// byte-orders before every extension of itself, and an [`Bound::After`]
/// terminator orders after every extension, which is what makes whole
/// collections addressable as one contiguous name range.
///
/// Contract relied on by the paging protocol: within a family, every stored
/// name under one property prefix has the same component count, so the
/// smallest possible stored name strictly greater than a returned one is
/// obtained by incrementing its final byte. Stored names always end in
/// [`Bound::Exact`] (0x00), so the increment never carries.
///

/// Bound byte for a component: `Exact` matches the component itself,
/// `After` sorts immediately past every name extending the component.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Bound {
    Exact,
    After,
}

impl Bound {
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Exact => 0x00,
            Self::After => 0x01,
        }
    }

    const fn try_from_byte(byte: u8) -> Result<Self, CompositeError> {
        match byte {
            0x00 => Ok(Self::Exact),
            0x01 => Ok(Self::After),
            _ => Err(CompositeError::InvalidBound { byte }),
        }
    }
}

///
/// CompositeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum CompositeError {
    #[error("composite component too long: {len} bytes")]
    ComponentTooLong { len: usize },

    #[error("composite name is truncated")]
    Truncated,

    #[error("invalid component bound byte: {byte:#04x}")]
    InvalidBound { byte: u8 },

    #[error("composite name is empty")]
    Empty,
}

/// Encode a sequence of (component, bound) pairs.
pub fn encode(components: &[(&[u8], Bound)]) -> Result<Vec<u8>, CompositeError> {
    if components.is_empty() {
        return Err(CompositeError::Empty);
    }

    let mut out = Vec::with_capacity(components.iter().map(|(c, _)| c.len() + 3).sum());
    for (component, bound) in components {
        let len =
            u16::try_from(component.len()).map_err(|_| CompositeError::ComponentTooLong {
                len: component.len(),
            })?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(component);
        out.push(bound.as_byte());
    }
    Ok(out)
}

/// Decode an encoded composite name into its component byte slices.
pub fn decode(bytes: &[u8]) -> Result<Vec<&[u8]>, CompositeError> {
    if bytes.is_empty() {
        return Err(CompositeError::Empty);
    }

    let mut components = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        if rest.len() < 2 {
            return Err(CompositeError::Truncated);
        }
        let len = usize::from(u16::from_be_bytes([rest[0], rest[1]]));
        if rest.len() < 2 + len + 1 {
            return Err(CompositeError::Truncated);
        }
        components.push(&rest[2..2 + len]);
        Bound::try_from_byte(rest[2 + len])?;
        rest = &rest[2 + len + 1..];
    }
    Ok(components)
}

/// Smallest composite name strictly greater than `last`, used as the
/// inclusive start of the next page. Incrementing the final byte is exact
/// for every name this codec produces (see module contract); a 0xFF final
/// byte cannot occur there, but is still answered correctly by extending
/// the name. Only valid for composite names: see [`next_raw_start`] for
/// families that store raw byte strings.
#[must_use]
pub fn next_page_start(last: &[u8]) -> Vec<u8> {
    let mut out = last.to_vec();
    match out.last_mut() {
        Some(byte) if *byte < 0xFF => *byte += 1,
        _ => out.push(0x00),
    }
    out
}

/// Smallest byte string strictly greater than `last`. Raw names (bare
/// physical names, primary keys) are not prefix-free, so incrementing a
/// byte could skip a stored name that extends `last`; the zero-extension
/// never can.
#[must_use]
pub fn next_raw_start(last: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(last.len() + 1);
    out.extend_from_slice(last);
    out.push(0x00);
    out
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let encoded = encode(&[(b"tags", Bound::Exact), (&[0x07], Bound::Exact)]).unwrap();
        let components = decode(&encoded).unwrap();
        assert_eq!(components, vec![b"tags".as_slice(), [0x07].as_slice()]);
    }

    #[test]
    fn names_order_before_their_extensions() {
        let bare = encode(&[(b"tags", Bound::Exact)]).unwrap();
        let element = encode(&[(b"tags", Bound::Exact), (&[0x01], Bound::Exact)]).unwrap();
        assert!(element.starts_with(&bare));
        assert!(bare < element);
    }

    #[test]
    fn element_names_sort_by_element_key() {
        let a = encode(&[(b"tags", Bound::Exact), (&[0x01], Bound::Exact)]).unwrap();
        let b = encode(&[(b"tags", Bound::Exact), (&[0x02], Bound::Exact)]).unwrap();
        let c = encode(&[(b"tags", Bound::Exact), (&[0x01, 0x00], Bound::Exact)]).unwrap();
        assert!(a < b);
        assert!(b < c, "longer minimal big-endian keys sort after shorter ones");
    }

    #[test]
    fn after_bound_sorts_past_all_extensions() {
        let start = encode(&[(b"tags", Bound::Exact)]).unwrap();
        let element = encode(&[(b"tags", Bound::Exact), (&[0xFF], Bound::Exact)]).unwrap();
        let end = encode(&[(b"tags", Bound::After)]).unwrap();
        assert!(start < element);
        assert!(element < end);
    }

    #[test]
    fn next_page_start_is_immediate_successor() {
        let name = encode(&[(b"tags", Bound::Exact), (&[0x03], Bound::Exact)]).unwrap();
        let next = next_page_start(&name);
        assert!(next > name);

        // No encodable name fits between a stored name and its successor.
        let sibling = encode(&[(b"tags", Bound::Exact), (&[0x04], Bound::Exact)]).unwrap();
        assert!(next < sibling);
    }

    #[test]
    fn raw_successor_orders_before_name_extensions() {
        let next = next_raw_start(b"body");
        assert!(next.as_slice() > b"body".as_slice());
        assert!(next.as_slice() < b"body_html".as_slice());
    }

    #[test]
    fn decode_rejects_malformed_names() {
        assert_eq!(decode(&[]).unwrap_err(), CompositeError::Empty);
        assert_eq!(decode(&[0x00]).unwrap_err(), CompositeError::Truncated);
        assert_eq!(
            decode(&[0x00, 0x01, b'x']).unwrap_err(),
            CompositeError::Truncated
        );
        assert_eq!(
            decode(&[0x00, 0x01, b'x', 0x09]).unwrap_err(),
            CompositeError::InvalidBound { byte: 0x09 }
        );
    }
}
