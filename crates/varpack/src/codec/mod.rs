//! Per-type codec bank.
//!
//! Dispatches a flattened variable to the string, integer or opaque codec
//! on write, and decodes a record payload into a staged [`Decoded`] value
//! on read. Booleans never pass through here; see [`boolean`].

pub(crate) mod boolean;
mod integer;
mod opaque;
mod string;

use std::io::{BufRead, Write};

use crate::error::{Result, VarpackError};
use crate::flatten::Flat;
use crate::types::{ElemValue, ElementType, Variable};
use crate::wire::{Decoder, Encoder};

pub use boolean::BoolQueue;
pub use integer::minimal_width;

/// A decoded record payload waiting to be committed to caller storage.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Decoded {
    /// Tag the record carried on disk.
    pub tag: u8,
    /// Element width declared by the file (0 for strings).
    pub width: usize,
    pub items: Vec<ElemValue>,
}

/// What the reader expects the next payload to decode into.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub label: String,
    pub element: ElementType,
    pub is_array: bool,
    pub width: usize,
    pub min: usize,
    pub max: usize,
    pub capacity: Option<usize>,
    pub lossy: bool,
}

impl Target {
    pub(crate) fn of(variable: &Variable<'_>) -> Self {
        let (min, max) = variable.bounds();
        Self {
            label: variable.label(),
            element: variable.element_type(),
            is_array: variable.alloc_kind().is_array(),
            width: variable.element_width(),
            min,
            max,
            capacity: variable.capacity(),
            lossy: variable.is_lossy(),
        }
    }
}

/// Encode the payload of a non-boolean record.
pub(crate) fn write_payload<W: Write>(
    enc: &mut Encoder<W>,
    flat: &Flat<'_>,
    label: &str,
) -> Result<()> {
    match flat.element {
        ElementType::String => string::write(enc, flat, label),
        ElementType::Signed | ElementType::Unsigned => integer::write(enc, flat),
        ElementType::Float | ElementType::Opaque => opaque::write(enc, flat),
        ElementType::Bool => Err(VarpackError::TypeMismatch {
            variable: label.to_string(),
            expected: ElementType::Bool.tag(false),
            found: flat.tag(),
        }),
    }
}

/// Decode the payload of a record whose tag already matched `target`.
pub(crate) fn read_payload<R: BufRead>(
    dec: &mut Decoder<R>,
    target: &Target,
    tag: u8,
) -> Result<Decoded> {
    let (width, items) = match target.element {
        ElementType::String => (0, string::read(dec, target)?),
        ElementType::Signed | ElementType::Unsigned => integer::read(dec, target)?,
        ElementType::Float | ElementType::Opaque => opaque::read(dec, target)?,
        ElementType::Bool => {
            return Err(VarpackError::TypeMismatch {
                variable: target.label.clone(),
                expected: ElementType::Bool.tag(false),
                found: tag,
            });
        }
    };
    Ok(Decoded { tag, width, items })
}

/// Read an element count for arrays (1 for scalars) and check it against
/// the target's bounds and capacity.
fn read_count<R: BufRead>(dec: &mut Decoder<R>, target: &Target) -> Result<usize> {
    if !target.is_array {
        return Ok(1);
    }
    let count = dec.word()?;
    if count < target.min || count > target.max {
        return Err(VarpackError::OutOfRange {
            variable: target.label.clone(),
            len: count,
            min: target.min,
            max: target.max,
        });
    }
    if let Some(capacity) = target.capacity
        && count > capacity
    {
        return Err(VarpackError::length_mismatch(&target.label, capacity, count));
    }
    Ok(count)
}

/// Largest number of elements reserved up front; the rest grow as they decode.
const INITIAL_RESERVE: usize = 4096;

/// Reserve room for up to [`INITIAL_RESERVE`] of the `count` declared elements.
fn reserve<T>(target: &Target, count: usize) -> Result<Vec<T>> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(count.min(INITIAL_RESERVE))
        .map_err(|_| VarpackError::Alloc {
            variable: target.label.clone(),
            count,
        })?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::ErrorKind;
    use crate::wire::Endian;

    pub(super) fn target(element: ElementType, is_array: bool, width: usize) -> Target {
        Target {
            label: "var".to_string(),
            element,
            is_array,
            width,
            min: 0,
            max: usize::MAX,
            capacity: None,
            lossy: false,
        }
    }

    fn count_bytes(count: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut enc = Encoder::new(&mut out, Endian::Little, 8);
        enc.word(count).unwrap();
        out
    }

    #[test]
    fn test_read_count_bounds() {
        let mut bounded = target(ElementType::Signed, true, 4);
        bounded.min = 2;
        bounded.max = 3;

        for (count, ok) in [(1, false), (2, true), (3, true), (4, false)] {
            let mut dec = Decoder::new(Cursor::new(count_bytes(count)), 8);
            dec.set_layout(Endian::Little, 8);
            let result = read_count(&mut dec, &bounded);
            if ok {
                assert_eq!(result.unwrap(), count);
            } else {
                assert_eq!(result.unwrap_err().kind(), ErrorKind::OutOfRange);
            }
        }
    }

    #[test]
    fn test_read_count_capacity() {
        let mut fixed = target(ElementType::Unsigned, true, 1);
        fixed.capacity = Some(2);
        let mut dec = Decoder::new(Cursor::new(count_bytes(5)), 8);
        dec.set_layout(Endian::Little, 8);
        let err = read_count(&mut dec, &fixed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LengthMismatch);
    }

    #[test]
    fn test_scalar_count_reads_nothing() {
        let mut dec = Decoder::new(Cursor::new(Vec::new()), 8);
        let scalar = target(ElementType::Float, false, 8);
        assert_eq!(read_count(&mut dec, &scalar).unwrap(), 1);
    }

    #[test]
    fn test_reserve_is_capped() {
        let items: Vec<u64> = reserve(&target(ElementType::Unsigned, true, 8), usize::MAX).unwrap();
        assert!(items.capacity() >= INITIAL_RESERVE);
        assert!(items.capacity() < usize::MAX / 16);
    }

    #[test]
    fn test_huge_declared_count_hits_end_of_stream() {
        let mut bytes = count_bytes(1);
        bytes.extend(count_bytes(u32::MAX as usize));
        bytes.extend([1, 2, 3]);
        let mut dec = Decoder::new(Cursor::new(bytes), 8);
        dec.set_layout(Endian::Little, 8);
        let unbounded = target(ElementType::Unsigned, true, 1);
        let err = read_payload(&mut dec, &unbounded, unbounded.element.tag(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileIo);
    }

    #[test]
    fn test_bool_payload_rejected() {
        let mut dec = Decoder::new(Cursor::new(vec![1u8]), 8);
        let flag = target(ElementType::Bool, false, 1);
        let err = read_payload(&mut dec, &flag, 0x02).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
