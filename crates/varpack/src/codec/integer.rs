//! Minimal-width integer codec.
//!
//! A block of integers (a scalar is a block of one) is stored with the
//! smallest uniform byte width that keeps every value intact. Signed values
//! keep one extra sign bit so they sign-extend back correctly.

use std::io::{BufRead, Write};

use tracing::trace;

use super::{Target, read_count, reserve};
use crate::error::{Result, VarpackError};
use crate::flatten::Flat;
use crate::types::{ElemRef, ElemValue, ElementType, Integer};
use crate::wire::{Decoder, Encoder, MAX_WORD};

/// Smallest byte width that preserves every value in `values`.
///
/// Never less than one byte, even for an empty or all-zero block.
///
/// ```
/// assert_eq!(varpack::minimal_width(&[0i8, 1, -1, 127, -128]), 1);
/// assert_eq!(varpack::minimal_width(&[300u32]), 2);
/// assert_eq!(varpack::minimal_width(&[128i16]), 2);
/// ```
#[must_use]
pub fn minimal_width<T: Integer>(values: &[T]) -> usize {
    width_of(values.iter().map(|value| match value.view() {
        ElemRef::Int(wide) => wide,
        _ => 0,
    }), T::SIGNED)
}

fn width_of(values: impl Iterator<Item = i128>, signed: bool) -> usize {
    values
        .map(|value| {
            let bits = if signed {
                // Magnitude bits of the value plus one sign bit.
                let magnitude = if value < 0 { !value } else { value };
                128 - magnitude.leading_zeros() as usize + 1
            } else {
                128 - value.leading_zeros() as usize
            };
            bits.div_ceil(8)
        })
        .max()
        .unwrap_or(1)
        .max(1)
}

pub(super) fn write<W: Write>(enc: &mut Encoder<W>, flat: &Flat<'_>) -> Result<()> {
    let signed = flat.element == ElementType::Signed;
    let values: Vec<i128> = flat
        .items
        .iter()
        .map(|item| match item {
            ElemRef::Int(value) => *value,
            _ => 0,
        })
        .collect();

    let width = width_of(values.iter().copied(), signed);
    trace!(declared = flat.width, chosen = width, count = values.len(), "integer width");

    enc.word(width)?;
    if flat.is_array {
        enc.word(values.len())?;
    }
    for value in values {
        // Truncation keeps the low `width` bytes of the two's complement form.
        enc.uint(value as u64, width)?;
    }
    Ok(())
}

pub(super) fn read<R: BufRead>(
    dec: &mut Decoder<R>,
    target: &Target,
) -> Result<(usize, Vec<ElemValue>)> {
    let width = dec.word()?;
    if width == 0 {
        return Err(VarpackError::length_mismatch(&target.label, target.width, 0));
    }
    if width > MAX_WORD {
        return Err(VarpackError::arch("integer width", width, MAX_WORD));
    }

    let count = read_count(dec, target)?;
    let signed = target.element == ElementType::Signed;
    let mut items = reserve(target, count)?;
    for _ in 0..count {
        let raw = dec.uint(width)?;
        let value = if signed {
            sign_extend(raw, width)
        } else {
            i128::from(raw)
        };
        items.push(ElemValue::Int(value));
    }
    trace!(variable = %target.label, width, count, "decoded integers");
    Ok((width, items))
}

fn sign_extend(raw: u64, width: usize) -> i128 {
    let shift = (8 - width) * 8;
    i128::from(((raw << shift) as i64) >> shift)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;
    use crate::codec::tests::target;
    use crate::error::ErrorKind;
    use crate::types::Storage;
    use crate::wire::Endian;

    fn encode<T: Integer>(values: &mut Vec<T>, endian: Endian) -> Vec<u8> {
        let storage = Storage::Vec(values);
        let flat = crate::flatten::flatten(&storage, "ints").unwrap();
        let mut out = Vec::new();
        let mut enc = Encoder::new(&mut out, endian, 8);
        write(&mut enc, &flat).unwrap();
        out
    }

    fn decode(bytes: Vec<u8>, endian: Endian, element: ElementType, width: usize) -> Vec<i128> {
        let mut dec = Decoder::new(Cursor::new(bytes), 8);
        dec.set_layout(endian, 8);
        let (_, items) = read(&mut dec, &target(element, true, width)).unwrap();
        items
            .into_iter()
            .map(|item| match item {
                ElemValue::Int(value) => value,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_minimal_width_signed_bytes() {
        assert_eq!(minimal_width(&[0i8, 1, -1, 127, -128]), 1);
        assert_eq!(minimal_width(&[0i64, 0, 0]), 1);
        assert_eq!(minimal_width::<i32>(&[]), 1);
        assert_eq!(minimal_width(&[-129i32]), 2);
        assert_eq!(minimal_width(&[i64::MIN]), 8);
    }

    #[test]
    fn test_minimal_width_unsigned() {
        assert_eq!(minimal_width(&[300u32]), 2);
        assert_eq!(minimal_width(&[255u16]), 1);
        assert_eq!(minimal_width(&[u64::MAX]), 8);
    }

    #[test]
    fn test_layout_little_endian() {
        let bytes = encode(&mut vec![300u32, 1], Endian::Little);
        // width word, count word, then two 2-byte elements
        let mut expected = vec![2, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0];
        expected.extend([0x2c, 0x01, 0x01, 0x00]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_signed_roundtrip_both_endians() {
        for endian in [Endian::Little, Endian::Big] {
            let bytes = encode(&mut vec![0i8, 1, -1, 127, -128], endian);
            let values = decode(bytes, endian, ElementType::Signed, 1);
            assert_eq!(values, vec![0, 1, -1, 127, -128]);
        }
    }

    #[test]
    fn test_zero_width_rejected() {
        let mut dec = Decoder::new(Cursor::new(vec![0u8; 8]), 8);
        dec.set_layout(Endian::Little, 8);
        let err = read(&mut dec, &target(ElementType::Signed, false, 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LengthMismatch);
    }

    #[test]
    fn test_oversized_width_rejected() {
        let mut dec = Decoder::new(Cursor::new(vec![16, 0, 0, 0, 0, 0, 0, 0]), 8);
        dec.set_layout(Endian::Little, 8);
        let err = read(&mut dec, &target(ElementType::Unsigned, false, 8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arch);
    }

    proptest! {
        #[test]
        fn prop_i32_roundtrip(values in prop::collection::vec(any::<i32>(), 0..32)) {
            let mut copy = values.clone();
            let bytes = encode(&mut copy, Endian::Big);
            let decoded = decode(bytes, Endian::Big, ElementType::Signed, 4);
            let expected: Vec<i128> = values.iter().map(|&v| i128::from(v)).collect();
            prop_assert_eq!(decoded, expected);
        }

        #[test]
        fn prop_width_never_exceeds_declared(values in prop::collection::vec(any::<i16>(), 1..16)) {
            let width = minimal_width(&values);
            prop_assert!((1..=2).contains(&width));
        }

        #[test]
        fn prop_u64_roundtrip(values in prop::collection::vec(any::<u64>(), 0..16)) {
            let mut copy = values.clone();
            let bytes = encode(&mut copy, Endian::Little);
            let decoded = decode(bytes, Endian::Little, ElementType::Unsigned, 8);
            let expected: Vec<i128> = values.iter().map(|&v| i128::from(v)).collect();
            prop_assert_eq!(decoded, expected);
        }
    }
}
