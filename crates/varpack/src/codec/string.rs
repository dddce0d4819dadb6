//! NUL-terminated string codec. Arrays carry an element count first.

use std::io::{BufRead, Write};

use super::{Target, read_count, reserve};
use crate::error::Result;
use crate::flatten::Flat;
use crate::types::{ElemRef, ElemValue};
use crate::wire::{Decoder, Encoder};

pub(super) fn write<W: Write>(enc: &mut Encoder<W>, flat: &Flat<'_>, label: &str) -> Result<()> {
    if flat.is_array {
        enc.word(flat.count())?;
    }
    for item in &flat.items {
        if let ElemRef::Str(text) = item {
            enc.cstr(text, label)?;
        }
    }
    Ok(())
}

pub(super) fn read<R: BufRead>(dec: &mut Decoder<R>, target: &Target) -> Result<Vec<ElemValue>> {
    let count = read_count(dec, target)?;
    let mut items = reserve(target, count)?;
    for _ in 0..count {
        items.push(ElemValue::Str(dec.cstr(&target.label)?));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::tests::target;
    use crate::error::ErrorKind;
    use crate::types::{ElementType, Storage};
    use crate::wire::Endian;

    #[test]
    fn test_scalar_has_no_count() {
        let mut text = "hi".to_string();
        let storage = Storage::Scalar(&mut text);
        let flat = crate::flatten::flatten(&storage, "text").unwrap();
        let mut out = Vec::new();
        write(&mut Encoder::new(&mut out, Endian::Little, 8), &flat, "text").unwrap();
        assert_eq!(out, b"hi\0");
    }

    #[test]
    fn test_array_roundtrip() {
        let mut words = vec!["alpha".to_string(), String::new(), "γ".to_string()];
        let storage = Storage::Vec(&mut words);
        let flat = crate::flatten::flatten(&storage, "words").unwrap();
        let mut out = Vec::new();
        write(&mut Encoder::new(&mut out, Endian::Big, 1), &flat, "words").unwrap();
        assert_eq!(out[0], 3);

        let mut dec = Decoder::new(Cursor::new(out), 8);
        dec.set_layout(Endian::Big, 1);
        let items = read(&mut dec, &target(ElementType::String, true, 0)).unwrap();
        assert_eq!(
            items,
            vec![
                ElemValue::Str("alpha".to_string()),
                ElemValue::Str(String::new()),
                ElemValue::Str("γ".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut dec = Decoder::new(Cursor::new(vec![0xff, 0xfe, 0]), 8);
        let err = read(&mut dec, &target(ElementType::String, false, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadString);
    }
}
