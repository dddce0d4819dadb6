//! Fixed-width codec for floats and opaque blobs.
//!
//! The element width is written ahead of every record, scalar or array.
//! Floats are stored as their IEEE bits in file byte order; blobs are
//! copied byte for byte.

use std::io::{BufRead, Write};

use tracing::warn;

use super::{Target, read_count, reserve};
use crate::error::{Result, VarpackError};
use crate::flatten::Flat;
use crate::types::{ElemRef, ElemValue, ElementType};
use crate::wire::{Decoder, Encoder};

pub(super) fn write<W: Write>(enc: &mut Encoder<W>, flat: &Flat<'_>) -> Result<()> {
    enc.word(flat.width)?;
    if flat.is_array {
        enc.word(flat.count())?;
    }
    for item in &flat.items {
        match item {
            ElemRef::Float(bits) => enc.uint(*bits, flat.width)?,
            ElemRef::Bytes(bytes) => enc.bytes(bytes)?,
            _ => {}
        }
    }
    Ok(())
}

pub(super) fn read<R: BufRead>(
    dec: &mut Decoder<R>,
    target: &Target,
) -> Result<(usize, Vec<ElemValue>)> {
    let width = dec.word()?;
    check_width(target, width)?;

    let count = read_count(dec, target)?;
    let mut items = reserve(target, count)?;
    for _ in 0..count {
        let item = match target.element {
            ElementType::Float => ElemValue::Float(dec.uint(width)?),
            _ => {
                let mut bytes = reserve::<u8>(target, width)?;
                bytes.resize(width, 0);
                dec.bytes(&mut bytes)?;
                ElemValue::Bytes(bytes)
            }
        };
        items.push(item);
    }
    Ok((width, items))
}

fn check_width(target: &Target, width: usize) -> Result<()> {
    if width == target.width {
        return Ok(());
    }
    let convertible = target.element == ElementType::Float && matches!(width, 4 | 8);
    if convertible && target.lossy {
        warn!(
            variable = %target.label,
            file_width = width,
            target_width = target.width,
            "converting float between widths"
        );
        return Ok(());
    }
    Err(VarpackError::length_mismatch(&target.label, target.width, width))
}
