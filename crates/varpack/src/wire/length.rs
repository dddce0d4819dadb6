//! Portable length codec.
//!
//! Counts and lengths are stored in exactly the writer's word width. A
//! reader with a narrower word accepts the value only when every excess
//! high-order byte is zero; a reader with a wider word simply widens it.

use crate::error::{Result, VarpackError};

use super::Endian;

/// Word width of the running host, in bytes.
pub const NATIVE_WORD: usize = std::mem::size_of::<usize>();

/// Largest supported word width, in bytes.
pub const MAX_WORD: usize = 8;

/// Reject word widths outside `1..=8`.
pub fn check_word_width(width: usize) -> Result<usize> {
    if (1..=MAX_WORD).contains(&width) {
        Ok(width)
    } else {
        Err(VarpackError::UnsupportedWordWidth { width })
    }
}

/// Number of bytes needed to hold `value` (at least one).
#[must_use]
pub fn significant_bytes(value: u64) -> usize {
    let bits = (u64::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8).max(1)
}

/// Encode `value` into `buf`, whose length is the writer's word width.
pub fn encode_word(buf: &mut [u8], value: u64, endian: Endian) -> Result<()> {
    let width = buf.len();
    let needed = significant_bytes(value);
    if needed > width {
        return Err(VarpackError::arch("length field", needed, width));
    }
    endian.write_uint(buf, value);
    Ok(())
}

/// Decode a word-sized field written with `raw.len()` bytes on a host whose
/// word is `host_width` bytes.
pub fn decode_word(raw: &[u8], host_width: usize, endian: Endian) -> Result<usize> {
    let file_width = raw.len();
    let value = if file_width <= host_width {
        endian.read_uint(raw)
    } else {
        let (high, low) = endian.split_high(raw, host_width);
        if high.iter().any(|&byte| byte != 0) {
            let needed = significant_bytes(endian.read_uint(raw));
            return Err(VarpackError::arch("length field", needed, host_width));
        }
        endian.read_uint(low)
    };

    usize::try_from(value)
        .map_err(|_| VarpackError::arch("length field", significant_bytes(value), NATIVE_WORD))
}
