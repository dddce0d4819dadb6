//! Byte order of multi-byte fields.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order used for every multi-byte field after the magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl Endian {
    /// Byte order of the running host.
    pub const NATIVE: Self = if cfg!(target_endian = "big") {
        Self::Big
    } else {
        Self::Little
    };

    /// The other byte order.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Little => Self::Big,
            Self::Big => Self::Little,
        }
    }

    /// Read an unsigned integer occupying all of `buf` (1 to 8 bytes).
    pub(crate) fn read_uint(self, buf: &[u8]) -> u64 {
        match self {
            Self::Little => LittleEndian::read_uint(buf, buf.len()),
            Self::Big => BigEndian::read_uint(buf, buf.len()),
        }
    }

    /// Write `value` into all of `buf` (1 to 8 bytes). `value` must fit.
    pub(crate) fn write_uint(self, buf: &mut [u8], value: u64) {
        let nbytes = buf.len();
        match self {
            Self::Little => LittleEndian::write_uint(buf, value, nbytes),
            Self::Big => BigEndian::write_uint(buf, value, nbytes),
        }
    }

    /// Split a field into its (high-order, low-order) parts, keeping `low` bytes.
    pub(crate) fn split_high(self, raw: &[u8], low: usize) -> (&[u8], &[u8]) {
        match self {
            Self::Little => {
                let (low_bytes, high_bytes) = raw.split_at(low);
                (high_bytes, low_bytes)
            }
            Self::Big => raw.split_at(raw.len() - low),
        }
    }
}

impl Default for Endian {
    fn default() -> Self {
        Self::NATIVE
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => write!(f, "little-endian"),
            Self::Big => write!(f, "big-endian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_both_orders() {
        let mut buf = [0u8; 3];
        Endian::Little.write_uint(&mut buf, 0x010203);
        assert_eq!(buf, [0x03, 0x02, 0x01]);
        assert_eq!(Endian::Little.read_uint(&buf), 0x010203);

        Endian::Big.write_uint(&mut buf, 0x010203);
        assert_eq!(buf, [0x01, 0x02, 0x03]);
        assert_eq!(Endian::Big.read_uint(&buf), 0x010203);
    }

    #[test]
    fn test_split_high() {
        let raw = [1, 2, 3, 4, 5, 6, 7, 8];
        let (high, low) = Endian::Little.split_high(&raw, 4);
        assert_eq!(high, &[5, 6, 7, 8]);
        assert_eq!(low, &[1, 2, 3, 4]);

        let (high, low) = Endian::Big.split_high(&raw, 4);
        assert_eq!(high, &[1, 2, 3, 4]);
        assert_eq!(low, &[5, 6, 7, 8]);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Endian::NATIVE.opposite().opposite(), Endian::NATIVE);
        assert_ne!(Endian::NATIVE.opposite(), Endian::NATIVE);
    }
}
