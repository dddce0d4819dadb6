//! Low-level field encoding shared by the header and the variable codecs.
//!
//! [`Encoder`] and [`Decoder`] carry the negotiated byte order and word
//! widths so that higher layers never deal with raw endianness.

mod endian;
pub mod length;

use std::io::{BufRead, Write};

pub use endian::Endian;
pub use length::{MAX_WORD, NATIVE_WORD};

use crate::error::{Result, VarpackError};

/// Writes fields in a fixed byte order and word width.
pub(crate) struct Encoder<W> {
    inner: W,
    endian: Endian,
    word: usize,
}

impl<W: Write> Encoder<W> {
    pub(crate) fn new(inner: W, endian: Endian, word: usize) -> Self {
        Self {
            inner,
            endian,
            word,
        }
    }

    pub(crate) fn endian(&self) -> Endian {
        self.endian
    }

    pub(crate) fn u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_all(&[value])?;
        Ok(())
    }

    pub(crate) fn u32(&mut self, value: u32) -> Result<()> {
        self.uint(u64::from(value), 4)
    }

    /// Write the low `width` bytes of `value`.
    pub(crate) fn uint(&mut self, value: u64, width: usize) -> Result<()> {
        let mut buf = [0u8; 8];
        let mask = if width >= 8 {
            u64::MAX
        } else {
            (1u64 << (width * 8)) - 1
        };
        self.endian.write_uint(&mut buf[..width], value & mask);
        self.inner.write_all(&buf[..width])?;
        Ok(())
    }

    /// Write a count or length in the writer's word width.
    pub(crate) fn word(&mut self, value: usize) -> Result<()> {
        let mut buf = [0u8; MAX_WORD];
        let raw = &mut buf[..self.word];
        length::encode_word(raw, value as u64, self.endian)?;
        self.inner.write_all(raw)?;
        Ok(())
    }

    /// Write a NUL-terminated string.
    pub(crate) fn cstr(&mut self, value: &str, context: &str) -> Result<()> {
        if value.as_bytes().contains(&0) {
            return Err(VarpackError::bad_string(context));
        }
        self.inner.write_all(value.as_bytes())?;
        self.inner.write_all(&[0])?;
        Ok(())
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads fields using the byte order and word width negotiated from the header.
pub(crate) struct Decoder<R> {
    inner: R,
    endian: Endian,
    file_word: usize,
    host_word: usize,
}

impl<R: BufRead> Decoder<R> {
    /// Until the header is negotiated the file is assumed to match the host.
    pub(crate) fn new(inner: R, host_word: usize) -> Self {
        Self {
            inner,
            endian: Endian::NATIVE,
            file_word: host_word,
            host_word,
        }
    }

    pub(crate) fn set_layout(&mut self, endian: Endian, file_word: usize) {
        self.endian = endian;
        self.file_word = file_word;
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        // Four bytes always fit in a u32.
        Ok(self.uint(4)? as u32)
    }

    /// Read a `width`-byte unsigned field (1 to 8 bytes).
    pub(crate) fn uint(&mut self, width: usize) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.inner.read_exact(&mut buf[..width])?;
        Ok(self.endian.read_uint(&buf[..width]))
    }

    /// Read a count or length written in the file's word width.
    pub(crate) fn word(&mut self) -> Result<usize> {
        let mut buf = [0u8; MAX_WORD];
        let raw = &mut buf[..self.file_word];
        self.inner.read_exact(raw)?;
        length::decode_word(raw, self.host_word, self.endian)
    }

    /// Read a NUL-terminated string.
    pub(crate) fn cstr(&mut self, context: &str) -> Result<String> {
        let mut buf = Vec::new();
        self.inner.read_until(0, &mut buf)?;
        if buf.pop() != Some(0) {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        String::from_utf8(buf).map_err(|_| VarpackError::bad_string(context))
    }

    pub(crate) fn bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf)?;
        Ok(())
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}
