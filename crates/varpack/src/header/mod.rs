//! File header encoding and decoding.
//!
//! The header is the fixed preamble ahead of the variable records:
//!
//! | Field | Size | Notes |
//! |-------|------|-------|
//! | magic | 4 | [`MAGIC`], byte-reversed when written on an opposite-endian host |
//! | metadata | 1 | see [`Metadata`] |
//! | format version / subversion | 1 + 1 | |
//! | producer version / subversion | 1 + 1 | |
//! | producer | NUL-terminated name or 4-byte id | |
//! | producer description | NUL-terminated | only when descriptions are saved |

mod negotiate;

use std::io::{BufRead, BufReader, Read, Write};

use tracing::debug;

use crate::error::{Result, VarpackError};
use crate::types::{IdMode, Producer, ProducerId, WriterOptions};
use crate::wire::length::check_word_width;
use crate::wire::{Decoder, Encoder, Endian, NATIVE_WORD};

pub(crate) use negotiate::{check_format, check_producer};

/// Format identity at offset 0.
pub const MAGIC: u32 = 0x11BC_1A2E;
/// Container format version; must match exactly.
pub const FORMAT_VERSION: u8 = 2;
/// Container format subversion; files may not exceed it.
pub const FORMAT_SUBVERSION: u8 = 0;

const NUMERIC_IDS: u8 = 0b01;
const DESCRIPTIONS: u8 = 0b10;
const WIDTH_SHIFT: u8 = 2;

/// Contents of the metadata byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    pub id_mode: IdMode,
    pub descriptions: bool,
    /// Writer word width in bytes.
    pub word_width: usize,
}

impl Metadata {
    /// Pack into the on-disk byte.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        let mut byte = (self.word_width as u8) << WIDTH_SHIFT;
        if self.id_mode == IdMode::Numeric {
            byte |= NUMERIC_IDS;
        }
        if self.descriptions {
            byte |= DESCRIPTIONS;
        }
        byte
    }

    /// Unpack the on-disk byte. Word widths outside 1..=8 are rejected.
    pub fn from_byte(byte: u8) -> Result<Self> {
        let word_width = check_word_width(usize::from(byte >> WIDTH_SHIFT))?;
        Ok(Self {
            id_mode: if byte & NUMERIC_IDS != 0 {
                IdMode::Numeric
            } else {
                IdMode::Names
            },
            descriptions: byte & DESCRIPTIONS != 0,
            word_width,
        })
    }
}

/// Header fields as found in a file.
///
/// Readers keep this echo even when a later gate or record fails.
/// `producer` is `None` when decoding stopped before the producer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileHeader {
    /// Magic as read in host byte order.
    pub magic: u32,
    /// Byte order of the file.
    pub endian: Endian,
    pub metadata: Metadata,
    pub format_version: u8,
    pub format_subversion: u8,
    pub producer_version: u8,
    pub producer_subversion: u8,
    pub producer: Option<ProducerId>,
    pub producer_description: Option<String>,
}

impl FileHeader {
    /// Whether the file was written with the opposite byte order.
    #[must_use]
    pub fn is_swapped(&self) -> bool {
        self.endian != Endian::NATIVE
    }
}

/// Whatever a reader decoded of a file's header before it stopped.
///
/// A read that fails inside the fixed preamble still reports the fields it
/// got through.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderEcho {
    /// Decoding stopped before the version bytes.
    Partial {
        /// Magic as read in host byte order.
        magic: u32,
        /// `None` when the magic was not recognised.
        endian: Option<Endian>,
        /// Raw metadata byte, if it was reached.
        metadata_byte: Option<u8>,
    },
    /// The fixed preamble decoded; the producer may still be missing.
    Header(FileHeader),
}

impl HeaderEcho {
    /// Magic as read in host byte order.
    #[must_use]
    pub fn magic(&self) -> u32 {
        match self {
            Self::Partial { magic, .. } => *magic,
            Self::Header(header) => header.magic,
        }
    }

    #[must_use]
    pub fn header(&self) -> Option<&FileHeader> {
        match self {
            Self::Partial { .. } => None,
            Self::Header(header) => Some(header),
        }
    }

    pub(crate) fn header_mut(&mut self) -> Option<&mut FileHeader> {
        match self {
            Self::Partial { .. } => None,
            Self::Header(header) => Some(header),
        }
    }

    /// The decoded header, if the fixed preamble was read.
    #[must_use]
    pub fn into_header(self) -> Option<FileHeader> {
        match self {
            Self::Partial { .. } => None,
            Self::Header(header) => Some(header),
        }
    }
}

/// Write the header for `producer` under `options`.
pub(crate) fn write_header<W: Write>(
    enc: &mut Encoder<W>,
    options: &WriterOptions,
    producer: &Producer,
) -> Result<()> {
    if producer.id.mode() != options.id_mode {
        return Err(VarpackError::missing(
            match options.id_mode {
                IdMode::Names => "producer name",
                IdMode::Numeric => "producer numeric id",
            },
            None,
        ));
    }
    if options.descriptions && producer.description.is_none() {
        return Err(VarpackError::missing("producer description", None));
    }
    if matches!(&producer.id, ProducerId::Name(name) if name.contains('\0'))
        || producer.description.as_deref().is_some_and(|text| text.contains('\0'))
    {
        return Err(VarpackError::bad_string("producer"));
    }

    let metadata = Metadata {
        id_mode: options.id_mode,
        descriptions: options.descriptions,
        word_width: options.word_width,
    };

    enc.u32(MAGIC)?;
    enc.u8(metadata.to_byte())?;
    enc.u8(FORMAT_VERSION)?;
    enc.u8(FORMAT_SUBVERSION)?;
    enc.u8(producer.version)?;
    enc.u8(producer.subversion)?;
    match &producer.id {
        ProducerId::Name(name) => enc.cstr(name, "producer name")?,
        ProducerId::Numeric(id) => enc.u32(*id)?,
    }
    if let (true, Some(description)) = (options.descriptions, &producer.description) {
        enc.cstr(description, "producer description")?;
    }

    debug!(
        producer = %producer.id,
        version = producer.version,
        subversion = producer.subversion,
        endian = %enc.endian(),
        word_width = options.word_width,
        "wrote header"
    );
    Ok(())
}

/// Read magic, metadata and version bytes, and switch the decoder to the
/// file's byte order and word width.
///
/// `echo` is updated after every field, so it holds as much of the header
/// as was decoded when an error is returned.
pub(crate) fn read_preamble<R: BufRead>(
    dec: &mut Decoder<R>,
    echo: &mut Option<HeaderEcho>,
) -> Result<()> {
    *echo = None;
    let magic = dec.u32()?;
    let endian = if magic == MAGIC {
        Some(Endian::NATIVE)
    } else if magic == MAGIC.swap_bytes() {
        Some(Endian::NATIVE.opposite())
    } else {
        None
    };
    *echo = Some(HeaderEcho::Partial {
        magic,
        endian,
        metadata_byte: None,
    });
    let Some(endian) = endian else {
        return Err(VarpackError::BadFormat { found: magic });
    };

    let byte = dec.u8()?;
    *echo = Some(HeaderEcho::Partial {
        magic,
        endian: Some(endian),
        metadata_byte: Some(byte),
    });
    let metadata = Metadata::from_byte(byte)?;
    dec.set_layout(endian, metadata.word_width);

    let header = FileHeader {
        magic,
        endian,
        metadata,
        format_version: dec.u8()?,
        format_subversion: dec.u8()?,
        producer_version: dec.u8()?,
        producer_subversion: dec.u8()?,
        producer: None,
        producer_description: None,
    };
    debug!(
        %endian,
        word_width = metadata.word_width,
        id_mode = %metadata.id_mode,
        format_version = header.format_version,
        format_subversion = header.format_subversion,
        "read preamble"
    );
    *echo = Some(HeaderEcho::Header(header));
    Ok(())
}

/// Read the producer identity and description into `header`.
pub(crate) fn read_producer<R: BufRead>(
    dec: &mut Decoder<R>,
    header: &mut FileHeader,
) -> Result<()> {
    let producer = match header.metadata.id_mode {
        IdMode::Names => ProducerId::Name(dec.cstr("producer name")?),
        IdMode::Numeric => ProducerId::Numeric(dec.u32()?),
    };
    header.producer = Some(producer);
    if header.metadata.descriptions {
        header.producer_description = Some(dec.cstr("producer description")?);
    }
    Ok(())
}

/// Decode a file's header without any compatibility checks.
///
/// ```
/// use std::io::Cursor;
/// use varpack::{Producer, Schema, VarWriter, WriterOptions, peek_header};
///
/// let mut writer = VarWriter::new(Vec::new(), WriterOptions::new(), Producer::named("demo"))?;
/// writer.write(&Schema::new())?;
/// let bytes = writer.into_inner()?;
///
/// let header = peek_header(Cursor::new(bytes))?;
/// assert_eq!(header.producer_version, 1);
/// # Ok::<(), varpack::VarpackError>(())
/// ```
pub fn peek_header<R: Read>(reader: R) -> Result<FileHeader> {
    let mut dec = Decoder::new(BufReader::new(reader), NATIVE_WORD);
    let mut echo = None;
    read_preamble(&mut dec, &mut echo)?;
    let mut header = echo
        .and_then(HeaderEcho::into_header)
        .ok_or_else(|| VarpackError::missing("file header", None))?;
    read_producer(&mut dec, &mut header)?;
    Ok(header)
}
