//! Reader and writer options.

use std::fmt;

use crate::error::{Result, VarpackError};
use crate::wire::{Endian, NATIVE_WORD, length::check_word_width};

/// How variables and the producer are identified on disk.
///
/// | Mode | Variable identifier | Producer identity |
/// |------|---------------------|-------------------|
/// | `Names` | NUL-terminated name | NUL-terminated name |
/// | `Numeric` | 1-byte id | 4-byte id |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdMode {
    /// Identify by name (default).
    #[default]
    Names,
    /// Identify by numeric id.
    Numeric,
}

impl fmt::Display for IdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Names => write!(f, "names"),
            Self::Numeric => write!(f, "numeric"),
        }
    }
}

/// Identity of the program that wrote a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProducerId {
    Name(String),
    Numeric(u32),
}

impl ProducerId {
    /// Identifier mode this identity belongs to.
    #[must_use]
    pub fn mode(&self) -> IdMode {
        match self {
            Self::Name(_) => IdMode::Names,
            Self::Numeric(_) => IdMode::Numeric,
        }
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "`{name}`"),
            Self::Numeric(id) => write!(f, "{id:#010x}"),
        }
    }
}

/// Producer identity and version, written by the writer and expected by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Producer {
    pub id: ProducerId,
    pub description: Option<String>,
    /// Incremented when compatibility breaks; must match exactly.
    pub version: u8,
    /// Incremented when features are added; the file's must not exceed the reader's.
    pub subversion: u8,
}

impl Producer {
    /// Producer identified by name, version 1.0.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: ProducerId::Name(name.into()),
            description: None,
            version: 1,
            subversion: 0,
        }
    }

    /// Producer identified by numeric id, version 1.0.
    #[must_use]
    pub fn numeric(id: u32) -> Self {
        Self {
            id: ProducerId::Numeric(id),
            description: None,
            version: 1,
            subversion: 0,
        }
    }

    /// Set version and subversion.
    #[must_use]
    pub fn with_version(mut self, version: u8, subversion: u8) -> Self {
        self.version = version;
        self.subversion = subversion;
        self
    }

    /// Set the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Options for writing variable files.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Identifier mode (default: names).
    pub id_mode: IdMode,
    /// Save descriptions of the producer and every variable (default: false).
    pub descriptions: bool,
    /// Byte order of multi-byte fields (default: host order).
    pub endian: Endian,
    /// Width of length and count fields in bytes (default: host word).
    pub word_width: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            id_mode: IdMode::Names,
            descriptions: false,
            endian: Endian::NATIVE,
            word_width: NATIVE_WORD,
        }
    }
}

impl WriterOptions {
    /// Create writer options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier mode.
    #[must_use]
    pub fn with_id_mode(mut self, mode: IdMode) -> Self {
        self.id_mode = mode;
        self
    }

    /// Identify variables and producer numerically.
    #[must_use]
    pub fn numeric(mut self) -> Self {
        self.id_mode = IdMode::Numeric;
        self
    }

    /// Save descriptions.
    #[must_use]
    pub fn with_descriptions(mut self, enable: bool) -> Self {
        self.descriptions = enable;
        self
    }

    /// Write with the given byte order.
    #[must_use]
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Write length fields with the given width in bytes.
    #[must_use]
    pub fn with_word_width(mut self, width: usize) -> Self {
        self.word_width = width;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_word_width(self.word_width)?;
        Ok(())
    }
}

/// Options for reading variable files.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Word width of the reading host in bytes (default: host word).
    pub word_width: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            word_width: NATIVE_WORD,
        }
    }
}

impl ReaderOptions {
    /// Create reader options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read as if the host word were `width` bytes.
    #[must_use]
    pub fn with_word_width(mut self, width: usize) -> Self {
        self.word_width = width;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_word_width(self.word_width)?;
        if self.word_width > NATIVE_WORD {
            return Err(VarpackError::UnsupportedWordWidth {
                width: self.word_width,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_options() {
        let opts = WriterOptions::new()
            .numeric()
            .with_descriptions(true)
            .with_endian(Endian::Big)
            .with_word_width(4);

        assert_eq!(opts.id_mode, IdMode::Numeric);
        assert!(opts.descriptions);
        assert_eq!(opts.endian, Endian::Big);
        assert_eq!(opts.word_width, 4);
        assert!(opts.validate().is_ok());
        assert!(opts.with_word_width(0).validate().is_err());
    }

    #[test]
    fn test_reader_options_limits() {
        assert!(ReaderOptions::new().validate().is_ok());
        assert!(ReaderOptions::new().with_word_width(4).validate().is_ok());
        assert!(ReaderOptions::new().with_word_width(16).validate().is_err());
    }

    #[test]
    fn test_producer_builders() {
        let producer = Producer::named("demo")
            .with_version(2, 3)
            .with_description("Demo program");
        assert_eq!(producer.id, ProducerId::Name("demo".to_string()));
        assert_eq!(producer.id.mode(), IdMode::Names);
        assert_eq!((producer.version, producer.subversion), (2, 3));

        let producer = Producer::numeric(0xcafe);
        assert_eq!(producer.id.mode(), IdMode::Numeric);
        assert_eq!(producer.id.to_string(), "0x0000cafe");
    }
}
