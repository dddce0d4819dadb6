//! Error types for variable file operations.
//!
//! Every failure is terminal for the call that produced it. Each
//! [`VarpackError`] variant belongs to exactly one [`ErrorKind`], and every
//! kind has a stable diagnostic name and numeric code.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::header::HeaderEcho;

/// Errors that can occur when saving or restoring variables.
#[derive(Debug, Error)]
pub enum VarpackError {
    /// Underlying read, write or close failed (including truncated files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found when opening by path.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Storage for a decoded array could not be reserved.
    #[error("failed to allocate {count} elements for {variable}")]
    Alloc { variable: String, count: usize },

    /// A value in the file needs more bytes than this host can represent.
    #[error("{context} needs {needed} bytes but only {available} are available on this host")]
    Arch {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// Word width outside the supported range.
    #[error("unsupported word width: {width} bytes")]
    UnsupportedWordWidth { width: usize },

    /// Neither the magic number nor its byte-reversed form matched.
    #[error("not a variable file: bad magic {found:#010x}")]
    BadFormat { found: u32 },

    /// Container format version is incompatible.
    #[error("format version {found}.{found_sub} is incompatible with reader {expected}.{expected_sub}")]
    FormatVersion {
        expected: u8,
        expected_sub: u8,
        found: u8,
        found_sub: u8,
    },

    /// Producer version is incompatible.
    #[error("producer version {found}.{found_sub} is incompatible with expected {expected}.{expected_sub}")]
    ProducerVersion {
        expected: u8,
        expected_sub: u8,
        found: u8,
        found_sub: u8,
    },

    /// File was written by a different producer.
    #[error("producer mismatch: expected {expected}, found {found}")]
    ProducerIdentity { expected: String, found: String },

    /// Identifier in the file does not exist in the reader's schema.
    #[error("unknown variable: {id}")]
    UnknownVariable { id: String },

    /// Record tag disagrees with the resolved variable's declared type.
    #[error("type mismatch for {variable}: expected tag {expected:#04x}, found {found:#04x}")]
    TypeMismatch {
        variable: String,
        expected: u8,
        found: u8,
    },

    /// Declared element width or element count disagrees with the target.
    #[error("length mismatch for {variable}: expected {expected}, found {found}")]
    LengthMismatch {
        variable: String,
        expected: usize,
        found: usize,
    },

    /// Array length outside the variable's inclusive bounds.
    #[error("array length {len} for {variable} is outside [{min}, {max}]")]
    OutOfRange {
        variable: String,
        len: usize,
        min: usize,
        max: usize,
    },

    /// A name, id or description required by the metadata mode is absent.
    #[error("missing {field}{}", fmt_owner(.variable))]
    MissingField {
        field: &'static str,
        variable: Option<String>,
    },

    /// Owned storage was empty where a value was required.
    #[error("no data to write for {variable}")]
    NullData { variable: String },

    /// Both or neither of a path and a handle were supplied.
    #[error("invalid file target: {message}")]
    BadTarget { message: &'static str },

    /// String contains an interior NUL or is not valid UTF-8.
    #[error("invalid string in {context}")]
    BadString { context: String },

    /// Two schema entries share the same identifier.
    #[error("duplicate variable identifier: {id}")]
    DuplicateId { id: String },
}

fn fmt_owner(variable: &Option<String>) -> String {
    variable
        .as_deref()
        .map(|name| format!(" for {name}"))
        .unwrap_or_default()
}

/// Result type alias for variable file operations.
pub type Result<T> = std::result::Result<T, VarpackError>;

impl VarpackError {
    /// The taxonomy entry this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::FileNotFound { .. } => ErrorKind::FileIo,
            Self::Alloc { .. } => ErrorKind::Alloc,
            Self::Arch { .. } | Self::UnsupportedWordWidth { .. } => ErrorKind::Arch,
            Self::BadFormat { .. } => ErrorKind::BadFormat,
            Self::FormatVersion { .. } => ErrorKind::FormatVersion,
            Self::ProducerVersion { .. } => ErrorKind::ProducerVersion,
            Self::ProducerIdentity { .. } => ErrorKind::ProducerIdentity,
            Self::UnknownVariable { .. } => ErrorKind::UnknownVariable,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::NullData { .. } => ErrorKind::NullData,
            Self::BadTarget { .. } => ErrorKind::BadTarget,
            Self::BadString { .. } => ErrorKind::BadString,
            Self::DuplicateId { .. } => ErrorKind::DuplicateId,
        }
    }

    pub(crate) fn arch(context: &'static str, needed: usize, available: usize) -> Self {
        Self::Arch {
            context,
            needed,
            available,
        }
    }

    pub(crate) fn missing(field: &'static str, variable: Option<&str>) -> Self {
        Self::MissingField {
            field,
            variable: variable.map(str::to_string),
        }
    }

    pub(crate) fn bad_string(context: impl Into<String>) -> Self {
        Self::BadString {
            context: context.into(),
        }
    }

    pub(crate) fn length_mismatch(variable: &str, expected: usize, found: usize) -> Self {
        Self::LengthMismatch {
            variable: variable.to_string(),
            expected,
            found,
        }
    }
}

/// A failed [`load_vars`](crate::load_vars) call.
///
/// `echo` holds the part of the file header decoded before the failure,
/// or `None` when not even the magic number could be read.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct LoadError {
    pub error: VarpackError,
    pub echo: Option<HeaderEcho>,
}

impl LoadError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl From<VarpackError> for LoadError {
    fn from(error: VarpackError) -> Self {
        Self { error, echo: None }
    }
}

impl From<LoadError> for VarpackError {
    fn from(err: LoadError) -> Self {
        err.error
    }
}

/// Discrete outcome categories reported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileIo,
    Alloc,
    Arch,
    BadFormat,
    FormatVersion,
    ProducerVersion,
    ProducerIdentity,
    UnknownVariable,
    TypeMismatch,
    LengthMismatch,
    OutOfRange,
    MissingField,
    NullData,
    BadTarget,
    BadString,
    DuplicateId,
}

impl ErrorKind {
    /// Every kind, ordered by code.
    pub const ALL: [ErrorKind; 16] = [
        Self::FileIo,
        Self::Alloc,
        Self::Arch,
        Self::BadFormat,
        Self::FormatVersion,
        Self::ProducerVersion,
        Self::ProducerIdentity,
        Self::UnknownVariable,
        Self::TypeMismatch,
        Self::LengthMismatch,
        Self::OutOfRange,
        Self::MissingField,
        Self::NullData,
        Self::BadTarget,
        Self::BadString,
        Self::DuplicateId,
    ];

    /// Stable diagnostic name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FileIo => "FILEIO_ERR",
            Self::Alloc => "MALLOC_ERR",
            Self::Arch => "BAD_ARCH",
            Self::BadFormat => "BAD_FORMAT",
            Self::FormatVersion => "BAD_FORMAT_VER",
            Self::ProducerVersion => "BAD_PROG_VER",
            Self::ProducerIdentity => "BAD_PROG_ID",
            Self::UnknownVariable => "BAD_VAR",
            Self::TypeMismatch => "BAD_TYPE",
            Self::LengthMismatch => "BAD_LEN",
            Self::OutOfRange => "BAD_RANGE",
            Self::MissingField => "MISSING_FIELD",
            Self::NullData => "NULL_DATA",
            Self::BadTarget => "BAD_TARGET",
            Self::BadString => "BAD_STRING",
            Self::DuplicateId => "DUPLICATE_ID",
        }
    }

    /// Stable numeric code. Zero is reserved for success.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::FileIo => 1,
            Self::Alloc => 2,
            Self::Arch => 3,
            Self::BadFormat => 4,
            Self::FormatVersion => 5,
            Self::ProducerVersion => 6,
            Self::ProducerIdentity => 7,
            Self::UnknownVariable => 8,
            Self::TypeMismatch => 9,
            Self::LengthMismatch => 10,
            Self::OutOfRange => 11,
            Self::MissingField => 12,
            Self::NullData => 13,
            Self::BadTarget => 14,
            Self::BadString => 15,
            Self::DuplicateId => 16,
        }
    }

    /// Look up a kind by its numeric code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Diagnostic name for a numeric outcome code.
///
/// `0` is `"OK"`; unrecognised codes map to `"UNKNOWN_ERR"`.
#[must_use]
pub fn strerror(code: u8) -> &'static str {
    if code == 0 {
        return "OK";
    }
    ErrorKind::from_code(code).map_or("UNKNOWN_ERR", ErrorKind::name)
}
