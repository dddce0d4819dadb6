//! Portable binary persistence for typed program variables.
//!
//! A caller declares a [`Schema`] of named, typed variables bound to its own
//! storage. [`VarWriter`] saves their current values; [`VarReader`] restores
//! them into an equivalent schema, even when the writing and reading hosts
//! differ in byte order or word width.
//!
//! # Features
//!
//! - Strings, booleans, every primitive integer, `f32`/`f64` and `[u8; N]` blobs
//! - Scalars and arrays, with in-place or owned storage
//! - Integers stored at the smallest width that keeps every value
//! - Booleans packed into one trailing bitfield
//! - Producer identity and version gates checked before any variable is read
//! - All-or-nothing reads: storage is only touched once the whole file decodes
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use varpack::{Producer, ReaderOptions, Schema, VarReader, VarWriter, Variable, WriterOptions};
//!
//! let producer = Producer::named("demo").with_version(1, 0);
//!
//! // Save
//! let mut verbose = true;
//! let mut ints = vec![1i32, -2, 300];
//! let schema = Schema::new()
//!     .with(Variable::scalar("verbose", &mut verbose))
//!     .with(Variable::array("ints", &mut ints).with_bounds(0, 4096));
//! let mut writer = VarWriter::new(Vec::new(), WriterOptions::new(), producer.clone())?;
//! writer.write(&schema)?;
//! let bytes = writer.into_inner()?;
//!
//! // Restore
//! let mut verbose = false;
//! let mut ints: Vec<i32> = Vec::new();
//! let mut schema = Schema::new()
//!     .with(Variable::scalar("verbose", &mut verbose))
//!     .with(Variable::array("ints", &mut ints).with_bounds(0, 4096));
//! let mut reader = VarReader::new(Cursor::new(bytes), ReaderOptions::new(), producer)?;
//! reader.read(&mut schema)?;
//! drop(schema);
//!
//! assert!(verbose);
//! assert_eq!(ints, [1, -2, 300]);
//! # Ok::<(), varpack::VarpackError>(())
//! ```
//!
//! # Error codes
//!
//! Every error has a stable diagnostic name:
//!
//! ```
//! use varpack::{ErrorKind, strerror};
//!
//! assert_eq!(ErrorKind::OutOfRange.name(), "BAD_RANGE");
//! assert_eq!(strerror(0), "OK");
//! ```

mod codec;
mod endpoint;
mod error;
mod flatten;
pub mod header;
mod reader;
mod resolve;
mod types;
pub mod wire;
mod writer;

// Re-export error types
pub use error::{ErrorKind, LoadError, Result, VarpackError, strerror};

// Re-export core types
pub use types::{
    ARRAY_FLAG, AllocKind, ArrayElement, ElemRef, ElemValue, Element, ElementType, IdMode,
    Integer, Producer, ProducerId, ReaderOptions, RestoreError, Schema, Storage, VarId, Variable,
    WriterOptions,
};

pub use codec::{BoolQueue, minimal_width};
pub use header::{FileHeader, HeaderEcho, Metadata, peek_header};
pub use wire::Endian;

// Re-export reader and writer functionality
pub use endpoint::{Endpoint, load_vars, save_vars};
pub use reader::VarReader;
pub use writer::VarWriter;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
