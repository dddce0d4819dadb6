//! One-call save and load against a path or an open handle.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{LoadError, Result, VarpackError};
use crate::header::{FileHeader, HeaderEcho};
use crate::reader::VarReader;
use crate::types::{Producer, ReaderOptions, Schema, WriterOptions};
use crate::writer::VarWriter;

/// Where a file is saved to or loaded from.
///
/// A handle is borrowed or owned by the caller as they choose: pass
/// `&mut File` to keep the file open after the call.
#[derive(Debug)]
pub enum Endpoint<H> {
    Path(PathBuf),
    Handle(H),
}

impl<H> Endpoint<H> {
    /// Build an endpoint from exactly one of a path and a handle.
    pub fn from_parts(path: Option<&Path>, handle: Option<H>) -> Result<Self> {
        match (path, handle) {
            (Some(path), None) => Ok(Self::Path(path.to_path_buf())),
            (None, Some(handle)) => Ok(Self::Handle(handle)),
            (Some(_), Some(_)) => Err(VarpackError::BadTarget {
                message: "both a path and a handle were given",
            }),
            (None, None) => Err(VarpackError::BadTarget {
                message: "neither a path nor a handle was given",
            }),
        }
    }
}

impl Endpoint<File> {
    /// Endpoint for a file path.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }
}

/// Save `schema` to `target`.
///
/// Files opened by path are flushed to disk and closed before returning.
pub fn save_vars<H: Write>(
    target: Endpoint<H>,
    options: WriterOptions,
    producer: Producer,
    schema: &Schema<'_>,
) -> Result<()> {
    match target {
        Endpoint::Path(path) => {
            let mut writer = VarWriter::create(&path, options, producer)?;
            writer.write(schema)?;
            writer.into_inner()?.sync_all()?;
        }
        Endpoint::Handle(handle) => {
            let mut writer = VarWriter::new(handle, options, producer)?;
            writer.write(schema)?;
            writer.into_inner()?;
        }
    }
    Ok(())
}

/// Load `schema` from `source` and return the file's header.
///
/// On failure the returned [`LoadError`] carries whatever part of the
/// header was decoded before the error.
pub fn load_vars<H: Read>(
    source: Endpoint<H>,
    options: ReaderOptions,
    producer: Producer,
    schema: &mut Schema<'_>,
) -> std::result::Result<FileHeader, LoadError> {
    match source {
        Endpoint::Path(path) => finish_load(VarReader::open(&path, options, producer)?, schema),
        Endpoint::Handle(handle) => finish_load(VarReader::new(handle, options, producer)?, schema),
    }
}

fn finish_load<R: Read>(
    mut reader: VarReader<R>,
    schema: &mut Schema<'_>,
) -> std::result::Result<FileHeader, LoadError> {
    let outcome = reader.read(schema);
    let echo = reader.echo().cloned();
    match (outcome, echo) {
        (Ok(()), Some(HeaderEcho::Header(header))) => Ok(header),
        (Ok(()), echo) => Err(LoadError {
            error: VarpackError::missing("file header", None),
            echo,
        }),
        (Err(error), echo) => Err(LoadError { error, echo }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::ErrorKind;
    use crate::types::Variable;

    #[test]
    fn test_from_parts() {
        let path = Path::new("vars.bin");
        assert!(matches!(
            Endpoint::<File>::from_parts(Some(path), None),
            Ok(Endpoint::Path(_))
        ));
        assert!(matches!(
            Endpoint::from_parts(None, Some(Vec::<u8>::new())),
            Ok(Endpoint::Handle(_))
        ));

        let both = Endpoint::from_parts(Some(path), Some(Vec::<u8>::new())).unwrap_err();
        assert_eq!(both.kind(), ErrorKind::BadTarget);
        let neither = Endpoint::<File>::from_parts(None, None).unwrap_err();
        assert_eq!(neither.kind(), ErrorKind::BadTarget);
    }

    #[test]
    fn test_handle_stays_with_caller() {
        let mut level = 42u32;
        let schema = Schema::new().with(Variable::scalar("level", &mut level));
        let mut buffer = Vec::new();
        save_vars(
            Endpoint::Handle(&mut buffer),
            WriterOptions::new(),
            Producer::named("endpoint"),
            &schema,
        )
        .unwrap();
        assert!(!buffer.is_empty());

        let mut restored = 0u32;
        let mut schema = Schema::new().with(Variable::scalar("level", &mut restored));
        let header = load_vars(
            Endpoint::Handle(Cursor::new(buffer)),
            ReaderOptions::new(),
            Producer::named("endpoint"),
            &mut schema,
        )
        .unwrap();
        drop(schema);

        assert_eq!(restored, 42);
        assert_eq!(header.producer_version, 1);
    }

    #[test]
    fn test_failed_load_returns_echo() {
        let mut level = 3u32;
        let schema = Schema::new().with(Variable::scalar("level", &mut level));
        let mut buffer = Vec::new();
        save_vars(
            Endpoint::Handle(&mut buffer),
            WriterOptions::new(),
            Producer::named("endpoint").with_version(4, 2),
            &schema,
        )
        .unwrap();

        let mut restored = 0u32;
        let mut schema = Schema::new().with(Variable::scalar("level", &mut restored));
        let err = load_vars(
            Endpoint::Handle(Cursor::new(buffer)),
            ReaderOptions::new(),
            Producer::named("someone-else"),
            &mut schema,
        )
        .unwrap_err();
        drop(schema);

        assert_eq!(err.kind(), ErrorKind::ProducerIdentity);
        assert_eq!(restored, 0);
        let header = err.echo.and_then(HeaderEcho::into_header).unwrap();
        assert_eq!((header.producer_version, header.producer_subversion), (4, 2));
        assert_eq!(
            header.producer,
            Some(crate::types::ProducerId::Name("endpoint".to_string()))
        );
    }

    #[test]
    fn test_failed_load_echoes_foreign_magic() {
        let mut schema = Schema::new();
        let err = load_vars(
            Endpoint::Handle(Cursor::new(b"GIF89a".to_vec())),
            ReaderOptions::new(),
            Producer::named("endpoint"),
            &mut schema,
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadFormat);
        let echo = err.echo.unwrap();
        assert_eq!(echo.magic(), u32::from_ne_bytes(*b"GIF8"));
        assert!(echo.header().is_none());
    }

    #[test]
    fn test_missing_path_has_no_echo() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_vars(
            Endpoint::path(dir.path().join("absent.var")),
            ReaderOptions::new(),
            Producer::named("endpoint"),
            &mut Schema::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileIo);
        assert!(err.echo.is_none());
    }

    #[test]
    fn test_path_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.var");

        let mut words = vec!["a".to_string(), "bc".to_string()];
        let schema = Schema::new().with(Variable::array("words", &mut words));
        save_vars(
            Endpoint::path(&path),
            WriterOptions::new(),
            Producer::named("endpoint"),
            &schema,
        )
        .unwrap();

        let mut restored: Vec<String> = Vec::new();
        let mut schema = Schema::new().with(Variable::array("words", &mut restored));
        load_vars(
            Endpoint::path(&path),
            ReaderOptions::new(),
            Producer::named("endpoint"),
            &mut schema,
        )
        .unwrap();
        drop(schema);

        assert_eq!(restored, vec!["a", "bc"]);
    }
}
