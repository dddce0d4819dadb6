//! Variable file reader.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::codec::{self, BoolQueue, Decoded, Target, boolean::packed_len};
use crate::error::{Result, VarpackError};
use crate::header::{self, FileHeader, HeaderEcho, check_format, check_producer};
use crate::resolve::{lookup, read_identifier};
use crate::types::{ElemValue, ElementType, Producer, ReaderOptions, Schema};
use crate::wire::Decoder;

/// State owned by one read call.
#[derive(Debug, Default)]
struct ReadContext {
    bools: BoolQueue,
    records: usize,
}

/// Restores a schema's variables from a byte stream.
///
/// A read is all-or-nothing: decoded values are staged and reach caller
/// storage only after the whole file has been consumed without error.
pub struct VarReader<R: Read> {
    dec: Decoder<BufReader<R>>,
    producer: Producer,
    echo: Option<HeaderEcho>,
}

impl<R: Read> VarReader<R> {
    /// Create a reader over `reader` that expects files from `producer`.
    pub fn new(reader: R, options: ReaderOptions, producer: Producer) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            dec: Decoder::new(BufReader::new(reader), options.word_width),
            producer,
            echo: None,
        })
    }

    /// Header fields of the last file read, kept even if the read failed.
    ///
    /// `None` before any read, or if the read stopped inside the fixed
    /// preamble; see [`VarReader::echo`] for that case.
    pub fn header(&self) -> Option<&FileHeader> {
        self.echo.as_ref().and_then(HeaderEcho::header)
    }

    /// Everything decoded of the last file's header, down to a bare magic.
    ///
    /// `None` before any read, or if fewer than four bytes could be read.
    pub fn echo(&self) -> Option<&HeaderEcho> {
        self.echo.as_ref()
    }

    /// Read one file into `schema`.
    ///
    /// On error no variable in `schema` is modified.
    pub fn read(&mut self, schema: &mut Schema<'_>) -> Result<()> {
        schema.discard_staged();
        match self.read_records(schema) {
            Ok(records) => {
                schema.commit_staged();
                debug!(records, "read complete");
                Ok(())
            }
            Err(err) => {
                let staged = schema.staged_count();
                schema.discard_staged();
                debug!(staged, error = %err, "read aborted");
                Err(err)
            }
        }
    }

    /// Return the underlying reader. Buffered but unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.dec.into_inner().into_inner()
    }

    fn read_records(&mut self, schema: &mut Schema<'_>) -> Result<usize> {
        header::read_preamble(&mut self.dec, &mut self.echo)?;
        let echo = self
            .echo
            .as_mut()
            .and_then(HeaderEcho::header_mut)
            .ok_or_else(|| VarpackError::missing("file header", None))?;
        check_format(echo)?;
        header::read_producer(&mut self.dec, echo)?;
        check_producer(echo, &self.producer)?;
        let metadata = echo.metadata;
        schema.check_identifiers(metadata.id_mode)?;

        let mut ctx = ReadContext::default();
        loop {
            let id = read_identifier(&mut self.dec, metadata.id_mode)?;
            if id.is_sentinel() {
                break;
            }
            let index = lookup(schema, &id, metadata.id_mode)?;
            if metadata.descriptions {
                self.dec.cstr("variable description")?;
            }
            let variable = schema
                .get_mut(index)
                .ok_or_else(|| VarpackError::UnknownVariable { id: id.to_string() })?;

            if variable.element_type() == ElementType::Bool && !variable.alloc_kind().is_array() {
                ctx.bools.push(index, false);
                continue;
            }

            let tag = self.dec.u8()?;
            if tag != variable.tag() {
                return Err(VarpackError::TypeMismatch {
                    variable: variable.label(),
                    expected: variable.tag(),
                    found: tag,
                });
            }
            let record = codec::read_payload(&mut self.dec, &Target::of(variable), tag)?;
            debug!(variable = %id, count = record.items.len(), "read record");
            variable.stage(record)?;
            ctx.records += 1;
        }

        self.read_booleans(schema, &mut ctx)?;
        Ok(ctx.records)
    }

    fn read_booleans(&mut self, schema: &mut Schema<'_>, ctx: &mut ReadContext) -> Result<()> {
        let count = self.dec.word()?;
        if count != ctx.bools.len() {
            return Err(VarpackError::length_mismatch(
                "boolean section",
                ctx.bools.len(),
                count,
            ));
        }
        let mut bits = vec![0u8; packed_len(count)];
        self.dec.bytes(&mut bits)?;
        ctx.bools.assign(&bits);

        for (index, value) in ctx.bools.drain() {
            let Some(variable) = schema.get_mut(index) else {
                continue;
            };
            variable.stage(Decoded {
                tag: ElementType::Bool.tag(false),
                width: 1,
                items: vec![ElemValue::Bool(value)],
            })?;
            ctx.records += 1;
        }
        debug!(booleans = count, "read boolean section");
        Ok(())
    }
}

impl VarReader<File> {
    /// Open a file for reading.
    pub fn open(path: &Path, options: ReaderOptions, producer: Producer) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VarpackError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                VarpackError::Io(e)
            }
        })?;
        Self::new(file, options, producer)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{Variable, WriterOptions};
    use crate::writer::VarWriter;

    fn producer() -> Producer {
        Producer::named("reader-test").with_version(1, 1)
    }

    fn write(schema: &Schema<'_>) -> Vec<u8> {
        let mut writer = VarWriter::new(Vec::new(), WriterOptions::new(), producer()).unwrap();
        writer.write(schema).unwrap();
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_roundtrip_mixed() {
        let (mut flag, mut level, mut name) = (true, -7i16, "alpha".to_string());
        let bytes = write(
            &Schema::new()
                .with(Variable::scalar("flag", &mut flag))
                .with(Variable::scalar("level", &mut level))
                .with(Variable::scalar("name", &mut name)),
        );

        let (mut flag, mut level, mut name) = (false, 0i16, String::new());
        let mut schema = Schema::new()
            .with(Variable::scalar("flag", &mut flag))
            .with(Variable::scalar("level", &mut level))
            .with(Variable::scalar("name", &mut name));
        let mut reader = VarReader::new(Cursor::new(bytes), ReaderOptions::new(), producer()).unwrap();
        reader.read(&mut schema).unwrap();
        drop(schema);

        assert!(flag);
        assert_eq!(level, -7);
        assert_eq!(name, "alpha");
        assert_eq!(reader.header().map(|h| h.producer_subversion), Some(1));
    }

    #[test]
    fn test_tag_mismatch_leaves_storage_untouched() {
        let (mut a, mut b) = (1u8, 2u32);
        let bytes = write(
            &Schema::new()
                .with(Variable::scalar("a", &mut a))
                .with(Variable::scalar("b", &mut b)),
        );

        let (mut a, mut b) = (0u8, 0i32);
        let mut schema = Schema::new()
            .with(Variable::scalar("a", &mut a))
            .with(Variable::scalar("b", &mut b));
        let mut reader = VarReader::new(Cursor::new(bytes), ReaderOptions::new(), producer()).unwrap();
        let err = reader.read(&mut schema).unwrap_err();
        drop(schema);

        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!((a, b), (0, 0));
        assert!(reader.header().is_some());
    }

    #[test]
    fn test_duplicate_schema_ids() {
        let mut level = 1u8;
        let bytes = write(&Schema::new().with(Variable::scalar("level", &mut level)));

        let (mut a, mut b) = (0u8, 0u8);
        let mut schema = Schema::new()
            .with(Variable::scalar("level", &mut a))
            .with(Variable::scalar("level", &mut b));
        let mut reader = VarReader::new(Cursor::new(bytes), ReaderOptions::new(), producer()).unwrap();
        let err = reader.read(&mut schema).unwrap_err();
        drop(schema);

        assert_eq!(err.kind(), ErrorKind::DuplicateId);
        assert_eq!((a, b), (0, 0));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = VarReader::open(&dir.path().join("absent.var"), ReaderOptions::new(), producer())
            .err()
            .map(|err| err.kind());
        assert_eq!(err, Some(ErrorKind::FileIo));
    }
}
