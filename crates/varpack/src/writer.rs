//! Variable file writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::codec::{self, BoolQueue};
use crate::error::{Result, VarpackError};
use crate::flatten::Flat;
use crate::header::write_header;
use crate::resolve::{write_identifier, write_sentinel};
use crate::types::{ElemRef, ElementType, Producer, Schema, Variable, WriterOptions};
use crate::wire::Encoder;
use crate::wire::length::significant_bytes;

/// Writes a schema's variables to a byte stream.
///
/// Output layout: header, non-boolean records in schema order, the boolean
/// identifier run, a sentinel, then the packed boolean bitfield.
pub struct VarWriter<W: Write> {
    enc: Encoder<BufWriter<W>>,
    options: WriterOptions,
    producer: Producer,
}

impl<W: Write> VarWriter<W> {
    /// Create a writer over `writer`.
    pub fn new(writer: W, options: WriterOptions, producer: Producer) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            enc: Encoder::new(BufWriter::new(writer), options.endian, options.word_width),
            options,
            producer,
        })
    }

    /// Writer options in effect.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Write a complete file for `schema`.
    ///
    /// The schema is validated before any byte is emitted, so a rejected
    /// schema leaves the stream untouched.
    pub fn write(&mut self, schema: &Schema<'_>) -> Result<()> {
        let flats = self.validate(schema)?;
        let descriptions = self.options.descriptions;
        let mode = self.options.id_mode;

        write_header(&mut self.enc, &self.options, &self.producer)?;

        let mut bools = BoolQueue::new();
        for (index, (variable, flat)) in schema.iter().zip(&flats).enumerate() {
            if flat.element == ElementType::Bool {
                bools.push(index, flat.items.first() == Some(&ElemRef::Bool(true)));
                continue;
            }
            self.write_prefix(variable)?;
            self.enc.u8(flat.tag())?;
            codec::write_payload(&mut self.enc, flat, &variable.label())?;
            debug!(
                variable = %variable.label(),
                kind = %flat.element,
                count = flat.count(),
                "wrote record"
            );
        }

        for index in bools.indexes() {
            if let Some(variable) = schema.get(index) {
                self.write_prefix(variable)?;
            }
        }
        write_sentinel(&mut self.enc, mode)?;
        self.enc.word(bools.len())?;
        self.enc.bytes(&bools.pack())?;
        debug!(booleans = bools.len(), descriptions, "wrote boolean section");
        bools.clear();

        self.enc.flush()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.enc
            .into_inner()
            .into_inner()
            .map_err(|err| VarpackError::Io(err.into_error()))
    }

    fn write_prefix(&mut self, variable: &Variable<'_>) -> Result<()> {
        let id = variable
            .identifier(self.options.id_mode)
            .ok_or_else(|| VarpackError::missing("identifier", Some(&variable.label())))?;
        write_identifier(&mut self.enc, &id)?;
        if self.options.descriptions {
            let description = variable
                .description()
                .ok_or_else(|| VarpackError::missing("description", Some(&variable.label())))?;
            self.enc.cstr(description, "variable description")?;
        }
        Ok(())
    }

    fn validate<'s>(&self, schema: &'s Schema<'_>) -> Result<Vec<Flat<'s>>> {
        schema.check_identifiers(self.options.id_mode)?;

        let mut flats = Vec::with_capacity(schema.len());
        let mut bools = 0usize;
        for variable in schema.iter() {
            let label = variable.label();
            if variable.name().is_some_and(|name| name.contains('\0')) {
                return Err(VarpackError::bad_string(format!("name of {label}")));
            }
            if self.options.descriptions {
                match variable.description() {
                    None => return Err(VarpackError::missing("description", Some(&label))),
                    Some(text) if text.contains('\0') => {
                        return Err(VarpackError::bad_string(format!("description of {label}")));
                    }
                    Some(_) => {}
                }
            }
            let flat = variable.flatten()?;
            let (min, max) = variable.bounds();
            if flat.is_array && !(min..=max).contains(&flat.count()) {
                return Err(VarpackError::OutOfRange {
                    variable: label,
                    len: flat.count(),
                    min,
                    max,
                });
            }
            if flat.is_array {
                self.check_count(flat.count())?;
            }
            if matches!(flat.element, ElementType::Float | ElementType::Opaque) {
                self.check_count(flat.width)?;
            }
            if flat
                .items
                .iter()
                .any(|item| matches!(item, ElemRef::Str(text) if text.contains('\0')))
            {
                return Err(VarpackError::bad_string(label));
            }
            if flat.element == ElementType::Bool {
                bools += 1;
            }
            flats.push(flat);
        }
        self.check_count(bools)?;
        Ok(flats)
    }

    /// Counts must fit the writer's word width.
    fn check_count(&self, count: usize) -> Result<()> {
        let needed = significant_bytes(count as u64);
        if needed > self.options.word_width {
            return Err(VarpackError::arch(
                "length field",
                needed,
                self.options.word_width,
            ));
        }
        Ok(())
    }
}

impl VarWriter<File> {
    /// Create (or truncate) a file for writing.
    pub fn create(path: &Path, options: WriterOptions, producer: Producer) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(file, options, producer)
    }
}
