//! Variable schema resolver.
//!
//! Maps identifiers read from a file back to schema entries and encodes
//! identifiers on the write side.

use std::io::{BufRead, Write};

use crate::error::{Result, VarpackError};
use crate::types::{IdMode, Schema, VarId};
use crate::wire::{Decoder, Encoder};

/// Write an identifier. The sentinel is `VarId::Name("")` or `VarId::Numeric(0)`.
pub(crate) fn write_identifier<W: Write>(enc: &mut Encoder<W>, id: &VarId) -> Result<()> {
    match id {
        VarId::Name(name) => enc.cstr(name, "variable name"),
        VarId::Numeric(id) => enc.u8(*id),
    }
}

/// Write the end-of-section sentinel for `mode`.
pub(crate) fn write_sentinel<W: Write>(enc: &mut Encoder<W>, mode: IdMode) -> Result<()> {
    write_identifier(enc, &sentinel(mode))
}

fn sentinel(mode: IdMode) -> VarId {
    match mode {
        IdMode::Names => VarId::Name(String::new()),
        IdMode::Numeric => VarId::Numeric(0),
    }
}

pub(crate) fn read_identifier<R: BufRead>(dec: &mut Decoder<R>, mode: IdMode) -> Result<VarId> {
    Ok(match mode {
        IdMode::Names => VarId::Name(dec.cstr("variable name")?),
        IdMode::Numeric => VarId::Numeric(dec.u8()?),
    })
}

/// Index of the schema entry identified by `id`, by linear search.
pub(crate) fn lookup(schema: &Schema<'_>, id: &VarId, mode: IdMode) -> Result<usize> {
    schema
        .iter()
        .position(|variable| variable.identifier(mode).as_ref() == Some(id))
        .ok_or_else(|| VarpackError::UnknownVariable { id: id.to_string() })
}
