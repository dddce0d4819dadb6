//! Scalar/array flattener.
//!
//! Normalizes any of the four allocation kinds into one view: element type,
//! element byte width, array-ness and the live elements (one for scalars).
//! Every encoder consumes this view, so allocation kind is branched on here
//! and nowhere else.

use crate::error::{Result, VarpackError};
use crate::types::{ElemRef, Element, ElementType, Storage};

/// Uniform write-side view of a variable.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Flat<'v> {
    pub element: ElementType,
    pub width: usize,
    pub is_array: bool,
    pub items: Vec<ElemRef<'v>>,
}

impl Flat<'_> {
    pub(crate) fn count(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn tag(&self) -> u8 {
        self.element.tag(self.is_array)
    }
}

/// Flatten `storage` for writing.
pub(crate) fn flatten<'v, T: Element>(storage: &'v Storage<'_, T>, name: &str) -> Result<Flat<'v>> {
    let is_array = storage.kind().is_array();
    if is_array && T::TYPE == ElementType::Bool {
        return Err(VarpackError::TypeMismatch {
            variable: name.to_string(),
            expected: ElementType::Bool.tag(false),
            found: ElementType::Bool.tag(true),
        });
    }

    let items: Vec<ElemRef<'v>> = match storage {
        Storage::Scalar(value) => vec![value.view()],
        Storage::Owned(value) => match &**value {
            Some(value) => vec![value.view()],
            None => {
                return Err(VarpackError::NullData {
                    variable: name.to_string(),
                });
            }
        },
        Storage::Fixed { buf, len } => {
            let live = buf
                .get(..**len)
                .ok_or_else(|| VarpackError::length_mismatch(name, buf.len(), **len))?;
            live.iter().map(Element::view).collect()
        }
        Storage::Vec(values) => values.iter().map(Element::view).collect(),
    };

    Ok(Flat {
        element: T::TYPE,
        width: T::WIDTH,
        is_array,
        items,
    })
}
