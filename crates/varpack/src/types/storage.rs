//! Caller-owned storage behind a variable.
//!
//! [`Storage`] borrows the live location a variable is saved from and
//! restored into. Decoded values are staged next to the borrow and only
//! reach caller storage once the whole file has been read.

use crate::codec::Decoded;
use crate::error::{Result, VarpackError};
use crate::flatten::{Flat, flatten};

use super::element::{Element, ElementType, RestoreError};

/// How a variable's storage is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocKind {
    /// A single value written in place.
    StaticScalar,
    /// A single value that may be absent and is replaced on read.
    OwnedScalar,
    /// A fixed buffer plus a caller-owned element count.
    StaticArray,
    /// A growable buffer reallocated to the file's element count.
    OwnedArray,
}

impl AllocKind {
    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::StaticArray | Self::OwnedArray)
    }

    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self, Self::OwnedScalar | Self::OwnedArray)
    }
}

/// Borrowed storage for one variable.
#[derive(Debug)]
pub enum Storage<'a, T> {
    /// `&mut T`, overwritten in place.
    Scalar(&'a mut T),
    /// `&mut Option<T>`; `None` cannot be saved, and is replaced on read.
    Owned(&'a mut Option<T>),
    /// A fixed-capacity buffer whose live prefix length is `len`.
    Fixed { buf: &'a mut [T], len: &'a mut usize },
    /// A vector resized to the file's element count on read.
    Vec(&'a mut Vec<T>),
}

impl<T> Storage<'_, T> {
    /// Allocation kind of this storage.
    #[must_use]
    pub fn kind(&self) -> AllocKind {
        match self {
            Self::Scalar(_) => AllocKind::StaticScalar,
            Self::Owned(_) => AllocKind::OwnedScalar,
            Self::Fixed { .. } => AllocKind::StaticArray,
            Self::Vec(_) => AllocKind::OwnedArray,
        }
    }

    /// Maximum element count for static arrays.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::Fixed { buf, .. } => Some(buf.len()),
            _ => None,
        }
    }
}

/// Type-erased view of a variable's storage used by the codecs.
pub(crate) trait Binding {
    fn element_type(&self) -> ElementType;
    fn element_width(&self) -> usize;
    fn alloc_kind(&self) -> AllocKind;
    fn capacity(&self) -> Option<usize>;
    fn flatten(&self, name: &str) -> Result<Flat<'_>>;
    fn stage(&mut self, name: &str, record: Decoded, lossy: bool) -> Result<()>;
    fn commit(&mut self);
    fn discard(&mut self);
    fn has_staged(&self) -> bool;
}

/// Storage plus the values staged for it by the current read.
pub(crate) struct Bound<'a, T> {
    storage: Storage<'a, T>,
    staged: Option<Vec<T>>,
}

impl<'a, T> Bound<'a, T> {
    pub(crate) fn new(storage: Storage<'a, T>) -> Self {
        Self {
            storage,
            staged: None,
        }
    }
}

impl<T: Element> Binding for Bound<'_, T> {
    fn element_type(&self) -> ElementType {
        T::TYPE
    }

    fn element_width(&self) -> usize {
        T::WIDTH
    }

    fn alloc_kind(&self) -> AllocKind {
        self.storage.kind()
    }

    fn capacity(&self) -> Option<usize> {
        self.storage.capacity()
    }

    fn flatten(&self, name: &str) -> Result<Flat<'_>> {
        flatten(&self.storage, name)
    }

    fn stage(&mut self, name: &str, record: Decoded, lossy: bool) -> Result<()> {
        let Decoded { tag, width, items } = record;
        let count = items.len();

        if !self.alloc_kind().is_array() && count != 1 {
            return Err(VarpackError::length_mismatch(name, 1, count));
        }
        if let Some(capacity) = self.capacity()
            && count > capacity
        {
            return Err(VarpackError::length_mismatch(name, capacity, count));
        }

        let mut staged = Vec::new();
        staged
            .try_reserve_exact(count)
            .map_err(|_| VarpackError::Alloc {
                variable: name.to_string(),
                count,
            })?;

        for item in items {
            let value = T::restore(item, width, lossy).map_err(|err| match err {
                RestoreError::Type => VarpackError::TypeMismatch {
                    variable: name.to_string(),
                    expected: T::TYPE.tag(self.storage.kind().is_array()),
                    found: tag,
                },
                RestoreError::Range => VarpackError::arch("integer value", width, T::WIDTH),
                RestoreError::Width => VarpackError::length_mismatch(name, T::WIDTH, width),
            })?;
            staged.push(value);
        }

        self.staged = Some(staged);
        Ok(())
    }

    fn commit(&mut self) {
        let Some(staged) = self.staged.take() else {
            return;
        };
        match &mut self.storage {
            Storage::Scalar(slot) => {
                if let Some(value) = staged.into_iter().next() {
                    **slot = value;
                }
            }
            Storage::Owned(slot) => **slot = staged.into_iter().next(),
            Storage::Fixed { buf, len } => {
                let count = staged.len();
                for (dst, src) in buf.iter_mut().zip(staged) {
                    *dst = src;
                }
                **len = count;
            }
            Storage::Vec(values) => **values = staged,
        }
    }

    fn discard(&mut self) {
        self.staged = None;
    }

    fn has_staged(&self) -> bool {
        self.staged.is_some()
    }
}
