//! Data model for variable files.

mod element;
mod options;
mod storage;
mod variable;

pub use element::{
    ARRAY_FLAG, ArrayElement, ElemRef, ElemValue, Element, ElementType, Integer, RestoreError,
};
pub use options::{IdMode, Producer, ProducerId, ReaderOptions, WriterOptions};
pub use storage::{AllocKind, Storage};
pub use variable::{Schema, VarId, Variable};
