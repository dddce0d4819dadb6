//! Variable descriptors and the schema that groups them.

use std::fmt;

use crate::codec::Decoded;
use crate::error::{Result, VarpackError};
use crate::flatten::Flat;

use super::element::{ArrayElement, Element, ElementType};
use super::options::IdMode;
use super::storage::{AllocKind, Binding, Bound, Storage};

/// On-disk identifier of a variable.
///
/// The empty name and the id `0` are reserved as the end-of-section sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VarId {
    Name(String),
    Numeric(u8),
}

impl VarId {
    /// Whether this is the reserved sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        match self {
            Self::Name(name) => name.is_empty(),
            Self::Numeric(id) => *id == 0,
        }
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "`{name}`"),
            Self::Numeric(id) => write!(f, "#{id}"),
        }
    }
}

/// A named, typed program variable bound to caller storage.
///
/// # Example
///
/// ```
/// use varpack::{Schema, Variable};
///
/// let mut verbose = false;
/// let mut ints: Vec<i32> = vec![1, 2, 3];
///
/// let schema = Schema::new()
///     .with(Variable::scalar("verbose", &mut verbose))
///     .with(Variable::array("ints", &mut ints).with_bounds(0, 4096));
/// assert_eq!(schema.len(), 2);
/// ```
pub struct Variable<'a> {
    name: Option<String>,
    id: Option<u8>,
    description: Option<String>,
    min_len: usize,
    max_len: usize,
    lossy: bool,
    slot: Box<dyn Binding + 'a>,
}

impl<'a> Variable<'a> {
    /// Unnamed variable over any storage; add a name or id before use.
    pub fn new<T: Element + 'a>(storage: Storage<'a, T>) -> Self {
        Self {
            name: None,
            id: None,
            description: None,
            min_len: 0,
            max_len: usize::MAX,
            lossy: false,
            slot: Box::new(Bound::new(storage)),
        }
    }

    /// Scalar written in place.
    pub fn scalar<T: Element + 'a>(name: impl Into<String>, value: &'a mut T) -> Self {
        Self::new(Storage::Scalar(value)).with_name(name)
    }

    /// Scalar that may be absent; replaced on read.
    pub fn owned<T: Element + 'a>(name: impl Into<String>, value: &'a mut Option<T>) -> Self {
        Self::new(Storage::Owned(value)).with_name(name)
    }

    /// Growable array; reallocated to the file's length on read.
    pub fn array<T: ArrayElement + 'a>(name: impl Into<String>, values: &'a mut Vec<T>) -> Self {
        Self::new(Storage::Vec(values)).with_name(name)
    }

    /// Fixed-capacity array whose live length is kept in `len`.
    pub fn fixed<T: ArrayElement + 'a>(
        name: impl Into<String>,
        buf: &'a mut [T],
        len: &'a mut usize,
    ) -> Self {
        Self::new(Storage::Fixed { buf, len }).with_name(name)
    }

    /// Set the name used in name mode.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the id used in numeric mode.
    #[must_use]
    pub fn with_id(mut self, id: u8) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the description saved when descriptions are enabled.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Inclusive array length bounds. Ignored for scalars.
    #[must_use]
    pub fn with_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_len = min;
        self.max_len = max;
        self
    }

    /// Accept float values of a different width, converting them.
    #[must_use]
    pub fn lossy(mut self) -> Self {
        self.lossy = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn id(&self) -> Option<u8> {
        self.id
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.slot.element_type()
    }

    /// In-memory byte width of one element (0 for strings).
    #[must_use]
    pub fn element_width(&self) -> usize {
        self.slot.element_width()
    }

    #[must_use]
    pub fn alloc_kind(&self) -> AllocKind {
        self.slot.alloc_kind()
    }

    /// Inclusive array length bounds.
    #[must_use]
    pub fn bounds(&self) -> (usize, usize) {
        (self.min_len, self.max_len)
    }

    #[must_use]
    pub fn is_lossy(&self) -> bool {
        self.lossy
    }

    /// Capacity of a static array.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.slot.capacity()
    }

    /// Record tag this variable must carry on disk.
    #[must_use]
    pub fn tag(&self) -> u8 {
        self.element_type().tag(self.alloc_kind().is_array())
    }

    /// Identifier under the given mode, if one is set.
    #[must_use]
    pub fn identifier(&self, mode: IdMode) -> Option<VarId> {
        match mode {
            IdMode::Names => self.name.clone().map(VarId::Name),
            IdMode::Numeric => self.id.map(VarId::Numeric),
        }
    }

    /// Human-readable label for diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("#{id}"),
            (None, None) => "<unnamed>".to_string(),
        }
    }

    pub(crate) fn flatten(&self) -> Result<Flat<'_>> {
        self.slot.flatten(&self.label())
    }

    pub(crate) fn stage(&mut self, record: Decoded) -> Result<()> {
        let label = self.label();
        self.slot.stage(&label, record, self.lossy)
    }

    pub(crate) fn commit(&mut self) {
        self.slot.commit();
    }

    pub(crate) fn discard(&mut self) {
        self.slot.discard();
    }

    pub(crate) fn has_staged(&self) -> bool {
        self.slot.has_staged()
    }
}

impl fmt::Debug for Variable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("description", &self.description)
            .field("element_type", &self.element_type())
            .field("alloc_kind", &self.alloc_kind())
            .field("bounds", &self.bounds())
            .field("lossy", &self.lossy)
            .finish()
    }
}

/// Ordered list of variables, in the order they are written.
#[derive(Debug, Default)]
pub struct Schema<'a> {
    variables: Vec<Variable<'a>>,
}

impl<'a> Schema<'a> {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable (builder style).
    #[must_use]
    pub fn with(mut self, variable: Variable<'a>) -> Self {
        self.variables.push(variable);
        self
    }

    /// Append a variable.
    pub fn push(&mut self, variable: Variable<'a>) {
        self.variables.push(variable);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable<'a>> {
        self.variables.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Variable<'a>> {
        self.variables.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Variable<'a>> {
        self.variables.get_mut(index)
    }

    /// Move every staged value into caller storage.
    pub(crate) fn commit_staged(&mut self) {
        for variable in &mut self.variables {
            variable.commit();
        }
    }

    /// Drop every staged value without touching caller storage.
    pub(crate) fn discard_staged(&mut self) {
        for variable in &mut self.variables {
            variable.discard();
        }
    }

    pub(crate) fn staged_count(&self) -> usize {
        self.variables.iter().filter(|var| var.has_staged()).count()
    }

    /// Reject identifiers that are missing, reserved or duplicated under `mode`.
    pub(crate) fn check_identifiers(&self, mode: IdMode) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for variable in &self.variables {
            let Some(id) = variable.identifier(mode) else {
                return Err(VarpackError::missing(
                    match mode {
                        IdMode::Names => "name",
                        IdMode::Numeric => "numeric id",
                    },
                    Some(&variable.label()),
                ));
            };
            if id.is_sentinel() {
                return Err(VarpackError::missing(
                    "non-reserved identifier",
                    Some(&variable.label()),
                ));
            }
            if !seen.insert(id.clone()) {
                return Err(VarpackError::DuplicateId { id: id.to_string() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_variable_metadata() {
        let mut ints = vec![1i32, 2];
        let var = Variable::array("ints", &mut ints)
            .with_id(7)
            .with_description("Some ints")
            .with_bounds(1, 8);

        assert_eq!(var.name(), Some("ints"));
        assert_eq!(var.id(), Some(7));
        assert_eq!(var.description(), Some("Some ints"));
        assert_eq!(var.element_type(), ElementType::Signed);
        assert_eq!(var.element_width(), 4);
        assert_eq!(var.alloc_kind(), AllocKind::OwnedArray);
        assert_eq!(var.bounds(), (1, 8));
        assert_eq!(var.tag(), 0x83);
        assert_eq!(var.identifier(IdMode::Numeric), Some(VarId::Numeric(7)));
    }

    #[test]
    fn test_sentinels() {
        assert!(VarId::Name(String::new()).is_sentinel());
        assert!(VarId::Numeric(0).is_sentinel());
        assert!(!VarId::Numeric(1).is_sentinel());
    }

    #[test]
    fn test_check_identifiers_duplicate() {
        let mut a = 1u8;
        let mut b = 2u8;
        let schema = Schema::new()
            .with(Variable::scalar("x", &mut a))
            .with(Variable::scalar("x", &mut b));
        let err = schema.check_identifiers(IdMode::Names).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateId);
    }

    #[test]
    fn test_check_identifiers_missing_id() {
        let mut a = 1u8;
        let schema = Schema::new().with(Variable::scalar("x", &mut a));
        assert!(schema.check_identifiers(IdMode::Names).is_ok());
        let err = schema.check_identifiers(IdMode::Numeric).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
    }

    #[test]
    fn test_check_identifiers_reserved() {
        let mut a = 1u8;
        let schema = Schema::new().with(Variable::scalar("", &mut a));
        let err = schema.check_identifiers(IdMode::Names).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
    }
}
