//! Element types and their on-disk tags.
//!
//! Every supported in-memory element implements the sealed [`Element`]
//! trait, which converts it to and from the codec's uniform element views.

use std::fmt;

/// High bit of a record tag, set when the variable is an array.
pub const ARRAY_FLAG: u8 = 0x80;

/// Declared element type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    /// UTF-8 text stored NUL-terminated.
    String,
    /// Truth value, stored in the trailing boolean bitfield.
    Bool,
    /// Two's complement integer.
    Signed,
    /// Unsigned integer.
    Unsigned,
    /// IEEE 754 floating point.
    Float,
    /// Fixed-width blob copied byte for byte.
    Opaque,
}

impl ElementType {
    /// Type code stored in the low bits of a record tag.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::String => 1,
            Self::Bool => 2,
            Self::Signed => 3,
            Self::Unsigned => 4,
            Self::Float => 5,
            Self::Opaque => 6,
        }
    }

    /// Look up a type by code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::String),
            2 => Some(Self::Bool),
            3 => Some(Self::Signed),
            4 => Some(Self::Unsigned),
            5 => Some(Self::Float),
            6 => Some(Self::Opaque),
            _ => None,
        }
    }

    /// One-byte record tag combining type and array-ness.
    #[must_use]
    pub const fn tag(self, is_array: bool) -> u8 {
        if is_array {
            self.code() | ARRAY_FLAG
        } else {
            self.code()
        }
    }

    /// Split a record tag into type and array-ness.
    #[must_use]
    pub const fn parse_tag(tag: u8) -> Option<(Self, bool)> {
        match Self::from_code(tag & !ARRAY_FLAG) {
            Some(element) => Some((element, tag & ARRAY_FLAG != 0)),
            None => None,
        }
    }

    /// Whether the type goes through the minimal-width integer codec.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Signed | Self::Unsigned)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Signed => "signed",
            Self::Unsigned => "unsigned",
            Self::Float => "float",
            Self::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Borrowed element as seen by the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElemRef<'v> {
    Str(&'v str),
    Bool(bool),
    Int(i128),
    /// Raw IEEE bits, zero-extended.
    Float(u64),
    Bytes(&'v [u8]),
}

/// Element decoded from a file, not yet converted to its target type.
#[derive(Debug, Clone, PartialEq)]
pub enum ElemValue {
    Str(String),
    Bool(bool),
    Int(i128),
    Float(u64),
    Bytes(Vec<u8>),
}

/// Why a decoded element could not be stored into its target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreError {
    /// Element family does not match.
    Type,
    /// Integer value does not fit the target width.
    Range,
    /// Element width differs and no conversion is permitted.
    Width,
}

mod sealed {
    pub trait Sealed {}
}

/// A value type the codec can save and restore.
///
/// Implemented for `String`, `bool`, every primitive integer, `f32`, `f64`
/// and fixed-size byte arrays `[u8; N]`.
pub trait Element: Sized + sealed::Sealed {
    /// Declared element type.
    const TYPE: ElementType;
    /// In-memory byte width of one element (0 for strings).
    const WIDTH: usize;

    /// Borrow the element in codec form.
    fn view(&self) -> ElemRef<'_>;

    /// Convert a decoded element whose on-disk width was `file_width`.
    fn restore(value: ElemValue, file_width: usize, lossy: bool) -> Result<Self, RestoreError>;
}

/// Elements that may be stored in arrays. Booleans are scalar only.
pub trait ArrayElement: Element {}

/// Primitive integers handled by the minimal-width codec.
pub trait Integer: Element + Copy {
    /// Whether values are two's complement signed.
    const SIGNED: bool;
}

impl sealed::Sealed for String {}

impl Element for String {
    const TYPE: ElementType = ElementType::String;
    const WIDTH: usize = 0;

    fn view(&self) -> ElemRef<'_> {
        ElemRef::Str(self)
    }

    fn restore(value: ElemValue, _file_width: usize, _lossy: bool) -> Result<Self, RestoreError> {
        match value {
            ElemValue::Str(text) => Ok(text),
            _ => Err(RestoreError::Type),
        }
    }
}

impl ArrayElement for String {}

impl sealed::Sealed for bool {}

impl Element for bool {
    const TYPE: ElementType = ElementType::Bool;
    const WIDTH: usize = std::mem::size_of::<bool>();

    fn view(&self) -> ElemRef<'_> {
        ElemRef::Bool(*self)
    }

    fn restore(value: ElemValue, _file_width: usize, _lossy: bool) -> Result<Self, RestoreError> {
        match value {
            ElemValue::Bool(flag) => Ok(flag),
            _ => Err(RestoreError::Type),
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $signed:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const TYPE: ElementType = if $signed {
                    ElementType::Signed
                } else {
                    ElementType::Unsigned
                };
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn view(&self) -> ElemRef<'_> {
                    ElemRef::Int(*self as i128)
                }

                fn restore(
                    value: ElemValue,
                    _file_width: usize,
                    _lossy: bool,
                ) -> Result<Self, RestoreError> {
                    match value {
                        ElemValue::Int(wide) => {
                            <$ty>::try_from(wide).map_err(|_| RestoreError::Range)
                        }
                        _ => Err(RestoreError::Type),
                    }
                }
            }

            impl ArrayElement for $ty {}

            impl Integer for $ty {
                const SIGNED: bool = $signed;
            }
        )*
    };
}

impl_integer!(
    i8 => true,
    i16 => true,
    i32 => true,
    i64 => true,
    isize => true,
    u8 => false,
    u16 => false,
    u32 => false,
    u64 => false,
    usize => false,
);

impl sealed::Sealed for f32 {}

impl Element for f32 {
    const TYPE: ElementType = ElementType::Float;
    const WIDTH: usize = 4;

    fn view(&self) -> ElemRef<'_> {
        ElemRef::Float(u64::from(self.to_bits()))
    }

    fn restore(value: ElemValue, file_width: usize, lossy: bool) -> Result<Self, RestoreError> {
        let ElemValue::Float(bits) = value else {
            return Err(RestoreError::Type);
        };
        match (file_width, lossy) {
            (4, _) => Ok(f32::from_bits(bits as u32)),
            (8, true) => Ok(f64::from_bits(bits) as f32),
            _ => Err(RestoreError::Width),
        }
    }
}

impl ArrayElement for f32 {}

impl sealed::Sealed for f64 {}

impl Element for f64 {
    const TYPE: ElementType = ElementType::Float;
    const WIDTH: usize = 8;

    fn view(&self) -> ElemRef<'_> {
        ElemRef::Float(self.to_bits())
    }

    fn restore(value: ElemValue, file_width: usize, lossy: bool) -> Result<Self, RestoreError> {
        let ElemValue::Float(bits) = value else {
            return Err(RestoreError::Type);
        };
        match (file_width, lossy) {
            (8, _) => Ok(f64::from_bits(bits)),
            (4, true) => Ok(f64::from(f32::from_bits(bits as u32))),
            _ => Err(RestoreError::Width),
        }
    }
}

impl ArrayElement for f64 {}

impl<const N: usize> sealed::Sealed for [u8; N] {}

impl<const N: usize> Element for [u8; N] {
    const TYPE: ElementType = ElementType::Opaque;
    const WIDTH: usize = N;

    fn view(&self) -> ElemRef<'_> {
        ElemRef::Bytes(self)
    }

    fn restore(value: ElemValue, _file_width: usize, _lossy: bool) -> Result<Self, RestoreError> {
        match value {
            ElemValue::Bytes(bytes) => {
                <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| RestoreError::Width)
            }
            _ => Err(RestoreError::Type),
        }
    }
}

impl<const N: usize> ArrayElement for [u8; N] {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(ElementType::Signed.tag(false), 0x03);
        assert_eq!(ElementType::Signed.tag(true), 0x83);
        assert_eq!(
            ElementType::parse_tag(0x81),
            Some((ElementType::String, true))
        );
        assert_eq!(ElementType::parse_tag(0x06), Some((ElementType::Opaque, false)));
        assert_eq!(ElementType::parse_tag(0x07), None);
        assert_eq!(ElementType::parse_tag(0x80), None);
    }

    #[test]
    fn test_integer_metadata() {
        assert_eq!(<i16 as Element>::TYPE, ElementType::Signed);
        assert_eq!(<u64 as Element>::TYPE, ElementType::Unsigned);
        assert_eq!(<i32 as Element>::WIDTH, 4);
        assert_eq!(<usize as Element>::WIDTH, std::mem::size_of::<usize>());
        assert!(<i8 as Integer>::SIGNED);
        assert!(!<u8 as Integer>::SIGNED);
    }

    #[test]
    fn test_integer_restore_range() {
        assert_eq!(i8::restore(ElemValue::Int(-128), 1, false), Ok(-128));
        assert_eq!(
            i8::restore(ElemValue::Int(200), 2, false),
            Err(RestoreError::Range)
        );
        assert_eq!(
            u16::restore(ElemValue::Int(-1), 2, false),
            Err(RestoreError::Range)
        );
    }

    #[test]
    fn test_float_narrowing_requires_opt_in() {
        let bits = 1.5f64.to_bits();
        assert_eq!(
            f32::restore(ElemValue::Float(bits), 8, false),
            Err(RestoreError::Width)
        );
        assert_eq!(f32::restore(ElemValue::Float(bits), 8, true), Ok(1.5));

        let narrow = u64::from(0.25f32.to_bits());
        assert_eq!(f64::restore(ElemValue::Float(narrow), 4, true), Ok(0.25));
    }

    #[test]
    fn test_opaque_width() {
        let value = <[u8; 3]>::restore(ElemValue::Bytes(vec![1, 2, 3]), 3, false);
        assert_eq!(value, Ok([1, 2, 3]));
        let value = <[u8; 3]>::restore(ElemValue::Bytes(vec![1, 2]), 2, false);
        assert_eq!(value, Err(RestoreError::Width));
    }
}
