//! Error types for view operations

use thiserror::Error;

/// Broad classification of an [Error].
///
/// Schema mismatches, bounds violations, encoding failures, and builder exhaustion are
/// separate bugs with separate fixes, so callers can branch on the category instead of
/// matching every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// The shape of an initializer or descriptor disagrees with the static layout.
    LayoutMismatch,
    /// A slice, index, or pointer target lies outside the backing buffer or declared length.
    OutOfBounds,
    /// Bytes cannot be decoded, or a value cannot be represented in its wire encoding.
    Encoding,
    /// The builder cannot satisfy an allocation within its configured capacity.
    Exhausted,
}

/// Error type for view operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("missing member: {0}")]
    MissingMember(String),
    #[error("unknown member: {0}")]
    UnknownMember(String),
    #[error("unknown variant: {0}")]
    UnknownVariant(String),
    #[error("pointer target size mismatch: expected {expected}, found {found}")]
    TargetMismatch { expected: usize, found: usize },
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid schema for {0}: {1}")]
    InvalidSchema(String, String), // type name, reason
    #[error("invalid alignment: {0}")]
    InvalidAlignment(usize),
    #[error("out of bounds: {offset}+{len} exceeds {capacity}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error("index out of range: {index} >= {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("null pointer dereference at {0}")]
    NullPointer(usize),
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("unrepresentable displacement: {0}")]
    DisplacementOverflow(i64),
    #[error("length {0} does not fit in a 16-bit prefix")]
    LengthOverflow(usize),
    #[error("invalid discriminant: {0}")]
    InvalidDiscriminant(i64),
    #[error("capacity exceeded: {requested} > {limit}")]
    CapacityExceeded { requested: usize, limit: usize },
}

impl Error {
    /// Returns the [Category] this error belongs to.
    pub fn category(&self) -> Category {
        match self {
            Self::LengthMismatch { .. }
            | Self::MissingMember(_)
            | Self::UnknownMember(_)
            | Self::UnknownVariant(_)
            | Self::TargetMismatch { .. }
            | Self::TypeMismatch { .. }
            | Self::InvalidSchema(..)
            | Self::InvalidAlignment(_) => Category::LayoutMismatch,
            Self::OutOfBounds { .. } | Self::IndexOutOfRange { .. } | Self::NullPointer(_) => {
                Category::OutOfBounds
            }
            Self::InvalidUtf8(_)
            | Self::DisplacementOverflow(_)
            | Self::LengthOverflow(_)
            | Self::InvalidDiscriminant(_) => Category::Encoding,
            Self::CapacityExceeded { .. } => Category::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let cases = [
            (
                Error::LengthMismatch {
                    expected: 4,
                    found: 3,
                },
                Category::LayoutMismatch,
            ),
            (
                Error::OutOfBounds {
                    offset: 10,
                    len: 2,
                    capacity: 8,
                },
                Category::OutOfBounds,
            ),
            (Error::DisplacementOverflow(40_000), Category::Encoding),
            (
                Error::CapacityExceeded {
                    requested: 256,
                    limit: 128,
                },
                Category::Exhausted,
            ),
        ];
        for (error, category) in cases {
            assert_eq!(error.category(), category);
        }
    }

    #[test]
    fn test_display() {
        let error = Error::OutOfBounds {
            offset: 10,
            len: 2,
            capacity: 8,
        };
        assert_eq!(error.to_string(), "out of bounds: 10+2 exceeds 8");
    }
}
