//! Size and alignment of encoded values.

use crate::Error;

/// How many bytes a value occupies and where it may start.
///
/// For variable-length kinds (strings and vectors) `size` covers only the length prefix: the
/// true extent depends on the stored length and is only known once the value is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    /// Number of bytes of the static representation.
    pub size: usize,

    /// Required alignment of the first byte (always a power of two).
    pub alignment: usize,
}

impl Layout {
    /// Creates a layout.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two.
    pub const fn new(size: usize, alignment: usize) -> Self {
        assert!(alignment.is_power_of_two(), "alignment must be a power of two");
        Self { size, alignment }
    }

    /// Creates a layout, failing with [Error::InvalidAlignment] if `alignment` is not a power
    /// of two.
    pub fn try_new(size: usize, alignment: usize) -> Result<Self, Error> {
        if !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment));
        }
        Ok(Self { size, alignment })
    }

    /// Returns true if a value with this layout may start at `offset`.
    pub const fn is_aligned(&self, offset: usize) -> bool {
        offset % self.alignment == 0
    }

    /// Number of padding bytes needed to move `offset` to the next legal start.
    pub fn padding(&self, offset: usize) -> Result<usize, Error> {
        Ok(align_up(offset, self.alignment)? - offset)
    }
}

/// Rounds `offset` up to the next multiple of `alignment`.
///
/// Fails if `alignment` is not a power of two or if the result would overflow.
pub fn align_up(offset: usize, alignment: usize) -> Result<usize, Error> {
    if !alignment.is_power_of_two() {
        return Err(Error::InvalidAlignment(alignment));
    }
    let mask = alignment - 1;
    offset
        .checked_add(mask)
        .map(|bumped| bumped & !mask)
        .ok_or(Error::OutOfBounds {
            offset,
            len: mask,
            capacity: usize::MAX,
        })
}
