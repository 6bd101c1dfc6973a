//! Length-prefixed sequences of packed elements.
//!
//! ```text
//! +--------+--------+-----------+-----------+-----+-------------+
//! | len lo | len hi | padding   | element 0 | ... | element n-1 |
//! +--------+--------+-----------+-----------+-----+-------------+
//! ```
//!
//! The prefix is an unsigned 16-bit little-endian element count. Padding runs to the first
//! offset (relative to the start of the vector) that is a multiple of the element alignment,
//! so no padding is present for elements aligned to 1 or 2.

use super::{mismatch, Snapshot, Type, View};
use crate::{layout::align_up, Error, Layout, Region, Value};

/// Size of the length prefix.
pub(crate) const PREFIX: usize = 2;

/// Relative offset of the first element.
pub(crate) fn payload_offset(element: Layout) -> Result<usize, Error> {
    align_up(PREFIX, element.alignment)
}

/// Bytes needed to encode `count` elements.
pub(crate) fn encoded_len(element: Layout, count: usize) -> Result<usize, Error> {
    if count > u16::MAX as usize {
        return Err(Error::LengthOverflow(count));
    }
    element
        .size
        .checked_mul(count)
        .and_then(|payload| payload.checked_add(payload_offset(element).ok()?))
        .ok_or(Error::LengthOverflow(count))
}

/// A vector bound to a region starting at its length prefix.
///
/// The region extends past the prefix; elements are bounded against it on access.
#[derive(Debug)]
pub struct VectorView<'t, B> {
    ty: &'t Type,
    element: &'t Type,
    region: Region<B>,
}

impl<'t, B> VectorView<'t, B> {
    pub(crate) fn new(ty: &'t Type, element: &'t Type, region: Region<B>) -> Self {
        Self {
            ty,
            element,
            region,
        }
    }

    pub fn descriptor(&self) -> &'t Type {
        self.ty
    }

    pub fn element(&self) -> &'t Type {
        self.element
    }

    pub fn region(&self) -> &Region<B> {
        &self.region
    }
}

impl<'t, B: AsRef<[u8]>> VectorView<'t, B> {
    /// Stored element count.
    pub fn length(&self) -> Result<usize, Error> {
        Ok(u16::from_le_bytes(self.region.read(0)?) as usize)
    }

    /// Total encoded size (prefix, padding, and elements).
    pub fn extent(&self) -> Result<usize, Error> {
        encoded_len(self.element.layout(), self.length()?)
    }

    /// Binds the element at `index`.
    pub fn at(&self, index: usize) -> Result<View<'t, &[u8]>, Error> {
        let offset = self.position(index)?;
        self.element.child(&self.region, offset)
    }

    pub fn value(&self) -> Result<Value, Error> {
        (0..self.length()?)
            .map(|index| self.at(index)?.value())
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn position(&self, index: usize) -> Result<usize, Error> {
        let len = self.length()?;
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let layout = self.element.layout();
        let start = payload_offset(layout)?;
        layout
            .size
            .checked_mul(index)
            .and_then(|offset| offset.checked_add(start))
            .ok_or(Error::OutOfBounds {
                offset: self.region.offset(),
                len: usize::MAX,
                capacity: self.region.end(),
            })
    }
}

impl<'t, B: AsRef<[u8]> + AsMut<[u8]>> VectorView<'t, B> {
    /// Binds the element at `index` writably.
    pub fn at_mut(&mut self, index: usize) -> Result<View<'t, &mut [u8]>, Error> {
        let offset = self.position(index)?;
        self.element.child_mut(&mut self.region, offset)
    }

    /// Overwrites the elements in place, keeping the stored length.
    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        let items = items(value)?;
        let len = self.length()?;
        if items.len() != len {
            return Err(Error::LengthMismatch {
                expected: len,
                found: items.len(),
            });
        }
        let extent = self.extent()?;
        let snapshot = Snapshot::covering(self.ty, &self.region.slice(0, extent)?);
        for (index, item) in items.iter().enumerate() {
            if let Err(err) = self.at_mut(index).and_then(|mut view| view.set_value(item)) {
                return snapshot.restore(&mut self.region, err);
            }
        }
        Ok(())
    }

    /// Writes the length prefix, padding, and every element.
    pub fn init(&mut self, value: &Value) -> Result<(), Error> {
        let extent = self.fit(items(value)?.len())?;
        let snapshot = Snapshot::take(&self.region.slice(0, extent)?);
        match self.write(value) {
            Ok(()) => Ok(()),
            Err(err) => snapshot.restore(&mut self.region, err),
        }
    }

    pub(crate) fn write(&mut self, value: &Value) -> Result<(), Error> {
        let items = items(value)?;
        self.fit(items.len())?;
        let start = payload_offset(self.element.layout())?;
        self.region.write(0, &(items.len() as u16).to_le_bytes())?;
        self.region.slice_mut(PREFIX, start - PREFIX)?.bytes_mut().fill(0);
        for (index, item) in items.iter().enumerate() {
            self.at_mut(index)?.write(item)?;
        }
        Ok(())
    }

    /// Checks that `count` elements fit in the region, returning the encoded size.
    fn fit(&self, count: usize) -> Result<usize, Error> {
        let needed = encoded_len(self.element.layout(), count)?;
        if needed > self.region.len() {
            return Err(Error::OutOfBounds {
                offset: self.region.offset(),
                len: needed,
                capacity: self.region.end(),
            });
        }
        Ok(needed)
    }
}

fn items(value: &Value) -> Result<&[Value], Error> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(mismatch("list", other)),
    }
}
