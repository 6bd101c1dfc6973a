//! Fixed-count arrays of packed elements.
//!
//! An array of `count` elements occupies `count * element.size` bytes with no header and
//! inherits the alignment of its element.

use super::{mismatch, Snapshot, Type, View};
use crate::{Error, Region, Value};

/// An array bound to exactly `count * element.size` bytes.
#[derive(Debug)]
pub struct ArrayView<'t, B> {
    ty: &'t Type,
    element: &'t Type,
    count: usize,
    region: Region<B>,
}

impl<'t, B> ArrayView<'t, B> {
    pub(crate) fn new(ty: &'t Type, element: &'t Type, count: usize, region: Region<B>) -> Self {
        Self {
            ty,
            element,
            count,
            region,
        }
    }

    pub fn descriptor(&self) -> &'t Type {
        self.ty
    }

    pub fn element(&self) -> &'t Type {
        self.element
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn region(&self) -> &Region<B> {
        &self.region
    }

    fn position(&self, index: usize) -> Result<usize, Error> {
        if index >= self.count {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.count,
            });
        }
        Ok(index * self.element.layout().size)
    }
}

impl<'t, B: AsRef<[u8]>> ArrayView<'t, B> {
    /// Binds the element at `index`.
    pub fn at(&self, index: usize) -> Result<View<'t, &[u8]>, Error> {
        let offset = self.position(index)?;
        self.element.child(&self.region, offset)
    }

    pub fn value(&self) -> Result<Value, Error> {
        (0..self.count)
            .map(|index| self.at(index)?.value())
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

impl<'t, B: AsRef<[u8]> + AsMut<[u8]>> ArrayView<'t, B> {
    /// Binds the element at `index` writably.
    pub fn at_mut(&mut self, index: usize) -> Result<View<'t, &mut [u8]>, Error> {
        let offset = self.position(index)?;
        self.element.child_mut(&mut self.region, offset)
    }

    /// Overwrites every element in place.
    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        let items = self.items(value)?;
        let snapshot = Snapshot::covering(self.ty, &self.region);
        for (index, item) in items.iter().enumerate() {
            if let Err(err) = self.at_mut(index).and_then(|mut view| view.set_value(item)) {
                return snapshot.restore(&mut self.region, err);
            }
        }
        Ok(())
    }

    /// Initializes every element.
    pub fn init(&mut self, value: &Value) -> Result<(), Error> {
        let snapshot = Snapshot::take(&self.region);
        match self.write(value) {
            Ok(()) => Ok(()),
            Err(err) => snapshot.restore(&mut self.region, err),
        }
    }

    pub(crate) fn write(&mut self, value: &Value) -> Result<(), Error> {
        let items = self.items(value)?;
        for (index, item) in items.iter().enumerate() {
            self.at_mut(index)?.write(item)?;
        }
        Ok(())
    }

    fn items<'v>(&self, value: &'v Value) -> Result<&'v [Value], Error> {
        let Value::List(items) = value else {
            return Err(mismatch("list", value));
        };
        if items.len() != self.count {
            return Err(Error::LengthMismatch {
                expected: self.count,
                found: items.len(),
            });
        }
        Ok(items)
    }
}
