//! Relative pointers.
//!
//! A pointer is a signed 16-bit little-endian displacement `d` stored at the pointer's own
//! (2-aligned) location. The pointee starts at `pointer_offset - d` in the same buffer, so a
//! positive displacement refers backwards (to an earlier allocation) and a negative one
//! forwards. A displacement of zero is the null pointer.

use super::{mismatch, Type, View};
use crate::{Error, Layout, Region, Target, Value};

/// Static layout of every pointer, independent of the pointee.
pub(crate) const LAYOUT: Layout = Layout::new(2, 2);

/// A pointer bound to its 2-byte displacement.
#[derive(Debug)]
pub struct PointerView<'t, B> {
    ty: &'t Type,
    pointee: &'t Type,
    region: Region<B>,
}

impl<'t, B> PointerView<'t, B> {
    pub(crate) fn new(ty: &'t Type, pointee: &'t Type, region: Region<B>) -> Self {
        Self {
            ty,
            pointee,
            region,
        }
    }

    pub fn descriptor(&self) -> &'t Type {
        self.ty
    }

    /// Descriptor of the value pointed to.
    pub fn pointee(&self) -> &'t Type {
        self.pointee
    }

    pub fn region(&self) -> &Region<B> {
        &self.region
    }
}

impl<'t, B: AsRef<[u8]>> PointerView<'t, B> {
    /// The stored displacement.
    pub fn displacement(&self) -> Result<i16, Error> {
        Ok(i16::from_le_bytes(self.region.read(0)?))
    }

    pub fn is_null(&self) -> Result<bool, Error> {
        Ok(self.displacement()? == 0)
    }

    /// Absolute offset of the pointee in the backing buffer.
    pub fn target_offset(&self) -> Result<usize, Error> {
        let displacement = self.displacement()?;
        if displacement == 0 {
            return Err(Error::NullPointer(self.region.offset()));
        }
        let target = self.region.offset() as i64 - i64::from(displacement);
        usize::try_from(target).map_err(|_| Error::OutOfBounds {
            offset: self.region.offset(),
            len: self.pointee.layout().size,
            capacity: self.region.buffer().len(),
        })
    }

    /// Binds the pointee.
    ///
    /// Fixed-size pointees are bound to exactly their layout size; strings and vectors extend
    /// to the end of the buffer and are bounded by their own prefix.
    pub fn deref(&self) -> Result<View<'t, &[u8]>, Error> {
        let target = self.target_offset()?;
        self.pointee.resolve(&self.region, target)
    }

    /// The pointee's value.
    pub fn value(&self) -> Result<Value, Error> {
        self.deref()?.value()
    }
}

impl<'t, B: AsRef<[u8]> + AsMut<[u8]>> PointerView<'t, B> {
    /// Binds the pointee writably.
    pub fn deref_mut(&mut self) -> Result<View<'t, &mut [u8]>, Error> {
        let target = self.target_offset()?;
        self.pointee.resolve_mut(&mut self.region, target)
    }

    /// Overwrites the pointee's value in place.
    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        self.deref_mut()?.set_value(value)
    }

    /// Points at an already-built value.
    ///
    /// The target's layout size must equal the pointee's and its displacement must fit in
    /// 16 bits (and be nonzero). Nothing is written on failure.
    pub fn point_to(&mut self, target: Target) -> Result<(), Error> {
        let expected = self.pointee.layout().size;
        if target.layout.size != expected {
            return Err(Error::TargetMismatch {
                expected,
                found: target.layout.size,
            });
        }
        let capacity = self.region.buffer().len();
        if target.offset.saturating_add(expected) > capacity {
            return Err(Error::OutOfBounds {
                offset: target.offset,
                len: expected,
                capacity,
            });
        }
        let displacement = self.region.offset() as i64 - target.offset as i64;
        let encoded = match i16::try_from(displacement) {
            Ok(0) | Err(_) => return Err(Error::DisplacementOverflow(displacement)),
            Ok(encoded) => encoded,
        };
        self.region.write(0, &encoded.to_le_bytes())
    }

    /// Resets to the null pointer.
    pub fn set_null(&mut self) -> Result<(), Error> {
        self.region.write(0, &0i16.to_le_bytes())
    }

    /// Initializes from a [Value::Ref].
    pub fn init(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Ref(target) => self.point_to(*target),
            other => Err(mismatch("ref", other)),
        }
    }
}
