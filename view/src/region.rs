//! Bounded windows over a backing buffer.
//!
//! A [Region] pairs a buffer handle with the absolute byte range a view is bound to. The
//! handle is kept whole (not pre-sliced) so that relative pointers can resolve targets
//! anywhere in the same buffer.
//!
//! Regions are generic over the buffer handle `B`: any `B: AsRef<[u8]>` can be read through,
//! and `B: AsMut<[u8]>` additionally allows in-place writes. Sub-regions reborrow the parent's
//! buffer (`&[u8]` or `&mut [u8]`), so the borrow checker enforces the single-writer discipline
//! of the underlying message.

use crate::Error;

/// A byte range `[offset, offset + len)` of a buffer.
///
/// Invariant: the range always lies within the buffer.
#[derive(Clone, Copy, Debug)]
pub struct Region<B> {
    buf: B,
    offset: usize,
    len: usize,
}

impl<B> Region<B> {
    /// Absolute offset of the first byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the region covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset one past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

impl<B: AsRef<[u8]>> Region<B> {
    /// Binds `[offset, offset + len)` of `buf`.
    pub fn new(buf: B, offset: usize, len: usize) -> Result<Self, Error> {
        let capacity = buf.as_ref().len();
        match offset.checked_add(len) {
            Some(end) if end <= capacity => Ok(Self { buf, offset, len }),
            _ => Err(Error::OutOfBounds {
                offset,
                len,
                capacity,
            }),
        }
    }

    /// Binds the entire buffer.
    pub fn whole(buf: B) -> Self {
        let len = buf.as_ref().len();
        Self { buf, offset: 0, len }
    }

    /// The covered bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buf.as_ref()[self.offset..self.end()]
    }

    /// The entire backing buffer.
    pub fn buffer(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Reborrows as a read-only region over the same range.
    pub fn reborrow(&self) -> Region<&[u8]> {
        Region {
            buf: self.buf.as_ref(),
            offset: self.offset,
            len: self.len,
        }
    }

    /// Sub-region at a relative `offset`, `len` bytes long.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Region<&[u8]>, Error> {
        let absolute = self.relative(offset, len)?;
        Ok(Region {
            buf: self.buf.as_ref(),
            offset: absolute,
            len,
        })
    }

    /// Sub-region from a relative `offset` to the end of this region.
    pub fn tail(&self, offset: usize) -> Result<Region<&[u8]>, Error> {
        let len = self.remaining(offset)?;
        self.slice(offset, len)
    }

    /// Region at an absolute `offset` anywhere in the backing buffer.
    pub fn locate(&self, offset: usize, len: usize) -> Result<Region<&[u8]>, Error> {
        Region::new(self.buf.as_ref(), offset, len)
    }

    /// Region from an absolute `offset` to the end of the backing buffer.
    pub fn locate_tail(&self, offset: usize) -> Result<Region<&[u8]>, Error> {
        let capacity = self.buf.as_ref().len();
        let len = capacity.checked_sub(offset).ok_or(Error::OutOfBounds {
            offset,
            len: 0,
            capacity,
        })?;
        Region::new(self.buf.as_ref(), offset, len)
    }

    /// Shrinks the region to its first `len` bytes.
    pub fn truncate(self, len: usize) -> Result<Self, Error> {
        if len > self.len {
            return Err(Error::OutOfBounds {
                offset: self.offset,
                len,
                capacity: self.end(),
            });
        }
        Ok(Self {
            buf: self.buf,
            offset: self.offset,
            len,
        })
    }

    /// Copies `N` bytes starting at a relative offset.
    pub fn read<const N: usize>(&self, at: usize) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(at, N)?.bytes());
        Ok(out)
    }

    /// Converts a relative range into an absolute offset, checking it stays inside.
    fn relative(&self, offset: usize, len: usize) -> Result<usize, Error> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(self.offset + offset),
            _ => Err(Error::OutOfBounds {
                offset: self.offset.saturating_add(offset),
                len,
                capacity: self.end(),
            }),
        }
    }

    fn remaining(&self, offset: usize) -> Result<usize, Error> {
        self.len.checked_sub(offset).ok_or(Error::OutOfBounds {
            offset: self.offset.saturating_add(offset),
            len: 0,
            capacity: self.end(),
        })
    }
}

impl<'a> Region<&'a [u8]> {
    /// The covered bytes, for as long as the underlying borrow lives.
    pub fn into_bytes(self) -> &'a [u8] {
        &self.buf[self.offset..self.offset + self.len]
    }
}

impl<'a> Region<&'a mut [u8]> {
    /// The covered bytes, mutably, for as long as the underlying borrow lives.
    pub fn into_bytes_mut(self) -> &'a mut [u8] {
        let (start, end) = (self.offset, self.offset + self.len);
        &mut self.buf[start..end]
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Region<B> {
    /// The covered bytes, mutably.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let (start, end) = (self.offset, self.end());
        &mut self.buf.as_mut()[start..end]
    }

    /// The entire backing buffer, writably.
    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    /// Reborrows as a writable region over the same range.
    pub fn reborrow_mut(&mut self) -> Region<&mut [u8]> {
        Region {
            offset: self.offset,
            len: self.len,
            buf: self.buf.as_mut(),
        }
    }

    /// Writable sub-region at a relative `offset`, `len` bytes long.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Result<Region<&mut [u8]>, Error> {
        let absolute = self.relative(offset, len)?;
        Ok(Region {
            buf: self.buf.as_mut(),
            offset: absolute,
            len,
        })
    }

    /// Writable sub-region from a relative `offset` to the end of this region.
    pub fn tail_mut(&mut self, offset: usize) -> Result<Region<&mut [u8]>, Error> {
        let len = self.remaining(offset)?;
        self.slice_mut(offset, len)
    }

    /// Writable region at an absolute `offset` anywhere in the backing buffer.
    pub fn locate_mut(&mut self, offset: usize, len: usize) -> Result<Region<&mut [u8]>, Error> {
        Region::new(self.buf.as_mut(), offset, len)
    }

    /// Writable region from an absolute `offset` to the end of the backing buffer.
    pub fn locate_tail_mut(&mut self, offset: usize) -> Result<Region<&mut [u8]>, Error> {
        let capacity = self.buf.as_ref().len();
        let len = capacity.checked_sub(offset).ok_or(Error::OutOfBounds {
            offset,
            len: 0,
            capacity,
        })?;
        Region::new(self.buf.as_mut(), offset, len)
    }

    /// Copies `bytes` to a relative offset.
    pub fn write(&mut self, at: usize, bytes: &[u8]) -> Result<(), Error> {
        self.slice_mut(at, bytes.len())?
            .bytes_mut()
            .copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bounds() {
        let buf = [0u8; 8];
        assert!(Region::new(&buf[..], 4, 4).is_ok());
        assert_eq!(
            Region::new(&buf[..], 6, 4).unwrap_err(),
            Error::OutOfBounds {
                offset: 6,
                len: 4,
                capacity: 8
            }
        );
        assert!(Region::new(&buf[..], usize::MAX, 2).is_err());
    }

    #[test]
    fn test_slice_is_relative() {
        let buf: Vec<u8> = (0..16).collect();
        let region = Region::new(&buf[..], 4, 8).unwrap();
        let sub = region.slice(2, 3).unwrap();
        assert_eq!(sub.offset(), 6);
        assert_eq!(sub.bytes(), &[6, 7, 8]);

        // Cannot escape the parent, even though the buffer is larger
        assert!(region.slice(6, 4).is_err());
        assert_eq!(region.tail(5).unwrap().bytes(), &[9, 10, 11]);
        assert!(region.tail(9).is_err());
    }

    #[test]
    fn test_locate_is_absolute() {
        let buf: Vec<u8> = (0..16).collect();
        let region = Region::new(&buf[..], 10, 2).unwrap();
        assert_eq!(region.locate(0, 2).unwrap().bytes(), &[0, 1]);
        assert_eq!(region.locate_tail(14).unwrap().bytes(), &[14, 15]);
        assert!(region.locate(15, 2).is_err());
        assert!(region.locate_tail(17).is_err());
    }

    #[test]
    fn test_write() {
        let mut buf = vec![0u8; 8];
        let mut region = Region::new(&mut buf[..], 2, 4).unwrap();
        region.write(1, &[0xAA, 0xBB]).unwrap();
        assert!(region.write(3, &[1, 2]).is_err());
        assert_eq!(region.read::<2>(1).unwrap(), [0xAA, 0xBB]);
        assert_eq!(buf, vec![0, 0, 0, 0xAA, 0xBB, 0, 0, 0]);
    }

    #[test]
    fn test_truncate() {
        let buf = [0u8; 8];
        let region = Region::whole(&buf[..]);
        assert_eq!(region.truncate(3).unwrap().len(), 3);
        assert!(region.truncate(9).is_err());
    }
}
