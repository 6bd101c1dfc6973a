//! Construct messages in a single growable buffer.
//!
//! [MessageBuilder] is a bump allocator: every allocation is carved from the end of the used
//! prefix of one buffer, aligned as requested, and nothing is ever freed individually. Values
//! are written in place as they are allocated, and relative pointers can refer to any value
//! built earlier (or later) in the same message.
//!
//! # Example
//!
//! ```rust
//! use lattice_view::{MessageBuilder, Primitive, Type, Value};
//!
//! let mut builder = MessageBuilder::default();
//! let number = Type::Primitive(Primitive::U8);
//! let target = builder.create(&number, &Value::U8(42)).unwrap().target();
//!
//! let pointer = Type::pointer(number.clone());
//! let view = builder.point_to(&pointer, target).unwrap();
//! assert_eq!(view.value().unwrap(), Value::U8(42));
//!
//! let message = builder.finish();
//! assert_eq!(message.as_ref(), &[42, 0, 2, 0]);
//! ```

use crate::{
    layout::align_up, Descriptor, Error, PointerView, Region, StringView, Target, Type, Utf8,
    Value, View,
};
use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

/// Configuration for a [MessageBuilder].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Bytes allocated up front.
    pub initial_capacity: usize,

    /// Upper bound the buffer may grow to. Allocations past it fail with
    /// [Error::CapacityExceeded].
    pub max_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 128,
            max_capacity: 65_536,
        }
    }
}

/// A bump allocator over one zero-initialized buffer.
pub struct MessageBuilder {
    buf: BytesMut,
    cursor: usize,
    max_capacity: usize,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl MessageBuilder {
    pub fn new(cfg: Config) -> Self {
        let initial = cfg.initial_capacity.min(cfg.max_capacity);
        Self {
            buf: BytesMut::zeroed(initial),
            cursor: 0,
            max_capacity: cfg.max_capacity,
        }
    }

    /// Bytes allocated so far (including padding).
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Current size of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The message built so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    /// Reserves `size` bytes at the next multiple of `alignment`.
    ///
    /// Padding bytes skipped to reach the alignment are left zeroed. The returned region sees
    /// every byte allocated so far, so pointers written into it can resolve earlier values.
    pub fn allocate(&mut self, size: usize, alignment: usize) -> Result<Region<&mut [u8]>, Error> {
        let start = align_up(self.cursor, alignment)?;
        let end = start.checked_add(size).ok_or(Error::CapacityExceeded {
            requested: usize::MAX,
            limit: self.max_capacity,
        })?;
        self.reserve(end)?;
        self.cursor = end;
        Region::new(&mut self.buf[..end], start, size)
    }

    /// Grows the buffer (by doubling) to hold at least `end` bytes.
    fn reserve(&mut self, end: usize) -> Result<(), Error> {
        let old = self.buf.len();
        if end <= old {
            return Ok(());
        }
        if end > self.max_capacity {
            warn!(
                requested = end,
                limit = self.max_capacity,
                "allocation exceeds maximum message size"
            );
            return Err(Error::CapacityExceeded {
                requested: end,
                limit: self.max_capacity,
            });
        }
        let mut new = old.max(1);
        while new < end {
            new = new.saturating_mul(2);
        }
        let new = new.min(self.max_capacity);
        self.buf.resize(new, 0);
        debug!(old, new, "growing message buffer");
        Ok(())
    }

    /// Discards allocations made after `mark`, zeroing their bytes.
    fn rewind(&mut self, mark: usize) {
        self.buf[mark..self.cursor].fill(0);
        self.cursor = mark;
    }

    /// Binds a value previously built at absolute `offset`.
    pub fn bind<'t>(&self, ty: &'t Type, offset: usize) -> Result<View<'t, &[u8]>, Error> {
        ty.bind(self.as_bytes(), offset)
    }

    /// Binds a value previously built at absolute `offset` writably.
    pub fn bind_mut<'t>(
        &mut self,
        ty: &'t Type,
        offset: usize,
    ) -> Result<View<'t, &mut [u8]>, Error> {
        let end = self.cursor;
        ty.bind(&mut self.buf[..end], offset)
    }

    /// Allocates space for `value` and initializes it.
    ///
    /// The allocation is aligned to the descriptor's alignment and sized to the value's encoded
    /// length. If initialization fails the allocation is rolled back.
    pub fn create<'t>(
        &mut self,
        ty: &'t Type,
        value: &Value,
    ) -> Result<View<'t, &mut [u8]>, Error> {
        let len = ty.encoded_len(value)?;
        let mark = self.cursor;
        let start = self.allocate(len, ty.layout().alignment)?.offset();
        let end = self.cursor;
        let result = Region::new(&mut self.buf[..end], start, len)
            .and_then(|region| ty.instantiate(region))
            .and_then(|mut view| view.init(value));
        if let Err(err) = result {
            debug!(offset = start, len, ?err, "rolling back failed construction");
            self.rewind(mark);
            return Err(err);
        }
        ty.instantiate(Region::new(&mut self.buf[..end], start, len)?)
    }

    /// Like [MessageBuilder::create], returning the view type of a refined descriptor.
    pub fn create_as<'t, D: Descriptor>(
        &mut self,
        descriptor: &'t D,
        value: &Value,
    ) -> Result<D::View<'t, &mut [u8]>, Error> {
        let view = self.create(descriptor.descriptor(), value)?;
        descriptor.narrow(view)
    }

    /// Allocates and writes a string (prefix aligned to 2, then the UTF-8 bytes).
    pub fn create_string(&mut self, text: &str) -> Result<StringView<&mut [u8]>, Error> {
        self.create_as(&Utf8, &Value::from(text))
    }

    /// Allocates a pointer of descriptor `ty` referring to `target`.
    pub fn point_to<'t>(
        &mut self,
        ty: &'t Type,
        target: Target,
    ) -> Result<PointerView<'t, &mut [u8]>, Error> {
        self.create(ty, &Value::Ref(target))?.into_pointer()
    }

    /// Zeroes the used bytes and starts a new message, keeping the allocation.
    pub fn reset(&mut self) {
        debug!(len = self.cursor, "resetting message builder");
        self.rewind(0);
    }

    /// Returns the finished message.
    pub fn finish(mut self) -> Bytes {
        self.buf.truncate(self.cursor);
        self.buf.freeze()
    }
}
