//! Length-prefixed UTF-8 text.
//!
//! ```text
//! +--------+--------+----------------------+
//! | len lo | len hi | len bytes of UTF-8   |
//! +--------+--------+----------------------+
//! ```
//!
//! The prefix is an unsigned 16-bit little-endian byte count and the value is aligned to 2.
//! The payload is not validated until it is read as text.

use super::{mismatch, Descriptor, Type, View};
use crate::{Error, Layout, Region, Value};

/// Size of the length prefix.
pub(crate) const PREFIX: usize = 2;

/// Static layout (prefix only).
pub(crate) const LAYOUT: Layout = Layout::new(PREFIX, 2);

static STRING: Type = Type::String;

/// Bytes needed to encode a string with a `len`-byte payload.
pub(crate) fn encoded_len(len: usize) -> Result<usize, Error> {
    if len > u16::MAX as usize {
        return Err(Error::LengthOverflow(len));
    }
    Ok(PREFIX + len)
}

/// Descriptor for strings that narrows bound views to [StringView].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Utf8;

impl Descriptor for Utf8 {
    type View<'t, B> = StringView<B> where Self: 't;

    fn descriptor(&self) -> &Type {
        &STRING
    }

    fn narrow<'t, B>(&'t self, view: View<'t, B>) -> Result<Self::View<'t, B>, Error> {
        view.into_string()
    }
}

/// A string bound to a region starting at its length prefix.
///
/// The region extends past the prefix (to the end of the enclosing value or buffer); the
/// payload is bounded against it on every access.
#[derive(Debug)]
pub struct StringView<B> {
    region: Region<B>,
}

impl<B> StringView<B> {
    pub(crate) fn new(region: Region<B>) -> Self {
        Self { region }
    }

    pub fn descriptor(&self) -> &'static Type {
        &STRING
    }

    pub fn region(&self) -> &Region<B> {
        &self.region
    }
}

impl<B: AsRef<[u8]>> StringView<B> {
    /// Binds the string whose prefix starts at absolute `offset` of `buf`.
    pub fn bind(buf: B, offset: usize) -> Result<Self, Error> {
        STRING.bind(buf, offset)?.into_string()
    }

    /// Stored byte length of the payload.
    pub fn length(&self) -> Result<usize, Error> {
        Ok(u16::from_le_bytes(self.region.read(0)?) as usize)
    }

    /// Total encoded size (prefix and payload).
    pub fn extent(&self) -> Result<usize, Error> {
        Ok(PREFIX + self.length()?)
    }

    /// The raw payload.
    pub fn as_bytes(&self) -> Result<&[u8], Error> {
        let len = self.length()?;
        Ok(self.region.slice(PREFIX, len)?.into_bytes())
    }

    /// The payload as text.
    pub fn as_str(&self) -> Result<&str, Error> {
        Ok(std::str::from_utf8(self.as_bytes()?)?)
    }

    pub fn value(&self) -> Result<Value, Error> {
        Ok(Value::String(self.as_str()?.to_string()))
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> StringView<B> {
    /// Writes the length prefix and payload.
    ///
    /// Nothing is written if the text does not fit in the region or its length overflows the
    /// prefix.
    pub fn init(&mut self, text: &str) -> Result<(), Error> {
        let needed = encoded_len(text.len())?;
        if needed > self.region.len() {
            return Err(Error::OutOfBounds {
                offset: self.region.offset(),
                len: needed,
                capacity: self.region.end(),
            });
        }
        self.region.write(0, &(text.len() as u16).to_le_bytes())?;
        self.region.write(PREFIX, text.as_bytes())
    }

    /// Replaces the payload with text of the same byte length.
    pub fn set(&mut self, text: &str) -> Result<(), Error> {
        let len = self.length()?;
        if text.len() != len {
            return Err(Error::LengthMismatch {
                expected: len,
                found: text.len(),
            });
        }
        self.region.write(PREFIX, text.as_bytes())
    }

    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::String(text) => self.set(text),
            other => Err(mismatch("string", other)),
        }
    }

    /// Initializes from a [Value::String].
    pub fn init_value(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::String(text) => self.init(text),
            other => Err(mismatch("string", other)),
        }
    }
}
