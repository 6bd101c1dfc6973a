//! Views over fixed-size scalars.
//!
//! All multi-byte scalars are little-endian: two's complement for signed integers and IEEE-754
//! for floats. A `bool` occupies one byte; any nonzero byte reads as `true` and `true` is
//! written as `1`.

use super::{mismatch, Descriptor, Type, View};
use crate::{Error, Layout, Region, Value};

/// Scalar kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

/// Descriptors for each primitive, in declaration order of [Primitive].
static DESCRIPTORS: [Type; 11] = [
    Type::Primitive(Primitive::Bool),
    Type::Primitive(Primitive::U8),
    Type::Primitive(Primitive::U16),
    Type::Primitive(Primitive::U32),
    Type::Primitive(Primitive::U64),
    Type::Primitive(Primitive::I8),
    Type::Primitive(Primitive::I16),
    Type::Primitive(Primitive::I32),
    Type::Primitive(Primitive::I64),
    Type::Primitive(Primitive::F32),
    Type::Primitive(Primitive::F64),
];

impl Primitive {
    /// Encoded size in bytes (equal to the alignment).
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    pub const fn layout(self) -> Layout {
        Layout::new(self.size(), self.size())
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// The shared [Type] for this primitive.
    pub fn descriptor(self) -> &'static Type {
        &DESCRIPTORS[self as usize]
    }

    /// Returns true for the integer kinds (usable as enum bases and union discriminants).
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Bool | Self::F32 | Self::F64)
    }

    /// Decodes `bytes`, which must be exactly [Primitive::size] long.
    pub fn decode(self, bytes: &[u8]) -> Result<Value, Error> {
        Ok(match self {
            Self::Bool => bool::decode(bytes)?.into(),
            Self::U8 => u8::decode(bytes)?.into(),
            Self::U16 => u16::decode(bytes)?.into(),
            Self::U32 => u32::decode(bytes)?.into(),
            Self::U64 => u64::decode(bytes)?.into(),
            Self::I8 => i8::decode(bytes)?.into(),
            Self::I16 => i16::decode(bytes)?.into(),
            Self::I32 => i32::decode(bytes)?.into(),
            Self::I64 => i64::decode(bytes)?.into(),
            Self::F32 => f32::decode(bytes)?.into(),
            Self::F64 => f64::decode(bytes)?.into(),
        })
    }

    /// Encodes `value` into `out`, which must be exactly [Primitive::size] long.
    ///
    /// Nothing is written if `value` is not of this kind or `out` has the wrong length.
    pub fn encode(self, value: &Value, out: &mut [u8]) -> Result<(), Error> {
        match self {
            Self::Bool => encode_as::<bool>(value, out),
            Self::U8 => encode_as::<u8>(value, out),
            Self::U16 => encode_as::<u16>(value, out),
            Self::U32 => encode_as::<u32>(value, out),
            Self::U64 => encode_as::<u64>(value, out),
            Self::I8 => encode_as::<i8>(value, out),
            Self::I16 => encode_as::<i16>(value, out),
            Self::I32 => encode_as::<i32>(value, out),
            Self::I64 => encode_as::<i64>(value, out),
            Self::F32 => encode_as::<f32>(value, out),
            Self::F64 => encode_as::<f64>(value, out),
        }
    }

    /// Reads an integer kind as `i64`.
    pub(crate) fn read_integer(self, bytes: &[u8]) -> Result<i64, Error> {
        match self.decode(bytes)? {
            Value::U8(v) => Ok(v.into()),
            Value::U16(v) => Ok(v.into()),
            Value::U32(v) => Ok(v.into()),
            Value::U64(v) => i64::try_from(v).map_err(|_| Error::InvalidDiscriminant(v as i64)),
            Value::I8(v) => Ok(v.into()),
            Value::I16(v) => Ok(v.into()),
            Value::I32(v) => Ok(v.into()),
            Value::I64(v) => Ok(v),
            other => Err(mismatch("integer", &other)),
        }
    }

    /// Converts `value` to this integer kind, failing if it is out of range.
    pub(crate) fn integer(self, value: i64) -> Result<Value, Error> {
        let invalid = |_| Error::InvalidDiscriminant(value);
        Ok(match self {
            Self::U8 => Value::U8(u8::try_from(value).map_err(invalid)?),
            Self::U16 => Value::U16(u16::try_from(value).map_err(invalid)?),
            Self::U32 => Value::U32(u32::try_from(value).map_err(invalid)?),
            Self::U64 => Value::U64(u64::try_from(value).map_err(invalid)?),
            Self::I8 => Value::I8(i8::try_from(value).map_err(invalid)?),
            Self::I16 => Value::I16(i16::try_from(value).map_err(invalid)?),
            Self::I32 => Value::I32(i32::try_from(value).map_err(invalid)?),
            Self::I64 => Value::I64(value),
            Self::Bool | Self::F32 | Self::F64 => {
                return Err(Error::TypeMismatch {
                    expected: "integer",
                    found: self.name(),
                })
            }
        })
    }
}

impl Descriptor for Primitive {
    type View<'t, B> = PrimitiveView<B> where Self: 't;

    fn descriptor(&self) -> &Type {
        Primitive::descriptor(*self)
    }

    fn narrow<'t, B>(&'t self, view: View<'t, B>) -> Result<Self::View<'t, B>, Error> {
        view.into_primitive()
    }
}

fn encode_as<T: Scalar>(value: &Value, out: &mut [u8]) -> Result<(), Error> {
    let value = T::from_value(value).ok_or_else(|| mismatch(T::PRIMITIVE.name(), value))?;
    value.encode(out)
}

/// Error for a scalar slice that is not exactly `kind.size()` bytes.
fn wrong_size(kind: Primitive, found: usize) -> Error {
    Error::OutOfBounds {
        offset: 0,
        len: kind.size(),
        capacity: found,
    }
}

/// A Rust type with a one-to-one [Primitive] encoding.
pub trait Scalar: Copy + Into<Value> {
    /// The wire kind of this type.
    const PRIMITIVE: Primitive;

    /// Decodes exactly `PRIMITIVE.size()` bytes.
    fn decode(bytes: &[u8]) -> Result<Self, Error>;

    /// Encodes into exactly `PRIMITIVE.size()` bytes.
    fn encode(self, out: &mut [u8]) -> Result<(), Error>;

    /// Extracts a value of this exact kind.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($type:ty, $variant:ident) => {
        impl Scalar for $type {
            const PRIMITIVE: Primitive = Primitive::$variant;

            #[inline]
            fn decode(bytes: &[u8]) -> Result<Self, Error> {
                let raw = bytes
                    .try_into()
                    .map_err(|_| wrong_size(Self::PRIMITIVE, bytes.len()))?;
                Ok(<$type>::from_le_bytes(raw))
            }

            #[inline]
            fn encode(self, out: &mut [u8]) -> Result<(), Error> {
                let found = out.len();
                let out: &mut [u8; std::mem::size_of::<$type>()] = out
                    .try_into()
                    .map_err(|_| wrong_size(Self::PRIMITIVE, found))?;
                *out = self.to_le_bytes();
                Ok(())
            }

            #[inline]
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

impl_scalar!(u8, U8);
impl_scalar!(u16, U16);
impl_scalar!(u32, U32);
impl_scalar!(u64, U64);
impl_scalar!(i8, I8);
impl_scalar!(i16, I16);
impl_scalar!(i32, I32);
impl_scalar!(i64, I64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

impl Scalar for bool {
    const PRIMITIVE: Primitive = Primitive::Bool;

    #[inline]
    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        match bytes {
            [byte] => Ok(*byte != 0),
            _ => Err(wrong_size(Self::PRIMITIVE, bytes.len())),
        }
    }

    #[inline]
    fn encode(self, out: &mut [u8]) -> Result<(), Error> {
        let found = out.len();
        match out {
            [byte] => {
                *byte = u8::from(self);
                Ok(())
            }
            _ => Err(wrong_size(Self::PRIMITIVE, found)),
        }
    }

    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// A scalar bound to exactly [Primitive::size] bytes.
#[derive(Debug)]
pub struct PrimitiveView<B> {
    kind: Primitive,
    region: Region<B>,
}

impl<B> PrimitiveView<B> {
    pub(crate) fn new(kind: Primitive, region: Region<B>) -> Self {
        Self { kind, region }
    }

    pub fn kind(&self) -> Primitive {
        self.kind
    }

    pub fn descriptor(&self) -> &'static Type {
        self.kind.descriptor()
    }

    pub fn region(&self) -> &Region<B> {
        &self.region
    }
}

impl<B: AsRef<[u8]>> PrimitiveView<B> {
    /// Reads the scalar as `T`, which must be the bound kind.
    pub fn get<T: Scalar>(&self) -> Result<T, Error> {
        self.check::<T>()?;
        T::decode(self.region.bytes())
    }

    pub fn value(&self) -> Result<Value, Error> {
        self.kind.decode(self.region.bytes())
    }

    fn check<T: Scalar>(&self) -> Result<(), Error> {
        if T::PRIMITIVE != self.kind {
            return Err(Error::TypeMismatch {
                expected: self.kind.name(),
                found: T::PRIMITIVE.name(),
            });
        }
        Ok(())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> PrimitiveView<B> {
    /// Writes `value`, which must be the bound kind.
    pub fn set<T: Scalar>(&mut self, value: T) -> Result<(), Error> {
        self.check::<T>()?;
        value.encode(self.region.bytes_mut())
    }

    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        self.kind.encode(value, self.region.bytes_mut())
    }

    /// Same as [PrimitiveView::set_value]: scalars have no header to initialize.
    pub fn init(&mut self, value: &Value) -> Result<(), Error> {
        self.set_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paste::paste;

    fn roundtrip<T: Scalar + PartialEq + std::fmt::Debug>(value: T) {
        let size = T::PRIMITIVE.size();
        let mut buf = vec![0u8; size];
        let mut view = T::PRIMITIVE
            .instantiate(Region::whole(&mut buf[..]))
            .unwrap();
        view.set(value).unwrap();
        assert_eq!(view.get::<T>().unwrap(), value);
        assert_eq!(view.value().unwrap(), Into::<Value>::into(value));
    }

    macro_rules! impl_num_test {
        ($type:ty) => {
            paste! {
                #[test]
                fn [<test_ $type>]() {
                    assert_eq!(
                        <$type as Scalar>::PRIMITIVE.size(),
                        std::mem::size_of::<$type>()
                    );
                    let values: [$type; 5] =
                        [0 as $type, 1 as $type, 42 as $type, <$type>::MAX, <$type>::MIN];
                    for value in values {
                        roundtrip(value);
                    }
                }
            }
        };
    }
    impl_num_test!(u8);
    impl_num_test!(u16);
    impl_num_test!(u32);
    impl_num_test!(u64);
    impl_num_test!(i8);
    impl_num_test!(i16);
    impl_num_test!(i32);
    impl_num_test!(i64);
    impl_num_test!(f32);
    impl_num_test!(f64);

    #[test]
    fn test_negative() {
        roundtrip(-1i8);
        roundtrip(-300i16);
        roundtrip(-70_000i32);
        roundtrip(-5_000_000_000i64);
        roundtrip(-0.5f32);
        roundtrip(-1e300f64);
    }

    #[test]
    fn test_float_specials() {
        for value in [f32::INFINITY, f32::NEG_INFINITY, f32::MIN_POSITIVE] {
            roundtrip(value);
        }
        for value in [f64::INFINITY, f64::NEG_INFINITY, f64::EPSILON] {
            roundtrip(value);
        }

        let mut buf = [0u8; 8];
        let mut view = Primitive::F64
            .instantiate(Region::whole(&mut buf[..]))
            .unwrap();
        view.set(f64::NAN).unwrap();
        assert!(view.get::<f64>().unwrap().is_nan());

        let mut buf = [0u8; 4];
        let mut view = Primitive::F32
            .instantiate(Region::whole(&mut buf[..]))
            .unwrap();
        view.set(f32::NAN).unwrap();
        assert!(view.get::<f32>().unwrap().is_nan());
    }

    #[test]
    fn test_bool() {
        roundtrip(true);
        roundtrip(false);

        // Any nonzero byte reads as true
        let buf = [0x7Fu8];
        let view = Primitive::Bool.instantiate(Region::whole(&buf[..])).unwrap();
        assert!(view.get::<bool>().unwrap());

        let mut buf = [0xFFu8];
        let mut view = Primitive::Bool
            .instantiate(Region::whole(&mut buf[..]))
            .unwrap();
        view.set(true).unwrap();
        assert_eq!(buf, [1]);
    }

    #[test]
    fn test_endianness() {
        let mut buf = [0u8; 4];
        let mut view = Primitive::U32
            .instantiate(Region::whole(&mut buf[..]))
            .unwrap();
        view.set(0x01020304u32).unwrap();
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);

        let mut buf = [0u8; 4];
        let mut view = Primitive::F32
            .instantiate(Region::whole(&mut buf[..]))
            .unwrap();
        view.set(1.0f32).unwrap();
        assert_eq!(buf, [0x00, 0x00, 0x80, 0x3F]);

        let mut buf = [0u8; 2];
        let mut view = Primitive::I16
            .instantiate(Region::whole(&mut buf[..]))
            .unwrap();
        view.set(-2i16).unwrap();
        assert_eq!(buf, [0xFE, 0xFF]);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut buf = [0u8; 4];
        let mut view = Primitive::U32
            .instantiate(Region::whole(&mut buf[..]))
            .unwrap();
        assert_eq!(
            view.set(1i32).unwrap_err(),
            Error::TypeMismatch {
                expected: "u32",
                found: "i32"
            }
        );
        assert!(matches!(
            view.set_value(&Value::F32(1.0)),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(buf, [0; 4]);
    }

    #[test]
    fn test_descriptors_match_kind() {
        for kind in [
            Primitive::Bool,
            Primitive::U8,
            Primitive::U16,
            Primitive::U32,
            Primitive::U64,
            Primitive::I8,
            Primitive::I16,
            Primitive::I32,
            Primitive::I64,
            Primitive::F32,
            Primitive::F64,
        ] {
            assert_eq!(kind.descriptor(), &Type::Primitive(kind));
        }
    }

    #[test]
    fn test_integer_conversions() {
        assert_eq!(Primitive::U8.integer(255).unwrap(), Value::U8(255));
        assert_eq!(
            Primitive::U8.integer(256).unwrap_err(),
            Error::InvalidDiscriminant(256)
        );
        assert_eq!(Primitive::I8.integer(-128).unwrap(), Value::I8(-128));
        assert!(Primitive::F32.integer(1).is_err());
        assert_eq!(Primitive::I16.read_integer(&[0xFE, 0xFF]).unwrap(), -2);
        assert_eq!(
            Primitive::U64.read_integer(&[0xFF; 8]).unwrap_err(),
            Error::InvalidDiscriminant(-1)
        );
    }

    #[test]
    fn test_wrong_size_slices() {
        assert_eq!(
            Primitive::U32.decode(&[1, 2]).unwrap_err(),
            Error::OutOfBounds {
                offset: 0,
                len: 4,
                capacity: 2
            }
        );
        assert!(Primitive::Bool.decode(&[]).is_err());
        assert!(u16::decode(&[1, 2, 3]).is_err());

        let mut out = [0u8; 3];
        assert!(Primitive::U16.encode(&Value::U16(7), &mut out).is_err());
        assert!(1u64.encode(&mut out).is_err());
        assert!(true.encode(&mut out[..0]).is_err());
        assert_eq!(out, [0; 3]);
    }

    #[test]
    fn test_bind_through_type() {
        let buf = [7u8, 0, 0, 0, 0, 0, 0, 0];
        for kind in [Primitive::U8, Primitive::U16, Primitive::U32, Primitive::U64] {
            let ty = Type::Primitive(kind);
            assert_eq!(ty.layout(), Layout::new(kind.size(), kind.size()));
            assert_eq!(Descriptor::layout(&kind), kind.layout());

            let view = ty.instantiate(Region::new(&buf[..], 0, kind.size()).unwrap()).unwrap();
            assert_eq!(view.value().unwrap(), kind.integer(7).unwrap());
            assert_eq!(ty.bind(&buf[..], 0).unwrap().offset(), 0);
        }
    }
}
