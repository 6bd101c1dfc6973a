//! Type descriptors and the views they bind.
//!
//! The set of value kinds is closed, so both descriptors ([Type]) and bound views ([View]) are
//! tagged unions with one variant per kind. Composite views (arrays, vectors, structs, unions,
//! pointers) bind their children over sub-ranges of the same buffer on demand; nothing is
//! decoded until a value is requested.

mod array;
mod enumeration;
mod pointer;
mod primitives;
mod string;
mod structure;
mod union;
mod vector;

pub use array::ArrayView;
pub use enumeration::{EnumType, EnumView};
pub use pointer::PointerView;
pub use primitives::{Primitive, PrimitiveView, Scalar};
pub use string::{StringView, Utf8};
pub use structure::{Member, StructType, StructView};
pub use union::{UnionType, UnionView};
pub use vector::VectorView;

use crate::{Error, Layout, Region, Target, Value};
use std::sync::Arc;

/// Describes the layout of a value kind and binds views of it.
///
/// Descriptors are immutable and have no affinity to any buffer: one descriptor binds any
/// number of regions over its lifetime.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Primitive(Primitive),
    /// Length-prefixed UTF-8 text.
    String,
    /// `count` packed elements with no header.
    Array(Box<Type>, usize),
    /// Length-prefixed sequence of packed elements.
    Vector(Box<Type>),
    /// 16-bit signed displacement to a value elsewhere in the same buffer.
    Pointer(Box<Type>),
    Struct(Arc<StructType>),
    Enum(Arc<EnumType>),
    Union(Arc<UnionType>),
}

impl Type {
    /// Fixed array of `count` elements.
    pub fn array(element: Type, count: usize) -> Self {
        Self::Array(Box::new(element), count)
    }

    /// Variable-length vector of elements.
    pub fn vector(element: Type) -> Self {
        Self::Vector(Box::new(element))
    }

    /// Relative pointer to a value.
    pub fn pointer(pointee: Type) -> Self {
        Self::Pointer(Box::new(pointee))
    }

    /// Short name of the kind, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Primitive(primitive) => primitive.name(),
            Self::String => "string",
            Self::Array(..) => "array",
            Self::Vector(_) => "vector",
            Self::Pointer(_) => "pointer",
            Self::Struct(_) => "struct",
            Self::Enum(_) => "enum",
            Self::Union(_) => "union",
        }
    }

    /// Static layout of the kind.
    ///
    /// For strings and vectors this is the length prefix only.
    pub fn layout(&self) -> Layout {
        match self {
            Self::Primitive(primitive) => Primitive::layout(*primitive),
            Self::String => string::LAYOUT,
            Self::Array(element, count) => {
                let element = element.layout();
                Layout::new(element.size.saturating_mul(*count), element.alignment)
            }
            Self::Vector(element) => Layout::new(vector::PREFIX, element.layout().alignment),
            Self::Pointer(_) => pointer::LAYOUT,
            Self::Struct(schema) => schema.layout(),
            Self::Enum(schema) => schema.layout(),
            Self::Union(schema) => schema.layout(),
        }
    }

    /// Returns true if the encoded size depends on the stored data.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::String | Self::Vector(_))
    }

    /// Returns true if overwriting a value of this kind in place may write outside its own
    /// bytes (through a pointer).
    pub(crate) fn writes_through(&self) -> bool {
        match self {
            Self::Pointer(_) => true,
            Self::Array(element, _) | Self::Vector(element) => element.writes_through(),
            Self::Struct(schema) => schema.members().iter().any(|m| m.ty.writes_through()),
            // Unions are re-initialized, which only writes displacements
            Self::Primitive(_) | Self::String | Self::Enum(_) | Self::Union(_) => false,
        }
    }

    /// Number of bytes needed to construct `value` with this descriptor.
    pub fn encoded_len(&self, value: &Value) -> Result<usize, Error> {
        match (self, value) {
            (Self::String, Value::String(text)) => string::encoded_len(text.len()),
            (Self::String, other) => Err(mismatch("string", other)),
            (Self::Vector(element), Value::List(items)) => {
                vector::encoded_len(element.layout(), items.len())
            }
            (Self::Vector(_), other) => Err(mismatch("list", other)),
            _ => Ok(self.layout().size),
        }
    }

    /// Binds a view over `region`.
    ///
    /// Fixed-size kinds are narrowed to exactly their layout size; an undersized region is
    /// rejected. Variable-size kinds keep the whole region (it must at least hold the prefix)
    /// and bound their payload against it when read.
    pub fn instantiate<B: AsRef<[u8]>>(&self, region: Region<B>) -> Result<View<'_, B>, Error> {
        // Variable-length values can only be embedded through pointers
        if let Self::Array(element, _) | Self::Vector(element) = self {
            if element.is_variable() {
                return Err(Error::InvalidSchema(
                    self.name().to_string(),
                    format!("variable-length element {}", element.name()),
                ));
            }
        }
        let layout = self.layout();
        if region.len() < layout.size {
            return Err(Error::OutOfBounds {
                offset: region.offset(),
                len: layout.size,
                capacity: region.end(),
            });
        }
        let region = if self.is_variable() {
            region
        } else {
            region.truncate(layout.size)?
        };
        Ok(match self {
            Self::Primitive(primitive) => View::Primitive(PrimitiveView::new(*primitive, region)),
            Self::String => View::String(StringView::new(region)),
            Self::Array(element, count) => {
                View::Array(ArrayView::new(self, element, *count, region))
            }
            Self::Vector(element) => View::Vector(VectorView::new(self, element, region)),
            Self::Pointer(pointee) => View::Pointer(PointerView::new(self, pointee, region)),
            Self::Struct(schema) => View::Struct(StructView::new(self, schema, region)),
            Self::Enum(schema) => View::Enum(EnumView::new(self, schema, region)),
            Self::Union(schema) => View::Union(UnionView::new(self, schema, region)),
        })
    }

    /// Binds a view over existing bytes starting at absolute `offset` of `buf`.
    pub fn bind<B: AsRef<[u8]>>(&self, buf: B, offset: usize) -> Result<View<'_, B>, Error> {
        let region = if self.is_variable() {
            let capacity = buf.as_ref().len();
            let len = capacity.checked_sub(offset).ok_or(Error::OutOfBounds {
                offset,
                len: self.layout().size,
                capacity,
            })?;
            Region::new(buf, offset, len)?
        } else {
            Region::new(buf, offset, self.layout().size)?
        };
        self.instantiate(region)
    }

    /// Binds at a relative `offset` inside `parent`.
    pub(crate) fn child<'t, 'r, B: AsRef<[u8]>>(
        &'t self,
        parent: &'r Region<B>,
        offset: usize,
    ) -> Result<View<'t, &'r [u8]>, Error> {
        let region = if self.is_variable() {
            parent.tail(offset)?
        } else {
            parent.slice(offset, self.layout().size)?
        };
        self.instantiate(region)
    }

    /// Binds writably at a relative `offset` inside `parent`.
    pub(crate) fn child_mut<'t, 'r, B: AsRef<[u8]> + AsMut<[u8]>>(
        &'t self,
        parent: &'r mut Region<B>,
        offset: usize,
    ) -> Result<View<'t, &'r mut [u8]>, Error> {
        let region = if self.is_variable() {
            parent.tail_mut(offset)?
        } else {
            parent.slice_mut(offset, self.layout().size)?
        };
        self.instantiate(region)
    }

    /// Binds at an absolute `offset` of the buffer backing `from`.
    pub(crate) fn resolve<'t, 'r, B: AsRef<[u8]>>(
        &'t self,
        from: &'r Region<B>,
        offset: usize,
    ) -> Result<View<'t, &'r [u8]>, Error> {
        let region = if self.is_variable() {
            from.locate_tail(offset)?
        } else {
            from.locate(offset, self.layout().size)?
        };
        self.instantiate(region)
    }

    /// Binds writably at an absolute `offset` of the buffer backing `from`.
    pub(crate) fn resolve_mut<'t, 'r, B: AsRef<[u8]> + AsMut<[u8]>>(
        &'t self,
        from: &'r mut Region<B>,
        offset: usize,
    ) -> Result<View<'t, &'r mut [u8]>, Error> {
        let region = if self.is_variable() {
            from.locate_tail_mut(offset)?
        } else {
            from.locate_mut(offset, self.layout().size)?
        };
        self.instantiate(region)
    }
}

/// A descriptor whose bound views have a known concrete type.
///
/// [Type] binds the generic [View]; refined descriptors (such as [Utf8], [Primitive], or the
/// markers generated by [crate::structure]) narrow it so typed construction helpers can return
/// the specific view.
pub trait Descriptor {
    /// The view produced by binding this descriptor.
    type View<'t, B>
    where
        Self: 't;

    /// The dynamic descriptor backing this one.
    fn descriptor(&self) -> &Type;

    /// Narrows a view bound with [Descriptor::descriptor] to the concrete view type.
    fn narrow<'t, B>(&'t self, view: View<'t, B>) -> Result<Self::View<'t, B>, Error>;

    /// Static layout of the described kind.
    fn layout(&self) -> Layout {
        self.descriptor().layout()
    }

    /// Binds a concrete view over `region`.
    fn instantiate<'t, B: AsRef<[u8]>>(
        &'t self,
        region: Region<B>,
    ) -> Result<Self::View<'t, B>, Error> {
        let view = self.descriptor().instantiate(region)?;
        self.narrow(view)
    }
}

impl Descriptor for Type {
    type View<'t, B> = View<'t, B> where Self: 't;

    fn descriptor(&self) -> &Type {
        self
    }

    fn narrow<'t, B>(&'t self, view: View<'t, B>) -> Result<Self::View<'t, B>, Error> {
        Ok(view)
    }
}

/// A value of any kind bound to a region of a buffer.
#[derive(Debug)]
pub enum View<'t, B> {
    Primitive(PrimitiveView<B>),
    String(StringView<B>),
    Array(ArrayView<'t, B>),
    Vector(VectorView<'t, B>),
    Pointer(PointerView<'t, B>),
    Struct(StructView<'t, B>),
    Enum(EnumView<'t, B>),
    Union(UnionView<'t, B>),
}

macro_rules! impl_into {
    ($method:ident, $variant:ident, $view:ty, $expected:literal) => {
        #[doc = concat!("Converts into the ", $expected, " view, or fails with a type mismatch.")]
        pub fn $method(self) -> Result<$view, Error> {
            match self {
                Self::$variant(view) => Ok(view),
                other => Err(Error::TypeMismatch {
                    expected: $expected,
                    found: other.descriptor().name(),
                }),
            }
        }
    };
}

impl<'t, B> View<'t, B> {
    /// The descriptor this view was bound with.
    pub fn descriptor(&self) -> &'t Type {
        match self {
            Self::Primitive(view) => view.descriptor(),
            Self::String(view) => view.descriptor(),
            Self::Array(view) => view.descriptor(),
            Self::Vector(view) => view.descriptor(),
            Self::Pointer(view) => view.descriptor(),
            Self::Struct(view) => view.descriptor(),
            Self::Enum(view) => view.descriptor(),
            Self::Union(view) => view.descriptor(),
        }
    }

    /// The region this view is bound to.
    pub fn region(&self) -> &Region<B> {
        match self {
            Self::Primitive(view) => view.region(),
            Self::String(view) => view.region(),
            Self::Array(view) => view.region(),
            Self::Vector(view) => view.region(),
            Self::Pointer(view) => view.region(),
            Self::Struct(view) => view.region(),
            Self::Enum(view) => view.region(),
            Self::Union(view) => view.region(),
        }
    }

    /// Absolute offset of the value in its buffer.
    pub fn offset(&self) -> usize {
        self.region().offset()
    }

    /// Where this value lives, for initializing pointers to it.
    pub fn target(&self) -> Target {
        Target {
            offset: self.offset(),
            layout: self.descriptor().layout(),
        }
    }

    impl_into!(into_primitive, Primitive, PrimitiveView<B>, "primitive");
    impl_into!(into_string, String, StringView<B>, "string");
    impl_into!(into_array, Array, ArrayView<'t, B>, "array");
    impl_into!(into_vector, Vector, VectorView<'t, B>, "vector");
    impl_into!(into_pointer, Pointer, PointerView<'t, B>, "pointer");
    impl_into!(into_struct, Struct, StructView<'t, B>, "struct");
    impl_into!(into_enum, Enum, EnumView<'t, B>, "enum");
    impl_into!(into_union, Union, UnionView<'t, B>, "union");
}

impl<'t, B: AsRef<[u8]>> View<'t, B> {
    /// Decodes the value, recursively.
    pub fn value(&self) -> Result<Value, Error> {
        match self {
            Self::Primitive(view) => view.value(),
            Self::String(view) => view.value(),
            Self::Array(view) => view.value(),
            Self::Vector(view) => view.value(),
            Self::Pointer(view) => view.value(),
            Self::Struct(view) => view.value(),
            Self::Enum(view) => view.value(),
            Self::Union(view) => view.value(),
        }
    }
}

impl<'t, B: AsRef<[u8]> + AsMut<[u8]>> View<'t, B> {
    /// Overwrites the stored value in place.
    ///
    /// Strings and vectors keep their stored length: replacement contents must be the same
    /// length. Pointers write through to their pointee.
    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        match self {
            Self::Primitive(view) => view.set_value(value),
            Self::String(view) => view.set_value(value),
            Self::Array(view) => view.set_value(value),
            Self::Vector(view) => view.set_value(value),
            Self::Pointer(view) => view.set_value(value),
            Self::Struct(view) => view.set_value(value),
            Self::Enum(view) => view.set_value(value),
            Self::Union(view) => view.set_value(value),
        }
    }

    /// Initializes freshly allocated bytes from `value`.
    ///
    /// Unlike [View::set_value], strings and vectors write their length prefix and pointers
    /// expect a [Value::Ref]. Either the whole value is written or, on error, the bytes of the
    /// view are left as they were.
    pub fn init(&mut self, value: &Value) -> Result<(), Error> {
        match self {
            Self::Primitive(view) => view.init(value),
            Self::String(view) => view.init_value(value),
            Self::Array(view) => view.init(value),
            Self::Vector(view) => view.init(value),
            Self::Pointer(view) => view.init(value),
            Self::Struct(view) => view.init(value),
            Self::Enum(view) => view.init(value),
            Self::Union(view) => view.init(value),
        }
    }

    /// Initialization without rollback, for use inside an enclosing [View::init].
    pub(crate) fn write(&mut self, value: &Value) -> Result<(), Error> {
        match self {
            Self::Primitive(view) => view.init(value),
            Self::String(view) => view.init_value(value),
            Self::Array(view) => view.write(value),
            Self::Vector(view) => view.write(value),
            Self::Pointer(view) => view.init(value),
            Self::Struct(view) => view.write(value),
            Self::Enum(view) => view.init(value),
            Self::Union(view) => view.write(value),
        }
    }
}

/// Saved bytes of a buffer, restored if a multi-step write fails.
pub(crate) struct Snapshot {
    offset: usize,
    saved: Vec<u8>,
}

impl Snapshot {
    /// Saves the bytes of `region`.
    pub(crate) fn take<B: AsRef<[u8]>>(region: &Region<B>) -> Self {
        Self {
            offset: region.offset(),
            saved: region.bytes().to_vec(),
        }
    }

    /// Saves every byte an in-place overwrite of `ty` at `region` may touch.
    ///
    /// Pointers write through to their pointees, which can lie anywhere in the buffer, so a
    /// descriptor containing one saves the whole buffer.
    pub(crate) fn covering<B: AsRef<[u8]>>(ty: &Type, region: &Region<B>) -> Self {
        if !ty.writes_through() {
            return Self::take(region);
        }
        Self {
            offset: 0,
            saved: region.buffer().to_vec(),
        }
    }

    /// Restores the saved bytes into the buffer backing `region` and returns `err`.
    pub(crate) fn restore<B: AsRef<[u8]> + AsMut<[u8]>, T>(
        self,
        region: &mut Region<B>,
        err: Error,
    ) -> Result<T, Error> {
        let end = self.offset + self.saved.len();
        region.buffer_mut()[self.offset..end].copy_from_slice(&self.saved);
        Err(err)
    }
}

pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Error {
    Error::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts() {
        let f32_type = Type::Primitive(Primitive::F32);
        assert_eq!(f32_type.layout(), Layout::new(4, 4));
        assert_eq!(Type::String.layout(), Layout::new(2, 2));
        assert_eq!(Type::array(f32_type.clone(), 3).layout(), Layout::new(12, 4));
        assert_eq!(
            Type::vector(Type::Primitive(Primitive::U64)).layout(),
            Layout::new(2, 8)
        );
        assert_eq!(Type::vector(Type::Primitive(Primitive::U8)).layout(), Layout::new(2, 1));
        assert_eq!(Type::pointer(Type::String).layout(), Layout::new(2, 2));
        assert_eq!(
            Type::pointer(Type::array(f32_type, 100)).layout(),
            Layout::new(2, 2)
        );
    }

    #[test]
    fn test_instantiate_undersized() {
        let buf = [0u8; 3];
        let region = Region::whole(&buf[..]);
        let ty = Type::Primitive(Primitive::U32);
        assert!(matches!(
            ty.instantiate(region),
            Err(Error::OutOfBounds { .. })
        ));

        let region = Region::new(&buf[..], 2, 1).unwrap();
        assert!(Type::String.instantiate(region).is_err());
    }

    #[test]
    fn test_variable_elements_rejected() {
        let buf = [0u8; 8];
        for ty in [Type::vector(Type::String), Type::array(Type::String, 2)] {
            assert!(matches!(
                ty.bind(&buf[..], 0),
                Err(Error::InvalidSchema(..))
            ));
        }

        // Through a pointer is fine
        let ty = Type::array(Type::pointer(Type::String), 2);
        assert!(ty.bind(&buf[..], 0).is_ok());
    }

    #[test]
    fn test_instantiate_narrows_fixed() {
        let buf = [1u8, 2, 3, 4, 5, 6];
        let ty = Type::Primitive(Primitive::U16);
        let view = ty.instantiate(Region::whole(&buf[..])).unwrap();
        assert_eq!(view.region().len(), 2);
        assert_eq!(view.value().unwrap(), Value::U16(0x0201));

        // Variable kinds keep the whole region
        let ty = Type::String;
        let view = ty.instantiate(Region::whole(&buf[..])).unwrap();
        assert_eq!(view.region().len(), 6);
    }

    #[test]
    fn test_bind_at_offset() {
        let buf = [0u8, 0, 3, 0, b'a', b'b', b'c', 0xFF];
        let string = Type::String;
        let view = string.bind(&buf[..], 2).unwrap();
        assert_eq!(view.value().unwrap(), Value::from("abc"));
        assert_eq!(view.offset(), 2);

        let byte = Type::Primitive(Primitive::U8);
        let view = byte.bind(&buf[..], 7).unwrap();
        assert_eq!(view.value().unwrap(), Value::U8(0xFF));
        assert!(Type::Primitive(Primitive::U16).bind(&buf[..], 7).is_err());
        assert!(Type::String.bind(&buf[..], 9).is_err());
    }

    #[test]
    fn test_into_mismatch() {
        let buf = [0u8; 4];
        let ty = Type::Primitive(Primitive::I32);
        let view = ty.bind(&buf[..], 0).unwrap();
        assert_eq!(
            view.into_string().unwrap_err(),
            Error::TypeMismatch {
                expected: "string",
                found: "i32"
            }
        );
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(Type::String.encoded_len(&Value::from("hello")).unwrap(), 7);
        assert_eq!(
            Type::vector(Type::Primitive(Primitive::U32))
                .encoded_len(&Value::List(vec![Value::U32(1); 3]))
                .unwrap(),
            16
        );
        assert_eq!(
            Type::Primitive(Primitive::U64)
                .encoded_len(&Value::U64(9))
                .unwrap(),
            8
        );
        assert!(matches!(
            Type::String.encoded_len(&Value::U8(1)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_target() {
        let buf = [0u8; 16];
        let ty = Type::Primitive(Primitive::U64);
        let view = ty.bind(&buf[..], 8).unwrap();
        assert_eq!(
            view.target(),
            Target {
                offset: 8,
                layout: Layout::new(8, 8)
            }
        );
    }

    fn offset_of<B>(view: &View<'_, B>) -> usize {
        view.offset()
    }

    #[test]
    fn test_offset_for_any_buffer() {
        let buf = [0u8; 4];
        let ty = Type::Primitive(Primitive::U16);
        let view = ty.bind(&buf[..], 2).unwrap();
        assert_eq!(offset_of(&view), 2);
        assert_eq!(view.region().end(), 4);
    }

    #[test]
    fn test_writes_through() {
        let byte = Type::Primitive(Primitive::U8);
        assert!(!byte.writes_through());
        assert!(!Type::vector(byte.clone()).writes_through());
        assert!(Type::pointer(byte.clone()).writes_through());
        assert!(Type::array(Type::pointer(byte.clone()), 2).writes_through());

        let schema = StructType::new(
            "Link",
            Layout::new(2, 2),
            [Member::new("next", Type::pointer(byte), 0)],
        )
        .unwrap();
        assert!(Type::Struct(Arc::new(schema)).writes_through());
    }
}
