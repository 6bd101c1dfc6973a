//! Read and write schema-derived binary messages in place.
//!
//! # Overview
//!
//! Messages are stored in one contiguous little-endian buffer. Instead of decoding into native
//! structures, callers bind a *view* to a byte range of the buffer: reads decode only the bytes
//! asked for and writes mutate the buffer directly. Composite views (arrays, vectors, structs,
//! unions, and pointers) bind their children over sub-ranges of the same buffer on demand.
//!
//! Every value kind is described by a [Type], which reports its [Layout] and binds views. The
//! set of kinds is closed:
//!
//! - Primitives: `bool`, `u8`..`u64`, `i8`..`i64`, `f32`, `f64`
//! - Strings: 16-bit byte length, then UTF-8 bytes
//! - Arrays: a fixed count of packed elements
//! - Vectors: 16-bit element count, padding to the element alignment, then packed elements
//! - Structs and unions: members at fixed offsets
//! - Enums: named discriminants stored in an integer primitive
//! - Pointers: a signed 16-bit displacement to a value elsewhere in the buffer
//!
//! # Format
//!
//! ```text
//! string "hi" at 0, u32 vector [7] at 4, pointer to the string at 12:
//!
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9 |10 |11 |12 |13 |
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! | len=2 | h | i | len=1 |  pad  |  7 (u32 LE)   | d=12  |
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//!
//! pointee offset = pointer offset - d = 12 - 12 = 0
//! ```
//!
//! # Construction
//!
//! [MessageBuilder] is a bump allocator that hands out aligned regions of a growable buffer and
//! initializes values in them. Because pointers are relative, values are typically built
//! leaves-first: build the pointee, then point to its [Target].
//!
//! # Example
//!
//! ```rust
//! use lattice_view::{MessageBuilder, Primitive, Type, Value};
//!
//! let mut builder = MessageBuilder::default();
//!
//! // Build a string and a vector
//! let name = builder.create_string("hi").unwrap().region().offset();
//! let numbers = Type::vector(Type::Primitive(Primitive::U32));
//! builder.create(&numbers, &Value::List(vec![Value::U32(7)])).unwrap();
//!
//! // Point at the string
//! let target = builder.bind(&Type::String, name).unwrap().target();
//! let pointer = Type::pointer(Type::String);
//! let view = builder.point_to(&pointer, target).unwrap();
//! assert_eq!(view.value().unwrap(), Value::from("hi"));
//!
//! let message = builder.finish();
//! assert_eq!(message.len(), 14);
//! assert_eq!(&message[12..], &12i16.to_le_bytes());
//! ```

pub mod builder;
pub mod error;
pub mod layout;
mod macros;
pub mod region;
pub mod types;
pub mod value;

pub use builder::{Config, MessageBuilder};
pub use error::{Category, Error};
pub use layout::{align_up, Layout};
pub use region::Region;
pub use types::{
    ArrayView, Descriptor, EnumType, EnumView, Member, PointerView, Primitive, PrimitiveView,
    Scalar, StringView, StructType, StructView, Type, UnionType, UnionView, Utf8, VectorView,
    View,
};
pub use value::{Target, Value};

#[doc(hidden)]
pub use paste;
