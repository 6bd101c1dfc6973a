//! Owned values decoded from, or written into, views.

use crate::Layout;
use std::fmt;

/// The location of a value that has already been written into a buffer.
///
/// Used to initialize relative pointers: the pointer stores the distance to `offset`, and the
/// pointee's layout size must match `layout.size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    /// Absolute offset of the value in its buffer.
    pub offset: usize,

    /// Layout of the value's descriptor.
    pub layout: Layout,
}

/// A decoded value, or an initializer for a view.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    /// Elements of a fixed array or a vector, in order.
    List(Vec<Value>),
    /// Members of a struct, in declaration order.
    Struct(Vec<(String, Value)>),
    /// The name of an enum variant.
    Enum(String),
    /// The active alternative of a union and its value.
    Union(String, Box<Value>),
    /// An already-built value a pointer should refer to (initializer only).
    Ref(Target),
}

impl Value {
    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Struct(_) => "struct",
            Self::Enum(_) => "enum",
            Self::Union(..) => "union",
            Self::Ref(_) => "ref",
        }
    }

    /// Builds a struct initializer from `(name, value)` pairs.
    pub fn structure<N: Into<String>>(members: impl IntoIterator<Item = (N, Value)>) -> Self {
        Self::Struct(
            members
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Looks up a struct member by name.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(members) => members
                .iter()
                .find(|(member, _)| member == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                Self::$variant(value)
            }
        }
    };
}

impl_from!(bool, Bool);
impl_from!(u8, U8);
impl_from!(u16, U16);
impl_from!(u32, U32);
impl_from!(u64, U64);
impl_from!(i8, I8);
impl_from!(i16, I16);
impl_from!(i32, I32);
impl_from!(i64, I64);
impl_from!(f32, F32);
impl_from!(f64, F64);
impl_from!(String, String);
impl_from!(Vec<Value>, List);
impl_from!(Target, Ref);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Struct(members) => {
                write!(f, "{{")?;
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {name}: {value}")?;
                }
                write!(f, " }}")
            }
            Self::Enum(name) => write!(f, "{name}"),
            Self::Union(name, value) => write!(f, "{name}({value})"),
            Self::Ref(target) => write!(f, "@{}", target.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let value = Value::structure([
            ("x", Value::from(42f32)),
            ("tags", Value::List(vec![Value::from(1u8), Value::from(2u8)])),
            ("name", Value::from("vec")),
        ]);
        assert_eq!(value.to_string(), r#"{ x: 42, tags: [1, 2], name: "vec" }"#);
        assert_eq!(
            Value::Union("val".into(), Box::new(Value::I32(-3))).to_string(),
            "val(-3)"
        );
    }

    #[test]
    fn test_member() {
        let value = Value::structure([("a", Value::U8(1)), ("b", Value::U8(2))]);
        assert_eq!(value.member("b"), Some(&Value::U8(2)));
        assert_eq!(value.member("c"), None);
        assert_eq!(Value::U8(1).member("a"), None);
    }
}
