//! Structs with a fixed member table.
//!
//! A struct's layout and the offset of each member are fixed when the schema is compiled.
//! Members are laid out inline and never overlap; variable-length values (strings and vectors)
//! must be reached through pointer members.

use super::{mismatch, Scalar, Snapshot, Type, View};
use crate::{Error, Layout, Region, Value};
use std::collections::HashSet;

/// A named member at a fixed offset.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: Type,
    /// Byte offset relative to the start of the enclosing value.
    pub offset: usize,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: Type, offset: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            offset,
        }
    }
}

/// Checks a member table against the enclosing layout.
///
/// Every member must be aligned, start at or after `floor`, and end within `layout.size`.
/// Names must be unique. If `disjoint` is set, member ranges may not overlap.
pub(crate) fn validate_members(
    owner: &str,
    layout: Layout,
    members: &[Member],
    floor: usize,
    disjoint: bool,
) -> Result<(), Error> {
    let invalid = |reason: String| Error::InvalidSchema(owner.to_string(), reason);
    let mut names = HashSet::new();
    let mut ranges = Vec::with_capacity(members.len());
    for member in members {
        if !names.insert(member.name.as_str()) {
            return Err(invalid(format!("duplicate member {}", member.name)));
        }
        if member.ty.is_variable() {
            return Err(invalid(format!(
                "variable-length member {} must be behind a pointer",
                member.name
            )));
        }
        let required = member.ty.layout();
        if required.alignment > layout.alignment || !required.is_aligned(member.offset) {
            return Err(invalid(format!(
                "member {} at {} is not aligned to {}",
                member.name, member.offset, required.alignment
            )));
        }
        let end = member
            .offset
            .checked_add(required.size)
            .filter(|end| member.offset >= floor && *end <= layout.size)
            .ok_or_else(|| {
                invalid(format!(
                    "member {} at {} does not fit in {} bytes",
                    member.name, member.offset, layout.size
                ))
            })?;
        ranges.push((member.offset, end, member.name.as_str()));
    }
    if disjoint {
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            let ((_, end, first), (start, _, second)) = (pair[0], pair[1]);
            if start < end {
                return Err(invalid(format!("members {first} and {second} overlap")));
            }
        }
    }
    Ok(())
}

/// A struct schema: name, static layout, and member table.
#[derive(Clone, Debug, PartialEq)]
pub struct StructType {
    name: String,
    layout: Layout,
    members: Vec<Member>,
}

impl StructType {
    /// Creates a schema, rejecting member tables that do not fit `layout`.
    pub fn new(
        name: impl Into<String>,
        layout: Layout,
        members: impl IntoIterator<Item = Member>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let members: Vec<Member> = members.into_iter().collect();
        validate_members(&name, layout, &members, 0, true)?;
        Ok(Self {
            name,
            layout,
            members,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.name == name)
    }
}

/// A struct bound to exactly its layout size.
#[derive(Debug)]
pub struct StructView<'t, B> {
    ty: &'t Type,
    schema: &'t StructType,
    region: Region<B>,
}

impl<'t, B> StructView<'t, B> {
    pub(crate) fn new(ty: &'t Type, schema: &'t StructType, region: Region<B>) -> Self {
        Self { ty, schema, region }
    }

    pub fn descriptor(&self) -> &'t Type {
        self.ty
    }

    pub fn schema(&self) -> &'t StructType {
        self.schema
    }

    pub fn region(&self) -> &Region<B> {
        &self.region
    }

    fn lookup(&self, name: &str) -> Result<&'t Member, Error> {
        self.schema
            .member(name)
            .ok_or_else(|| Error::UnknownMember(name.to_string()))
    }
}

impl<'t, B: AsRef<[u8]>> StructView<'t, B> {
    /// Binds the member called `name`.
    pub fn member(&self, name: &str) -> Result<View<'t, &[u8]>, Error> {
        let member = self.lookup(name)?;
        member.ty.child(&self.region, member.offset)
    }

    /// Reads a scalar member.
    pub fn get<T: Scalar>(&self, name: &str) -> Result<T, Error> {
        self.member(name)?.into_primitive()?.get()
    }

    /// Decodes every member, in declaration order.
    pub fn value(&self) -> Result<Value, Error> {
        self.schema
            .members
            .iter()
            .map(|member| {
                let value = member.ty.child(&self.region, member.offset)?.value()?;
                Ok((member.name.clone(), value))
            })
            .collect::<Result<Vec<_>, Error>>()
            .map(Value::Struct)
    }
}

impl<'t, B: AsRef<[u8]> + AsMut<[u8]>> StructView<'t, B> {
    /// Binds the member called `name` writably.
    pub fn member_mut(&mut self, name: &str) -> Result<View<'t, &mut [u8]>, Error> {
        let member = self.lookup(name)?;
        member.ty.child_mut(&mut self.region, member.offset)
    }

    /// Writes a scalar member.
    pub fn set<T: Scalar>(&mut self, name: &str, value: T) -> Result<(), Error> {
        self.member_mut(name)?.into_primitive()?.set(value)
    }

    /// Overwrites the members present in `value`, leaving the others untouched.
    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        let members = self.members(value)?;
        let snapshot = Snapshot::covering(self.ty, &self.region);
        for (name, item) in members {
            if let Err(err) = self
                .member_mut(name)
                .and_then(|mut view| view.set_value(item))
            {
                return snapshot.restore(&mut self.region, err);
            }
        }
        Ok(())
    }

    /// Initializes every member. The initializer must name each declared member exactly.
    pub fn init(&mut self, value: &Value) -> Result<(), Error> {
        let snapshot = Snapshot::take(&self.region);
        match self.write(value) {
            Ok(()) => Ok(()),
            Err(err) => snapshot.restore(&mut self.region, err),
        }
    }

    pub(crate) fn write(&mut self, value: &Value) -> Result<(), Error> {
        let members = self.members(value)?;
        let schema = self.schema;
        for member in &schema.members {
            if !members.iter().any(|(name, _)| *name == member.name) {
                return Err(Error::MissingMember(member.name.clone()));
            }
        }
        for (name, item) in members {
            self.member_mut(name)?.write(item)?;
        }
        Ok(())
    }

    /// Extracts the `(name, value)` pairs of a struct initializer, rejecting unknown names.
    fn members<'v>(&self, value: &'v Value) -> Result<&'v [(String, Value)], Error> {
        let Value::Struct(members) = value else {
            return Err(mismatch("struct", value));
        };
        for (name, _) in members {
            self.lookup(name)?;
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Primitive;
    use std::sync::Arc;

    fn f32_type() -> Type {
        Type::Primitive(Primitive::F32)
    }

    fn vec3() -> Type {
        let schema = StructType::new(
            "Vec3",
            Layout::new(12, 4),
            [
                Member::new("x", f32_type(), 0),
                Member::new("y", f32_type(), 4),
                Member::new("z", f32_type(), 8),
            ],
        )
        .unwrap();
        Type::Struct(Arc::new(schema))
    }

    #[test]
    fn test_vec3() {
        let ty = vec3();
        assert_eq!(ty.layout(), Layout::new(12, 4));
        let mut buf = vec![0u8; 12];
        let mut view = ty.bind(&mut buf[..], 0).unwrap().into_struct().unwrap();
        let value = Value::structure([
            ("x", Value::F32(42.0)),
            ("y", Value::F32(50.0)),
            ("z", Value::F32(512.0)),
        ]);
        view.init(&value).unwrap();
        assert_eq!(view.value().unwrap(), value);
        assert_eq!(view.get::<f32>("y").unwrap(), 50.0);

        view.set("z", 1.5f32).unwrap();
        assert_eq!(view.get::<f32>("z").unwrap(), 1.5);
        assert_eq!(&buf[8..12], &1.5f32.to_le_bytes());
    }

    #[test]
    fn test_missing_member() {
        let ty = vec3();
        let mut buf = vec![0u8; 12];
        let mut view = ty.bind(&mut buf[..], 0).unwrap().into_struct().unwrap();
        let partial = Value::structure([("x", Value::F32(1.0)), ("z", Value::F32(3.0))]);
        assert_eq!(
            view.init(&partial).unwrap_err(),
            Error::MissingMember("y".into())
        );
        assert_eq!(buf, vec![0; 12]);
    }

    #[test]
    fn test_unknown_member() {
        let ty = vec3();
        let mut buf = vec![0u8; 12];
        let mut view = ty.bind(&mut buf[..], 0).unwrap().into_struct().unwrap();
        let value = Value::structure([("w", Value::F32(1.0))]);
        assert_eq!(
            view.set_value(&value).unwrap_err(),
            Error::UnknownMember("w".into())
        );
        assert!(matches!(view.member("w"), Err(Error::UnknownMember(_))));
    }

    #[test]
    fn test_set_value_through_pointer_is_atomic() {
        let schema = StructType::new(
            "Counter",
            Layout::new(4, 2),
            [
                Member::new("p", Type::pointer(Type::Primitive(Primitive::U8)), 0),
                Member::new("b", Type::Primitive(Primitive::U8), 2),
            ],
        )
        .unwrap();
        let ty = Type::Struct(Arc::new(schema));
        let mut buf = vec![42u8, 0, 2, 0, 1, 0];
        let mut view = ty.bind(&mut buf[..], 2).unwrap().into_struct().unwrap();
        assert_eq!(view.member("p").unwrap().value().unwrap(), Value::U8(42));

        // The pointee written before the failing member is restored
        let bad = Value::structure([("p", Value::U8(7)), ("b", Value::from("x"))]);
        assert!(matches!(
            view.set_value(&bad),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(view.member("p").unwrap().value().unwrap(), Value::U8(42));

        let good = Value::structure([("p", Value::U8(7)), ("b", Value::U8(9))]);
        view.set_value(&good).unwrap();
        assert_eq!(buf, vec![7, 0, 2, 0, 9, 0]);
    }

    #[test]
    fn test_set_value_partial_and_atomic() {
        let ty = vec3();
        let mut buf = vec![0u8; 12];
        let mut view = ty.bind(&mut buf[..], 0).unwrap().into_struct().unwrap();
        view.set_value(&Value::structure([("y", Value::F32(2.0))]))
            .unwrap();
        assert_eq!(view.get::<f32>("y").unwrap(), 2.0);

        let bad = Value::structure([("x", Value::F32(9.0)), ("z", Value::U32(1))]);
        assert!(view.set_value(&bad).is_err());
        assert_eq!(view.get::<f32>("x").unwrap(), 0.0);
    }

    #[test]
    fn test_nested() {
        let inner = vec3();
        let schema = StructType::new(
            "Segment",
            Layout::new(28, 4),
            [
                Member::new("id", Type::Primitive(Primitive::U16), 0),
                Member::new("from", inner.clone(), 4),
                Member::new("to", inner, 16),
            ],
        )
        .unwrap();
        let ty = Type::Struct(Arc::new(schema));
        let point = |x: f32| {
            Value::structure([
                ("x", Value::F32(x)),
                ("y", Value::F32(0.0)),
                ("z", Value::F32(0.0)),
            ])
        };
        let value = Value::structure([
            ("id", Value::U16(3)),
            ("from", point(1.0)),
            ("to", point(2.0)),
        ]);
        let mut buf = vec![0u8; 28];
        let mut view = ty.bind(&mut buf[..], 0).unwrap().into_struct().unwrap();
        view.init(&value).unwrap();
        assert_eq!(view.value().unwrap(), value);
        let to = view.member("to").unwrap().into_struct().unwrap();
        assert_eq!(to.get::<f32>("x").unwrap(), 2.0);
        assert_eq!(to.region().offset(), 16);
    }

    #[test]
    fn test_invalid_schemas() {
        let u32_type = Type::Primitive(Primitive::U32);
        let cases = [
            // Overlap
            vec![
                Member::new("a", u32_type.clone(), 0),
                Member::new("b", u32_type.clone(), 2),
            ],
            // Misaligned
            vec![Member::new("a", u32_type.clone(), 2)],
            // Out of range
            vec![Member::new("a", u32_type.clone(), 8)],
            // Duplicate
            vec![
                Member::new("a", u32_type.clone(), 0),
                Member::new("a", u32_type.clone(), 4),
            ],
            // Inline string
            vec![Member::new("s", Type::String, 0)],
        ];
        for members in cases {
            let result = StructType::new("Bad", Layout::new(8, 4), members);
            assert!(matches!(result, Err(Error::InvalidSchema(..))));
        }

        // Member alignment exceeds the struct's
        let result = StructType::new(
            "Bad",
            Layout::new(8, 4),
            [Member::new("a", Type::Primitive(Primitive::U64), 0)],
        );
        assert!(matches!(result, Err(Error::InvalidSchema(..))));
    }
}
