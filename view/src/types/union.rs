//! Tagged unions.
//!
//! A union starts with an integer discriminant holding the index of the active alternative.
//! Alternatives share the space after the discriminant, each at its own fixed offset.

use super::{mismatch, structure::validate_members, Member, Primitive, Snapshot, Type, View};
use crate::{Error, Layout, Region, Value};

/// A union schema: name, static layout, discriminant width, and alternatives.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionType {
    name: String,
    layout: Layout,
    discriminant: Primitive,
    alternatives: Vec<Member>,
}

impl UnionType {
    /// Creates a schema.
    ///
    /// The discriminant is stored at offset 0 and must be an unsigned integer wide enough to
    /// index every alternative. Alternatives may overlap each other but not the discriminant.
    pub fn new(
        name: impl Into<String>,
        layout: Layout,
        discriminant: Primitive,
        alternatives: impl IntoIterator<Item = Member>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let alternatives: Vec<Member> = alternatives.into_iter().collect();
        let unsigned = matches!(
            discriminant,
            Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64
        );
        let max = i64::try_from(alternatives.len().saturating_sub(1)).unwrap_or(i64::MAX);
        if !unsigned || discriminant.integer(max).is_err() {
            return Err(Error::InvalidSchema(
                name,
                format!(
                    "discriminant {} cannot index {} alternatives",
                    discriminant.name(),
                    alternatives.len()
                ),
            ));
        }
        let tag = discriminant.layout();
        if tag.size > layout.size || tag.alignment > layout.alignment {
            return Err(Error::InvalidSchema(
                name,
                format!("discriminant does not fit in {} bytes", layout.size),
            ));
        }
        validate_members(&name, layout, &alternatives, tag.size, false)?;
        Ok(Self {
            name,
            layout,
            discriminant,
            alternatives,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn discriminant(&self) -> Primitive {
        self.discriminant
    }

    pub fn alternatives(&self) -> &[Member] {
        &self.alternatives
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.alternatives
            .iter()
            .position(|alternative| alternative.name == name)
    }
}

/// A union bound to exactly its layout size.
#[derive(Debug)]
pub struct UnionView<'t, B> {
    ty: &'t Type,
    schema: &'t UnionType,
    region: Region<B>,
}

impl<'t, B> UnionView<'t, B> {
    pub(crate) fn new(ty: &'t Type, schema: &'t UnionType, region: Region<B>) -> Self {
        Self { ty, schema, region }
    }

    pub fn descriptor(&self) -> &'t Type {
        self.ty
    }

    pub fn schema(&self) -> &'t UnionType {
        self.schema
    }

    pub fn region(&self) -> &Region<B> {
        &self.region
    }
}

impl<'t, B: AsRef<[u8]>> UnionView<'t, B> {
    /// Index of the active alternative.
    pub fn index(&self) -> Result<usize, Error> {
        let tag = self.schema.discriminant;
        let bytes = self.region.slice(0, tag.size())?.into_bytes();
        let raw = tag.read_integer(bytes)?;
        usize::try_from(raw)
            .ok()
            .filter(|index| *index < self.schema.alternatives.len())
            .ok_or(Error::InvalidDiscriminant(raw))
    }

    /// The active alternative's schema entry.
    pub fn active(&self) -> Result<&'t Member, Error> {
        let index = self.index()?;
        Ok(&self.schema.alternatives[index])
    }

    /// Binds the active alternative.
    pub fn alternative(&self) -> Result<View<'t, &[u8]>, Error> {
        let member = self.active()?;
        member.ty.child(&self.region, member.offset)
    }

    pub fn value(&self) -> Result<Value, Error> {
        let member = self.active()?;
        let value = member.ty.child(&self.region, member.offset)?.value()?;
        Ok(Value::Union(member.name.clone(), Box::new(value)))
    }
}

impl<'t, B: AsRef<[u8]> + AsMut<[u8]>> UnionView<'t, B> {
    /// Binds the active alternative writably.
    pub fn alternative_mut(&mut self) -> Result<View<'t, &mut [u8]>, Error> {
        let member = self.active()?;
        member.ty.child_mut(&mut self.region, member.offset)
    }

    /// Selects an alternative and writes its value.
    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        self.init(value)
    }

    /// Writes the discriminant and the selected alternative.
    pub fn init(&mut self, value: &Value) -> Result<(), Error> {
        let snapshot = Snapshot::take(&self.region);
        match self.write(value) {
            Ok(()) => Ok(()),
            Err(err) => snapshot.restore(&mut self.region, err),
        }
    }

    pub(crate) fn write(&mut self, value: &Value) -> Result<(), Error> {
        let Value::Union(name, inner) = value else {
            return Err(mismatch("union", value));
        };
        let schema = self.schema;
        let index = schema
            .position(name)
            .ok_or_else(|| Error::UnknownVariant(name.clone()))?;
        let tag = schema.discriminant.integer(index as i64)?;
        let bytes = self.region.slice_mut(0, schema.discriminant.size())?;
        schema.discriminant.encode(&tag, bytes.into_bytes_mut())?;
        let member = &schema.alternatives[index];
        member.ty.child_mut(&mut self.region, member.offset)?.write(inner)
    }
}
