//! Named integer constants stored in an integer primitive.

use super::{mismatch, Primitive, Type};
use crate::{Error, Layout, Region, Value};
use std::collections::HashSet;

/// An enum schema: name, integer base, and `(variant, discriminant)` table.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumType {
    name: String,
    base: Primitive,
    variants: Vec<(String, i64)>,
}

impl EnumType {
    /// Creates a schema, rejecting non-integer bases, discriminants that do not fit the base,
    /// and duplicate names or discriminants.
    pub fn new<N: Into<String>>(
        name: impl Into<String>,
        base: Primitive,
        variants: impl IntoIterator<Item = (N, i64)>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let invalid = |reason: String| Error::InvalidSchema(name.clone(), reason);
        if !base.is_integer() {
            return Err(invalid(format!("base {} is not an integer", base.name())));
        }
        let variants: Vec<(String, i64)> = variants
            .into_iter()
            .map(|(variant, value)| (variant.into(), value))
            .collect();
        let mut names = HashSet::new();
        let mut values = HashSet::new();
        for (variant, value) in &variants {
            if base.integer(*value).is_err() {
                return Err(invalid(format!(
                    "{variant} = {value} does not fit in {}",
                    base.name()
                )));
            }
            if !names.insert(variant.as_str()) || !values.insert(*value) {
                return Err(invalid(format!("duplicate variant {variant} = {value}")));
            }
        }
        Ok(Self {
            name,
            base,
            variants,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Primitive {
        self.base
    }

    pub fn layout(&self) -> Layout {
        self.base.layout()
    }

    pub fn variants(&self) -> &[(String, i64)] {
        &self.variants
    }

    /// Discriminant of the variant called `name`.
    pub fn discriminant(&self, name: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(variant, _)| variant == name)
            .map(|(_, value)| *value)
    }

    /// Name of the variant with discriminant `value`.
    pub fn variant(&self, value: i64) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, discriminant)| *discriminant == value)
            .map(|(variant, _)| variant.as_str())
    }
}

/// An enum bound to its base primitive.
#[derive(Debug)]
pub struct EnumView<'t, B> {
    ty: &'t Type,
    schema: &'t EnumType,
    region: Region<B>,
}

impl<'t, B> EnumView<'t, B> {
    pub(crate) fn new(ty: &'t Type, schema: &'t EnumType, region: Region<B>) -> Self {
        Self { ty, schema, region }
    }

    pub fn descriptor(&self) -> &'t Type {
        self.ty
    }

    pub fn schema(&self) -> &'t EnumType {
        self.schema
    }

    pub fn region(&self) -> &Region<B> {
        &self.region
    }
}

impl<'t, B: AsRef<[u8]>> EnumView<'t, B> {
    /// The raw stored discriminant.
    pub fn discriminant(&self) -> Result<i64, Error> {
        self.schema.base.read_integer(self.region.bytes())
    }

    /// Name of the stored variant.
    pub fn variant(&self) -> Result<&'t str, Error> {
        let discriminant = self.discriminant()?;
        self.schema
            .variant(discriminant)
            .ok_or(Error::InvalidDiscriminant(discriminant))
    }

    pub fn value(&self) -> Result<Value, Error> {
        Ok(Value::Enum(self.variant()?.to_string()))
    }
}

impl<'t, B: AsRef<[u8]> + AsMut<[u8]>> EnumView<'t, B> {
    /// Stores the variant called `name`.
    pub fn set(&mut self, name: &str) -> Result<(), Error> {
        let discriminant = self
            .schema
            .discriminant(name)
            .ok_or_else(|| Error::UnknownVariant(name.to_string()))?;
        let encoded = self.schema.base.integer(discriminant)?;
        self.schema.base.encode(&encoded, self.region.bytes_mut())
    }

    pub fn set_value(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Enum(name) => self.set(name),
            other => Err(mismatch("enum", other)),
        }
    }

    /// Same as [EnumView::set_value].
    pub fn init(&mut self, value: &Value) -> Result<(), Error> {
        self.set_value(value)
    }
}
