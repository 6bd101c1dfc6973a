#![no_main]

use arbitrary::Arbitrary;
use lattice_view::{Layout, Member, Primitive, StructType, Type};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

const MAX_DEPTH: usize = 4;

#[derive(Arbitrary, Debug)]
enum Kind {
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

impl From<Kind> for Primitive {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Bool => Primitive::Bool,
            Kind::U8 => Primitive::U8,
            Kind::U16 => Primitive::U16,
            Kind::U32 => Primitive::U32,
            Kind::U64 => Primitive::U64,
            Kind::I8 => Primitive::I8,
            Kind::I16 => Primitive::I16,
            Kind::I32 => Primitive::I32,
            Kind::I64 => Primitive::I64,
            Kind::F32 => Primitive::F32,
            Kind::F64 => Primitive::F64,
        }
    }
}

#[derive(Arbitrary, Debug)]
enum Shape {
    Primitive(Kind),
    String,
    Array(Box<Shape>, u8),
    Vector(Box<Shape>),
    Pointer(Box<Shape>),
    Struct(u8, u8, Vec<(Shape, u8)>),
}

impl Shape {
    /// Converts to a descriptor, or `None` if the shape is too deep or its members are invalid.
    fn into_type(self, depth: usize) -> Option<Type> {
        if depth > MAX_DEPTH {
            return None;
        }
        Some(match self {
            Shape::Primitive(kind) => Type::Primitive(kind.into()),
            Shape::String => Type::String,
            Shape::Array(element, count) => Type::array(element.into_type(depth + 1)?, count.into()),
            Shape::Vector(element) => Type::vector(element.into_type(depth + 1)?),
            Shape::Pointer(pointee) => Type::pointer(pointee.into_type(depth + 1)?),
            Shape::Struct(size, align, members) => {
                let members = members
                    .into_iter()
                    .enumerate()
                    .map(|(i, (shape, offset))| {
                        let ty = shape.into_type(depth + 1)?;
                        Some(Member::new(format!("m{i}"), ty, offset.into()))
                    })
                    .collect::<Option<Vec<_>>>()?;
                let layout = Layout::try_new(size.into(), align.into()).ok()?;
                Type::Struct(Arc::new(StructType::new("Fuzz", layout, members).ok()?))
            }
        })
    }
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    shape: Shape,
    offset: u16,
    data: Vec<u8>,
}

fn fuzz(input: FuzzInput) {
    let Some(ty) = input.shape.into_type(0) else {
        return;
    };
    let offset = input.offset as usize;

    // Reading arbitrary bytes may fail but must never panic
    if let Ok(view) = ty.bind(&input.data[..], offset) {
        let _ = view.value();
        assert_eq!(view.offset(), offset);
    }

    // Writing a decoded value back must never panic either
    let mut data = input.data;
    let decoded = match ty.bind(&data[..], offset) {
        Ok(view) => view.value(),
        Err(_) => return,
    };
    if let (Ok(value), Ok(mut view)) = (decoded, ty.bind(&mut data[..], offset)) {
        let _ = view.set_value(&value);
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
