#![no_main]

use arbitrary::Arbitrary;
use lattice_view::{Config, MessageBuilder, Primitive, Target, Type, Value};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Item {
    Text(String),
    Numbers(Vec<u32>),
    Wide(Vec<i64>),
    Flag(bool),
    /// Points at an earlier item (index modulo the number built so far).
    Pointer(u8),
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    items: Vec<Item>,
}

fn fuzz(input: FuzzInput) {
    let string = Type::String;
    let numbers = Type::vector(Type::Primitive(Primitive::U32));
    let wide = Type::vector(Type::Primitive(Primitive::I64));
    let flag = Type::Primitive(Primitive::Bool);
    let pointers = [
        Type::pointer(Type::String),
        Type::pointer(numbers.clone()),
        Type::pointer(wide.clone()),
        Type::pointer(flag.clone()),
    ];

    let mut builder = MessageBuilder::new(Config {
        initial_capacity: 64,
        max_capacity: 1 << 16,
    });
    let mut built: Vec<(&Type, usize, Value)> = Vec::new();
    for item in input.items {
        let (ty, value) = match item {
            Item::Text(text) => (&string, Value::String(text)),
            Item::Numbers(items) => (
                &numbers,
                Value::List(items.into_iter().map(Value::U32).collect()),
            ),
            Item::Wide(items) => (
                &wide,
                Value::List(items.into_iter().map(Value::I64).collect()),
            ),
            Item::Flag(value) => (&flag, Value::Bool(value)),
            Item::Pointer(index) => {
                if built.is_empty() {
                    continue;
                }
                let (pointee, offset, value) = built[index as usize % built.len()].clone();
                let pointer = pointers
                    .iter()
                    .find(|pointer| matches!(pointer, Type::Pointer(inner) if **inner == *pointee));
                let Some(pointer) = pointer else {
                    continue;
                };
                let target = Target {
                    offset,
                    layout: pointee.layout(),
                };
                match builder.point_to(pointer, target) {
                    Ok(view) => {
                        let offset = view.region().offset();
                        assert_eq!(view.value().ok(), Some(value.clone()));
                        built.push((pointer, offset, value));
                    }
                    Err(_) => continue,
                }
                continue;
            }
        };

        // Oversized values and a full builder are expected failures
        let Ok(view) = builder.create(ty, &value) else {
            continue;
        };
        let offset = view.offset();
        built.push((ty, offset, value));
    }

    // Every value built reads back from the finished message
    let message = builder.finish();
    for (ty, offset, value) in built {
        let view = ty.bind(&message[..], offset).expect("built value must bind");
        assert_eq!(view.value().expect("built value must decode"), value);
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
