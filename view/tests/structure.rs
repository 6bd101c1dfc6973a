use lattice_view::{
    structure, Category, Descriptor, Error, Layout, MessageBuilder, Primitive, Type, Value,
};

structure! {
    /// A point in space.
    pub struct Vec3(size = 12, align = 4) {
        x: f32 = 0,
        y: f32 = 4,
        z: f32 = 8,
    }
}

structure! {
    /// A header with a gap between its members.
    struct Header(size = 16, align = 8) {
        flags: u8 = 0,
        active: bool = 1,
        sequence: u64 = 8,
    }
}

#[test]
fn test_vec3_roundtrip() {
    let mut builder = MessageBuilder::default();
    let point = Vec3::create(&mut builder, 42.0, 50.0, 512.0).unwrap();
    assert_eq!(point.x().unwrap(), 42.0);
    assert_eq!(point.y().unwrap(), 50.0);
    assert_eq!(point.z().unwrap(), 512.0);
    assert_eq!(
        point.value().unwrap(),
        Value::structure([
            ("x", Value::F32(42.0)),
            ("y", Value::F32(50.0)),
            ("z", Value::F32(512.0)),
        ])
    );

    let message = builder.finish();
    assert_eq!(message.len(), 12);
    assert_eq!(&message[..4], &42.0f32.to_le_bytes());

    // Rebind over the finished bytes
    let point = Vec3::bind(&message[..], 0).unwrap();
    assert_eq!(point.z().unwrap(), 512.0);
}

#[test]
fn test_vec3_schema() {
    assert_eq!(Vec3.layout(), Layout::new(12, 4));
    let Type::Struct(schema) = Vec3::schema() else {
        panic!("expected a struct schema");
    };
    assert_eq!(schema.name(), "Vec3");
    let offsets: Vec<_> = schema
        .members()
        .iter()
        .map(|member| (member.name.as_str(), member.offset))
        .collect();
    assert_eq!(offsets, vec![("x", 0), ("y", 4), ("z", 8)]);
}

#[test]
fn test_setters() {
    let mut buf = vec![0u8; 16];
    let mut header = Header::bind(&mut buf[..], 0).unwrap();
    header.set_flags(0x80).unwrap();
    header.set_active(true).unwrap();
    header.set_sequence(u64::MAX - 1).unwrap();
    assert_eq!(header.flags().unwrap(), 0x80);
    assert!(header.active().unwrap());
    assert_eq!(header.sequence().unwrap(), u64::MAX - 1);
    assert_eq!(&buf[..2], &[0x80, 1]);
    assert_eq!(&buf[2..8], &[0; 6]);
}

#[test]
fn test_create_as_and_narrow() {
    let mut builder = MessageBuilder::default();
    builder.allocate(1, 1).unwrap();
    let value = Value::structure([
        ("flags", Value::U8(3)),
        ("active", Value::Bool(false)),
        ("sequence", Value::U64(99)),
    ]);
    let descriptor = Header;
    let header = builder.create_as(&descriptor, &value).unwrap();
    assert_eq!(header.target().offset, 8);
    assert_eq!(header.sequence().unwrap(), 99);

    // Missing members are rejected and rolled back
    let partial = Value::structure([("flags", Value::U8(3))]);
    let err = builder.create_as(&descriptor, &partial).unwrap_err();
    assert_eq!(err, Error::MissingMember("active".into()));
    assert_eq!(err.category(), Category::LayoutMismatch);
    assert_eq!(builder.len(), 24);
}

#[test]
fn test_pointer_to_struct() {
    let mut builder = MessageBuilder::default();
    let target = Vec3::create(&mut builder, 1.0, 2.0, 3.0).unwrap().target();
    let pointer = Type::pointer(Vec3::schema().clone());
    let mut view = builder.point_to(&pointer, target).unwrap();
    view.set_value(&Value::structure([("y", Value::F32(-2.0))]))
        .unwrap();

    let point = Vec3::bind(builder.as_bytes(), 0).unwrap();
    assert_eq!(point.y().unwrap(), -2.0);

    // A pointer to a different struct is rejected
    let wrong = Type::pointer(Header::schema().clone());
    assert!(matches!(
        builder.point_to(&wrong, target),
        Err(Error::TargetMismatch { .. })
    ));
}

#[test]
fn test_narrow_mismatch() {
    let buf = [0u8; 12];
    let ty = Type::Primitive(Primitive::U32);
    let view = ty.bind(&buf[..], 0).unwrap();
    assert!(matches!(
        Vec3.narrow(view),
        Err(Error::TypeMismatch { .. })
    ));
}
