use criterion::criterion_main;


criterion_main!(
    read_scalar::benches,
    create_struct::benches,
    read_vector::benches
);
