#![no_main]

use crate::arbitrary_ops::*;
use libfuzzer_sys::arbitrary;
use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use proaring::Bitmap;
use roaring::RoaringTreemap;

mod arbitrary_ops;

fuzz_target!(|input: FuzzInput| {
    let mut bitmap = Bitmap::try_deserialize(input.initial_input).unwrap_or_default();
    let mut tree = RoaringTreemap::from_iter(bitmap.iter());

    for op in input.ops.iter().take(50) {
        op.on_bitmap(&mut bitmap);
        op.on_treemap(&mut tree);
    }
    for op in input.read_ops.iter().take(10) {
        op.check_against_tree(&bitmap, &tree);
    }

    assert_bitmap_eq(&bitmap, &tree);
});

#[derive(Arbitrary, Debug)]
struct FuzzInput<'a> {
    ops: Vec<MutableBitmapOperation>,
    read_ops: Vec<ReadBitmapOp>,
    initial_input: &'a [u8],
}
