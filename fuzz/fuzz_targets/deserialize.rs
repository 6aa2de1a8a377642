#![no_main]

use libfuzzer_sys::fuzz_target;
use proaring::{Bitmap, BitmapView, ContainerIterator};

fuzz_target!(|input: &[u8]| {
    let owned = Bitmap::try_deserialize(input);
    let view = BitmapView::deserialize(input);
    let streamed = ContainerIterator::new(input)
        .map_or(false, |mut containers| containers.all(|entry| entry.is_ok()));

    // every decoding path accepts exactly the same inputs
    assert_eq!(owned.is_ok(), view.is_ok());
    assert_eq!(owned.is_ok(), streamed);
    let (Ok(mut bitmap), Ok(view)) = (owned, view) else {
        return;
    };
    bitmap.internal_validate().unwrap();
    assert_eq!(bitmap.cardinality(), view.cardinality());
    assert!(bitmap.iter().eq(view.iter()));

    // canonical re-encoding decodes to the same set
    let data = bitmap.serialize().unwrap();
    assert_eq!(Bitmap::try_deserialize(&data).unwrap(), view);

    let start_cardinality = bitmap.cardinality();
    let mut new_cardinality = start_cardinality;
    for i in 100..1000 {
        if !bitmap.contains(i) {
            bitmap.add(i);
            new_cardinality += 1;
        }
    }
    assert_eq!(new_cardinality, bitmap.cardinality());
    bitmap.internal_validate().unwrap();
});
