use proaring::{Bitmap, BitmapView, ContainerIterator, Encoding, Error};
use proptest::prelude::*;
use roaring::RoaringTreemap;

// adapted from the roaring-rs smoke tests, with values spread over 64 bits
#[test]
fn smoke1() {
    let mut bitmap = Bitmap::new();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.remove(0);
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
    bitmap.add(1);
    assert!(bitmap.contains(1));
    assert_eq!(bitmap.cardinality(), 1);
    assert!(!bitmap.is_empty());
    bitmap.add(u64::MAX - 2);
    assert!(bitmap.contains(u64::MAX - 2));
    assert_eq!(bitmap.cardinality(), 2);
    bitmap.add(u64::MAX);
    assert!(bitmap.contains(u64::MAX));
    assert_eq!(bitmap.cardinality(), 3);
    bitmap.add(2);
    assert!(bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 4);
    bitmap.remove(2);
    assert!(!bitmap.contains(2));
    assert_eq!(bitmap.cardinality(), 3);
    assert!(!bitmap.contains(0));
    assert!(bitmap.contains(1));
    assert!(!bitmap.contains(100));
    assert!(bitmap.contains(u64::MAX - 2));
    assert!(!bitmap.contains(u64::MAX - 1));
    assert!(bitmap.contains(u64::MAX));
    bitmap.clear();
    assert_eq!(bitmap.cardinality(), 0);
    assert!(bitmap.is_empty());
}

#[test]
fn smoke2() {
    let mut rb1 = Bitmap::new();
    rb1.add_many(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 100, 1000]);
    rb1.run_optimize();

    let mut rb2 = Bitmap::new();
    rb2.add_many(&[3, 4, 1000]);
    rb2.run_optimize();

    assert_eq!(rb1.cardinality(), 12);
    assert!(rb1.contains(3));
    assert_eq!(rb1.container_encoding(0), Some(Encoding::Run));
    assert_eq!(rb2.container_encoding(0), Some(Encoding::Array));
    assert!(rb2.iter().all(|value| rb1.contains(value)));
    assert_ne!(rb1, rb2);
}

#[test]
fn spans_two_containers() {
    let bitmap = Bitmap::of(&[1, 2, 4, 8, 16, 128, 256, 1024, 65535, 65536]);
    assert_eq!(bitmap.cardinality(), 10);
    assert_eq!(bitmap.directory().len(), 2);
    assert_eq!(bitmap.container_encoding(0), Some(Encoding::Array));
    assert_eq!(bitmap.container_encoding(1), Some(Encoding::Array));
    assert_eq!(
        bitmap.to_vec(),
        [1, 2, 4, 8, 16, 128, 256, 1024, 65535, 65536]
    );
}

#[test]
fn boundary_values() {
    let values = [0, 65_535, 65_536, u32::MAX as u64, 1 << 32, u64::MAX - 65_536, u64::MAX];
    let bitmap = Bitmap::of(&values);
    assert_eq!(bitmap.to_vec(), values);
    assert_eq!(bitmap.minimum(), Some(0));
    assert_eq!(bitmap.maximum(), Some(u64::MAX));
    bitmap.internal_validate().unwrap();

    let data = bitmap.serialize().unwrap();
    assert_eq!(Bitmap::try_deserialize(&data).unwrap(), bitmap);
}

#[test]
fn encoding_thresholds() {
    let mut bitmap: Bitmap = (0..4096).collect();
    assert_eq!(bitmap.container_encoding(0), Some(Encoding::Array));
    bitmap.add(5000);
    assert_eq!(bitmap.container_encoding(0), Some(Encoding::Bitmap));

    let data = bitmap.serialize().unwrap();
    // type tag of the first container header
    assert_eq!(u16::from_le_bytes([data[16], data[17]]), 2);
    assert_eq!(data.len(), 8 + 16 + 8192);

    // stays dense until well below the promotion threshold
    for value in 0..200 {
        bitmap.remove(value);
    }
    assert_eq!(bitmap.container_encoding(0), Some(Encoding::Bitmap));
    for value in 200..300 {
        bitmap.remove(value);
    }
    assert_eq!(bitmap.cardinality(), 3797);
    assert_eq!(bitmap.container_encoding(0), Some(Encoding::Array));
    bitmap.internal_validate().unwrap();
}

#[test]
fn run_optimized_statistics() {
    let mut bitmap: Bitmap = (0..100_000).collect();
    bitmap.add(1 << 40);
    assert!(bitmap.run_optimize());

    let stats = bitmap.statistics();
    assert_eq!(stats.n_containers, 3);
    assert_eq!(stats.n_run_containers, 2);
    assert_eq!(stats.n_array_containers, 1);
    assert_eq!(stats.n_values_run_containers, 100_000);
    assert_eq!(stats.n_bytes_run_containers, 12);
    assert_eq!(stats.cardinality, 100_001);

    let data = bitmap.serialize().unwrap();
    assert_eq!(data.len(), 8 + 3 * 16 + 6 + 6 + 2);
    let restored = Bitmap::try_deserialize(&data).unwrap();
    assert_eq!(restored.statistics(), stats);

    assert!(bitmap.remove_run_compression());
    assert_eq!(bitmap.statistics().n_bitset_containers, 2);
    assert_eq!(bitmap, restored);
}

#[test]
fn decodes_handwritten_buffer() {
    #[rustfmt::skip]
    let data: Vec<u8> = [
        &[0x3Cu8, 0x30, 0, 0, 2, 0, 0, 0][..],
        // key 0: array of 2, key 9: run of 5 values
        &[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0],
        &[9, 0, 0, 0, 0, 0, 0, 0, 3, 0, 4, 0],
        &[40, 0, 0, 0, 44, 0, 0, 0],
        &[7, 0, 0xFF, 0xFF],
        &[1, 0, 10, 0, 4, 0],
    ]
    .concat();

    let bitmap = Bitmap::try_deserialize(&data).unwrap();
    assert_eq!(
        bitmap.to_vec(),
        [7, 65535, 9 << 16 | 10, 9 << 16 | 11, 9 << 16 | 12, 9 << 16 | 13, 9 << 16 | 14]
    );
    assert_eq!(bitmap.container_encoding(9), Some(Encoding::Run));
    assert_eq!(bitmap.serialize().unwrap(), data);
}

#[test]
fn rejects_malformed_input() {
    let data = Bitmap::of(&[1, 2, 3, 1 << 20]).serialize().unwrap();

    assert!(matches!(Bitmap::try_deserialize(&[]), Err(Error::Truncated { .. })));
    for len in 0..data.len() {
        let result = Bitmap::try_deserialize(&data[..len]);
        assert!(matches!(result, Err(Error::Truncated { .. })), "{len}");
    }

    let mut bad_magic = data.clone();
    bad_magic[1] = 0;
    assert!(matches!(
        Bitmap::try_deserialize(&bad_magic),
        Err(Error::InvalidMagic(_))
    ));

    let mut bad_version = data.clone();
    bad_version[2] = 1;
    assert!(matches!(
        BitmapView::deserialize(&bad_version),
        Err(Error::UnsupportedVersion(1))
    ));

    let mut unsorted = data.clone();
    unsorted[8..16].copy_from_slice(&100u64.to_le_bytes());
    assert!(matches!(
        Bitmap::try_deserialize(&unsorted),
        Err(Error::UnsortedKeys { previous: 100, key: 16 })
    ));
}

#[test]
fn failed_unmarshal_keeps_content() {
    let data = Bitmap::of(&[5, 6]).serialize().unwrap();
    let mut bitmap = Bitmap::of(&[1 << 60]);
    let mut corrupt = data.clone();
    // offset pointing into the header
    corrupt[20..24].copy_from_slice(&0u32.to_le_bytes());
    assert!(matches!(
        bitmap.unmarshal_binary(&corrupt),
        Err(Error::Corrupt { key: 0, .. })
    ));
    assert_eq!(bitmap.to_vec(), [1 << 60]);
}

#[test]
fn streams_containers() {
    let bitmap: Bitmap = (0..10).chain(1 << 32..(1 << 32) + 10).collect();
    let data = bitmap.serialize().unwrap();
    let keys: Vec<u64> = ContainerIterator::new(&data)
        .unwrap()
        .map(|entry| entry.map(|(key, _)| key))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(keys, [0, 1 << 16]);
}

#[test]
fn write_to_reports_io_errors() {
    struct Full;

    impl std::io::Write for Full {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::WriteZero.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let result = Bitmap::of(&[1]).write_to(Full);
    assert!(matches!(result, Err(Error::Io(_))));
}

fn values() -> impl Strategy<Value = u64> {
    prop_oneof![
        proptest::num::u64::ANY,
        // dense enough to fill bitmap and run containers
        0u64..20_000,
        (0u64..4).prop_map(|high| (high << 32) | 0xFFF0),
    ]
}

proptest! {
    #[test]
    fn cardinality_roundtrip(
        indices in prop::collection::vec(values(), 1..3000)
    ) {
        let original: Bitmap = indices.iter().copied().collect();
        let mut a = indices;
        a.sort_unstable();
        a.dedup();
        prop_assert_eq!(a.len(), original.cardinality() as usize);
        prop_assert_eq!(a, original.to_vec());
    }

    #[test]
    fn serialization_roundtrip(
        indices in prop::collection::vec(values(), 1..3000),
        optimize in any::<bool>(),
    ) {
        let mut original: Bitmap = indices.into_iter().collect();
        if optimize {
            original.run_optimize();
        }

        let data = original.serialize().unwrap();
        prop_assert_eq!(data.len(), original.get_serialized_size_in_bytes());

        let deserialized = Bitmap::try_deserialize(&data).unwrap();
        prop_assert_eq!(&original, &deserialized);
        prop_assert_eq!(original.statistics(), deserialized.statistics());

        let view = BitmapView::deserialize(&data).unwrap();
        prop_assert!(view.iter().eq(original.iter()));
    }

    #[test]
    fn matches_treemap(
        ops in prop::collection::vec((any::<bool>(), values()), 1..6000)
    ) {
        let mut bitmap = Bitmap::new();
        let mut expected = RoaringTreemap::new();
        for (insert, value) in ops {
            if insert {
                prop_assert_eq!(bitmap.add_checked(value), expected.insert(value));
            } else {
                prop_assert_eq!(bitmap.remove_checked(value), expected.remove(value));
            }
        }
        bitmap.internal_validate().unwrap();
        prop_assert_eq!(bitmap.cardinality(), expected.len());
        prop_assert_eq!(bitmap.minimum(), expected.min());
        prop_assert_eq!(bitmap.maximum(), expected.max());
        prop_assert!(bitmap.iter().eq(expected.iter()));
    }

    #[test]
    fn truncation_is_always_rejected(
        indices in prop::collection::vec(values(), 1..500),
        cut in any::<prop::sample::Index>(),
    ) {
        let data = Bitmap::of(&indices).serialize().unwrap();
        let len = cut.index(data.len());
        prop_assert!(Bitmap::try_deserialize(&data[..len]).is_err());
    }
}
