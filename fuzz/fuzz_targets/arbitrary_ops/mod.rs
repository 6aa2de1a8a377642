use libfuzzer_sys::arbitrary::{self, Arbitrary, Unstructured};
use proaring::{Bitmap, BitmapView};
use roaring::RoaringTreemap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Num(pub u64);

// a few hundred containers, enough to cross every encoding threshold
pub const MAX_NUM: u64 = 0x1_0000 * 260;

impl<'a> Arbitrary<'a> for Num {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self(u.int_in_range(0..=(MAX_NUM - 1))?))
    }
}

#[derive(Arbitrary, Debug, PartialEq, Eq)]
pub enum MutableBitmapOperation {
    Add(Num),
    AddChecked(Num),
    AddMany(Vec<Num>),
    // fills a container densely, so it turns into a bitmap or run
    AddDense { key: u16, start: u16, len: u16 },
    Copy,
    Clear,
    Remove(Num),
    RemoveChecked(Num),
    RemoveDense { key: u16, start: u16, len: u16 },
    RunOptimize,
    RemoveRunCompression,
    // Add to the max key (or with 0xFFFFFFFF_FFFF0000)
    AddToMax(u16),
}

fn dense(key: u16, start: u16, len: u16) -> impl Iterator<Item = u64> {
    let base = (u64::from(key) % (MAX_NUM >> 16)) << 16;
    let end = u32::from(start) + u32::from(len);
    (u32::from(start)..end.min(0x1_0000)).map(move |low| base | u64::from(low))
}

impl MutableBitmapOperation {
    pub fn on_bitmap(&self, b: &mut Bitmap) {
        match *self {
            MutableBitmapOperation::Add(Num(i)) => b.add(i),
            MutableBitmapOperation::AddChecked(Num(i)) => {
                let expected = !b.contains(i);
                assert_eq!(b.add_checked(i), expected);
            }
            MutableBitmapOperation::AddMany(ref items) => {
                let items: Vec<u64> = items.iter().map(|n| n.0).collect();
                b.add_many(&items);
            }
            MutableBitmapOperation::AddDense { key, start, len } => {
                b.extend(dense(key, start, len));
            }
            MutableBitmapOperation::Copy => {
                *b = b.clone();
            }
            MutableBitmapOperation::Clear => {
                b.clear();
                assert!(b.is_empty());
            }
            MutableBitmapOperation::Remove(Num(i)) => {
                b.remove(i);
                assert!(!b.contains(i));
            }
            MutableBitmapOperation::RemoveChecked(Num(i)) => {
                let expected = b.contains(i);
                assert_eq!(b.remove_checked(i), expected);
            }
            MutableBitmapOperation::RemoveDense { key, start, len } => {
                dense(key, start, len).for_each(|i| b.remove(i));
            }
            MutableBitmapOperation::RunOptimize => {
                let before = b.cardinality();
                b.run_optimize();
                assert_eq!(b.cardinality(), before);
            }
            MutableBitmapOperation::RemoveRunCompression => {
                b.remove_run_compression();
                assert_eq!(b.statistics().n_run_containers, 0);
            }
            MutableBitmapOperation::AddToMax(low_bits) => {
                b.add(0xFFFF_FFFF_FFFF_0000 | u64::from(low_bits));
            }
        }
        b.internal_validate().unwrap();
    }

    pub fn on_treemap(&self, t: &mut RoaringTreemap) {
        match *self {
            MutableBitmapOperation::Add(Num(i)) | MutableBitmapOperation::AddChecked(Num(i)) => {
                t.insert(i);
            }
            MutableBitmapOperation::AddMany(ref items) => {
                t.extend(items.iter().map(|n| n.0));
            }
            MutableBitmapOperation::AddDense { key, start, len } => {
                t.extend(dense(key, start, len));
            }
            MutableBitmapOperation::Copy
            | MutableBitmapOperation::RunOptimize
            | MutableBitmapOperation::RemoveRunCompression => {}
            MutableBitmapOperation::Clear => t.clear(),
            MutableBitmapOperation::Remove(Num(i))
            | MutableBitmapOperation::RemoveChecked(Num(i)) => {
                t.remove(i);
            }
            MutableBitmapOperation::RemoveDense { key, start, len } => {
                dense(key, start, len).for_each(|i| {
                    t.remove(i);
                });
            }
            MutableBitmapOperation::AddToMax(low_bits) => {
                t.insert(0xFFFF_FFFF_FFFF_0000 | u64::from(low_bits));
            }
        }
    }
}

#[derive(Arbitrary, Debug, PartialEq, Eq)]
pub enum ReadBitmapOp {
    Contains(u64),
    ContainsNum(Num),
    Cardinality,
    ToVec,
    GetSerializedSizeInBytes,
    Serialize,
    View(Num),
    IsEmpty,
    Minimum,
    Maximum,
    Clone,
    Debug,
}

impl ReadBitmapOp {
    pub fn check_against_tree(&self, b: &Bitmap, t: &RoaringTreemap) {
        match *self {
            ReadBitmapOp::Contains(i) | ReadBitmapOp::ContainsNum(Num(i)) => {
                assert_eq!(b.contains(i), t.contains(i));
            }
            ReadBitmapOp::Cardinality => {
                assert_eq!(b.cardinality(), t.len());
            }
            ReadBitmapOp::IsEmpty => {
                assert_eq!(b.is_empty(), b.cardinality() == 0);
                assert_eq!(b.is_empty(), t.is_empty());
            }
            ReadBitmapOp::Minimum => {
                assert_eq!(b.minimum(), t.min());
            }
            ReadBitmapOp::Maximum => {
                assert_eq!(b.maximum(), t.max());
            }
            ReadBitmapOp::Clone => {
                let other = b.clone();
                assert_eq!(b, &other);
            }
            ReadBitmapOp::Debug => {
                use std::io::Write;
                let mut black_hole = std::io::sink();
                write!(black_hole, "{:?}", b).unwrap();
            }
            ReadBitmapOp::ToVec => {
                assert_eq!(b.to_vec(), t.iter().collect::<Vec<_>>());
            }
            ReadBitmapOp::GetSerializedSizeInBytes => {
                assert_eq!(
                    b.get_serialized_size_in_bytes(),
                    b.serialize().unwrap().len()
                );
            }
            ReadBitmapOp::Serialize => {
                let data = b.serialize().unwrap();
                let deserialized = Bitmap::try_deserialize(&data).unwrap();
                assert_eq!(b, &deserialized);
                assert_eq!(b.statistics(), deserialized.statistics());
            }
            ReadBitmapOp::View(Num(i)) => {
                let data = b.serialize().unwrap();
                let view = BitmapView::deserialize(&data).unwrap();
                assert_eq!(view.cardinality(), t.len());
                assert_eq!(view.contains(i), t.contains(i));
                assert!(view.iter().eq(t.iter()));
            }
        }
    }
}

#[track_caller]
pub fn assert_bitmap_eq(b: &Bitmap, t: &RoaringTreemap) {
    assert_eq!(b.cardinality(), t.len());
    assert!(b.iter().eq(t.iter()));
}
