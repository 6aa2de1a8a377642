//! Containers hold the low 16 bits of every value sharing one high key.
//!
//! Each container picks one of three encodings from its content:
//!
//! * [`Encoding::Array`]: a sorted `Vec<u16>`, used up to [`ARRAY_MAX_SIZE`] values
//! * [`Encoding::Bitmap`]: 1024 words covering all 65,536 positions
//! * [`Encoding::Run`]: sorted `(start, end)` intervals, chosen by
//!   [`Container::run_optimize`] when it is the smallest encoding
//!
//! Adding the 4097th value to an array promotes it to a bitmap. A bitmap is
//! only demoted back to an array once it drops below [`BITMAP_MIN_SIZE`].

use std::iter::{Copied, Map};
use std::slice::{self, ChunksExact};

mod array;
mod bitmap;
mod run;

pub use self::array::ArrayStore;
pub use self::bitmap::{BitIter, BitmapStore, Words, BITMAP_WORDS};
pub use self::run::{Interval, RunIter, RunStore};

pub(crate) use self::bitmap::count_runs;
pub(crate) use self::run::validate_intervals;

/// Largest cardinality stored as an array
pub const ARRAY_MAX_SIZE: u32 = 4096;

/// Distance below [`ARRAY_MAX_SIZE`] a bitmap must fall before it is demoted
pub const HYSTERESIS: u32 = 256;

/// Bitmaps with fewer values than this are demoted to arrays on mutation
pub const BITMAP_MIN_SIZE: u32 = ARRAY_MAX_SIZE - HYSTERESIS;

/// Run containers with more runs than this are unpacked on mutation
pub const RUN_MAX_SIZE: usize = 2048;

/// Serialized payload size of a bitmap container, in bytes
pub const BITMAP_PAYLOAD_SIZE: usize = BITMAP_WORDS * 8;

/// The representation chosen by a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Array,
    Bitmap,
    Run,
}

impl Encoding {
    /// Container type tag used by the wire format
    #[inline]
    pub const fn tag(self) -> u16 {
        match self {
            Encoding::Array => 1,
            Encoding::Bitmap => 2,
            Encoding::Run => 3,
        }
    }

    #[inline]
    pub const fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(Encoding::Array),
            2 => Some(Encoding::Bitmap),
            3 => Some(Encoding::Run),
            _ => None,
        }
    }
}

/// Serialized payload size for a container of `cardinality` values in `runs` runs
#[inline]
pub(crate) fn payload_size(encoding: Encoding, cardinality: u32, runs: usize) -> usize {
    match encoding {
        Encoding::Array => cardinality as usize * 2,
        Encoding::Bitmap => BITMAP_PAYLOAD_SIZE,
        Encoding::Run => 2 + runs * 4,
    }
}

/// A set of up to 65,536 low bits
#[derive(Clone, PartialEq, Eq)]
pub enum Container {
    Array(ArrayStore),
    Bitmap(BitmapStore),
    Run(RunStore),
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// An empty array container
    pub fn new() -> Self {
        Container::Array(ArrayStore::new())
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        match self {
            Container::Array(_) => Encoding::Array,
            Container::Bitmap(_) => Encoding::Bitmap,
            Container::Run(_) => Encoding::Run,
        }
    }

    #[inline]
    pub fn cardinality(&self) -> u32 {
        match self {
            Container::Array(a) => a.len(),
            Container::Bitmap(b) => b.len(),
            Container::Run(r) => r.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }

    #[inline]
    pub fn contains(&self, low: u16) -> bool {
        match self {
            Container::Array(a) => a.contains(low),
            Container::Bitmap(b) => b.contains(low),
            Container::Run(r) => r.contains(low),
        }
    }

    /// Insert `low`, returning whether the set changed.
    ///
    /// The container may switch encoding as a result.
    pub fn add(&mut self, low: u16) -> bool {
        let changed = match self {
            Container::Array(a) => a.insert(low),
            Container::Bitmap(b) => b.insert(low),
            Container::Run(r) => r.insert(low),
        };
        if changed {
            self.rebalance();
        }
        changed
    }

    /// Remove `low`, returning whether the set changed.
    ///
    /// The container may switch encoding as a result.
    pub fn remove(&mut self, low: u16) -> bool {
        let changed = match self {
            Container::Array(a) => a.remove(low),
            Container::Bitmap(b) => b.remove(low),
            Container::Run(r) => r.remove(low),
        };
        if changed {
            self.rebalance();
        }
        changed
    }

    /// Replace the container with another encoding if its content crossed a threshold
    fn rebalance(&mut self) {
        let replacement = match self {
            Container::Array(a) if a.len() > ARRAY_MAX_SIZE => Container::Bitmap(a.to_bitmap()),
            Container::Bitmap(b) if b.len() < BITMAP_MIN_SIZE => Container::Array(b.to_array()),
            Container::Run(r) if r.run_count() > RUN_MAX_SIZE => Self::unpack_runs(r),
            _ => return,
        };
        self.replace(replacement);
    }

    fn unpack_runs(runs: &RunStore) -> Container {
        if runs.len() > ARRAY_MAX_SIZE {
            Container::Bitmap(runs.to_bitmap())
        } else {
            Container::Array(runs.to_array())
        }
    }

    fn replace(&mut self, replacement: Container) {
        debug_assert_eq!(
            replacement.cardinality(),
            self.cardinality(),
            "encoding conversion changed the cardinality"
        );
        debug_assert!(replacement.validate().is_ok());
        *self = replacement;
    }

    /// Number of maximal runs of consecutive values
    pub fn count_runs(&self) -> usize {
        match self {
            Container::Array(a) => a.count_runs(),
            Container::Bitmap(b) => b.count_runs(),
            Container::Run(r) => r.run_count(),
        }
    }

    /// Serialized payload size of the current encoding, in bytes
    pub fn payload_size(&self) -> usize {
        payload_size(self.encoding(), self.cardinality(), self.count_runs())
    }

    /// Convert to run encoding when that is strictly smaller than the
    /// alternative, or away from it when it is not.
    ///
    /// Returns true if the container is run encoded afterwards.
    pub fn run_optimize(&mut self) -> bool {
        let cardinality = self.cardinality();
        let run_size = payload_size(Encoding::Run, cardinality, self.count_runs());
        let packed_size = match self {
            Container::Bitmap(_) => BITMAP_PAYLOAD_SIZE,
            _ if cardinality > ARRAY_MAX_SIZE => BITMAP_PAYLOAD_SIZE,
            _ => payload_size(Encoding::Array, cardinality, 0),
        };
        if run_size < packed_size {
            let replacement = match self {
                Container::Array(a) => Container::Run(a.to_run()),
                Container::Bitmap(b) => Container::Run(b.to_run()),
                Container::Run(_) => return true,
            };
            self.replace(replacement);
            true
        } else {
            self.remove_run_compression();
            false
        }
    }

    /// Convert a run container to array or bitmap encoding.
    ///
    /// Returns true if the container was run encoded.
    pub fn remove_run_compression(&mut self) -> bool {
        let replacement = match self {
            Container::Run(r) => Self::unpack_runs(r),
            _ => return false,
        };
        self.replace(replacement);
        true
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            Container::Array(a) => a.min(),
            Container::Bitmap(b) => b.min(),
            Container::Run(r) => r.min(),
        }
    }

    pub fn max(&self) -> Option<u16> {
        match self {
            Container::Array(a) => a.max(),
            Container::Bitmap(b) => b.max(),
            Container::Run(r) => r.max(),
        }
    }

    /// Ascending iterator over the low bits; each call starts from the beginning
    pub fn iter(&self) -> Iter<'_> {
        match self {
            Container::Array(a) => Iter::Array(a.iter()),
            Container::Bitmap(b) => Iter::Bitmap(b.iter()),
            Container::Run(r) => Iter::Run(r.iter()),
        }
    }

    pub fn to_vec(&self) -> Vec<u16> {
        self.iter().collect()
    }

    /// Check the invariants of the current encoding
    pub fn validate(&self) -> Result<(), &'static str> {
        match self {
            Container::Array(a) => a.validate(),
            Container::Bitmap(b) => b.validate(),
            Container::Run(r) => r.validate(),
        }
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}Container<{} values>", self.encoding(), self.cardinality())
    }
}

/// Read access shared by owned containers and serialized container views
pub trait ContainerRead: crate::sealed::Sealed {
    fn cardinality(&self) -> u32;
    fn contains(&self, low: u16) -> bool;
    fn iter(&self) -> Iter<'_>;
}

impl crate::sealed::Sealed for Container {}

impl ContainerRead for Container {
    #[inline]
    fn cardinality(&self) -> u32 {
        Container::cardinality(self)
    }

    #[inline]
    fn contains(&self, low: u16) -> bool {
        Container::contains(self, low)
    }

    #[inline]
    fn iter(&self) -> Iter<'_> {
        Container::iter(self)
    }
}

pub(crate) type ArrayBytesIter<'a> = Map<ChunksExact<'a, u8>, fn(&[u8]) -> u16>;
pub(crate) type RunBytesIter<'a> = Map<ChunksExact<'a, u8>, fn(&[u8]) -> Interval>;

/// Ascending iterator over the low bits of a container or a serialized container view
#[derive(Clone)]
pub enum Iter<'a> {
    Array(Copied<slice::Iter<'a, u16>>),
    Bitmap(BitIter<&'a [u64; BITMAP_WORDS]>),
    Run(RunIter<Copied<slice::Iter<'a, Interval>>>),
    ArrayBytes(ArrayBytesIter<'a>),
    BitmapBytes(BitIter<&'a [u8]>),
    RunBytes(RunIter<RunBytesIter<'a>>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        match self {
            Iter::Array(it) => it.next(),
            Iter::Bitmap(it) => it.next(),
            Iter::Run(it) => it.next(),
            Iter::ArrayBytes(it) => it.next(),
            Iter::BitmapBytes(it) => it.next(),
            Iter::RunBytes(it) => it.next(),
        }
    }
}
