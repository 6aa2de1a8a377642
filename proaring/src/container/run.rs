use super::array::ArrayStore;
use super::bitmap::BitmapStore;
use byteorder::{ByteOrder, LittleEndian};
use std::iter::Copied;
use std::slice;

/// An inclusive range of set low bits
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct Interval {
    pub start: u16,
    pub end: u16,
}

impl Interval {
    pub fn new(start: u16, end: u16) -> Interval {
        debug_assert!(start <= end);
        Interval { start, end }
    }

    /// Number of values covered, between 1 and 65536
    #[inline]
    pub fn len(&self) -> u32 {
        u32::from(self.end - self.start) + 1
    }

    /// Decode a serialized `(start, length - 1)` pair, where the second field
    /// is one less than the number of values in the run
    #[inline]
    pub(crate) fn from_le_bytes(chunk: &[u8]) -> Interval {
        let start = LittleEndian::read_u16(&chunk[0..2]);
        let length_minus_one = LittleEndian::read_u16(&chunk[2..4]);
        Interval {
            start,
            end: start.saturating_add(length_minus_one),
        }
    }
}

/// Run-length encoded low bits
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct RunStore {
    runs: Vec<Interval>,
    len: u32,
}

impl RunStore {
    pub fn new() -> Self {
        Self {
            runs: Vec::new(),
            len: 0,
        }
    }

    /// Collapse an ascending, duplicate-free sequence into runs
    pub fn from_sorted(values: impl IntoIterator<Item = u16>) -> Self {
        let mut store = RunStore::new();
        for low in values {
            match store.runs.last_mut() {
                Some(last) if u32::from(last.end) + 1 == u32::from(low) => last.end = low,
                _ => store.runs.push(Interval::new(low, low)),
            }
            store.len += 1;
        }
        store
    }

    /// Build from intervals which are already sorted and non-adjacent
    pub(crate) fn from_intervals_unchecked(runs: Vec<Interval>) -> Self {
        let len = runs.iter().map(Interval::len).sum();
        let store = Self { runs, len };
        debug_assert!(store.validate().is_ok());
        store
    }

    /// Index of the first run starting after `low`
    #[inline]
    fn upper_bound(&self, low: u16) -> usize {
        self.runs.partition_point(|iv| iv.start <= low)
    }

    pub fn insert(&mut self, low: u16) -> bool {
        let index = self.upper_bound(low);
        let extends_previous = if index > 0 {
            let previous = self.runs[index - 1];
            if low <= previous.end {
                return false;
            }
            previous.end + 1 == low
        } else {
            false
        };
        let joins_next = index < self.runs.len() && self.runs[index].start == low + 1;

        match (extends_previous, joins_next) {
            (true, true) => {
                self.runs[index - 1].end = self.runs[index].end;
                self.runs.remove(index);
            }
            (true, false) => self.runs[index - 1].end = low,
            (false, true) => self.runs[index].start = low,
            (false, false) => self.runs.insert(index, Interval::new(low, low)),
        }
        self.len += 1;
        true
    }

    pub fn remove(&mut self, low: u16) -> bool {
        let index = self.upper_bound(low);
        if index == 0 {
            return false;
        }
        let run = self.runs[index - 1];
        if low > run.end {
            return false;
        }

        if run.start == run.end {
            self.runs.remove(index - 1);
        } else if low == run.start {
            self.runs[index - 1].start = low + 1;
        } else if low == run.end {
            self.runs[index - 1].end = low - 1;
        } else {
            self.runs[index - 1].end = low - 1;
            self.runs.insert(index, Interval::new(low + 1, run.end));
        }
        self.len -= 1;
        true
    }

    #[inline]
    pub fn contains(&self, low: u16) -> bool {
        match self.upper_bound(low) {
            0 => false,
            index => low <= self.runs[index - 1].end,
        }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    #[inline]
    pub fn intervals(&self) -> &[Interval] {
        &self.runs
    }

    pub fn iter(&self) -> RunIter<Copied<slice::Iter<'_, Interval>>> {
        RunIter::new(self.runs.iter().copied())
    }

    pub fn min(&self) -> Option<u16> {
        self.runs.first().map(|iv| iv.start)
    }

    pub fn max(&self) -> Option<u16> {
        self.runs.last().map(|iv| iv.end)
    }

    pub fn to_array(&self) -> ArrayStore {
        ArrayStore::from_vec_unchecked(self.iter().collect())
    }

    pub fn to_bitmap(&self) -> BitmapStore {
        let mut bitmap = BitmapStore::new();
        for low in self.iter() {
            bitmap.insert(low);
        }
        bitmap
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        validate_intervals(self.runs.iter().copied(), self.len)
    }
}

/// Check that runs are ascending, non-overlapping and non-adjacent, and that
/// they cover exactly `expected` values.
pub(crate) fn validate_intervals(
    runs: impl Iterator<Item = Interval>,
    expected: u32,
) -> Result<(), &'static str> {
    let mut previous_end: Option<u16> = None;
    let mut total = 0u64;
    for run in runs {
        if run.start > run.end {
            return Err("run ends before it starts");
        }
        if let Some(end) = previous_end {
            if u32::from(run.start) <= u32::from(end) + 1 {
                return Err("runs overlap or touch");
            }
        }
        previous_end = Some(run.end);
        total += u64::from(run.len());
    }
    if total == u64::from(expected) {
        Ok(())
    } else {
        Err("run lengths do not add up to the cardinality")
    }
}

/// Ascending iterator over the values covered by a sequence of runs
#[derive(Clone)]
pub struct RunIter<I> {
    runs: I,
    // next value and inclusive end of the run being walked
    current: Option<(u32, u32)>,
}

impl<I: Iterator<Item = Interval>> RunIter<I> {
    pub(crate) fn new(runs: I) -> Self {
        Self {
            runs,
            current: None,
        }
    }
}

impl<I: Iterator<Item = Interval>> Iterator for RunIter<I> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        loop {
            if let Some((next, end)) = &mut self.current {
                if *next <= *end {
                    let value = *next as u16;
                    *next += 1;
                    return Some(value);
                }
            }
            let run = self.runs.next()?;
            self.current = Some((u32::from(run.start), u32::from(run.end)));
        }
    }
}
