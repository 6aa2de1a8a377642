use super::bitmap::BitmapStore;
use super::run::RunStore;
use std::slice;

/// Sorted, duplicate-free low bits
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ArrayStore {
    values: Vec<u16>,
}

impl ArrayStore {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Build from values already known to be strictly ascending
    pub(crate) fn from_vec_unchecked(values: Vec<u16>) -> Self {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        Self { values }
    }

    pub fn insert(&mut self, low: u16) -> bool {
        match self.values.binary_search(&low) {
            Ok(_) => false,
            Err(index) => {
                self.values.insert(index, low);
                true
            }
        }
    }

    pub fn remove(&mut self, low: u16) -> bool {
        match self.values.binary_search(&low) {
            Ok(index) => {
                self.values.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    #[inline]
    pub fn contains(&self, low: u16) -> bool {
        self.values.binary_search(&low).is_ok()
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.values.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.values
    }

    pub fn iter(&self) -> std::iter::Copied<slice::Iter<'_, u16>> {
        self.values.iter().copied()
    }

    pub fn min(&self) -> Option<u16> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<u16> {
        self.values.last().copied()
    }

    /// Number of maximal runs of consecutive values
    pub fn count_runs(&self) -> usize {
        match self.values.first() {
            None => 0,
            Some(_) => 1 + self.values.windows(2).filter(|w| w[0] + 1 != w[1]).count(),
        }
    }

    pub fn to_bitmap(&self) -> BitmapStore {
        let mut bitmap = BitmapStore::new();
        for &low in &self.values {
            bitmap.insert(low);
        }
        bitmap
    }

    pub fn to_run(&self) -> RunStore {
        RunStore::from_sorted(self.iter())
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.values.windows(2).all(|w| w[0] < w[1]) {
            Ok(())
        } else {
            Err("array values are not strictly ascending")
        }
    }
}
