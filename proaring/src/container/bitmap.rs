use super::array::ArrayStore;
use super::run::RunStore;
use byteorder::{ByteOrder, LittleEndian};

/// Number of 64-bit words in a dense container
pub const BITMAP_WORDS: usize = 1024;

/// Dense bitset over all 65,536 low bits
#[derive(Clone, PartialEq, Eq)]
pub struct BitmapStore {
    len: u32,
    words: Box<[u64; BITMAP_WORDS]>,
}

#[inline]
fn word_index(low: u16) -> usize {
    usize::from(low) / 64
}

#[inline]
fn bit(low: u16) -> u64 {
    1 << (low % 64)
}

impl BitmapStore {
    pub fn new() -> Self {
        Self {
            len: 0,
            words: Box::new([0; BITMAP_WORDS]),
        }
    }

    /// Build from raw words, recomputing the cardinality
    pub fn from_words(words: Box<[u64; BITMAP_WORDS]>) -> Self {
        let len = words.iter().map(|w| w.count_ones()).sum();
        Self { len, words }
    }

    pub fn insert(&mut self, low: u16) -> bool {
        let word = &mut self.words[word_index(low)];
        let before = *word;
        *word |= bit(low);
        let added = before != *word;
        self.len += u32::from(added);
        added
    }

    pub fn remove(&mut self, low: u16) -> bool {
        let word = &mut self.words[word_index(low)];
        let before = *word;
        *word &= !bit(low);
        let removed = before != *word;
        self.len -= u32::from(removed);
        removed
    }

    #[inline]
    pub fn contains(&self, low: u16) -> bool {
        self.words[word_index(low)] & bit(low) != 0
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
    pub fn words(&self) -> &[u64; BITMAP_WORDS] {
        &self.words
    }

    pub fn iter(&self) -> BitIter<&[u64; BITMAP_WORDS]> {
        BitIter::new(&*self.words)
    }

    pub fn min(&self) -> Option<u16> {
        self.iter().next()
    }

    pub fn max(&self) -> Option<u16> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| (i * 64 + 63 - w.leading_zeros() as usize) as u16)
    }

    pub fn count_runs(&self) -> usize {
        count_runs(&*self.words)
    }

    pub fn to_array(&self) -> ArrayStore {
        ArrayStore::from_vec_unchecked(self.iter().collect())
    }

    pub fn to_run(&self) -> RunStore {
        RunStore::from_sorted(self.iter())
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        let counted: u32 = self.words.iter().map(|w| w.count_ones()).sum();
        if counted == self.len {
            Ok(())
        } else {
            Err("bitmap cardinality does not match its set bits")
        }
    }
}

/// Random access to the 1024 words of a dense container, either owned or
/// still encoded as little-endian bytes in a serialized buffer.
pub trait Words {
    fn word(&self, index: usize) -> u64;
}

impl Words for &[u64; BITMAP_WORDS] {
    #[inline]
    fn word(&self, index: usize) -> u64 {
        self[index]
    }
}

impl Words for &[u8] {
    #[inline]
    fn word(&self, index: usize) -> u64 {
        LittleEndian::read_u64(&self[index * 8..index * 8 + 8])
    }
}

/// Count maximal runs of set bits
pub(crate) fn count_runs<W: Words>(words: W) -> usize {
    let mut runs = 0;
    let mut carry = 0;
    for index in 0..BITMAP_WORDS {
        let word = words.word(index);
        // a run starts at every set bit whose lower neighbour is clear
        runs += (word & !((word << 1) | carry)).count_ones() as usize;
        carry = word >> 63;
    }
    runs
}

/// Ascending iterator over the set bits of a dense container
#[derive(Clone)]
pub struct BitIter<W> {
    words: W,
    index: usize,
    current: u64,
}

impl<W: Words> BitIter<W> {
    pub(crate) fn new(words: W) -> Self {
        let current = words.word(0);
        Self {
            words,
            index: 0,
            current,
        }
    }
}

impl<W: Words> Iterator for BitIter<W> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        while self.current == 0 {
            self.index += 1;
            if self.index >= BITMAP_WORDS {
                return None;
            }
            self.current = self.words.word(self.index);
        }
        let bit = self.current.trailing_zeros() as usize;
        // clear the lowest set bit
        self.current &= self.current - 1;
        Some((self.index * 64 + bit) as u16)
    }
}
