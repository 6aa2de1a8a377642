//! The serialized bitmap format.
//!
//! All integers are little-endian.
//!
//! | offset    | field                                              | size   |
//! |-----------|----------------------------------------------------|--------|
//! | 0         | magic number ([`MAGIC_NUMBER`])                    | 2      |
//! | 2         | storage version ([`STORAGE_VERSION`])              | 1      |
//! | 3         | reserved, written as zero                          | 1      |
//! | 4         | key count `N`                                      | 4      |
//! | 8         | `N` headers: key `u64`, type `u16`, cardinality-1 `u16` | 12N |
//! | 8 + 12N   | `N` payload offsets, `u32`, from the start of the buffer | 4N |
//! | 8 + 16N   | payloads                                           | ...    |
//!
//! Array payloads are `cardinality` `u16` values, bitmap payloads are 1024
//! `u64` words, and run payloads are a `u16` run count followed by that many
//! `(start u16, length - 1 u16)` pairs. Empty containers are never written.
//!
//! The second field of a run pair is the run length minus one, not the
//! length, so a run covering all 65536 low values fits in 16 bits. A reader
//! that takes the field as a plain length sees every run one value short.

use crate::container::{
    count_runs, validate_intervals, ArrayStore, BitIter, BitmapStore, Container, ContainerRead,
    Encoding, Interval, Iter, RunIter, RunStore, Words, BITMAP_PAYLOAD_SIZE, BITMAP_WORDS,
};
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::util;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{self, Write};
use tracing::trace;

/// First two bytes of every serialized bitmap
pub const MAGIC_NUMBER: u16 = 12348;

/// The only storage version understood by this crate
pub const STORAGE_VERSION: u8 = 0;

/// Magic number, version, reserved byte and key count
pub const HEADER_BASE_SIZE: usize = 8;
pub const HEADER_ENTRY_SIZE: usize = 12;
pub const OFFSET_ENTRY_SIZE: usize = 4;

const RUN_COUNT_HEADER_SIZE: usize = 2;
const RUN_ENTRY_SIZE: usize = 4;

#[inline]
fn read_u16(chunk: &[u8]) -> u16 {
    LittleEndian::read_u16(chunk)
}

/// A container still encoded inside a serialized buffer.
///
/// The payload borrows the buffer, so a view can never outlive the bytes it
/// was read from. Use [`ContainerView::to_container`] to get an owned copy.
#[derive(Clone, Copy, Debug)]
pub struct ContainerView<'a> {
    encoding: Encoding,
    cardinality: u32,
    // for run containers, the pairs following the run count
    payload: &'a [u8],
}

impl<'a> ContainerView<'a> {
    fn new(key: u64, encoding: Encoding, cardinality: u32, payload: &'a [u8]) -> Result<Self> {
        let view = Self {
            encoding,
            cardinality,
            payload,
        };
        view.validate()
            .map_err(|reason| Error::Corrupt { key, reason })?;
        Ok(view)
    }

    fn validate(&self) -> std::result::Result<(), &'static str> {
        match self.encoding {
            Encoding::Array => {
                let ascending = self
                    .payload
                    .chunks_exact(2)
                    .map(read_u16)
                    .try_fold(None, |previous, value| match previous {
                        Some(previous) if previous >= value => Err(()),
                        _ => Ok(Some(value)),
                    });
                match ascending {
                    Ok(_) => Ok(()),
                    Err(()) => Err("array values are not strictly ascending"),
                }
            }
            Encoding::Bitmap => {
                let counted: u32 = (0..BITMAP_WORDS)
                    .map(|i| self.payload.word(i).count_ones())
                    .sum();
                if counted == self.cardinality {
                    Ok(())
                } else {
                    Err("bitmap cardinality does not match its set bits")
                }
            }
            Encoding::Run => {
                let overflows = self.payload.chunks_exact(RUN_ENTRY_SIZE).any(|chunk| {
                    u32::from(read_u16(&chunk[0..2])) + u32::from(read_u16(&chunk[2..4]))
                        > u32::from(u16::MAX)
                });
                if overflows {
                    return Err("run extends past the end of the container");
                }
                validate_intervals(self.intervals(), self.cardinality)
            }
        }
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn cardinality(&self) -> u32 {
        self.cardinality
    }

    fn intervals(&self) -> std::iter::Map<std::slice::ChunksExact<'a, u8>, fn(&[u8]) -> Interval> {
        self.payload
            .chunks_exact(RUN_ENTRY_SIZE)
            .map(Interval::from_le_bytes as fn(&[u8]) -> Interval)
    }

    /// Number of maximal runs of consecutive values
    pub fn count_runs(&self) -> usize {
        match self.encoding {
            Encoding::Array => {
                let values = self.payload.chunks_exact(2).map(read_u16);
                let mut previous: Option<u16> = None;
                let mut runs = 0;
                for value in values {
                    if previous.map_or(true, |p| u32::from(p) + 1 != u32::from(value)) {
                        runs += 1;
                    }
                    previous = Some(value);
                }
                runs
            }
            Encoding::Bitmap => count_runs(self.payload),
            Encoding::Run => self.payload.len() / RUN_ENTRY_SIZE,
        }
    }

    pub fn contains(&self, low: u16) -> bool {
        match self.encoding {
            Encoding::Array => {
                let value = |i: usize| read_u16(&self.payload[i * 2..i * 2 + 2]);
                let len = self.payload.len() / 2;
                let index = util::partition_point(len, |i| value(i) < low);
                index < len && value(index) == low
            }
            Encoding::Bitmap => self.payload.word(usize::from(low) / 64) & (1 << (low % 64)) != 0,
            Encoding::Run => {
                let run = |i: usize| {
                    Interval::from_le_bytes(&self.payload[i * RUN_ENTRY_SIZE..][..RUN_ENTRY_SIZE])
                };
                let len = self.payload.len() / RUN_ENTRY_SIZE;
                match util::partition_point(len, |i| run(i).start <= low) {
                    0 => false,
                    index => low <= run(index - 1).end,
                }
            }
        }
    }

    /// Ascending iterator over the low bits, reading straight from the buffer
    pub fn iter(&self) -> Iter<'a> {
        match self.encoding {
            Encoding::Array => Iter::ArrayBytes(
                self.payload
                    .chunks_exact(2)
                    .map(read_u16 as fn(&[u8]) -> u16),
            ),
            Encoding::Bitmap => Iter::BitmapBytes(BitIter::new(self.payload)),
            Encoding::Run => Iter::RunBytes(RunIter::new(self.intervals())),
        }
    }

    /// Copy the payload into an owned container of the same encoding
    pub fn to_container(&self) -> Container {
        match self.encoding {
            Encoding::Array => {
                let mut values = vec![0; self.payload.len() / 2];
                LittleEndian::read_u16_into(self.payload, &mut values);
                Container::Array(ArrayStore::from_vec_unchecked(values))
            }
            Encoding::Bitmap => {
                let mut words = Box::new([0; BITMAP_WORDS]);
                LittleEndian::read_u64_into(self.payload, &mut words[..]);
                Container::Bitmap(BitmapStore::from_words(words))
            }
            Encoding::Run => {
                Container::Run(RunStore::from_intervals_unchecked(self.intervals().collect()))
            }
        }
    }
}

impl crate::sealed::Sealed for ContainerView<'_> {}

impl<'a> ContainerRead for ContainerView<'a> {
    #[inline]
    fn cardinality(&self) -> u32 {
        self.cardinality
    }

    #[inline]
    fn contains(&self, low: u16) -> bool {
        ContainerView::contains(self, low)
    }

    #[inline]
    fn iter(&self) -> Iter<'_> {
        ContainerView::iter(self)
    }
}

/// Streaming decoder over a serialized bitmap.
///
/// The header is checked when the iterator is created; every call to `next`
/// then bounds-checks and validates one container and yields a view into the
/// buffer without copying its payload. Iteration stops after the first error.
///
/// # Examples
///
/// ```
/// use proaring::{Bitmap, ContainerIterator, Encoding};
///
/// let bitmap = Bitmap::of(&[1, 2, 4, 65536]);
/// let data = bitmap.serialize().unwrap();
///
/// let mut containers = ContainerIterator::new(&data).unwrap();
/// assert_eq!(containers.len(), 2);
///
/// let (key, view) = containers.next().unwrap().unwrap();
/// assert_eq!(key, 0);
/// assert_eq!(view.encoding(), Encoding::Array);
/// assert_eq!(view.iter().collect::<Vec<_>>(), vec![1, 2, 4]);
///
/// let (key, view) = containers.next().unwrap().unwrap();
/// assert_eq!(key, 1);
/// assert!(view.contains(0));
/// assert!(containers.next().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct ContainerIterator<'a> {
    data: &'a [u8],
    headers: &'a [u8],
    offsets: &'a [u8],
    index: usize,
    key_count: usize,
    previous_key: Option<u64>,
    failed: bool,
}

impl<'a> ContainerIterator<'a> {
    /// Check the fixed header of `data` and position the iterator on the first container
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = data.get(..HEADER_BASE_SIZE).ok_or(Error::Truncated {
            needed: HEADER_BASE_SIZE,
            len: data.len(),
        })?;
        let magic = LittleEndian::read_u16(&header[0..2]);
        if magic != MAGIC_NUMBER {
            return Err(Error::InvalidMagic(magic));
        }
        let version = header[2];
        if version != STORAGE_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let key_count = LittleEndian::read_u32(&header[4..8]) as usize;

        let headers_end = key_count
            .saturating_mul(HEADER_ENTRY_SIZE)
            .saturating_add(HEADER_BASE_SIZE);
        let offsets_end = key_count
            .saturating_mul(OFFSET_ENTRY_SIZE)
            .saturating_add(headers_end);
        if offsets_end > data.len() {
            return Err(Error::Truncated {
                needed: offsets_end,
                len: data.len(),
            });
        }

        Ok(Self {
            data,
            headers: &data[HEADER_BASE_SIZE..headers_end],
            offsets: &data[headers_end..offsets_end],
            index: 0,
            key_count,
            previous_key: None,
            failed: false,
        })
    }

    /// Bytes `start..start + len` of the buffer
    fn bytes(&self, start: usize, len: usize) -> Result<&'a [u8]> {
        let end = start.saturating_add(len);
        self.data.get(start..end).ok_or(Error::Truncated {
            needed: end,
            len: self.data.len(),
        })
    }

    fn read_entry(&mut self) -> Result<(u64, ContainerView<'a>)> {
        let header = &self.headers[self.index * HEADER_ENTRY_SIZE..][..HEADER_ENTRY_SIZE];
        let key = LittleEndian::read_u64(&header[0..8]);
        let tag = LittleEndian::read_u16(&header[8..10]);
        let cardinality = u32::from(LittleEndian::read_u16(&header[10..12])) + 1;

        if let Some(previous) = self.previous_key {
            if key <= previous {
                return Err(Error::UnsortedKeys { previous, key });
            }
        }
        self.previous_key = Some(key);

        let encoding = Encoding::from_tag(tag).ok_or(Error::Corrupt {
            key,
            reason: "unknown container type",
        })?;
        let offset =
            LittleEndian::read_u32(&self.offsets[self.index * OFFSET_ENTRY_SIZE..]) as usize;
        if offset < HEADER_BASE_SIZE + self.headers.len() + self.offsets.len() {
            return Err(Error::Corrupt {
                key,
                reason: "payload offset points into the header",
            });
        }

        let payload = match encoding {
            Encoding::Array => self.bytes(offset, cardinality as usize * 2)?,
            Encoding::Bitmap => self.bytes(offset, BITMAP_PAYLOAD_SIZE)?,
            Encoding::Run => {
                let runs = read_u16(self.bytes(offset, RUN_COUNT_HEADER_SIZE)?) as usize;
                self.bytes(offset + RUN_COUNT_HEADER_SIZE, runs * RUN_ENTRY_SIZE)?
            }
        };
        let view = ContainerView::new(key, encoding, cardinality, payload)?;
        Ok((key, view))
    }
}

impl<'a> Iterator for ContainerIterator<'a> {
    type Item = Result<(u64, ContainerView<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.key_count {
            return None;
        }
        let entry = self.read_entry();
        self.index += 1;
        self.failed = entry.is_err();
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            self.key_count - self.index
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ContainerIterator<'_> {}

/// Serialized size of `directory`, in bytes
pub(crate) fn serialized_size(directory: &Directory) -> usize {
    directory
        .iter()
        .filter(|(_, container)| !container.is_empty())
        .fold(HEADER_BASE_SIZE, |size, (_, container)| {
            size + HEADER_ENTRY_SIZE + OFFSET_ENTRY_SIZE + container.payload_size()
        })
}

/// Write `directory` to `dst`, returning the number of bytes written
pub(crate) fn serialize_into<W: Write>(directory: &Directory, mut dst: W) -> Result<u64> {
    let entries: Vec<(u64, &Container, usize)> = directory
        .iter()
        .filter(|(_, container)| !container.is_empty())
        .map(|(&key, container)| (key, container, container.payload_size()))
        .collect();
    let payload_start =
        HEADER_BASE_SIZE + entries.len() * (HEADER_ENTRY_SIZE + OFFSET_ENTRY_SIZE);
    let total = payload_start + entries.iter().map(|&(_, _, size)| size).sum::<usize>();
    // key count and offsets are 32 bits wide
    let key_count = u32::try_from(entries.len()).map_err(|_| Error::TooLarge(total))?;
    if u32::try_from(total).is_err() {
        return Err(Error::TooLarge(total));
    }

    dst.write_u16::<LittleEndian>(MAGIC_NUMBER)?;
    dst.write_u8(STORAGE_VERSION)?;
    dst.write_u8(0)?;
    dst.write_u32::<LittleEndian>(key_count)?;

    for &(key, container, _) in &entries {
        dst.write_u64::<LittleEndian>(key)?;
        dst.write_u16::<LittleEndian>(container.encoding().tag())?;
        dst.write_u16::<LittleEndian>((container.cardinality() - 1) as u16)?;
    }

    let mut offset = payload_start;
    for &(_, _, size) in &entries {
        dst.write_u32::<LittleEndian>(offset as u32)?;
        offset += size;
    }

    for &(_, container, _) in &entries {
        write_payload(container, &mut dst)?;
    }

    trace!(containers = entries.len(), bytes = total, "serialized bitmap");
    Ok(total as u64)
}

fn write_payload<W: Write>(container: &Container, dst: &mut W) -> io::Result<()> {
    match container {
        Container::Array(array) => {
            let mut bytes = vec![0; array.as_slice().len() * 2];
            LittleEndian::write_u16_into(array.as_slice(), &mut bytes);
            dst.write_all(&bytes)
        }
        Container::Bitmap(bitmap) => {
            let mut bytes = vec![0; BITMAP_PAYLOAD_SIZE];
            LittleEndian::write_u64_into(&bitmap.words()[..], &mut bytes);
            dst.write_all(&bytes)
        }
        Container::Run(runs) => {
            dst.write_u16::<LittleEndian>(runs.run_count() as u16)?;
            for run in runs.intervals() {
                dst.write_u16::<LittleEndian>(run.start)?;
                dst.write_u16::<LittleEndian>(run.end - run.start)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn directory_of(values: &[u64]) -> Directory {
        let mut directory = Directory::new();
        for &value in values {
            let (high, low) = util::split(value);
            directory.get_or_create(high).add(low);
        }
        directory
    }

    fn encode(directory: &Directory) -> Vec<u8> {
        let mut data = Vec::new();
        let written = serialize_into(directory, &mut data).unwrap();
        assert_eq!(written as usize, data.len());
        assert_eq!(serialized_size(directory), data.len());
        data
    }

    #[test]
    fn layout_of_two_array_containers() {
        let directory = directory_of(&[1, 2, 4, 8, 16, 128, 256, 1024, 65535, 65536]);
        let data = encode(&directory);

        assert_eq!(LittleEndian::read_u16(&data[0..2]), MAGIC_NUMBER);
        assert_eq!(data[2], STORAGE_VERSION);
        assert_eq!(data[3], 0);
        assert_eq!(LittleEndian::read_u32(&data[4..8]), 2);

        // first header: key 0, array, 9 values
        assert_eq!(LittleEndian::read_u64(&data[8..16]), 0);
        assert_eq!(LittleEndian::read_u16(&data[16..18]), Encoding::Array.tag());
        assert_eq!(LittleEndian::read_u16(&data[18..20]), 8);
        // second header: key 1, array, 1 value
        assert_eq!(LittleEndian::read_u64(&data[20..28]), 1);
        assert_eq!(LittleEndian::read_u16(&data[30..32]), 0);

        // absolute offsets
        assert_eq!(LittleEndian::read_u32(&data[32..36]), 40);
        assert_eq!(LittleEndian::read_u32(&data[36..40]), 58);

        let mut first = [0u16; 9];
        LittleEndian::read_u16_into(&data[40..58], &mut first);
        assert_eq!(first, [1, 2, 4, 8, 16, 128, 256, 1024, 65535]);
        assert_eq!(LittleEndian::read_u16(&data[58..60]), 0);
        assert_eq!(data.len(), 60);
    }

    #[test]
    fn run_payload_stores_length_minus_one() {
        let mut directory = directory_of(&[]);
        let container = directory.get_or_create(7);
        for low in 0..=u16::MAX {
            container.add(low);
        }
        container.run_optimize();
        let data = encode(&directory);

        assert_eq!(LittleEndian::read_u16(&data[16..18]), Encoding::Run.tag());
        assert_eq!(LittleEndian::read_u16(&data[18..20]), u16::MAX);
        let payload = &data[24..];
        assert_eq!(LittleEndian::read_u16(&payload[0..2]), 1);
        assert_eq!(LittleEndian::read_u16(&payload[2..4]), 0);
        assert_eq!(LittleEndian::read_u16(&payload[4..6]), u16::MAX);

        let (key, view) = ContainerIterator::new(&data).unwrap().next().unwrap().unwrap();
        assert_eq!(key, 7);
        assert_eq!(view.cardinality(), 65536);
        assert_eq!(view.iter().count(), 65536);
        assert!(view.contains(0) && view.contains(u16::MAX));
        assert_eq!(view.count_runs(), 1);
    }

    #[test]
    fn run_pair_covers_one_more_than_its_length_field() {
        let mut data = Vec::new();
        data.write_u16::<LittleEndian>(MAGIC_NUMBER).unwrap();
        data.extend_from_slice(&[STORAGE_VERSION, 0]);
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u64::<LittleEndian>(0).unwrap();
        data.write_u16::<LittleEndian>(Encoding::Run.tag()).unwrap();
        data.write_u16::<LittleEndian>(2).unwrap();
        data.write_u32::<LittleEndian>(24).unwrap();
        for field in [1u16, 10, 2] {
            data.write_u16::<LittleEndian>(field).unwrap();
        }

        let (_, view) = ContainerIterator::new(&data).unwrap().next().unwrap().unwrap();
        assert_eq!(view.iter().collect::<Vec<_>>(), [10, 11, 12]);
        assert_eq!(view.to_container().to_vec(), [10, 11, 12]);
    }

    #[test]
    fn views_match_owned_containers() {
        let mut values: Vec<u64> = (0..3).chain(100..5000).map(|v| v * 3).collect();
        values.extend((1 << 20)..(1 << 20) + 300);
        let mut directory = directory_of(&values);
        directory.get_or_create(1 << 4).run_optimize();
        let data = encode(&directory);

        let views: Vec<_> = ContainerIterator::new(&data)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(views.len(), directory.len());
        for ((key, view), (&expected_key, container)) in views.iter().zip(directory.iter()) {
            assert_eq!(*key, expected_key);
            assert_eq!(view.encoding(), container.encoding());
            assert_eq!(view.cardinality(), container.cardinality());
            assert_eq!(view.count_runs(), container.count_runs());
            assert!(view.iter().eq(container.iter()));
            assert_eq!(&view.to_container(), container);
            for low in [0, 3, 4, 299, 300, 14_997, 15_000, u16::MAX] {
                assert_eq!(view.contains(low), container.contains(low), "{key} {low}");
            }
        }
    }

    #[test]
    fn empty_containers_are_skipped() {
        let mut directory = directory_of(&[5, 1 << 16]);
        directory.get_or_create(1).remove(0);
        let data = encode(&directory);
        assert_eq!(LittleEndian::read_u32(&data[4..8]), 1);
        assert_eq!(ContainerIterator::new(&data).unwrap().count(), 1);
    }

    #[test]
    fn rejects_bad_headers() {
        let data = encode(&directory_of(&[1, 2, 3]));

        let mut bad_magic = data.clone();
        bad_magic[0] ^= 0xFF;
        assert!(matches!(
            ContainerIterator::new(&bad_magic),
            Err(Error::InvalidMagic(_))
        ));

        let mut bad_version = data.clone();
        bad_version[2] = 9;
        assert!(matches!(
            ContainerIterator::new(&bad_version),
            Err(Error::UnsupportedVersion(9))
        ));

        assert!(matches!(
            ContainerIterator::new(&data[..5]),
            Err(Error::Truncated { needed: 8, len: 5 })
        ));
        assert!(matches!(
            ContainerIterator::new(&data[..20]),
            Err(Error::Truncated { needed: 24, len: 20 })
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let data = encode(&directory_of(&[1, 2, 3]));
        let mut containers = ContainerIterator::new(&data[..data.len() - 1]).unwrap();
        assert!(matches!(
            containers.next(),
            Some(Err(Error::Truncated { .. }))
        ));
        assert!(containers.next().is_none());
    }

    #[test]
    fn rejects_unsorted_keys() {
        let mut data = encode(&directory_of(&[1, 1 << 16]));
        // give both headers the same key
        LittleEndian::write_u64(&mut data[8..16], 1);
        LittleEndian::write_u64(&mut data[20..28], 1);
        let mut containers = ContainerIterator::new(&data).unwrap();
        assert!(containers.next().unwrap().is_ok());
        assert!(matches!(
            containers.next(),
            Some(Err(Error::UnsortedKeys {
                previous: 1,
                key: 1
            }))
        ));
    }

    #[test]
    fn rejects_inconsistent_payloads() {
        let data = encode(&directory_of(&[1, 2, 3]));

        let mut unknown_type = data.clone();
        LittleEndian::write_u16(&mut unknown_type[16..18], 0);
        let mut unsorted = data.clone();
        LittleEndian::write_u16(&mut unsorted[24..26], 9);
        let mut into_header = data.clone();
        LittleEndian::write_u32(&mut into_header[20..24], 4);

        for corrupt in [unknown_type, unsorted, into_header] {
            let mut containers = ContainerIterator::new(&corrupt).unwrap();
            assert!(matches!(
                containers.next(),
                Some(Err(Error::Corrupt { key: 0, .. }))
            ));
        }
    }
}
