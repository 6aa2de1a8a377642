use super::{Bitmap, Statistics};
use crate::container::{Container, Encoding};
use crate::directory::Directory;
use crate::util;
use tracing::debug;

impl Bitmap {
    /// Create a new empty bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let bitmap = Bitmap::new();
    /// assert_eq!(bitmap.cardinality(), 0);
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            directory: Directory::new(),
        }
    }

    /// Creates a new bitmap from a slice of u64 integers
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let bitmap = Bitmap::of(&[1, 2, 3]);
    /// assert_eq!(bitmap.cardinality(), 3);
    /// ```
    #[inline]
    #[must_use]
    pub fn of(slice: &[u64]) -> Self {
        let mut bitmap = Self::new();
        bitmap.add_many(slice);
        bitmap
    }

    pub(crate) fn from_directory(directory: Directory) -> Self {
        Self { directory }
    }

    /// The containers backing this bitmap, ordered by high key
    #[inline]
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Add the integer element to the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add(1);
    /// assert!(bitmap.contains(1));
    /// ```
    #[inline]
    pub fn add(&mut self, value: u64) {
        self.add_checked(value);
    }

    /// Add the integer element to the bitmap. Returns true if the value was
    /// added, false if the value was already in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.add_checked(1));
    /// assert!(!bitmap.add_checked(1));
    /// ```
    pub fn add_checked(&mut self, value: u64) -> bool {
        let (high, low) = util::split(value);
        self.directory.get_or_create(high).add(low)
    }

    /// Add many values to the bitmap
    ///
    /// See also [`Bitmap::extend`]
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_many(&[1, 2, 3]);
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert!(bitmap.contains(3));
    /// ```
    pub fn add_many(&mut self, values: &[u64]) {
        for &value in values {
            self.add(value);
        }
    }

    /// Remove the integer element from the bitmap
    ///
    /// A container left empty by the removal is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap = Bitmap::of(&[1, 1 << 20]);
    /// bitmap.remove(1 << 20);
    /// assert!(!bitmap.contains(1 << 20));
    /// assert_eq!(bitmap.directory().len(), 1);
    /// ```
    #[inline]
    pub fn remove(&mut self, value: u64) {
        self.remove_checked(value);
    }

    /// Remove the integer element from the bitmap. Returns true if the value
    /// was removed, false if the value was not present in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add(1);
    /// assert!(bitmap.remove_checked(1));
    /// assert!(!bitmap.remove_checked(1));
    /// ```
    pub fn remove_checked(&mut self, value: u64) -> bool {
        let (high, low) = util::split(value);
        let Some(container) = self.directory.get_mut(high) else {
            return false;
        };
        let removed = container.remove(low);
        if container.is_empty() {
            self.directory.remove(high);
        }
        removed
    }

    /// Empties the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap: Bitmap = (1..5).collect();
    /// assert!(!bitmap.is_empty());
    /// bitmap.clear();
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        self.directory.clear();
    }

    /// Returns the number of integers contained in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap = Bitmap::of(&[1, 2, 3]);
    /// assert_eq!(bitmap.cardinality(), 3);
    /// bitmap.add(1 << 40);
    /// assert_eq!(bitmap.cardinality(), 4);
    /// ```
    #[inline]
    #[must_use]
    #[doc(alias = "count")]
    pub fn cardinality(&self) -> u64 {
        self.directory
            .iter()
            .map(|(_, container)| u64::from(container.cardinality()))
            .sum()
    }

    /// Returns true if the bitmap is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.is_empty());
    /// bitmap.add(u64::MAX);
    /// assert!(!bitmap.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directory
            .iter()
            .all(|(_, container)| container.is_empty())
    }

    /// Returns true if the element is contained in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// assert!(!bitmap.contains(1));
    /// bitmap.add(1);
    /// assert!(bitmap.contains(1));
    /// ```
    #[inline]
    #[must_use]
    pub fn contains(&self, value: u64) -> bool {
        let (high, low) = util::split(value);
        self.directory
            .get(high)
            .is_some_and(|container| container.contains(low))
    }

    /// Returns the smallest value in the bitmap, or None if the bitmap is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap: Bitmap = (5..10).collect();
    /// let empty_bitmap = Bitmap::new();
    ///
    /// assert_eq!(bitmap.minimum(), Some(5));
    /// assert_eq!(empty_bitmap.minimum(), None);
    ///
    /// bitmap.add(3);
    ///
    /// assert_eq!(bitmap.minimum(), Some(3));
    /// ```
    #[must_use]
    pub fn minimum(&self) -> Option<u64> {
        self.directory
            .iter()
            .find_map(|(&high, container)| Some(util::join(high, container.min()?)))
    }

    /// Returns the largest value in the bitmap, or None if the bitmap is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap: Bitmap = (5..10).collect();
    /// let empty_bitmap = Bitmap::new();
    ///
    /// assert_eq!(bitmap.maximum(), Some(9));
    /// assert_eq!(empty_bitmap.maximum(), None);
    ///
    /// bitmap.add(u64::MAX);
    ///
    /// assert_eq!(bitmap.maximum(), Some(u64::MAX));
    /// ```
    #[must_use]
    pub fn maximum(&self) -> Option<u64> {
        self.directory
            .iter()
            .rev()
            .find_map(|(&high, container)| Some(util::join(high, container.max()?)))
    }

    /// Attempt to compress the bitmap by finding runs of consecutive values
    ///
    /// Every container is switched to whichever of its encodings serializes
    /// smallest. Returns true if the bitmap has at least one run container
    /// after optimization.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap: Bitmap = (100..1000).collect();
    /// assert_eq!(bitmap.cardinality(), 900);
    /// assert!(bitmap.run_optimize());
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        let before = self.get_serialized_size_in_bytes();
        let mut runs = 0;
        for container in self.directory.containers_mut() {
            runs += usize::from(container.run_optimize());
        }
        debug!(
            containers = self.directory.len(),
            runs,
            before,
            after = self.get_serialized_size_in_bytes(),
            "run optimized bitmap"
        );
        runs > 0
    }

    /// Convert every run container back to an array or bitmap container
    ///
    /// Returns true if any container was converted.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap: Bitmap = (100..1000).collect();
    /// assert!(bitmap.run_optimize());
    /// assert!(bitmap.remove_run_compression());
    /// assert_eq!(bitmap.statistics().n_run_containers, 0);
    /// ```
    pub fn remove_run_compression(&mut self) -> bool {
        let mut changed = false;
        for container in self.directory.containers_mut() {
            changed |= container.remove_run_compression();
        }
        changed
    }

    /// Returns the encoding of the container holding values with the given high key
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::{Bitmap, Encoding};
    /// let mut bitmap: Bitmap = (0..5000).collect();
    /// bitmap.add(1 << 16);
    /// assert_eq!(bitmap.container_encoding(0), Some(Encoding::Bitmap));
    /// assert_eq!(bitmap.container_encoding(1), Some(Encoding::Array));
    /// assert_eq!(bitmap.container_encoding(2), None);
    /// ```
    #[must_use]
    pub fn container_encoding(&self, key: u64) -> Option<Encoding> {
        self.directory.get(key).map(Container::encoding)
    }

    /// Returns a vector containing all of the integers stored in the bitmap
    /// in sorted order
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let bitmap = Bitmap::of(&[65536, 3, 1]);
    /// assert_eq!(bitmap.to_vec(), [1, 3, 65536]);
    /// ```
    #[must_use]
    #[doc(alias = "slice")]
    pub fn to_vec(&self) -> Vec<u64> {
        let mut values = Vec::with_capacity(self.cardinality() as usize);
        values.extend(self.iter());
        values
    }

    /// Returns statistics about the composition of the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap: Bitmap = (1..100).collect();
    /// bitmap.run_optimize();
    /// let statistics = bitmap.statistics();
    ///
    /// assert_eq!(statistics.n_containers, 1);
    /// assert_eq!(statistics.n_array_containers, 0);
    /// assert_eq!(statistics.n_run_containers, 1);
    /// assert_eq!(statistics.n_bitset_containers, 0);
    /// assert_eq!(statistics.n_values_run_containers, 99);
    /// assert_eq!(statistics.n_bytes_run_containers, 6);
    /// assert_eq!(statistics.max_value, Some(99));
    /// assert_eq!(statistics.min_value, Some(1));
    /// assert_eq!(statistics.cardinality, 99);
    /// ```
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics {
            min_value: self.minimum(),
            max_value: self.maximum(),
            ..Statistics::default()
        };
        for (_, container) in self.directory.iter() {
            let values = u64::from(container.cardinality());
            let bytes = container.payload_size() as u64;
            let (count, n_values, n_bytes) = match container.encoding() {
                Encoding::Array => (
                    &mut stats.n_array_containers,
                    &mut stats.n_values_array_containers,
                    &mut stats.n_bytes_array_containers,
                ),
                Encoding::Bitmap => (
                    &mut stats.n_bitset_containers,
                    &mut stats.n_values_bitset_containers,
                    &mut stats.n_bytes_bitset_containers,
                ),
                Encoding::Run => (
                    &mut stats.n_run_containers,
                    &mut stats.n_values_run_containers,
                    &mut stats.n_bytes_run_containers,
                ),
            };
            *count += 1;
            *n_values += values;
            *n_bytes += bytes;
            stats.n_containers += 1;
            stats.cardinality += values;
        }
        stats
    }

    /// Ensure the bitmap is internally valid
    ///
    /// This is useful for development, but is not needed for normal use:
    /// bitmaps should _always_ be internally valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the bitmap is not valid, with a description of the problem.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    ///
    /// let bitmap: Bitmap = (0..100).collect();
    /// bitmap.internal_validate().unwrap();
    /// ```
    #[doc(hidden)]
    pub fn internal_validate(&self) -> Result<(), &'static str> {
        self.directory.validate()
    }
}
