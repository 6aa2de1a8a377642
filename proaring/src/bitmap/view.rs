use super::{Bitmap, BitmapIterator, BitmapView};
use crate::directory::Directory;
use crate::error::Result;
use crate::serialization::{ContainerIterator, ContainerView};
use crate::util;

impl<'a> BitmapView<'a> {
    /// Create a bitmap view of a slice of data without copying
    ///
    /// Every container header and payload is checked up front, so the
    /// read-only methods of the view never fail afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in `data`; see [`Error`](crate::Error).
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::{Bitmap, BitmapView};
    /// let orig_bitmap = Bitmap::of(&[1, 2, 3, 4, 1 << 48]);
    /// let data = orig_bitmap.serialize().unwrap();
    /// let view = BitmapView::deserialize(&data).unwrap();
    /// assert!(view.contains(1 << 48));
    /// assert_eq!(view.cardinality(), 5);
    /// assert_eq!(orig_bitmap, view);
    /// ```
    pub fn deserialize(data: &'a [u8]) -> Result<Self> {
        let containers = ContainerIterator::new(data)?;
        let mut keys = Vec::with_capacity(containers.len());
        let mut views = Vec::with_capacity(containers.len());
        for entry in containers {
            let (key, view) = entry?;
            keys.push(key);
            views.push(view);
        }
        Ok(Self {
            keys,
            containers: views,
        })
    }

    /// Create an owned, mutable bitmap from this view
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::{Bitmap, BitmapView};
    ///
    /// let orig_bitmap = Bitmap::of(&[1, 2, 3, 4]);
    /// let data = orig_bitmap.serialize().unwrap();
    /// let view = BitmapView::deserialize(&data).unwrap();
    /// let mut mutable_bitmap: Bitmap = view.to_bitmap();
    /// assert_eq!(view, mutable_bitmap);
    /// mutable_bitmap.add(10);
    /// assert!(!view.contains(10));
    /// assert!(mutable_bitmap.contains(10));
    /// ```
    #[must_use]
    pub fn to_bitmap(&self) -> Bitmap {
        let mut directory = Directory::with_capacity(self.keys.len());
        for (&key, view) in self.keys.iter().zip(&self.containers) {
            directory.put(key, view.to_container());
        }
        Bitmap::from_directory(directory)
    }

    #[must_use]
    pub fn contains(&self, value: u64) -> bool {
        let (high, low) = util::split(value);
        self.get(high).is_some_and(|view| view.contains(low))
    }

    #[must_use]
    #[doc(alias = "count")]
    pub fn cardinality(&self) -> u64 {
        self.containers
            .iter()
            .map(|view| u64::from(view.cardinality()))
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// The container view stored under the high key `key`
    #[must_use]
    pub fn get(&self, key: u64) -> Option<&ContainerView<'a>> {
        let index = self.keys.binary_search(&key).ok()?;
        Some(&self.containers[index])
    }

    /// Ascending iterator over the values, read straight from the buffer
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::{Bitmap, BitmapView};
    /// let data = Bitmap::of(&[u64::MAX, 0, 70_000]).serialize().unwrap();
    /// let view = BitmapView::deserialize(&data).unwrap();
    /// assert_eq!(view.iter().collect::<Vec<_>>(), [0, 70_000, u64::MAX]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> BitmapIterator<'_, ContainerView<'a>> {
        BitmapIterator::new(&self.keys, &self.containers)
    }
}

impl<'a, 'b> PartialEq<BitmapView<'a>> for BitmapView<'b> {
    fn eq(&self, other: &BitmapView<'a>) -> bool {
        self.cardinality() == other.cardinality() && self.iter().eq(other.iter())
    }
}

impl Eq for BitmapView<'_> {}
