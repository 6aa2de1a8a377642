use super::Bitmap;
use crate::container::{Container, ContainerRead, Iter};
use crate::util;
use std::iter::{FusedIterator, Zip};
use std::slice;

/// Ascending iterator over the values of a [`Bitmap`] or a
/// [`BitmapView`](crate::BitmapView)
///
/// Containers are walked in key order and each yields its values without
/// being materialized, so iterating a view never copies its payloads.
#[derive(Clone)]
pub struct BitmapIterator<'a, C: ContainerRead = Container> {
    containers: Zip<slice::Iter<'a, u64>, slice::Iter<'a, C>>,
    current: Option<(u64, Iter<'a>)>,
}

impl<'a, C: ContainerRead> BitmapIterator<'a, C> {
    pub(crate) fn new(keys: &'a [u64], containers: &'a [C]) -> Self {
        Self {
            containers: keys.iter().zip(containers.iter()),
            current: None,
        }
    }
}

impl<C: ContainerRead> Iterator for BitmapIterator<'_, C> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        loop {
            if let Some((high, values)) = &mut self.current {
                if let Some(low) = values.next() {
                    return Some(util::join(*high, low));
                }
            }
            let (&high, container) = self.containers.next()?;
            self.current = Some((high, container.iter()));
        }
    }
}

impl<C: ContainerRead> FusedIterator for BitmapIterator<'_, C> {}

impl Bitmap {
    /// Returns an iterator over each value stored in the bitmap.
    /// Returned values are ordered in ascending order.
    ///
    /// Every call starts a fresh iterator; dropping one part way through is fine.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add(4);
    /// bitmap.add(u64::MAX);
    /// bitmap.add(3);
    ///
    /// let mut iterator = bitmap.iter();
    ///
    /// assert_eq!(iterator.next(), Some(3));
    /// assert_eq!(iterator.next(), Some(4));
    /// assert_eq!(iterator.next(), Some(u64::MAX));
    /// assert_eq!(iterator.next(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn iter(&self) -> BitmapIterator<'_> {
        let (keys, containers) = self.directory.as_slices();
        BitmapIterator::new(keys, containers)
    }
}

impl<'a> IntoIterator for &'a Bitmap {
    type Item = u64;
    type IntoIter = BitmapIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<u64> for Bitmap {
    /// Convenience method for creating bitmap from iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    ///
    /// let bitmap: Bitmap = (1..3).collect();
    ///
    /// assert!(!bitmap.is_empty());
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert_eq!(bitmap.cardinality(), 2);
    /// ```
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut bitmap = Bitmap::new();
        bitmap.extend(iter);
        bitmap
    }
}

impl Extend<u64> for Bitmap {
    fn extend<T: IntoIterator<Item = u64>>(&mut self, iter: T) {
        iter.into_iter().for_each(|value| self.add(value));
    }
}
