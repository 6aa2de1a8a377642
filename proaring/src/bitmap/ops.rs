use super::{Bitmap, BitmapView};
use crate::directory::Directory;
use std::fmt;

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_values(f, "Bitmap", self.cardinality(), self.iter())
    }
}

impl fmt::Debug for BitmapView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_values(f, "BitmapView", self.cardinality(), self.iter())
    }
}

fn fmt_values(
    f: &mut fmt::Formatter,
    name: &str,
    cardinality: u64,
    mut values: impl Iterator<Item = u64>,
) -> fmt::Result {
    if cardinality < 32 {
        write!(f, "{name}<[")?;
        if let Some(first) = values.next() {
            write!(f, "{first}")?;
        }
        for value in values {
            write!(f, ", {value}")?;
        }
        write!(f, "]>")
    } else {
        let minimum = values.next().unwrap_or_default();
        let maximum = values.last().unwrap_or(minimum);
        write!(
            f,
            "{name}<{cardinality:?} values between {minimum:?} and {maximum:?}>"
        )
    }
}

impl From<&'_ [u64]> for Bitmap {
    #[inline]
    fn from(slice: &[u64]) -> Self {
        Self::of(slice)
    }
}

impl<const N: usize> From<[u64; N]> for Bitmap {
    #[inline]
    fn from(slice: [u64; N]) -> Self {
        Self::of(&slice)
    }
}

/// Takes over a hand-built directory, dropping any container left empty.
///
/// # Examples
///
/// ```
/// use proaring::{Bitmap, Directory};
/// let mut directory = Directory::new();
/// directory.get_or_create(1).add(7);
/// directory.get_or_create(2);
///
/// let bitmap = Bitmap::from(directory);
/// assert_eq!(bitmap.directory().len(), 1);
/// assert_eq!(bitmap.to_vec(), [(1 << 16) + 7]);
/// ```
impl From<Directory> for Bitmap {
    fn from(mut directory: Directory) -> Self {
        directory.prune();
        Self::from_directory(directory)
    }
}

impl From<BitmapView<'_>> for Bitmap {
    #[inline]
    fn from(view: BitmapView<'_>) -> Self {
        view.to_bitmap()
    }
}

/// Set equality: two bitmaps are equal when they hold the same values,
/// whatever encoding their containers use.
impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.cardinality() == other.cardinality() && self.iter().eq(other.iter())
    }
}

impl Eq for Bitmap {}

impl PartialEq<BitmapView<'_>> for Bitmap {
    fn eq(&self, other: &BitmapView<'_>) -> bool {
        self.cardinality() == other.cardinality() && self.iter().eq(other.iter())
    }
}

impl PartialEq<Bitmap> for BitmapView<'_> {
    fn eq(&self, other: &Bitmap) -> bool {
        other == self
    }
}
