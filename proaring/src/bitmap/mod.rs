//! A compressed bitmap which can hold 64-bit integers

pub use self::iter::BitmapIterator;

use crate::directory::Directory;
use crate::serialization::ContainerView;

mod imp;
mod iter;
mod ops;
mod serialization;
mod view;

/// A Bitmap which can hold 64-bit integers
///
/// Values are split into a 48-bit high key and a 16-bit low part. Every high
/// key present owns one container holding the low parts.
#[derive(Clone, Default)]
pub struct Bitmap {
    directory: Directory,
}

/// A read-only bitmap backed by a serialized byte slice
///
/// Containers are validated when the view is created, but their payloads are
/// read in place and never copied.
pub struct BitmapView<'a> {
    keys: Vec<u64>,
    containers: Vec<ContainerView<'a>>,
}

/// Detailed statistics on the composition of a bitmap
///
/// See [`Bitmap::statistics`] for more information
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub n_containers: u64,
    pub n_array_containers: u64,
    pub n_run_containers: u64,
    pub n_bitset_containers: u64,
    pub n_values_array_containers: u64,
    pub n_values_run_containers: u64,
    pub n_values_bitset_containers: u64,
    /// Serialized payload bytes, excluding headers
    pub n_bytes_array_containers: u64,
    pub n_bytes_run_containers: u64,
    pub n_bytes_bitset_containers: u64,
    pub max_value: Option<u64>,
    pub min_value: Option<u64>,
    pub cardinality: u64,
}
