//! A compressed bitmap of 64-bit integers with a compact, zero-copy
//! serialization format.
//!
//! Each value is split into a 48-bit high key and a 16-bit low part. Values
//! sharing a high key live in one container, which stores its low parts as a
//! sorted array, a dense bitmap, or a list of runs, whichever suits the data.
//!
//! # Examples
//!
//! ```
//! use proaring::{Bitmap, BitmapView, Encoding};
//!
//! let mut bitmap = Bitmap::of(&[1, 2, 4, 8, 16, 128, 256, 1024, 65535, 65536]);
//! assert_eq!(bitmap.cardinality(), 10);
//! assert_eq!(bitmap.directory().len(), 2);
//! assert_eq!(bitmap.container_encoding(0), Some(Encoding::Array));
//!
//! bitmap.extend(1 << 40..(1 << 40) + 10_000);
//! bitmap.run_optimize();
//! assert_eq!(bitmap.container_encoding(1 << 24), Some(Encoding::Run));
//!
//! let data = bitmap.serialize().unwrap();
//! let view = BitmapView::deserialize(&data).unwrap();
//! assert!(view.contains(65536));
//! assert_eq!(view, bitmap);
//! ```

pub mod bitmap;
pub mod container;
pub mod directory;
mod error;
pub mod serialization;
mod util;

pub use bitmap::{Bitmap, BitmapIterator, BitmapView, Statistics};
pub use container::{
    Container, ContainerRead, Encoding, ARRAY_MAX_SIZE, BITMAP_MIN_SIZE, RUN_MAX_SIZE,
};
pub use directory::Directory;
pub use error::{Error, Result};
pub use serialization::{ContainerIterator, ContainerView, MAGIC_NUMBER, STORAGE_VERSION};

mod sealed {
    pub trait Sealed {}
}
