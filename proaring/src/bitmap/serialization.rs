use super::Bitmap;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::serialization::{self as format, ContainerIterator};
use std::io::Write;
use tracing::debug;

impl Bitmap {
    /// Computes the serialized size in bytes of the Bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let bitmap = Bitmap::of(&[1, 2, 4, 65536]);
    /// // header, two container headers and offsets, 3 + 1 array values
    /// assert_eq!(bitmap.get_serialized_size_in_bytes(), 8 + 2 * 16 + 4 * 2);
    /// ```
    #[must_use]
    pub fn get_serialized_size_in_bytes(&self) -> usize {
        format::serialized_size(&self.directory)
    }

    /// Serializes the bitmap into a new vector
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooLarge`] if the bitmap does not fit the 32-bit
    /// offsets of the format.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let original: Bitmap = (1..5).chain(1 << 33..(1 << 33) + 3).collect();
    /// let data = original.serialize().unwrap();
    /// assert_eq!(data.len(), original.get_serialized_size_in_bytes());
    /// assert_eq!(Bitmap::try_deserialize(&data).unwrap(), original);
    /// ```
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut dst = Vec::with_capacity(self.get_serialized_size_in_bytes());
        self.write_to(&mut dst)?;
        Ok(dst)
    }

    /// Writes the serialized bitmap to `dst`, returning the number of bytes written
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if writing fails, or [`Error::TooLarge`] if the
    /// bitmap does not fit the 32-bit offsets of the format. Bytes already
    /// written are not rolled back.
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let bitmap = Bitmap::of(&[7, 1 << 50]);
    /// let mut dst = Vec::new();
    /// let written = bitmap.write_to(&mut dst).unwrap();
    /// assert_eq!(written as usize, dst.len());
    /// ```
    #[doc(alias = "write")]
    pub fn write_to<W: Write>(&self, dst: W) -> Result<u64> {
        format::serialize_into(&self.directory, dst)
    }

    /// Given a serialized bitmap as slice of bytes returns a bitmap instance.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in `buffer`; see [`Error`].
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::{Bitmap, Error};
    /// let data = Bitmap::of(&[1, 2, 3]).serialize().unwrap();
    /// let bitmap = Bitmap::try_deserialize(&data).unwrap();
    /// assert_eq!(bitmap.to_vec(), [1, 2, 3]);
    ///
    /// assert!(matches!(
    ///     Bitmap::try_deserialize(&data[..4]),
    ///     Err(Error::Truncated { .. })
    /// ));
    /// ```
    pub fn try_deserialize(buffer: &[u8]) -> Result<Self> {
        decode(buffer).map(Self::from_directory)
    }

    /// Replace the content of this bitmap with the serialized bitmap in `buffer`
    ///
    /// The bitmap is left untouched if `buffer` is rejected.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in `buffer`; see [`Error`].
    ///
    /// # Examples
    ///
    /// ```
    /// use proaring::Bitmap;
    /// let data = Bitmap::of(&[10, 20]).serialize().unwrap();
    ///
    /// let mut bitmap = Bitmap::of(&[1]);
    /// assert!(bitmap.unmarshal_binary(&data[..data.len() - 1]).is_err());
    /// assert_eq!(bitmap.to_vec(), [1]);
    ///
    /// bitmap.unmarshal_binary(&data).unwrap();
    /// assert_eq!(bitmap.to_vec(), [10, 20]);
    /// ```
    #[doc(alias = "read")]
    pub fn unmarshal_binary(&mut self, buffer: &[u8]) -> Result<()> {
        self.directory = decode(buffer)?;
        Ok(())
    }
}

fn decode(buffer: &[u8]) -> Result<Directory> {
    debug!(bytes = buffer.len(), "decoding bitmap");
    let result = ContainerIterator::new(buffer).and_then(|containers| {
        let mut directory = Directory::with_capacity(containers.len());
        for entry in containers {
            let (key, view) = entry?;
            let previous = directory.last().map(|(key, _)| key);
            directory
                .push(key, view.to_container())
                .map_err(|_| Error::UnsortedKeys {
                    previous: previous.unwrap_or_default(),
                    key,
                })?;
        }
        Ok(directory)
    });
    if let Err(err) = &result {
        debug!(error = %err, "rejected serialized bitmap");
    }
    result
}
