/// Split a value into its container key and its position inside the container
#[inline]
pub fn split(value: u64) -> (u64, u16) {
    (value >> 16, value as u16)
}

#[inline]
pub fn join(high: u64, low: u16) -> u64 {
    (high << 16) | u64::from(low)
}

/// Index of the first element in `0..len` for which `pred` is false.
///
/// `pred` must be true for a (possibly empty) prefix and false afterwards.
/// This is [`slice::partition_point`] for data which is not a typed slice,
/// such as little-endian values still sitting in a byte buffer.
pub fn partition_point(len: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}
