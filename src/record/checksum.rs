//! 8-bit sum-complement checksum.
//!
//! The checksum byte is the last byte of a record image and holds the
//! one's complement of the sum of every byte before it.  A sealed image
//! therefore sums to `0xFF`, i.e. `sum(all) + 1 == 0 (mod 256)`.
//!
//! This is the on-flash format of every record ever written by the
//! feeder, so it must stay bit-exact.  It catches any single-byte
//! corruption; it is not a hash.

/// Wrapping byte sum.
fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Checksum for `body` (the image without its trailing checksum byte).
pub fn compute(body: &[u8]) -> u8 {
    !sum(body)
}

/// Recompute and store the trailing checksum byte of `image`.
///
/// Empty images are left untouched.
pub fn seal(image: &mut [u8]) {
    if let Some((last, body)) = image.split_last_mut() {
        *last = compute(body);
    }
}

/// Check a sealed image (checksum byte included).
///
/// An empty image is never valid.
pub fn verify(image: &[u8]) -> bool {
    !image.is_empty() && sum(image).wrapping_add(1) == 0
}
