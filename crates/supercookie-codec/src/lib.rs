//! # supercookie-codec
//!
//! Turns an identifier into a 32x32 monochrome favicon whose pixels carry a
//! hash expansion of that identifier, and derives the cache validators and
//! probe keys that go with it. Everything here is pure: same input, same bytes.

pub mod bitmap;
pub mod digest;

pub use bitmap::{encode, Bitmap, Rgb, BITMAP_LEN, HEIGHT, PALETTE, WIDTH};
pub use digest::{etag, expand, probe_key, quoted_etag, EXPANDED_LEN};

/// Keyed per-bit favicon: the bitmap of `probe_key(identifier, bit_position)`.
pub fn probe_bitmap(identifier: &str, bit_position: u32) -> Bitmap {
    encode(&probe_key(identifier, bit_position))
}
