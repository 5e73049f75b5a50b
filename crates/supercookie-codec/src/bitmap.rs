use bytes::Bytes;

use crate::digest::{expand, EXPANDED_LEN};

pub const WIDTH: usize = 32;
pub const HEIGHT: usize = 32;

/// Rows are padded to a 4-byte boundary.
const ROW_STRIDE: usize = WIDTH.div_ceil(32) * 4;
const ROW_BYTES: usize = WIDTH / 8;
const PIXEL_DATA_LEN: usize = ROW_STRIDE * HEIGHT;

const FILE_HEADER_LEN: usize = 14;
/// BITMAPV4HEADER.
const INFO_HEADER_LEN: usize = 108;
const PALETTE_LEN: usize = 2 * 4;
const PIXEL_OFFSET: usize = FILE_HEADER_LEN + INFO_HEADER_LEN + PALETTE_LEN;

/// Encoded size of every favicon: 130 bytes of headers and palette plus 128 of pixels.
pub const BITMAP_LEN: usize = PIXEL_OFFSET + PIXEL_DATA_LEN;

const PIXELS_PER_METER: i32 = 2835;
const BI_RGB: u32 = 0;
const LCS_SRGB: u32 = 0x7352_4742;

const _: () = assert!(EXPANDED_LEN * 8 == WIDTH * HEIGHT);
const _: () = assert!(BITMAP_LEN == 258);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Palette entries are stored blue, green, red, reserved.
    fn to_bgra(self) -> [u8; 4] {
        [self.b, self.g, self.r, 0]
    }

    fn from_bgra(raw: &[u8]) -> Self {
        Self::new(raw[2], raw[1], raw[0])
    }

    /// Largest per-channel difference between two colors.
    pub fn max_channel_delta(self, other: Rgb) -> u8 {
        self.r
            .abs_diff(other.r)
            .max(self.g.abs_diff(other.g))
            .max(self.b.abs_diff(other.b))
    }
}

/// Two near-identical dark shades. Index 0 is a cleared bit, index 1 a set bit.
pub const PALETTE: [Rgb; 2] = [Rgb::new(26, 26, 46), Rgb::new(28, 27, 48)];

/// A 32x32, 1-bit, top-down bitmap image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bitmap([u8; BITMAP_LEN]);

impl Bitmap {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        BITMAP_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the pixel at column `x`, row `y` (from the top) uses palette color 1.
    ///
    /// # Panics
    /// If `x >= WIDTH` or `y >= HEIGHT`.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        assert!(x < WIDTH && y < HEIGHT, "pixel ({x}, {y}) out of bounds");
        let byte = self.0[PIXEL_OFFSET + y * ROW_STRIDE + x / 8];
        (byte >> (7 - x % 8)) & 1 == 1
    }

    /// The palette as written into the image.
    pub fn palette(&self) -> [Rgb; 2] {
        let table = &self.0[FILE_HEADER_LEN + INFO_HEADER_LEN..PIXEL_OFFSET];
        [Rgb::from_bgra(&table[..4]), Rgb::from_bgra(&table[4..])]
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.0)
    }
}

impl AsRef<[u8]> for Bitmap {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bitmap> for Bytes {
    fn from(bitmap: Bitmap) -> Self {
        bitmap.to_bytes()
    }
}

/// Sequential little-endian writer over the fixed output buffer.
struct Writer<'a> {
    buf: &'a mut [u8; BITMAP_LEN],
    pos: usize,
}

impl Writer<'_> {
    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn u16(&mut self, v: u16) {
        self.put(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.put(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.put(&v.to_le_bytes());
    }

    fn zeros(&mut self, n: usize) {
        self.pos += n;
    }
}

/// Encodes `input` as a favicon.
///
/// Bit `n` of the 1024-bit expansion (most significant bit first within each
/// byte) becomes pixel `n` in row-major order. Never fails; any string,
/// including the empty one, yields a 258-byte image.
pub fn encode(input: &str) -> Bitmap {
    let bits = expand(input);
    let mut buf = [0u8; BITMAP_LEN];
    let mut w = Writer { buf: &mut buf, pos: 0 };

    // File header
    w.put(b"BM");
    w.u32(BITMAP_LEN as u32);
    w.u16(0);
    w.u16(0);
    w.u32(PIXEL_OFFSET as u32);

    // BITMAPV4HEADER
    w.u32(INFO_HEADER_LEN as u32);
    w.i32(WIDTH as i32);
    w.i32(-(HEIGHT as i32));
    w.u16(1);
    w.u16(1);
    w.u32(BI_RGB);
    w.u32(PIXEL_DATA_LEN as u32);
    w.i32(PIXELS_PER_METER);
    w.i32(PIXELS_PER_METER);
    w.u32(PALETTE.len() as u32);
    w.u32(PALETTE.len() as u32);
    // Channel masks are unused with BI_RGB.
    w.zeros(4 * 4);
    w.u32(LCS_SRGB);
    // CIE endpoints and gamma are ignored for sRGB.
    w.zeros(36 + 3 * 4);

    for color in PALETTE {
        w.put(&color.to_bgra());
    }

    for row in bits.chunks_exact(ROW_BYTES) {
        w.put(row);
        w.zeros(ROW_STRIDE - ROW_BYTES);
    }

    debug_assert_eq!(w.pos, BITMAP_LEN);
    Bitmap(buf)
}
