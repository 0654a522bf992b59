//! Decoded RGBA8 images on the CPU.
//!
//! A [`Bitmap`] is what the rest of the crate means by "a decoded image":
//! pixel dimensions plus a flat RGBA8 buffer. Decoding is the caller's job;
//! [`Bitmap::load`] is a thin convenience shim over the `image` crate for
//! callers that don't have their own asset pipeline.

use crate::math::Vec2;

/// A decoded RGBA8 image. Row-major, 4 bytes per pixel, no padding.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Wrap an existing RGBA8 buffer. Panics if the buffer length doesn't
    /// match `width * height * 4` — a malformed bitmap is a caller bug.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "bitmap buffer is {} bytes, expected {}x{}x4",
            pixels.len(),
            width,
            height,
        );
        Self { width, height, pixels }
    }

    /// A solid-color bitmap (used for tests and placeholder fills).
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        Self { width, height, pixels }
    }

    /// Load and decode an image from disk (PNG/JPEG).
    pub fn load(path: &str) -> Self {
        let img = image::open(path)
            .unwrap_or_else(|e| panic!("Failed to load image '{}': {}", path, e))
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel dimensions as a vector.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Raw RGBA8 buffer.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    /// Read one pixel, clamping coordinates to the image bounds.
    pub fn pixel(&self, x: i32, y: i32) -> [u8; 4] {
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        let i = ((y * self.width + x) * 4) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    /// Write one pixel. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_roundtrip() {
        let mut bmp = Bitmap::solid(4, 4, [0, 0, 0, 255]);
        bmp.put_pixel(2, 1, [10, 20, 30, 40]);
        assert_eq!(bmp.pixel(2, 1), [10, 20, 30, 40]);
        assert_eq!(bmp.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn pixel_clamps_at_edges() {
        let mut bmp = Bitmap::solid(2, 2, [1, 1, 1, 1]);
        bmp.put_pixel(1, 1, [9, 9, 9, 9]);
        assert_eq!(bmp.pixel(10, 10), [9, 9, 9, 9]);
        assert_eq!(bmp.pixel(-5, -5), bmp.pixel(0, 0));
    }

    #[test]
    #[should_panic]
    fn mismatched_buffer_panics() {
        Bitmap::from_rgba8(2, 2, vec![0u8; 3]);
    }
}
