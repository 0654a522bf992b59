//! Texture registry — decoded images and their draw-time metadata.
//!
//! Callers never pass image data into draw calls. They register a [`Bitmap`]
//! once and get back a [`TextureIndex`] — a lightweight index into the
//! [`TextureStore`]:
//!
//! - **Copyable**: `TextureIndex` is `Copy`, so it lives in tiles and sprites
//!   without lifetime headaches.
//! - **Indirection**: the store owns the pixel data and the optional GPU
//!   handle; the index is just a `usize`.
//!
//! Entries are created at registration and immutable afterwards. Lookups are
//! O(1); an out-of-range index is a caller bug and panics rather than being
//! defensively handled.

use crate::bitmap::Bitmap;
use crate::device::{BatchDevice, TextureHandle};
use crate::math::Vec2;
use crate::tile::TileInfo;

/// Handle to a registered texture in the [`TextureStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureIndex(pub(crate) usize);

/// How far tile UV rects are inset, in texture pixels, to keep filtering and
/// rotation from sampling the neighboring atlas tile.
const BLEED_SCALE: f32 = 0.3;

/// A registered texture: pixel data, dimensions, optional GPU handle, and the
/// UV-space bleed inset derived from the dimensions.
#[derive(Debug)]
pub struct TextureInfo {
    /// The decoded image, kept for the software backend's blits.
    pub bitmap: Bitmap,
    /// Pixel dimensions.
    pub size: Vec2,
    /// GPU handle, present when the texture was registered with an
    /// accelerated device. `None` means the GPU path cannot draw this texture
    /// (e.g. after a lost context) and the software backend must be used.
    pub gpu: Option<TextureHandle>,
    /// UV-space inset applied per edge when sampling tiles.
    pub bleed: Vec2,
}

/// Owns every registered texture. Populated during a load phase; read-only
/// while drawing.
#[derive(Debug, Default)]
pub struct TextureStore {
    entries: Vec<TextureInfo>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoded bitmap. When `device` is given, a GPU texture is
    /// created for it so the batched backend can draw it.
    ///
    /// Returns a stable index used thereafter to refer to the texture.
    pub fn register(&mut self, bitmap: Bitmap, device: Option<&mut dyn BatchDevice>) -> TextureIndex {
        let size = bitmap.size();
        let gpu = device.map(|d| d.create_texture(&bitmap));
        let index = TextureIndex(self.entries.len());
        log::debug!(
            "registered texture {} ({}x{}, gpu: {})",
            index.0,
            bitmap.width(),
            bitmap.height(),
            gpu.is_some(),
        );
        self.entries.push(TextureInfo {
            bitmap,
            size,
            gpu,
            bleed: Vec2::splat(BLEED_SCALE) / size,
        });
        index
    }

    /// Look up a registered texture. Panics on an out-of-range index.
    pub fn get(&self, index: TextureIndex) -> &TextureInfo {
        &self.entries[index.0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Describe a tile by its linear index into a grid of `size`-sized cells
    /// spanning the texture's width, counted left-to-right, top-to-bottom.
    ///
    /// Panics if `size` is non-positive or wider than the texture.
    pub fn tile_from_index(&self, texture: TextureIndex, index: u32, size: Vec2) -> TileInfo {
        assert!(
            size.x > 0.0 && size.y > 0.0,
            "tile size must be positive, got {size}"
        );
        let columns = (self.get(texture).size.x / size.x) as u32;
        assert!(columns > 0, "tile size {size} is wider than the texture");
        let pos = Vec2::new(
            (index % columns) as f32 * size.x,
            (index / columns) as f32 * size.y,
        );
        TileInfo::new(pos, size, texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(width: u32, height: u32) -> (TextureStore, TextureIndex) {
        let mut store = TextureStore::new();
        let index = store.register(Bitmap::solid(width, height, [255; 4]), None);
        (store, index)
    }

    #[test]
    fn bleed_scales_inversely_with_size() {
        let (store, index) = store_with(64, 32);
        let info = store.get(index);
        assert_eq!(info.bleed, Vec2::new(BLEED_SCALE / 64.0, BLEED_SCALE / 32.0));
        assert!(info.gpu.is_none());
    }

    #[test]
    fn indices_are_stable_and_sequential() {
        let mut store = TextureStore::new();
        let a = store.register(Bitmap::solid(1, 1, [255; 4]), None);
        let b = store.register(Bitmap::solid(2, 2, [255; 4]), None);
        assert_eq!(store.get(a).size, Vec2::splat(1.0));
        assert_eq!(store.get(b).size, Vec2::splat(2.0));
    }

    #[test]
    fn tile_index_decodes_row_and_column() {
        // 8 columns of 8x8 cells across a 64-wide texture: index 5 is
        // column 5, row 0.
        let (store, index) = store_with(64, 64);
        let tile = store.tile_from_index(index, 5, Vec2::splat(8.0));
        assert_eq!(tile.pos, Vec2::new(40.0, 0.0));

        // Index 9 wraps to column 1, row 1.
        let tile = store.tile_from_index(index, 9, Vec2::splat(8.0));
        assert_eq!(tile.pos, Vec2::new(8.0, 8.0));
    }

    #[test]
    #[should_panic]
    fn out_of_range_lookup_panics() {
        let (store, _) = store_with(4, 4);
        store.get(TextureIndex(7));
    }
}
