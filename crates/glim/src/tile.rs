//! Tile descriptors — sub-rectangles of a registered texture.
//!
//! A [`TileInfo`] names a pixel rectangle inside a texture by value. It holds
//! no reference back to the texture data; the texture is resolved by index at
//! draw time, so tiles are freely copied into sprites, animations, and
//! serialized scene data.

use crate::math::Vec2;
use crate::texture::TextureIndex;

/// A sub-rectangle of a registered texture, in source pixel coordinates.
///
/// Draws that carry no `TileInfo` render as untextured solid color instead.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileInfo {
    /// Pixel offset of the rectangle's top-left corner in the source texture.
    pub pos: Vec2,
    /// Pixel extent of the rectangle.
    pub size: Vec2,
    /// Which registered texture this tile samples from.
    pub texture: TextureIndex,
}

impl TileInfo {
    /// Describe a tile from an explicit pixel position and size.
    ///
    /// Panics if either size component is non-positive — a degenerate tile is
    /// a caller bug, caught here rather than as silent bad geometry.
    pub fn new(pos: Vec2, size: Vec2, texture: TextureIndex) -> Self {
        assert!(
            size.x > 0.0 && size.y > 0.0,
            "tile size must be positive, got {size}"
        );
        Self { pos, size, texture }
    }

    /// A translated copy: same size and texture, `pos` shifted by `delta`.
    /// Used to step animation frames without recomputing the grid layout.
    pub fn offset(self, delta: Vec2) -> Self {
        Self {
            pos: self.pos + delta,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_translates_pos_only() {
        let tile = TileInfo::new(Vec2::new(8.0, 16.0), Vec2::splat(8.0), TextureIndex(2));
        let moved = tile.offset(Vec2::new(8.0, 0.0));
        assert_eq!(moved.pos, Vec2::new(16.0, 16.0));
        assert_eq!(moved.size, tile.size);
        assert_eq!(moved.texture, tile.texture);
    }

    #[test]
    #[should_panic]
    fn zero_size_is_rejected() {
        TileInfo::new(Vec2::ZERO, Vec2::new(0.0, 8.0), TextureIndex(0));
    }

    #[test]
    #[should_panic]
    fn negative_size_is_rejected() {
        TileInfo::new(Vec2::ZERO, Vec2::splat(-8.0), TextureIndex(0));
    }
}
