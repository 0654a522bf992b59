//! Bitmap font rendering over a fixed glyph grid.
//!
//! A [`BitmapFont`] holds a glyph atlas laid out as equal-sized cells,
//! left-to-right, top-to-bottom, covering ASCII 0x20–0x7E plus an
//! unknown-glyph cell. Characters map to cells by code offset; each glyph is
//! a direct image blit. No shaping, kerning, or variable widths — monospace
//! grid only.
//!
//! The default font is generated at construction from const 8×8 bit
//! patterns: set bits become white texels with full alpha, clear bits stay
//! transparent, so glyphs composite over anything already on the surface.

use crate::bitmap::Bitmap;
use crate::math::Vec2;
use crate::surface::PixelSurface;

/// First mapped character code (space).
const FIRST_CODE: u32 = 0x20;
/// Last mapped character code (DEL, doubling as the unknown-glyph cell).
const LAST_CODE: u32 = 0x7F;
/// Glyph index for characters outside the mapped range.
const UNKNOWN_GLYPH: u32 = LAST_CODE - FIRST_CODE;

/// Columns in the generated default atlas.
const DEFAULT_ATLAS_COLS: u32 = 16;

/// A fixed-grid glyph atlas and its cell metrics.
pub struct BitmapFont {
    atlas: Bitmap,
    /// Pixel size of one glyph cell.
    cell: Vec2,
    /// Extra pixels advanced between glyphs (and between rows).
    padding: Vec2,
}

impl BitmapFont {
    /// Use a caller-supplied atlas. The column count is derived from
    /// `atlas_width / cell_width`; the atlas must hold 96 cells.
    pub fn new(atlas: Bitmap, cell: Vec2, padding: Vec2) -> Self {
        assert!(
            cell.x > 0.0 && cell.y > 0.0,
            "glyph cell size must be positive, got {cell}"
        );
        Self { atlas, cell, padding }
    }

    /// Map a character to its glyph index. Codes outside [0x20, 0x7F] land
    /// on the unknown-glyph cell.
    pub fn glyph_index(ch: char) -> u32 {
        let code = ch as u32;
        if (FIRST_CODE..=LAST_CODE).contains(&code) {
            code - FIRST_CODE
        } else {
            UNKNOWN_GLYPH
        }
    }

    pub fn cell_size(&self) -> Vec2 {
        self.cell
    }

    fn cols(&self) -> u32 {
        self.atlas.width() / self.cell.x as u32
    }

    /// Source pixel position of a glyph's cell in the atlas.
    fn glyph_pos(&self, index: u32) -> Vec2 {
        let cols = self.cols();
        Vec2::new(
            (index % cols) as f32 * self.cell.x,
            (index / cols) as f32 * self.cell.y,
        )
    }

    /// Horizontal offset applied to a row of `len` characters: half the
    /// row's rendered width when centering, truncated to whole pixels.
    fn row_offset(&self, len: usize, scale: f32, center: bool) -> f32 {
        if center {
            -(len as f32 * self.cell.x * scale / 2.0).trunc()
        } else {
            0.0
        }
    }

    /// Draw `text` onto `surface` at a screen-space pixel position. Rows are
    /// split on `\n`; `scale` multiplies the glyph cells; `center` centers
    /// each row horizontally on `pos`.
    pub fn draw_text_screen(
        &self,
        surface: &mut PixelSurface,
        text: &str,
        pos: Vec2,
        scale: f32,
        center: bool,
    ) {
        let advance = (self.cell + self.padding) * scale;
        for (row, line) in text.split('\n').enumerate() {
            let offset = self.row_offset(line.chars().count(), scale, center);
            for (col, ch) in line.chars().enumerate() {
                let index = Self::glyph_index(ch);
                let dst = Vec2::new(
                    pos.x + offset + col as f32 * advance.x,
                    pos.y + row as f32 * advance.y,
                );
                surface.blit_rect(
                    dst,
                    self.cell * scale,
                    &self.atlas,
                    self.glyph_pos(index),
                    self.cell,
                );
            }
        }
    }
}

impl Default for BitmapFont {
    /// The built-in 8×8 font: 96 glyphs generated from [`GLYPHS_8X8`] into a
    /// 16-column atlas of white-with-alpha texels.
    fn default() -> Self {
        let cols = DEFAULT_ATLAS_COLS;
        let rows = (GLYPHS_8X8.len() as u32).div_ceil(cols);
        let mut atlas = Bitmap::solid(cols * 8, rows * 8, [0, 0, 0, 0]);
        for (index, glyph) in GLYPHS_8X8.iter().enumerate() {
            let cell_x = (index as u32 % cols * 8) as i32;
            let cell_y = (index as u32 / cols * 8) as i32;
            for (y, bits) in glyph.iter().enumerate() {
                for x in 0..8 {
                    if bits >> x & 1 != 0 {
                        atlas.put_pixel(cell_x + x, cell_y + y as i32, [255, 255, 255, 255]);
                    }
                }
            }
        }
        Self::new(atlas, Vec2::splat(8.0), Vec2::ZERO)
    }
}

/// 8×8 glyph bitmaps for ASCII 0x20–0x7F. One byte per row, top to bottom,
/// bit 0 = leftmost pixel. The final entry is the unknown-glyph box.
#[rustfmt::skip]
const GLYPHS_8X8: [[u8; 8]; 96] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x18, 0x3C, 0x3C, 0x18, 0x18, 0x00, 0x18, 0x00], // !
    [0x36, 0x36, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // "
    [0x36, 0x36, 0x7F, 0x36, 0x7F, 0x36, 0x36, 0x00], // #
    [0x0C, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x0C, 0x00], // $
    [0x00, 0x63, 0x33, 0x18, 0x0C, 0x66, 0x63, 0x00], // %
    [0x1C, 0x36, 0x1C, 0x6E, 0x3B, 0x33, 0x6E, 0x00], // &
    [0x06, 0x06, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00], // '
    [0x18, 0x0C, 0x06, 0x06, 0x06, 0x0C, 0x18, 0x00], // (
    [0x06, 0x0C, 0x18, 0x18, 0x18, 0x0C, 0x06, 0x00], // )
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // *
    [0x00, 0x0C, 0x0C, 0x3F, 0x0C, 0x0C, 0x00, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ,
    [0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00], // .
    [0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01, 0x00], // /
    [0x3E, 0x63, 0x73, 0x7B, 0x6F, 0x67, 0x3E, 0x00], // 0
    [0x0C, 0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x3F, 0x00], // 1
    [0x1E, 0x33, 0x30, 0x1C, 0x06, 0x33, 0x3F, 0x00], // 2
    [0x1E, 0x33, 0x30, 0x1C, 0x30, 0x33, 0x1E, 0x00], // 3
    [0x38, 0x3C, 0x36, 0x33, 0x7F, 0x30, 0x78, 0x00], // 4
    [0x3F, 0x03, 0x1F, 0x30, 0x30, 0x33, 0x1E, 0x00], // 5
    [0x1C, 0x06, 0x03, 0x1F, 0x33, 0x33, 0x1E, 0x00], // 6
    [0x3F, 0x33, 0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x00], // 7
    [0x1E, 0x33, 0x33, 0x1E, 0x33, 0x33, 0x1E, 0x00], // 8
    [0x1E, 0x33, 0x33, 0x3E, 0x30, 0x18, 0x0E, 0x00], // 9
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x00], // :
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ;
    [0x18, 0x0C, 0x06, 0x03, 0x06, 0x0C, 0x18, 0x00], // <
    [0x00, 0x00, 0x3F, 0x00, 0x00, 0x3F, 0x00, 0x00], // =
    [0x06, 0x0C, 0x18, 0x30, 0x18, 0x0C, 0x06, 0x00], // >
    [0x1E, 0x33, 0x30, 0x18, 0x0C, 0x00, 0x0C, 0x00], // ?
    [0x3E, 0x63, 0x7B, 0x7B, 0x7B, 0x03, 0x1E, 0x00], // @
    [0x0C, 0x1E, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x00], // A
    [0x3F, 0x66, 0x66, 0x3E, 0x66, 0x66, 0x3F, 0x00], // B
    [0x3C, 0x66, 0x03, 0x03, 0x03, 0x66, 0x3C, 0x00], // C
    [0x1F, 0x36, 0x66, 0x66, 0x66, 0x36, 0x1F, 0x00], // D
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x46, 0x7F, 0x00], // E
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x06, 0x0F, 0x00], // F
    [0x3C, 0x66, 0x03, 0x03, 0x73, 0x66, 0x7C, 0x00], // G
    [0x33, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x33, 0x00], // H
    [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // I
    [0x78, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E, 0x00], // J
    [0x67, 0x66, 0x36, 0x1E, 0x36, 0x66, 0x67, 0x00], // K
    [0x0F, 0x06, 0x06, 0x06, 0x46, 0x66, 0x7F, 0x00], // L
    [0x63, 0x77, 0x7F, 0x7F, 0x6B, 0x63, 0x63, 0x00], // M
    [0x63, 0x67, 0x6F, 0x7B, 0x73, 0x63, 0x63, 0x00], // N
    [0x1C, 0x36, 0x63, 0x63, 0x63, 0x36, 0x1C, 0x00], // O
    [0x3F, 0x66, 0x66, 0x3E, 0x06, 0x06, 0x0F, 0x00], // P
    [0x1E, 0x33, 0x33, 0x33, 0x3B, 0x1E, 0x38, 0x00], // Q
    [0x3F, 0x66, 0x66, 0x3E, 0x36, 0x66, 0x67, 0x00], // R
    [0x1E, 0x33, 0x07, 0x0E, 0x38, 0x33, 0x1E, 0x00], // S
    [0x3F, 0x2D, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // T
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x33, 0x3F, 0x00], // U
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // V
    [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // W
    [0x63, 0x63, 0x36, 0x1C, 0x1C, 0x36, 0x63, 0x00], // X
    [0x33, 0x33, 0x33, 0x1E, 0x0C, 0x0C, 0x1E, 0x00], // Y
    [0x7F, 0x63, 0x31, 0x18, 0x4C, 0x66, 0x7F, 0x00], // Z
    [0x1E, 0x06, 0x06, 0x06, 0x06, 0x06, 0x1E, 0x00], // [
    [0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x40, 0x00], // backslash
    [0x1E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1E, 0x00], // ]
    [0x08, 0x1C, 0x36, 0x63, 0x00, 0x00, 0x00, 0x00], // ^
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // _
    [0x0C, 0x0C, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00], // `
    [0x00, 0x00, 0x1E, 0x30, 0x3E, 0x33, 0x6E, 0x00], // a
    [0x07, 0x06, 0x06, 0x3E, 0x66, 0x66, 0x3B, 0x00], // b
    [0x00, 0x00, 0x1E, 0x33, 0x03, 0x33, 0x1E, 0x00], // c
    [0x38, 0x30, 0x30, 0x3E, 0x33, 0x33, 0x6E, 0x00], // d
    [0x00, 0x00, 0x1E, 0x33, 0x3F, 0x03, 0x1E, 0x00], // e
    [0x1C, 0x36, 0x06, 0x0F, 0x06, 0x06, 0x0F, 0x00], // f
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x1F], // g
    [0x07, 0x06, 0x36, 0x6E, 0x66, 0x66, 0x67, 0x00], // h
    [0x0C, 0x00, 0x0E, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // i
    [0x30, 0x00, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E], // j
    [0x07, 0x06, 0x66, 0x36, 0x1E, 0x36, 0x67, 0x00], // k
    [0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // l
    [0x00, 0x00, 0x33, 0x7F, 0x7F, 0x6B, 0x63, 0x00], // m
    [0x00, 0x00, 0x1F, 0x33, 0x33, 0x33, 0x33, 0x00], // n
    [0x00, 0x00, 0x1E, 0x33, 0x33, 0x33, 0x1E, 0x00], // o
    [0x00, 0x00, 0x3B, 0x66, 0x66, 0x3E, 0x06, 0x0F], // p
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x78], // q
    [0x00, 0x00, 0x3B, 0x6E, 0x66, 0x06, 0x0F, 0x00], // r
    [0x00, 0x00, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x00], // s
    [0x08, 0x0C, 0x3E, 0x0C, 0x0C, 0x2C, 0x18, 0x00], // t
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x33, 0x6E, 0x00], // u
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // v
    [0x00, 0x00, 0x63, 0x6B, 0x7F, 0x7F, 0x36, 0x00], // w
    [0x00, 0x00, 0x63, 0x36, 0x1C, 0x36, 0x63, 0x00], // x
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x3E, 0x30, 0x1F], // y
    [0x00, 0x00, 0x3F, 0x19, 0x0C, 0x26, 0x3F, 0x00], // z
    [0x38, 0x0C, 0x0C, 0x07, 0x0C, 0x0C, 0x38, 0x00], // {
    [0x18, 0x18, 0x18, 0x00, 0x18, 0x18, 0x18, 0x00], // |
    [0x07, 0x0C, 0x0C, 0x38, 0x0C, 0x0C, 0x07, 0x00], // }
    [0x6E, 0x3B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ~
    [0x7F, 0x41, 0x41, 0x41, 0x41, 0x41, 0x7F, 0x00], // unknown glyph
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_codes_map_by_offset() {
        assert_eq!(BitmapFont::glyph_index('A'), 33);
        assert_eq!(BitmapFont::glyph_index(' '), 0);
        assert_eq!(BitmapFont::glyph_index('~'), 94);
    }

    #[test]
    fn out_of_range_codes_use_unknown_glyph() {
        assert_eq!(BitmapFont::glyph_index('\u{01}'), 95);
        assert_eq!(BitmapFont::glyph_index('é'), 95);
        assert_eq!(BitmapFont::glyph_index('\u{7F}'), 95);
    }

    #[test]
    fn glyph_cells_are_grid_ordered() {
        let font = BitmapFont::default();
        // 16 columns: index 33 ('A') is column 1, row 2.
        assert_eq!(font.glyph_pos(33), Vec2::new(8.0, 16.0));
        assert_eq!(font.glyph_pos(0), Vec2::ZERO);
        assert_eq!(font.glyph_pos(95), Vec2::new(120.0, 40.0));
    }

    #[test]
    fn centered_row_offset_is_half_width_truncated() {
        let font = BitmapFont::default();
        // 5 chars at 8px cells, scale 3: 120px wide, offset -60.
        assert_eq!(font.row_offset(5, 3.0, true), -60.0);
        assert_eq!(font.row_offset(7, 1.0, true), -28.0);
        // Fractional half-widths truncate toward zero: 3 chars at scale
        // 0.6 = 14.4px wide, half is 7.2, offset -7.
        assert_eq!(font.row_offset(3, 0.6, true), -7.0);
        assert_eq!(font.row_offset(5, 1.0, false), 0.0);
    }

    #[test]
    fn default_atlas_has_ink_for_visible_glyphs() {
        let font = BitmapFont::default();
        assert_eq!(font.atlas.width(), 128);
        assert_eq!(font.atlas.height(), 48);
        // 'A' cell has set pixels; the space cell has none.
        let a_pos = font.glyph_pos(BitmapFont::glyph_index('A'));
        let mut ink = 0;
        for y in 0..8 {
            for x in 0..8 {
                if font.atlas.pixel(a_pos.x as i32 + x, a_pos.y as i32 + y)[3] > 0 {
                    ink += 1;
                }
            }
        }
        assert!(ink > 0);
        let space = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| font.atlas.pixel(x, y)[3] > 0)
            .count();
        assert_eq!(space, 0);
    }

    #[test]
    fn draw_text_blits_glyph_pixels() {
        let font = BitmapFont::default();
        let mut surface = PixelSurface::new(32, 16);
        font.draw_text_screen(&mut surface, "A", Vec2::ZERO, 1.0, false);
        let ink = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| surface.pixel(x, y)[3] > 0)
            .count();
        assert!(ink > 0, "drawing 'A' must leave pixels");
    }
}
