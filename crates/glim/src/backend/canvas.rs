//! Immediate canvas backend — the software fallback path.
//!
//! Reproduces the batched backend's visual contract (position, size,
//! rotation, mirror) by painting straight onto a [`PixelSurface`], one call
//! at a time. Used when acceleration is unavailable, or per draw call when
//! the caller opts out of the batch.
//!
//! Capability asymmetry, by contract: textured draws honor only the tint's
//! *alpha* (full RGB tint would cost a per-pixel multiply on every blit), and
//! there is no additive color channel here at all. The additive *blend mode*
//! is supported through the surface's composite switch. Solid fills carry
//! their full RGBA color.

use crate::math::{Color, Vec2};
use crate::surface::PixelSurface;

use super::{DrawBackend, FrameContext, QuadDraw};

/// Establish a local transform on `surface` — translate to `pos` snapped to
/// the pixel grid plus a half-pixel center, rotate, scale by the signed size
/// — and hand the transformed surface to `paint`, which draws a unit-sized
/// (−0.5..0.5) shape. The transform is restored when `paint` returns, on
/// every exit path.
///
/// `pos` and `size` are screen-space pixels.
pub fn draw_canvas2d<F>(surface: &mut PixelSurface, pos: Vec2, size: Vec2, angle: f32, mirror: bool, paint: F)
where
    F: FnOnce(&mut PixelSurface),
{
    let mut scope = surface.scoped();
    scope.translate((pos + 0.5).floor());
    scope.rotate(angle);
    scope.scale(Vec2::new(if mirror { -size.x } else { size.x }, size.y));
    paint(&mut scope);
}

/// The two software surfaces and the immediate draw path over them.
pub struct CanvasBackend {
    /// World/batched-equivalent content.
    pub main: PixelSurface,
    /// UI and text, composited above `main` by the presenter.
    pub overlay: PixelSurface,
}

impl CanvasBackend {
    /// Two transparent surfaces of identical dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            main: PixelSurface::new(width, height),
            overlay: PixelSurface::new(width, height),
        }
    }

    /// Resize both surfaces, discarding their contents. Driven by the host
    /// when the output viewport changes.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.main = PixelSurface::new(width, height);
        self.overlay = PixelSurface::new(width, height);
    }

    fn to_screen(frame: &FrameContext<'_>, pos: Vec2, size: Vec2, screen_space: bool) -> (Vec2, Vec2) {
        if screen_space {
            (pos, size)
        } else {
            (
                frame.camera.world_to_screen(pos, frame.canvas_size),
                size * frame.camera.scale,
            )
        }
    }
}

impl DrawBackend for CanvasBackend {
    fn draw_quad(&mut self, frame: &FrameContext<'_>, quad: &QuadDraw) {
        let (pos, size) = Self::to_screen(frame, quad.pos, quad.size, quad.screen_space);
        match quad.tile {
            Some(tile) => {
                let info = frame.textures.get(tile.texture);
                // Alpha-only tint on the texture path.
                let alpha = quad.color.a;
                draw_canvas2d(&mut self.main, pos, size, quad.angle, quad.mirror, |s| {
                    s.blit(&info.bitmap, tile.pos, tile.size, alpha);
                });
            }
            None => {
                let color = quad.color;
                draw_canvas2d(&mut self.main, pos, size, quad.angle, quad.mirror, |s| {
                    s.fill_unit_rect(color);
                });
            }
        }
    }

    fn draw_polygon(
        &mut self,
        frame: &FrameContext<'_>,
        points: &[Vec2],
        color: Color,
        screen_space: bool,
    ) {
        let screen: Vec<Vec2> = if screen_space {
            points.to_vec()
        } else {
            points
                .iter()
                .map(|&p| frame.camera.world_to_screen(p, frame.canvas_size))
                .collect()
        };
        self.main.fill_polygon(&screen, color);
    }

    fn set_blend_mode(&mut self, additive: bool) {
        self.main.set_additive(additive);
    }

    fn flush(&mut self) {
        // Immediate mode: every draw already hit the pixels.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::camera::Camera;
    use crate::texture::TextureStore;
    use crate::tile::TileInfo;

    fn frame<'a>(store: &'a TextureStore, camera: &'a Camera) -> FrameContext<'a> {
        FrameContext {
            camera,
            canvas_size: Vec2::new(8.0, 8.0),
            textures: store,
        }
    }

    #[test]
    fn solid_rect_keeps_full_color() {
        let store = TextureStore::new();
        let camera = Camera::default();
        let mut backend = CanvasBackend::new(8, 8);
        backend.draw_quad(
            &frame(&store, &camera),
            &QuadDraw {
                pos: Vec2::new(4.0, 4.0),
                size: Vec2::splat(4.0),
                angle: 0.0,
                mirror: false,
                tile: None,
                color: Color::rgb(0.0, 1.0, 0.0),
                additive: Color::CLEAR,
                screen_space: true,
            },
        );
        assert_eq!(backend.main.pixel(4, 4), [0, 255, 0, 255]);
        assert_eq!(backend.main.pixel(0, 0)[3], 0);
    }

    #[test]
    fn textured_draw_tints_alpha_only() {
        let mut backend = CanvasBackend::new(4, 4);
        let mut store = TextureStore::new();
        let texture = store.register(Bitmap::solid(4, 4, [10, 200, 30, 255]), None);
        let camera = Camera::default();
        backend.draw_quad(
            &frame(&store, &camera),
            &QuadDraw {
                pos: Vec2::splat(2.0),
                size: Vec2::splat(4.0),
                angle: 0.0,
                mirror: false,
                tile: Some(TileInfo::new(Vec2::ZERO, Vec2::splat(4.0), texture)),
                // A red tint must NOT recolor the texels; only its alpha
                // applies.
                color: Color::rgba(1.0, 0.0, 0.0, 0.5),
                additive: Color::CLEAR,
                screen_space: true,
            },
        );
        let px = backend.main.pixel(2, 2);
        assert_eq!(px[1], 100, "green texel halved by tint alpha over transparent");
        assert_eq!(px[0], 5, "red channel from the texel, not the tint");
    }

    #[test]
    fn world_space_draw_respects_camera() {
        let mut backend = CanvasBackend::new(8, 8);
        let store = TextureStore::new();
        let camera = Camera::new(Vec2::ZERO, 2.0);
        // A 2x2 world-unit square at the origin covers 4x4 screen pixels
        // around the canvas center.
        backend.draw_quad(
            &frame(&store, &camera),
            &QuadDraw {
                pos: Vec2::ZERO,
                size: Vec2::splat(2.0),
                angle: 0.0,
                mirror: false,
                tile: None,
                color: Color::WHITE,
                additive: Color::CLEAR,
                screen_space: false,
            },
        );
        assert!(backend.main.pixel(3, 3)[3] > 0);
        assert!(backend.main.pixel(0, 0)[3] == 0);
    }
}
