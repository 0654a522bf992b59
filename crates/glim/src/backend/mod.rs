//! Draw backends — the two implementations of the visual contract.
//!
//! Every draw call resolves to a [`QuadDraw`] (or polygon) handed to a
//! [`DrawBackend`]: either the [`BatchedBackend`] feeding the GPU batch
//! device, or the [`CanvasBackend`] rasterizing in software. Both produce
//! visually consistent position/size/rotation/mirror output; their tinting
//! capabilities deliberately differ (see [`CanvasBackend`]).

pub(crate) mod batched;
pub(crate) mod canvas;

pub use batched::BatchedBackend;
pub use canvas::{CanvasBackend, draw_canvas2d};

use crate::camera::Camera;
use crate::math::{Color, Vec2};
use crate::texture::TextureStore;
use crate::tile::TileInfo;

/// Read-only per-frame state shared with backends: camera, canvas
/// dimensions, and the texture registry.
pub struct FrameContext<'a> {
    pub camera: &'a Camera,
    pub canvas_size: Vec2,
    pub textures: &'a TextureStore,
}

/// One resolved draw call: a positioned, rotated, optionally mirrored quad
/// with multiplicative and additive tints.
#[derive(Debug, Clone, Copy)]
pub struct QuadDraw {
    /// Center position, in the space named by `screen_space`.
    pub pos: Vec2,
    /// Extent, in the space named by `screen_space`. Always positive; mirror
    /// is carried separately.
    pub size: Vec2,
    /// Rotation in radians.
    pub angle: f32,
    /// Horizontal mirror.
    pub mirror: bool,
    /// Source tile, or `None` for an untextured solid-color quad.
    pub tile: Option<TileInfo>,
    /// Multiplicative tint.
    pub color: Color,
    /// Additive tint (batched backend only).
    pub additive: Color,
    /// Whether `pos`/`size` are screen-space pixels instead of world units.
    pub screen_space: bool,
}

/// The capability interface both backends implement. The public draw API
/// routes each call to the active implementation.
pub trait DrawBackend {
    /// Draw one quad.
    fn draw_quad(&mut self, frame: &FrameContext<'_>, quad: &QuadDraw);

    /// Draw a filled convex polygon.
    fn draw_polygon(
        &mut self,
        frame: &FrameContext<'_>,
        points: &[Vec2],
        color: Color,
        screen_space: bool,
    );

    /// Set the blend state for subsequent draws: `false` = alpha,
    /// `true` = additive.
    fn set_blend_mode(&mut self, additive: bool);

    /// Submit any accumulated work. A no-op for immediate backends.
    fn flush(&mut self);
}
