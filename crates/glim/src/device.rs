//! The batch-draw device interface consumed by the batched backend.
//!
//! The renderer treats GPU submission as an opaque service: set a texture and
//! blend mode, submit quads and polygons, flush. The [`WgpuDevice`]
//! (`gpu` feature) is the built-in implementation; integrators with their own
//! GPU plumbing implement [`BatchDevice`] instead.
//!
//! [`WgpuDevice`]: crate::gpu::WgpuDevice

use crate::bitmap::Bitmap;
use crate::math::Vec2;

/// Opaque handle to a device-owned texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureHandle(pub u32);

/// One quad record handed to the device.
///
/// `pos`/`size`/`angle` are in world units; a mirrored quad carries a negative
/// `size.x`. A zero-area UV rect (`uv_min == uv_max`) signals an untextured
/// solid-color quad — the device must not sample the bound texture for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadSubmit {
    /// World-space center of the quad.
    pub pos: Vec2,
    /// World-space extent; `x` is negated for mirrored quads.
    pub size: Vec2,
    /// Rotation in radians.
    pub angle: f32,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    /// Multiplicative tint, packed RGBA.
    pub tint: u32,
    /// Additive tint, packed RGBA.
    pub additive: u32,
}

impl QuadSubmit {
    /// Whether this record is an untextured solid-color quad.
    pub fn is_solid(&self) -> bool {
        self.uv_min == self.uv_max
    }
}

/// The opaque GPU batch-draw service.
///
/// Submissions between two `flush` calls form one batch; the caller guarantees
/// a batch never mixes textures or blend modes. `flush` is fire-and-forget:
/// it enqueues GPU work and returns without waiting for completion.
pub trait BatchDevice {
    /// Upload a decoded bitmap and return a handle for [`set_texture`].
    ///
    /// [`set_texture`]: Self::set_texture
    fn create_texture(&mut self, bitmap: &Bitmap) -> TextureHandle;

    /// Bind the texture sampled by subsequent quads.
    fn set_texture(&mut self, handle: TextureHandle);

    /// Set the blend state: `false` = alpha blending, `true` = additive.
    fn set_blend_mode(&mut self, additive: bool);

    /// Append one quad to the current batch.
    fn submit_quad(&mut self, quad: &QuadSubmit);

    /// Draw a filled convex polygon. Independent of the quad batch; the
    /// caller flushes before submitting one.
    fn submit_polygon(&mut self, points: &[Vec2], tint: u32);

    /// Submit the accumulated batch as one draw call and clear it.
    fn flush(&mut self);
}

/// A device that discards everything. Stands in when acceleration is
/// unavailable or disabled and only the software backend will draw.
#[derive(Debug, Default)]
pub struct NullDevice {
    next_handle: u32,
}

impl BatchDevice for NullDevice {
    fn create_texture(&mut self, _bitmap: &Bitmap) -> TextureHandle {
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn set_texture(&mut self, _handle: TextureHandle) {}
    fn set_blend_mode(&mut self, _additive: bool) {}
    fn submit_quad(&mut self, _quad: &QuadSubmit) {}
    fn submit_polygon(&mut self, _points: &[Vec2], _tint: u32) {}
    fn flush(&mut self) {}
}
