//! The public draw API.
//!
//! [`Renderer`] owns everything a frame needs — texture registry, camera,
//! both backends, the software surfaces, blend state, and statistics — and
//! routes each draw call to the batched or immediate backend. There are no
//! process-wide singletons: construct one renderer per output surface, tear
//! it down at shutdown.
//!
//! Draw calls default to world space, opaque white, no rotation, no mirror,
//! no additive tint, and the renderer's acceleration flag; [`DrawParams`]
//! overrides any of those per call.

use crate::backend::{BatchedBackend, CanvasBackend, DrawBackend, FrameContext, QuadDraw};
use crate::bitmap::Bitmap;
use crate::camera::Camera;
use crate::device::BatchDevice;
use crate::font::BitmapFont;
use crate::math::{Color, Vec2};
use crate::surface::PixelSurface;
use crate::texture::{TextureIndex, TextureStore};
use crate::tile::TileInfo;

/// Optional per-draw settings. Start from `default()` and override with the
/// builder methods.
#[derive(Debug, Clone, Copy)]
pub struct DrawParams {
    /// Multiplicative tint.
    pub color: Color,
    /// Rotation in radians.
    pub angle: f32,
    /// Horizontal mirror.
    pub mirror: bool,
    /// Additive tint. Ignored by the software backend.
    pub additive: Color,
    /// Interpret position/size as screen-space pixels.
    pub screen_space: bool,
    /// Per-call backend override; `None` uses the renderer's flag.
    pub accelerated: Option<bool>,
}

impl DrawParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn angle(mut self, radians: f32) -> Self {
        self.angle = radians;
        self
    }

    pub fn mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn additive(mut self, additive: Color) -> Self {
        self.additive = additive;
        self
    }

    pub fn screen_space(mut self) -> Self {
        self.screen_space = true;
        self
    }

    /// Force this draw onto the batched (`true`) or software (`false`) path.
    pub fn accelerated(mut self, accelerated: bool) -> Self {
        self.accelerated = Some(accelerated);
        self
    }
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            angle: 0.0,
            mirror: false,
            additive: Color::CLEAR,
            screen_space: false,
            accelerated: None,
        }
    }
}

/// Per-renderer draw statistics. Purely observational.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    /// Batches submitted to the GPU device.
    pub draw_calls: u64,
    /// Quads recorded through the batched backend.
    pub quads: u64,
    /// Polygons submitted through the batched backend.
    pub polygons: u64,
    /// Textures in the registry.
    pub textures_loaded: u32,
}

/// The rendering context: registry, camera, surfaces, and both backends.
pub struct Renderer<D: BatchDevice> {
    textures: TextureStore,
    camera: Camera,
    canvas_size: Vec2,
    batched: BatchedBackend<D>,
    canvas: CanvasBackend,
    font: BitmapFont,
    accelerated: bool,
    additive: bool,
}

impl<D: BatchDevice> Renderer<D> {
    /// A renderer drawing through `device`, with software surfaces of the
    /// given pixel dimensions. Starts accelerated.
    pub fn new(device: D, width: u32, height: u32) -> Self {
        log::debug!("renderer created at {}x{}", width, height);
        Self {
            textures: TextureStore::new(),
            camera: Camera::default(),
            canvas_size: Vec2::new(width as f32, height as f32),
            batched: BatchedBackend::new(device),
            canvas: CanvasBackend::new(width, height),
            font: BitmapFont::default(),
            accelerated: true,
            additive: false,
        }
    }

    /// A renderer that starts on the software path (acceleration off).
    pub fn with_acceleration(device: D, width: u32, height: u32, accelerated: bool) -> Self {
        let mut this = Self::new(device, width, height);
        this.accelerated = accelerated;
        this
    }

    // ── textures ────────────────────────────────────────────────────────

    /// Register a decoded bitmap. A GPU texture is created for it only while
    /// acceleration is on.
    pub fn register_texture(&mut self, bitmap: Bitmap) -> TextureIndex {
        let device = self
            .accelerated
            .then(|| self.batched.device_mut() as &mut dyn BatchDevice);
        self.textures.register(bitmap, device)
    }

    /// Load, decode, and register an image from disk.
    pub fn register_texture_from_path(&mut self, path: &str) -> TextureIndex {
        self.register_texture(Bitmap::load(path))
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    /// Describe a tile by linear grid index; see
    /// [`TextureStore::tile_from_index`].
    pub fn tile_from_index(&self, texture: TextureIndex, index: u32, size: Vec2) -> TileInfo {
        self.textures.tile_from_index(texture, index, size)
    }

    // ── camera & spaces ─────────────────────────────────────────────────

    pub fn set_camera(&mut self, pos: Vec2, scale: f32) {
        self.camera = Camera::new(pos, scale);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.camera.screen_to_world(screen, self.canvas_size)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.camera.world_to_screen(world, self.canvas_size)
    }

    /// Resize to a new output viewport. Both software surfaces follow.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas_size = Vec2::new(width as f32, height as f32);
        self.canvas.resize(width, height);
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    // ── backends ────────────────────────────────────────────────────────

    /// Toggle the default backend. Turning acceleration off routes new draws
    /// through the software path (e.g. after a lost GPU context, until
    /// textures are re-registered).
    pub fn set_accelerated(&mut self, accelerated: bool) {
        self.accelerated = accelerated;
    }

    /// The batch device, for integrator frame setup (render targets, camera
    /// uniforms) and texture management.
    pub fn device_mut(&mut self) -> &mut D {
        self.batched.device_mut()
    }

    pub fn device(&self) -> &D {
        self.batched.device()
    }

    /// The software surface holding world/batched-equivalent content.
    pub fn main_surface(&self) -> &PixelSurface {
        &self.canvas.main
    }

    /// The software surface holding UI and text.
    pub fn overlay_surface(&self) -> &PixelSurface {
        &self.canvas.overlay
    }

    // ── drawing ─────────────────────────────────────────────────────────

    /// Draw a textured tile (or an untextured quad when `tile` is `None`).
    pub fn draw_tile(&mut self, pos: Vec2, size: Vec2, tile: Option<TileInfo>, params: DrawParams) {
        let quad = QuadDraw {
            pos,
            size,
            angle: params.angle,
            mirror: params.mirror,
            tile,
            color: params.color,
            additive: params.additive,
            screen_space: params.screen_space,
        };
        let frame = FrameContext {
            camera: &self.camera,
            canvas_size: self.canvas_size,
            textures: &self.textures,
        };
        let backend: &mut dyn DrawBackend = if params.accelerated.unwrap_or(self.accelerated) {
            &mut self.batched
        } else {
            &mut self.canvas
        };
        backend.draw_quad(&frame, &quad);
    }

    /// Draw a solid-color rectangle.
    pub fn draw_rect(&mut self, pos: Vec2, size: Vec2, params: DrawParams) {
        self.draw_tile(pos, size, None, params);
    }

    /// Draw a line segment of the given thickness, as a rotated rectangle
    /// spanning the endpoints.
    pub fn draw_line(&mut self, from: Vec2, to: Vec2, thickness: f32, params: DrawParams) {
        let delta = to - from;
        let length = delta.length();
        if length <= 0.0 {
            return;
        }
        let params = DrawParams {
            // Rotate the rect's long axis onto the segment direction.
            angle: (-delta.x).atan2(delta.y),
            ..params
        };
        self.draw_rect(from + delta / 2.0, Vec2::new(thickness, length), params);
    }

    /// Draw a filled convex polygon.
    pub fn draw_poly(&mut self, points: &[Vec2], color: Color, params: DrawParams) {
        let frame = FrameContext {
            camera: &self.camera,
            canvas_size: self.canvas_size,
            textures: &self.textures,
        };
        let backend: &mut dyn DrawBackend = if params.accelerated.unwrap_or(self.accelerated) {
            &mut self.batched
        } else {
            &mut self.canvas
        };
        backend.draw_polygon(&frame, points, color, params.screen_space);
    }

    /// Draw text at a screen-space pixel position onto the overlay surface.
    pub fn draw_text_screen(&mut self, text: &str, pos: Vec2, scale: f32, center: bool) {
        self.font
            .draw_text_screen(&mut self.canvas.overlay, text, pos, scale, center);
    }

    /// Draw text at a world-space position: the screen variant composed with
    /// the world→screen transform and camera-adjusted scale.
    pub fn draw_text(&mut self, text: &str, pos: Vec2, scale: f32, center: bool) {
        let screen_pos = self.world_to_screen(pos);
        let screen_scale = scale * self.camera.scale;
        self.draw_text_screen(text, screen_pos, screen_scale, center);
    }

    /// Replace the text font (same fixed-grid contract as the default).
    pub fn set_font(&mut self, font: BitmapFont) {
        self.font = font;
    }

    // ── frame control ───────────────────────────────────────────────────

    /// Set the blend state for subsequent draws on both backends. Changing
    /// it closes the current batch.
    pub fn set_blend_mode(&mut self, additive: bool) {
        if self.additive == additive {
            return;
        }
        self.additive = additive;
        self.batched.set_blend_mode(additive);
        self.canvas.set_blend_mode(additive);
    }

    /// Submit the open batch. Call at least once at the end of each frame.
    pub fn flush(&mut self) {
        self.batched.flush();
    }

    pub fn stats(&self) -> RenderStats {
        let (quads, polygons, draw_calls) = self.batched.counters();
        RenderStats {
            draw_calls,
            quads,
            polygons,
            textures_loaded: self.textures.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::RecordingDevice;

    fn renderer() -> Renderer<RecordingDevice> {
        Renderer::new(RecordingDevice::default(), 640, 480)
    }

    #[test]
    fn draw_line_is_a_rotated_rect() {
        let mut r = renderer();
        r.draw_line(Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0), 0.5, DrawParams::new());
        let quad = &r.device().quads[0];
        // Vertical segment: no rotation, thickness x length.
        assert!((quad.pos - Vec2::new(1.0, 3.0)).length() < 1e-6);
        assert_eq!(quad.size, Vec2::new(0.5, 4.0));
        assert!(quad.angle.abs() < 1e-6);

        r.draw_line(Vec2::ZERO, Vec2::new(3.0, 0.0), 0.5, DrawParams::new());
        let quad = &r.device().quads[1];
        assert_eq!(quad.size, Vec2::new(0.5, 3.0));
        assert!((quad.angle.abs() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn zero_length_line_draws_nothing() {
        let mut r = renderer();
        r.draw_line(Vec2::ONE, Vec2::ONE, 2.0, DrawParams::new());
        assert!(r.device().quads.is_empty());
    }

    #[test]
    fn rect_is_untextured_tile() {
        let mut r = renderer();
        r.draw_rect(Vec2::ZERO, Vec2::ONE, DrawParams::new().color(Color::RED));
        let quad = &r.device().quads[0];
        assert!(quad.is_solid());
        assert_eq!(quad.tint, Color::RED.pack());
    }

    #[test]
    fn per_call_override_routes_to_software() {
        let mut r = renderer();
        r.draw_rect(
            Vec2::new(320.0, 240.0),
            Vec2::splat(10.0),
            DrawParams::new().screen_space().accelerated(false),
        );
        assert!(r.device().quads.is_empty(), "software draw must not hit the device");
        assert!(
            r.main_surface().pixel(320, 240)[3] > 0,
            "software draw must hit the surface"
        );
    }

    #[test]
    fn registration_skips_gpu_when_not_accelerated() {
        let mut r = Renderer::with_acceleration(RecordingDevice::default(), 64, 64, false);
        let index = r.register_texture(Bitmap::solid(8, 8, [255; 4]));
        assert!(r.textures().get(index).gpu.is_none());

        let mut r = renderer();
        let index = r.register_texture(Bitmap::solid(8, 8, [255; 4]));
        assert!(r.textures().get(index).gpu.is_some());
    }

    #[test]
    fn stats_track_quads_and_flushes() {
        let mut r = renderer();
        r.draw_rect(Vec2::ZERO, Vec2::ONE, DrawParams::new());
        r.draw_rect(Vec2::ONE, Vec2::ONE, DrawParams::new());
        r.flush();
        let stats = r.stats();
        assert_eq!(stats.quads, 2);
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn world_text_lands_at_projected_position() {
        let mut r = renderer();
        r.set_camera(Vec2::ZERO, 2.0);
        r.draw_text("M", Vec2::ZERO, 1.0, false);
        // World origin projects to the canvas center; the glyph fills a
        // 16x16 box (8px cell at camera scale 2) starting there.
        let px = r.world_to_screen(Vec2::ZERO);
        let ink = (px.y as u32..px.y as u32 + 16)
            .flat_map(|y| (px.x as u32..px.x as u32 + 16).map(move |x| (x, y)))
            .filter(|&(x, y)| r.overlay_surface().pixel(x, y)[3] > 0)
            .count();
        assert!(ink > 0);
    }
}
