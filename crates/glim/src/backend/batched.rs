//! Batched backend — coalesces quads into per-texture, per-blend GPU batches.
//!
//! Draw records accumulate in the device's current batch as long as they
//! share one texture and one blend mode; the first record that would break
//! that invariant flushes the batch before being submitted. Callers get
//! call-order layering across those boundaries for free, and maximal
//! coalescing within them.
//!
//! All batch-internal math is in world units: screen-space draws are
//! converted on the way in (inverse camera scaling), so a batch never mixes
//! unit spaces.

use crate::device::{BatchDevice, QuadSubmit};
use crate::math::{Color, Vec2};
use crate::texture::TextureIndex;

use super::{DrawBackend, FrameContext, QuadDraw};

/// Accumulation state and statistics for the GPU batch path.
pub struct BatchedBackend<D: BatchDevice> {
    device: D,
    /// Texture of the open batch. `None` until the first textured draw.
    texture: Option<TextureIndex>,
    additive: bool,
    /// Records in the open batch; flush is skipped while zero.
    pending: u32,
    quads: u64,
    polygons: u64,
    flushes: u64,
}

impl<D: BatchDevice> BatchedBackend<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            texture: None,
            additive: false,
            pending: 0,
            quads: 0,
            polygons: 0,
            flushes: 0,
        }
    }

    /// The underlying batch device (e.g. to register textures or drive a
    /// device-specific frame setup).
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// (quads, polygons, flushes) submitted since construction.
    pub(crate) fn counters(&self) -> (u64, u64, u64) {
        (self.quads, self.polygons, self.flushes)
    }

    fn flush_pending(&mut self) {
        if self.pending > 0 {
            self.device.flush();
            self.flushes += 1;
            self.pending = 0;
        }
    }

    /// Bind `texture`, flushing first if the open batch uses another one.
    /// Untextured draws pass `None` and ride in whatever batch is open.
    fn bind_texture(&mut self, frame: &FrameContext<'_>, texture: Option<TextureIndex>) {
        let Some(texture) = texture else { return };
        if self.texture == Some(texture) {
            return;
        }
        self.flush_pending();
        let handle = frame
            .textures
            .get(texture)
            .gpu
            .expect("texture was registered without a GPU handle");
        self.device.set_texture(handle);
        self.texture = Some(texture);
    }

    fn to_world(frame: &FrameContext<'_>, pos: Vec2, size: Vec2, screen_space: bool) -> (Vec2, Vec2) {
        if screen_space {
            (
                frame.camera.screen_to_world(pos, frame.canvas_size),
                size / frame.camera.scale,
            )
        } else {
            (pos, size)
        }
    }
}

impl<D: BatchDevice> DrawBackend for BatchedBackend<D> {
    fn draw_quad(&mut self, frame: &FrameContext<'_>, quad: &QuadDraw) {
        let (pos, size) = Self::to_world(frame, quad.pos, quad.size, quad.screen_space);

        let (uv_min, uv_max) = match quad.tile {
            Some(tile) => {
                let info = frame.textures.get(tile.texture);
                // Inset each edge by the bleed margin so filtering and
                // rotation never sample the neighboring tile.
                (
                    tile.pos / info.size + info.bleed,
                    (tile.pos + tile.size) / info.size - info.bleed,
                )
            }
            // Zero-area rect: the device renders this as untextured solid
            // color, so it batches with any open texture.
            None => (Vec2::ZERO, Vec2::ZERO),
        };

        self.bind_texture(frame, quad.tile.map(|t| t.texture));

        self.device.submit_quad(&QuadSubmit {
            pos,
            size: Vec2::new(if quad.mirror { -size.x } else { size.x }, size.y),
            angle: quad.angle,
            uv_min,
            uv_max,
            tint: quad.color.pack(),
            additive: quad.additive.pack(),
        });
        self.pending += 1;
        self.quads += 1;
    }

    fn draw_polygon(
        &mut self,
        frame: &FrameContext<'_>,
        points: &[Vec2],
        color: Color,
        screen_space: bool,
    ) {
        // Polygons take a separate device path; never mixed into a quad batch.
        self.flush_pending();
        let world: Vec<Vec2> = if screen_space {
            points
                .iter()
                .map(|&p| frame.camera.screen_to_world(p, frame.canvas_size))
                .collect()
        } else {
            points.to_vec()
        };
        self.device.submit_polygon(&world, color.pack());
        self.polygons += 1;
    }

    fn set_blend_mode(&mut self, additive: bool) {
        if self.additive == additive {
            return;
        }
        // A blend change is a batch boundary.
        self.flush_pending();
        self.device.set_blend_mode(additive);
        self.additive = additive;
    }

    fn flush(&mut self) {
        self.flush_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::camera::Camera;
    use crate::device::testing::RecordingDevice;
    use crate::texture::TextureStore;
    use crate::tile::TileInfo;

    fn fixture(texture_count: usize) -> (TextureStore, BatchedBackend<RecordingDevice>, Camera) {
        let mut backend = BatchedBackend::new(RecordingDevice::default());
        let mut store = TextureStore::new();
        for _ in 0..texture_count {
            store.register(
                Bitmap::solid(64, 64, [255; 4]),
                Some(backend.device_mut()),
            );
        }
        (store, backend, Camera::default())
    }

    fn quad(tile: Option<TileInfo>) -> QuadDraw {
        QuadDraw {
            pos: Vec2::ZERO,
            size: Vec2::ONE,
            angle: 0.0,
            mirror: false,
            tile,
            color: Color::WHITE,
            additive: Color::CLEAR,
            screen_space: false,
        }
    }

    fn frame<'a>(store: &'a TextureStore, camera: &'a Camera) -> FrameContext<'a> {
        FrameContext {
            camera,
            canvas_size: Vec2::new(640.0, 480.0),
            textures: store,
        }
    }

    #[test]
    fn alternating_textures_flush_per_switch() {
        let (store, mut backend, camera) = fixture(2);
        let tiles = [
            TileInfo::new(Vec2::ZERO, Vec2::splat(8.0), crate::texture::TextureIndex(0)),
            TileInfo::new(Vec2::ZERO, Vec2::splat(8.0), crate::texture::TextureIndex(1)),
        ];
        let n = 6;
        for i in 0..n {
            backend.draw_quad(&frame(&store, &camera), &quad(Some(tiles[i % 2])));
        }
        backend.flush();
        // One flush per texture switch plus the end-of-frame flush: N total.
        assert_eq!(backend.device().flushes, n as u32);
    }

    #[test]
    fn shared_texture_accumulates_one_batch() {
        let (store, mut backend, camera) = fixture(1);
        let tile = TileInfo::new(Vec2::ZERO, Vec2::splat(8.0), crate::texture::TextureIndex(0));
        for _ in 0..6 {
            backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        }
        backend.flush();
        assert_eq!(backend.device().flushes, 1);
        assert_eq!(backend.device().quads.len(), 6);
    }

    #[test]
    fn blend_change_is_a_batch_boundary() {
        let (store, mut backend, camera) = fixture(1);
        let tile = TileInfo::new(Vec2::ZERO, Vec2::splat(8.0), crate::texture::TextureIndex(0));
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        backend.set_blend_mode(true);
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        backend.flush();
        assert_eq!(backend.device().flushes, 2);
        assert_eq!(backend.device().blend_sets, vec![true]);
    }

    #[test]
    fn redundant_blend_set_does_not_flush() {
        let (store, mut backend, camera) = fixture(1);
        let tile = TileInfo::new(Vec2::ZERO, Vec2::splat(8.0), crate::texture::TextureIndex(0));
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        backend.set_blend_mode(false);
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        backend.flush();
        assert_eq!(backend.device().flushes, 1);
    }

    #[test]
    fn full_texture_tile_uv_is_inset_by_bleed() {
        let (store, mut backend, camera) = fixture(1);
        let tile = TileInfo::new(Vec2::ZERO, Vec2::splat(64.0), crate::texture::TextureIndex(0));
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));

        let bleed = store.get(crate::texture::TextureIndex(0)).bleed;
        let submitted = &backend.device().quads[0];
        assert_eq!(submitted.uv_min, bleed);
        assert_eq!(submitted.uv_max, Vec2::ONE - bleed);
        let width = submitted.uv_max.x - submitted.uv_min.x;
        assert!((width - (1.0 - 2.0 * bleed.x)).abs() < 1e-6);
    }

    #[test]
    fn mirror_negates_width_only() {
        let (store, mut backend, camera) = fixture(1);
        let tile = TileInfo::new(Vec2::ZERO, Vec2::splat(8.0), crate::texture::TextureIndex(0));
        let mut mirrored = quad(Some(tile));
        mirrored.mirror = true;
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        backend.draw_quad(&frame(&store, &camera), &mirrored);

        let quads = &backend.device().quads;
        assert_eq!(quads[1].size.x, -quads[0].size.x);
        assert_eq!(quads[1].size.y, quads[0].size.y);
        assert_eq!(quads[1].uv_min, quads[0].uv_min);
        assert_eq!(quads[1].uv_max, quads[0].uv_max);
        assert_eq!(quads[1].pos, quads[0].pos);
    }

    #[test]
    fn untextured_quad_is_solid_and_keeps_batch_open() {
        let (store, mut backend, camera) = fixture(1);
        let tile = TileInfo::new(Vec2::ZERO, Vec2::splat(8.0), crate::texture::TextureIndex(0));
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        backend.draw_quad(&frame(&store, &camera), &quad(None));
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        backend.flush();

        assert_eq!(backend.device().flushes, 1, "solid quad must not break the batch");
        assert!(backend.device().quads[1].is_solid());
        assert!(!backend.device().quads[0].is_solid());
    }

    #[test]
    fn screen_space_draw_lands_in_world_units() {
        let (store, mut backend, _) = fixture(1);
        let camera = Camera::new(Vec2::new(10.0, 20.0), 2.0);
        let ctx = FrameContext {
            camera: &camera,
            canvas_size: Vec2::new(640.0, 480.0),
            textures: &store,
        };
        let mut q = quad(None);
        q.pos = Vec2::new(320.0, 240.0);
        q.size = Vec2::new(8.0, 8.0);
        q.screen_space = true;
        backend.draw_quad(&ctx, &q);

        let submitted = &backend.device().quads[0];
        let expected = camera.screen_to_world(Vec2::new(320.0, 240.0), ctx.canvas_size);
        assert!((submitted.pos - expected).length() < 1e-4);
        assert_eq!(submitted.size, Vec2::splat(4.0));
    }

    #[test]
    fn polygon_flushes_open_batch_first() {
        let (store, mut backend, camera) = fixture(1);
        let tile = TileInfo::new(Vec2::ZERO, Vec2::splat(8.0), crate::texture::TextureIndex(0));
        backend.draw_quad(&frame(&store, &camera), &quad(Some(tile)));
        let points = [Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        backend.draw_polygon(&frame(&store, &camera), &points, Color::RED, false);
        assert_eq!(backend.device().flushes, 1);
        assert_eq!(backend.device().polygons.len(), 1);
    }
}
