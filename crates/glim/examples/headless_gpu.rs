//! Batched rendering without a window — draws through the wgpu device into
//! an offscreen target and writes the result to `headless_gpu.png`.

use glim::prelude::*;

fn main() {
    env_logger::init();

    let (width, height) = (512u32, 288u32);
    let device = WgpuDevice::headless(width, height);
    let mut renderer = Renderer::new(device, width, height);

    let texture = renderer.register_texture(checkerboard());
    let tile = renderer.tile_from_index(texture, 0, Vec2::splat(16.0));

    renderer.set_camera(Vec2::ZERO, 48.0);
    let view_proj = renderer.camera().view_proj(renderer.canvas_size());
    renderer
        .device_mut()
        .begin_frame(view_proj, Color::rgb(0.1, 0.1, 0.15));

    for i in 0..5 {
        let x = (i as f32 - 2.0) * 1.2;
        renderer.draw_tile(
            Vec2::new(x, 0.5),
            Vec2::ONE,
            Some(tile),
            DrawParams::new()
                .angle(i as f32 * 0.25)
                .mirror(i % 2 == 1)
                .color(Color::rgba(1.0, 1.0, 1.0, 0.95)),
        );
    }

    // Additive glow pass under the tiles.
    renderer.set_blend_mode(true);
    for i in 0..3 {
        renderer.draw_rect(
            Vec2::new(i as f32 - 1.0, -1.5),
            Vec2::splat(0.8),
            DrawParams::new().color(Color::rgba(0.3, 0.1, 0.0, 1.0)),
        );
    }
    renderer.set_blend_mode(false);

    renderer.draw_line(
        Vec2::new(-2.5, -2.2),
        Vec2::new(2.5, -2.2),
        0.08,
        DrawParams::new().color(Color::rgb(0.9, 0.9, 1.0)),
    );
    renderer.draw_poly(
        &[
            Vec2::new(2.2, 1.6),
            Vec2::new(2.8, 1.6),
            Vec2::new(2.5, 2.2),
        ],
        Color::rgba(0.2, 0.8, 0.4, 0.9),
        DrawParams::new(),
    );

    renderer.flush();
    log::info!("stats: {:?}", renderer.stats());

    let frame = renderer.device().read_back();
    image::RgbaImage::from_raw(width, height, frame.data().to_vec())
        .expect("read-back buffer size mismatch")
        .save("headless_gpu.png")
        .unwrap_or_else(|e| panic!("Failed to save 'headless_gpu.png': {}", e));
    log::info!("wrote headless_gpu.png");
}

/// A 16x16 two-tone checkerboard.
fn checkerboard() -> Bitmap {
    let mut bitmap = Bitmap::solid(16, 16, [40, 45, 70, 255]);
    for y in 0..16 {
        for x in 0..16 {
            if (x / 4 + y / 4) % 2 == 0 {
                bitmap.put_pixel(x, y, [230, 170, 50, 255]);
            }
        }
    }
    bitmap
}
