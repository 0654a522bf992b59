//! Software-only rendering — draws a small scene with the fallback backend
//! and writes the composited surfaces to `software.png`.

use glim::prelude::*;

fn main() {
    env_logger::init();

    let (width, height) = (320u32, 240u32);
    let mut renderer = Renderer::with_acceleration(NullDevice::default(), width, height, false);

    let texture = renderer.register_texture(checkerboard());
    let tile = renderer.tile_from_index(texture, 0, Vec2::splat(16.0));

    renderer.set_camera(Vec2::ZERO, 24.0);

    // A row of rotated, alternately mirrored tiles.
    for i in 0..5 {
        let x = (i as f32 - 2.0) * 1.5;
        renderer.draw_tile(
            Vec2::new(x, 0.0),
            Vec2::ONE,
            Some(tile),
            DrawParams::new()
                .angle(i as f32 * 0.3)
                .mirror(i % 2 == 1),
        );
    }

    renderer.draw_rect(
        Vec2::new(0.0, -2.5),
        Vec2::new(6.0, 0.5),
        DrawParams::new().color(Color::rgb(0.2, 0.6, 0.3)),
    );
    renderer.draw_line(
        Vec2::new(-3.0, 2.0),
        Vec2::new(3.0, 2.5),
        0.1,
        DrawParams::new().color(Color::RED),
    );
    renderer.draw_poly(
        &[
            Vec2::new(-3.5, -1.0),
            Vec2::new(-2.5, -1.0),
            Vec2::new(-3.0, -0.2),
        ],
        Color::rgba(0.9, 0.8, 0.2, 0.8),
        DrawParams::new(),
    );

    renderer.draw_text("glim demo", Vec2::new(0.0, 3.2), 0.08, true);
    renderer.draw_text_screen("software path", Vec2::new(4.0, 4.0), 1.0, false);

    renderer.flush();
    log::info!("stats: {:?}", renderer.stats());

    save_composite(&renderer, width, height, "software.png");
}

/// A 16x16 two-tone checkerboard.
fn checkerboard() -> Bitmap {
    let mut bitmap = Bitmap::solid(16, 16, [60, 60, 80, 255]);
    for y in 0..16 {
        for x in 0..16 {
            if (x / 4 + y / 4) % 2 == 0 {
                bitmap.put_pixel(x, y, [220, 180, 60, 255]);
            }
        }
    }
    bitmap
}

/// Composite the overlay over the main surface and save as PNG.
fn save_composite(renderer: &Renderer<NullDevice>, width: u32, height: u32, path: &str) {
    let main = renderer.main_surface();
    let overlay = renderer.overlay_surface();
    let mut out = image::RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let m = main.pixel(x, y);
            let o = overlay.pixel(x, y);
            let a = o[3] as f32 / 255.0;
            let mut px = [0u8; 4];
            for c in 0..3 {
                px[c] = (o[c] as f32 * a + m[c] as f32 * (1.0 - a)).round() as u8;
            }
            px[3] = 255;
            out.put_pixel(x, y, image::Rgba(px));
        }
    }
    out.save(path)
        .unwrap_or_else(|e| panic!("Failed to save '{}': {}", path, e));
    log::info!("wrote {path}");
}
