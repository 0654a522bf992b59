//! Camera state and world/screen coordinate transforms.
//!
//! World space is camera-relative and Y-up, with 1 world unit = `scale`
//! pixels. Screen space is the pixel grid of the output surface, Y-down with
//! the origin at the top-left. The transforms put the camera position at the
//! center of the canvas and add a half-pixel offset so pixel centers map onto
//! texel centers.

use crate::math::{Mat4, Vec2};

/// Camera position and zoom. Mutated by the application between frames;
/// read-only while a frame is being drawn.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// World-space position at the center of the canvas.
    pub pos: Vec2,
    /// Zoom: pixels per world unit.
    pub scale: f32,
}

impl Camera {
    pub fn new(pos: Vec2, scale: f32) -> Self {
        Self { pos, scale }
    }

    /// Map a screen-space pixel position to world space.
    pub fn screen_to_world(&self, screen: Vec2, canvas_size: Vec2) -> Vec2 {
        Vec2::new(
            (screen.x - canvas_size.x / 2.0 + 0.5) / self.scale + self.pos.x,
            (screen.y - canvas_size.y / 2.0 + 0.5) / -self.scale + self.pos.y,
        )
    }

    /// Map a world-space position to screen-space pixels. Exact algebraic
    /// inverse of [`screen_to_world`](Self::screen_to_world).
    pub fn world_to_screen(&self, world: Vec2, canvas_size: Vec2) -> Vec2 {
        Vec2::new(
            (world.x - self.pos.x) * self.scale + canvas_size.x / 2.0 - 0.5,
            (world.y - self.pos.y) * -self.scale + canvas_size.y / 2.0 - 0.5,
        )
    }

    /// Orthographic view-projection matrix for the GPU path: world space to
    /// clip space, camera at the canvas center, Y-up.
    pub fn view_proj(&self, canvas_size: Vec2) -> Mat4 {
        let half = canvas_size / (2.0 * self.scale);
        Mat4::orthographic_rh(
            self.pos.x - half.x,
            self.pos.x + half.x,
            self.pos.y - half.y,
            self.pos.y + half.y,
            -1.0,
            1.0,
        )
    }
}

impl Default for Camera {
    /// Origin, 1 world unit = 1 pixel.
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2, tol: f32) {
        assert!(
            (a - b).length() <= tol,
            "{a} and {b} differ by more than {tol}"
        );
    }

    #[test]
    fn round_trip_is_identity() {
        let canvas = Vec2::new(1280.0, 720.0);
        let cameras = [
            Camera::default(),
            Camera::new(Vec2::new(13.5, -42.25), 32.0),
            Camera::new(Vec2::new(-1000.0, 987.0), 0.5),
            Camera::new(Vec2::new(0.25, 0.75), 96.0),
        ];
        let points = [
            Vec2::ZERO,
            Vec2::new(640.0, 360.0),
            Vec2::new(1279.0, 719.0),
            Vec2::new(17.0, 503.0),
            Vec2::new(3.25, 9.75),
        ];
        for cam in cameras {
            for p in points {
                let back = cam.world_to_screen(cam.screen_to_world(p, canvas), canvas);
                assert_close(back, p, 1e-3);
            }
        }
    }

    #[test]
    fn canvas_center_maps_to_camera_pos() {
        let canvas = Vec2::new(200.0, 100.0);
        let cam = Camera::new(Vec2::new(5.0, 7.0), 10.0);
        // Center pixel (half-pixel corrected) sits on the camera position.
        let world = cam.screen_to_world(Vec2::new(99.5, 49.5), canvas);
        assert_close(world, cam.pos, 1e-5);
    }

    #[test]
    fn screen_y_is_inverted() {
        let canvas = Vec2::new(100.0, 100.0);
        let cam = Camera::new(Vec2::ZERO, 1.0);
        let top = cam.screen_to_world(Vec2::new(50.0, 0.0), canvas);
        let bottom = cam.screen_to_world(Vec2::new(50.0, 99.0), canvas);
        assert!(top.y > bottom.y, "screen-down must be world-down");
    }
}
