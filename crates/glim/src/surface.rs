//! Software drawing surface — the fallback rasterizer's canvas.
//!
//! A [`PixelSurface`] is an RGBA8 pixel buffer with a stateful affine
//! transform stack, mirroring the save/restore/transform/fill/blit surface of
//! a 2D drawing context. Shapes are painted in a unit space (−0.5..0.5) and
//! placed by the current transform; rasterization walks the destination
//! bounding box and inverse-transforms each pixel center, so rotation,
//! scaling, and mirroring all come from the transform rather than per-shape
//! code.
//!
//! Transform state is acquired through [`PixelSurface::scoped`], which
//! returns a guard that restores the saved transform when dropped — on every
//! exit path, including a panic inside the paint code.

use std::ops::{Deref, DerefMut};

use crate::bitmap::Bitmap;
use crate::math::{Affine2, Color, Vec2};

/// An RGBA8 software canvas with an affine transform stack.
#[derive(Debug)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    transform: Affine2,
    stack: Vec<Affine2>,
    additive: bool,
}

impl PixelSurface {
    /// A transparent surface of the given pixel dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
            transform: Affine2::IDENTITY,
            stack: Vec::new(),
            additive: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Raw RGBA8 buffer, row-major from the top-left.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    /// Overwrite every pixel with `color`, bypassing compositing.
    pub fn clear(&mut self, color: Color) {
        let packed = color.pack().to_le_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&packed);
        }
    }

    /// Switch the composite mode: `false` = source-over, `true` = additive.
    pub fn set_additive(&mut self, additive: bool) {
        self.additive = additive;
    }

    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    pub fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    /// Save the transform and return a guard that restores it on drop.
    pub fn scoped(&mut self) -> TransformScope<'_> {
        self.save();
        TransformScope { surface: self }
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.transform *= Affine2::from_translation(offset);
    }

    pub fn rotate(&mut self, radians: f32) {
        self.transform *= Affine2::from_angle(radians);
    }

    /// Scale the transform; negative components mirror.
    pub fn scale(&mut self, factor: Vec2) {
        self.transform *= Affine2::from_scale(factor);
    }

    #[cfg(test)]
    pub(crate) fn transform(&self) -> Affine2 {
        self.transform
    }

    /// Fill the unit rectangle (−0.5..0.5) under the current transform.
    pub fn fill_unit_rect(&mut self, color: Color) {
        let rgb = [color.r * 255.0, color.g * 255.0, color.b * 255.0];
        let a = color.a;
        self.raster_unit(|_| Some((rgb, a)));
    }

    /// Blit a sub-rectangle of `bitmap` into the unit rectangle under the
    /// current transform, nearest-sampled. `alpha` multiplies each texel's
    /// alpha; texel RGB passes through unmodified.
    pub fn blit(&mut self, bitmap: &Bitmap, src_pos: Vec2, src_size: Vec2, alpha: f32) {
        let max = src_pos + src_size - Vec2::ONE;
        self.raster_unit(|local| {
            let u = local.x + 0.5;
            let v = local.y + 0.5;
            let sx = (src_pos.x + u * src_size.x).floor().clamp(src_pos.x, max.x.max(src_pos.x));
            let sy = (src_pos.y + v * src_size.y).floor().clamp(src_pos.y, max.y.max(src_pos.y));
            let texel = bitmap.pixel(sx as i32, sy as i32);
            let a = texel[3] as f32 / 255.0 * alpha;
            (a > 0.0).then(|| ([texel[0] as f32, texel[1] as f32, texel[2] as f32], a))
        });
    }

    /// Axis-aligned scaled blit, ignoring the transform stack. The fast path
    /// for glyph cells, which are never rotated.
    pub fn blit_rect(
        &mut self,
        dst_pos: Vec2,
        dst_size: Vec2,
        bitmap: &Bitmap,
        src_pos: Vec2,
        src_size: Vec2,
    ) {
        if dst_size.x <= 0.0 || dst_size.y <= 0.0 {
            return;
        }
        let x0 = dst_pos.x.floor().max(0.0) as i64;
        let y0 = dst_pos.y.floor().max(0.0) as i64;
        let x1 = ((dst_pos.x + dst_size.x).ceil() as i64).min(self.width as i64);
        let y1 = ((dst_pos.y + dst_size.y).ceil() as i64).min(self.height as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                let u = (x as f32 + 0.5 - dst_pos.x) / dst_size.x;
                let v = (y as f32 + 0.5 - dst_pos.y) / dst_size.y;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let sx = (src_pos.x + u * src_size.x).floor() as i32;
                let sy = (src_pos.y + v * src_size.y).floor() as i32;
                let texel = bitmap.pixel(sx, sy);
                let a = texel[3] as f32 / 255.0;
                if a > 0.0 {
                    self.composite(
                        x as u32,
                        y as u32,
                        [texel[0] as f32, texel[1] as f32, texel[2] as f32],
                        a,
                    );
                }
            }
        }
    }

    /// Fill a convex polygon given in surface pixel coordinates (the caller
    /// pre-transforms the points). Even-odd scanline fill.
    pub fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        if points.len() < 3 || color.a <= 0.0 {
            return;
        }
        let rgb = [color.r * 255.0, color.g * 255.0, color.b * 255.0];
        let y_min = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let y_max = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        let y0 = y_min.floor().max(0.0) as i64;
        let y1 = (y_max.ceil() as i64).min(self.height as i64);

        let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
        for y in y0..y1 {
            let yc = y as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let p = points[i];
                let q = points[(i + 1) % points.len()];
                if (p.y <= yc) != (q.y <= yc) {
                    crossings.push(p.x + (yc - p.y) * (q.x - p.x) / (q.y - p.y));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let x0 = (pair[0] - 0.5).ceil().max(0.0) as i64;
                let x1 = ((pair[1] - 0.5).ceil() as i64).min(self.width as i64);
                for x in x0..x1 {
                    self.composite(x as u32, y as u32, rgb, color.a);
                }
            }
        }
    }

    /// Walk the destination bounding box of the transformed unit rectangle,
    /// inverse-transform each pixel center, and composite what `sample`
    /// returns for in-bounds local coordinates.
    fn raster_unit<F>(&mut self, mut sample: F)
    where
        F: FnMut(Vec2) -> Option<([f32; 3], f32)>,
    {
        if self.transform.matrix2.determinant().abs() < 1e-12 {
            return;
        }
        let corners = [
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, 0.5),
        ]
        .map(|c| self.transform.transform_point2(c));
        let min_x = corners.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.y).fold(f32::NEG_INFINITY, f32::max);

        let x0 = min_x.floor().max(0.0) as i64;
        let y0 = min_y.floor().max(0.0) as i64;
        let x1 = (max_x.ceil() as i64).min(self.width as i64);
        let y1 = (max_y.ceil() as i64).min(self.height as i64);

        let inverse = self.transform.inverse();
        for y in y0..y1 {
            for x in x0..x1 {
                let local = inverse.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if local.x.abs() > 0.5 || local.y.abs() > 0.5 {
                    continue;
                }
                if let Some((rgb, a)) = sample(local) {
                    self.composite(x as u32, y as u32, rgb, a);
                }
            }
        }
    }

    fn composite(&mut self, x: u32, y: u32, rgb: [f32; 3], a: f32) {
        let a = a.clamp(0.0, 1.0);
        let i = ((y * self.width + x) * 4) as usize;
        if self.additive {
            for c in 0..3 {
                self.pixels[i + c] =
                    (self.pixels[i + c] as f32 + rgb[c] * a).min(255.0) as u8;
            }
        } else {
            for c in 0..3 {
                self.pixels[i + c] =
                    (rgb[c] * a + self.pixels[i + c] as f32 * (1.0 - a)).round() as u8;
            }
        }
        let dst_a = self.pixels[i + 3] as f32 / 255.0;
        self.pixels[i + 3] = ((a + dst_a * (1.0 - a)) * 255.0).round() as u8;
    }
}

/// Guard over a saved transform. Dereferences to the surface; restores the
/// transform when dropped, on every exit path.
pub struct TransformScope<'a> {
    surface: &'a mut PixelSurface,
}

impl Deref for TransformScope<'_> {
    type Target = PixelSurface;

    fn deref(&self) -> &PixelSurface {
        self.surface
    }
}

impl DerefMut for TransformScope<'_> {
    fn deref_mut(&mut self) -> &mut PixelSurface {
        self.surface
    }
}

impl Drop for TransformScope<'_> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_transform_restores_on_drop() {
        let mut surface = PixelSurface::new(4, 4);
        let before = surface.transform();
        {
            let mut scope = surface.scoped();
            scope.translate(Vec2::new(2.0, 3.0));
            scope.rotate(0.5);
            assert_ne!(scope.transform(), before);
            // Early exit path: the guard drops here.
        }
        assert_eq!(surface.transform(), before);
    }

    #[test]
    fn fill_covers_transformed_unit_rect() {
        let mut surface = PixelSurface::new(4, 4);
        surface.translate(Vec2::splat(2.0));
        surface.scale(Vec2::splat(2.0));
        surface.fill_unit_rect(Color::RED);
        // Unit rect lands on the 1..3 pixel box.
        let mut filled = 0;
        for y in 0..4 {
            for x in 0..4 {
                let px = surface.pixel(x, y);
                if px[3] > 0 {
                    filled += 1;
                    assert_eq!(px, [255, 0, 0, 255]);
                    assert!((1..3).contains(&x) && (1..3).contains(&y));
                }
            }
        }
        assert_eq!(filled, 4);
    }

    #[test]
    fn blit_mirrors_under_negative_scale() {
        let mut bitmap = Bitmap::solid(2, 1, [0, 0, 0, 255]);
        bitmap.put_pixel(0, 0, [255, 0, 0, 255]);
        bitmap.put_pixel(1, 0, [0, 255, 0, 255]);

        let mut plain = PixelSurface::new(2, 1);
        plain.translate(Vec2::new(1.0, 0.5));
        plain.scale(Vec2::new(2.0, 1.0));
        plain.blit(&bitmap, Vec2::ZERO, Vec2::new(2.0, 1.0), 1.0);
        assert_eq!(plain.pixel(0, 0)[0], 255, "left pixel samples red texel");

        let mut mirrored = PixelSurface::new(2, 1);
        mirrored.translate(Vec2::new(1.0, 0.5));
        mirrored.scale(Vec2::new(-2.0, 1.0));
        mirrored.blit(&bitmap, Vec2::ZERO, Vec2::new(2.0, 1.0), 1.0);
        assert_eq!(mirrored.pixel(0, 0)[1], 255, "left pixel samples green texel");
    }

    #[test]
    fn additive_compositing_saturates() {
        let mut surface = PixelSurface::new(1, 1);
        surface.clear(Color::rgb(0.8, 0.0, 0.0));
        surface.set_additive(true);
        surface.translate(Vec2::splat(0.5));
        surface.fill_unit_rect(Color::rgb(0.8, 0.2, 0.0));
        let px = surface.pixel(0, 0);
        assert_eq!(px[0], 255, "red channel clamps at 255");
        assert_eq!(px[1], 51);
    }

    #[test]
    fn polygon_fill_stays_inside() {
        let mut surface = PixelSurface::new(8, 8);
        let points = [
            Vec2::new(1.0, 1.0),
            Vec2::new(7.0, 1.0),
            Vec2::new(7.0, 7.0),
            Vec2::new(1.0, 7.0),
        ];
        surface.fill_polygon(&points, Color::GREEN);
        assert_eq!(surface.pixel(4, 4), [0, 255, 0, 255]);
        assert_eq!(surface.pixel(0, 0)[3], 0);
        assert_eq!(surface.pixel(7, 7)[3], 0);
    }
}
