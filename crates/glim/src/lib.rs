//! # glim — Hybrid 2D Rendering Core
//!
//! A batched 2D quad renderer with a software fallback: tiles, rects, lines,
//! filled polygons, and fixed-grid bitmap text, drawn in either a Y-up world
//! space or Y-down screen pixels.
//!
//! ## Architecture
//!
//! Every draw call flows through one pipeline:
//!
//! ```text
//!        draw_tile / draw_rect / draw_line / draw_poly / draw_text
//!                               │
//!                               ▼
//!                    ┌─────────────────────┐
//!                    │  Renderer (facade)   │ resolve defaults,
//!                    │                      │ pick coordinate space
//!                    └──────────┬──────────┘
//!                 accelerated?  │
//!              ┌────────────────┴───────────────┐
//!              ▼                                ▼
//!   ┌─────────────────────┐         ┌─────────────────────┐
//!   │  BatchedBackend     │         │  CanvasBackend      │
//!   │  coalesce quads per │         │  software raster,   │
//!   │  texture + blend,   │         │  scoped transform,  │
//!   │  flush on change    │         │  immediate pixels   │
//!   └──────────┬──────────┘         └─────────────────────┘
//!              ▼
//!   ┌─────────────────────┐
//!   │  BatchDevice        │  opaque GPU service:
//!   │  (WgpuDevice, ...)  │  one draw call per flush
//!   └─────────────────────┘
//! ```
//!
//! Both backends honor position, size, rotation, and mirroring identically.
//! Tinting deliberately differs: the batched path supports full
//! multiplicative + additive color, the software path applies tint alpha only
//! on textured draws (see [`backend::CanvasBackend`]).
//!
//! ## Batching Discipline
//!
//! Records accumulate in the device as long as they share one texture and one
//! blend mode; the first draw that would break that invariant flushes the
//! batch first. Untextured solid-color quads carry a zero-area UV rect and
//! ride in any open batch. Draw order is preserved across flush boundaries;
//! within a batch the GPU may reorder freely, which is invisible without
//! depth testing.
//!
//! ## Spaces
//!
//! World space is camera-relative and Y-up, scaled by the camera zoom; screen
//! space is the Y-down pixel grid of the output. [`Camera::screen_to_world`]
//! and [`Camera::world_to_screen`] are exact inverses, with a half-pixel
//! offset aligning pixel centers to texel centers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use glim::prelude::*;
//!
//! let mut renderer = Renderer::with_acceleration(NullDevice::default(), 640, 480, false);
//! let texture = renderer.register_texture(Bitmap::solid(64, 64, [255, 255, 255, 255]));
//! let tile = renderer.tile_from_index(texture, 5, Vec2::splat(8.0));
//!
//! renderer.set_camera(Vec2::ZERO, 32.0);
//! renderer.draw_tile(Vec2::ZERO, Vec2::ONE, Some(tile), DrawParams::new());
//! renderer.draw_text("hello", Vec2::new(0.0, 2.0), 0.05, true);
//! renderer.flush();
//! ```
//!
//! [`Camera::screen_to_world`]: camera::Camera::screen_to_world
//! [`Camera::world_to_screen`]: camera::Camera::world_to_screen

pub mod backend;
pub mod bitmap;
pub mod camera;
pub mod device;
pub mod font;
pub mod math;
pub mod prelude;
pub mod renderer;
pub mod surface;
pub mod texture;
pub mod tile;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use backend::{BatchedBackend, CanvasBackend, DrawBackend};
pub use bitmap::Bitmap;
pub use camera::Camera;
pub use device::{BatchDevice, NullDevice, TextureHandle};
pub use font::BitmapFont;
pub use math::{Color, Vec2};
pub use renderer::{DrawParams, RenderStats, Renderer};
pub use surface::PixelSurface;
pub use texture::{TextureIndex, TextureInfo, TextureStore};
pub use tile::TileInfo;

#[cfg(feature = "gpu")]
pub use gpu::WgpuDevice;
