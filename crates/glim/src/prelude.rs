//! Common imports: `use glim::prelude::*`.

pub use crate::backend::{DrawBackend, FrameContext, QuadDraw};
pub use crate::bitmap::Bitmap;
pub use crate::camera::Camera;
pub use crate::device::{BatchDevice, NullDevice, QuadSubmit, TextureHandle};
pub use crate::font::BitmapFont;
pub use crate::math::{Color, Vec2};
pub use crate::renderer::{DrawParams, RenderStats, Renderer};
pub use crate::surface::PixelSurface;
pub use crate::texture::{TextureIndex, TextureInfo, TextureStore};
pub use crate::tile::TileInfo;

#[cfg(feature = "gpu")]
pub use crate::gpu::WgpuDevice;
