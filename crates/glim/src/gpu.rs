//! wgpu implementation of the batch-draw device.
//!
//! [`WgpuDevice`] is the built-in [`BatchDevice`]: it accumulates quad
//! vertices CPU-side, transforms each quad's corners by its rotation before
//! upload, and turns every flush into one `draw_indexed` call. The shader
//! only applies the camera view-projection, so quads with different
//! positions, rotations, and mirroring share a single draw call as long as
//! they share a texture and blend mode — exactly the batching contract the
//! caller maintains.
//!
//! Two premade pipelines (alpha and additive blending) share the same shader
//! and bind group layouts; a flush picks one by the current blend mode.
//! Untextured solid-color quads are uploaded with a negative UV sentinel and
//! the shader substitutes white for the texture sample, so they ride in any
//! open batch.
//!
//! Windowing stays outside: integrators wrap an existing `wgpu::Device` and
//! point [`set_target`](WgpuDevice::set_target) at their surface view each
//! frame. [`WgpuDevice::headless`] instead renders into an offscreen texture
//! that [`read_back`](WgpuDevice::read_back) copies out, which is enough for
//! server-side rendering and the examples.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::bitmap::Bitmap;
use crate::device::{BatchDevice, QuadSubmit, TextureHandle};
use crate::math::{Color, Mat4, Vec2};

/// Per-vertex data for batched quads. Position is world-space, transformed
/// CPU-side; tints are packed RGBA read by the GPU as normalized u8x4.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BatchVertex {
    position: [f32; 2],
    uv: [f32; 2],
    tint: u32,
    additive: u32,
}

impl BatchVertex {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<BatchVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // tint
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Unorm8x4,
            },
            // additive
            wgpu::VertexAttribute {
                offset: 20,
                shader_location: 3,
                format: wgpu::VertexFormat::Unorm8x4,
            },
        ],
    };
}

/// Camera view-projection matrix uploaded as a uniform buffer.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// UV sentinel for untextured quads; the shader substitutes white.
const SOLID_UV: Vec2 = Vec2::splat(-1.0);

struct Offscreen {
    texture: wgpu::Texture,
    width: u32,
    height: u32,
}

/// The built-in wgpu batch device.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline_alpha: wgpu::RenderPipeline,
    pipeline_additive: wgpu::RenderPipeline,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    /// Bind groups for registered textures, indexed by handle.
    textures: Vec<wgpu::BindGroup>,
    /// 1x1 white fallback, bound when a batch holds only solid quads.
    white_bind_group: wgpu::BindGroup,
    bound: Option<TextureHandle>,
    additive: bool,
    vertices: Vec<BatchVertex>,
    indices: Vec<u32>,
    target: Option<wgpu::TextureView>,
    clear_color: wgpu::Color,
    cleared: bool,
    offscreen: Option<Offscreen>,
}

impl WgpuDevice {
    /// Wrap an existing device and queue. `format` must match the render
    /// target later given to [`set_target`](Self::set_target).
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glim batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        // Bind group layout 0: camera uniform
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("glim camera bind group layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        // Bind group layout 1: texture + sampler
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("glim texture bind group layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glim batch pipeline layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let additive_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let make_pipeline = |label: &str, blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[BatchVertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None, // quads are double-sided under mirroring
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let pipeline_alpha = make_pipeline("glim batch pipeline", wgpu::BlendState::ALPHA_BLENDING);
        let pipeline_additive = make_pipeline("glim batch pipeline (additive)", additive_blend);

        let camera_uniform = CameraUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glim camera uniform buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glim camera bind group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Nearest filtering keeps pixel-art tiles crisp; the bleed inset
        // covers the filtering cases that do blend across texels.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glim batch sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white_bind_group = create_texture_bind_group(
            &device,
            &queue,
            &texture_bind_group_layout,
            &sampler,
            &Bitmap::solid(1, 1, [255, 255, 255, 255]),
            "glim white 1x1",
        );

        Self {
            device,
            queue,
            pipeline_alpha,
            pipeline_additive,
            texture_bind_group_layout,
            camera_buffer,
            camera_bind_group,
            sampler,
            textures: Vec::new(),
            white_bind_group,
            bound: None,
            additive: false,
            vertices: Vec::new(),
            indices: Vec::new(),
            target: None,
            clear_color: wgpu::Color::BLACK,
            cleared: false,
            offscreen: None,
        }
    }

    /// Create a device with no window: instance, adapter, and queue are
    /// acquired blocking, and rendering goes to an offscreen texture of the
    /// given size. Pair with [`read_back`](Self::read_back).
    pub fn headless(width: u32, height: u32) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .expect("Failed to find a suitable GPU adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("glim device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .expect("Failed to create GPU device");

        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let mut this = Self::new(device, queue, format);

        let texture = this.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glim offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        this.target = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        this.offscreen = Some(Offscreen { texture, width, height });
        this
    }

    /// Point flushes at a render target for this frame. The first flush
    /// clears it to `clear`; later flushes load.
    pub fn set_target(&mut self, view: wgpu::TextureView, clear: Color) {
        self.target = Some(view);
        self.clear_color = wgpu::Color {
            r: clear.r as f64,
            g: clear.g as f64,
            b: clear.b as f64,
            a: clear.a as f64,
        };
        self.cleared = false;
    }

    /// Upload the camera view-projection and reset the clear state for a new
    /// frame. For headless devices the target persists; windowed integrators
    /// call [`set_target`](Self::set_target) as well.
    pub fn begin_frame(&mut self, view_proj: Mat4, clear: Color) {
        let uniform = CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
        self.clear_color = wgpu::Color {
            r: clear.r as f64,
            g: clear.g as f64,
            b: clear.b as f64,
            a: clear.a as f64,
        };
        self.cleared = false;
    }

    /// Copy the offscreen target back to the CPU. Blocks on the GPU; only
    /// valid for devices made with [`headless`](Self::headless).
    pub fn read_back(&self) -> Bitmap {
        let offscreen = self
            .offscreen
            .as_ref()
            .expect("read_back requires a headless device");
        let (width, height) = (offscreen.width, offscreen.height);

        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let unpadded = width * 4;
        let padded = unpadded.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glim read-back buffer"),
            size: (padded * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glim read-back encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &offscreen.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        slice.map_async(wgpu::MapMode::Read, |result| {
            result.expect("Failed to map read-back buffer");
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .expect("Failed to poll GPU device");

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for row in 0..height {
            let start = (row * padded) as usize;
            pixels.extend_from_slice(&data[start..start + unpadded as usize]);
        }
        drop(data);
        buffer.unmap();

        Bitmap::from_rgba8(width, height, pixels)
    }

    fn push_quad(&mut self, quad: &QuadSubmit) {
        let half = quad.size / 2.0;
        let (sin, cos) = quad.angle.sin_cos();
        let rotate = |v: Vec2| Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos);

        let corners = [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ]
        .map(|c| quad.pos + rotate(c));

        // Texture V grows downward while world Y grows up: the bottom-left
        // corner samples v_max.
        let uvs = if quad.is_solid() {
            [SOLID_UV; 4]
        } else {
            [
                Vec2::new(quad.uv_min.x, quad.uv_max.y),
                Vec2::new(quad.uv_max.x, quad.uv_max.y),
                Vec2::new(quad.uv_max.x, quad.uv_min.y),
                Vec2::new(quad.uv_min.x, quad.uv_min.y),
            ]
        };

        let base = self.vertices.len() as u32;
        for i in 0..4 {
            self.vertices.push(BatchVertex {
                position: corners[i].to_array(),
                uv: uvs[i].to_array(),
                tint: quad.tint,
                additive: quad.additive,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

impl BatchDevice for WgpuDevice {
    fn create_texture(&mut self, bitmap: &Bitmap) -> TextureHandle {
        let bind_group = create_texture_bind_group(
            &self.device,
            &self.queue,
            &self.texture_bind_group_layout,
            &self.sampler,
            bitmap,
            "glim texture",
        );
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(bind_group);
        handle
    }

    fn set_texture(&mut self, handle: TextureHandle) {
        self.bound = Some(handle);
    }

    fn set_blend_mode(&mut self, additive: bool) {
        self.additive = additive;
    }

    fn submit_quad(&mut self, quad: &QuadSubmit) {
        self.push_quad(quad);
    }

    fn submit_polygon(&mut self, points: &[Vec2], tint: u32) {
        if points.len() < 3 {
            return;
        }
        // Fan from the centroid; the contract only requires convex input.
        let centroid = points.iter().copied().sum::<Vec2>() / points.len() as f32;
        let base = self.vertices.len() as u32;
        self.vertices.push(BatchVertex {
            position: centroid.to_array(),
            uv: SOLID_UV.to_array(),
            tint,
            additive: 0,
        });
        for p in points {
            self.vertices.push(BatchVertex {
                position: p.to_array(),
                uv: SOLID_UV.to_array(),
                tint,
                additive: 0,
            });
        }
        let n = points.len() as u32;
        for i in 0..n {
            self.indices
                .extend_from_slice(&[base, base + 1 + i, base + 1 + (i + 1) % n]);
        }
        self.flush();
    }

    fn flush(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        let Some(target) = &self.target else {
            log::warn!("batch flush with no render target set; dropping {} vertices", self.vertices.len());
            self.vertices.clear();
            self.indices.clear();
            return;
        };

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("glim batch vertex buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("glim batch index buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glim batch encoder"),
            });
        {
            let load = if self.cleared {
                wgpu::LoadOp::Load
            } else {
                wgpu::LoadOp::Clear(self.clear_color)
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glim batch pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(if self.additive {
                &self.pipeline_additive
            } else {
                &self.pipeline_alpha
            });
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            let texture_bind_group = match self.bound {
                Some(handle) => &self.textures[handle.0 as usize],
                None => &self.white_bind_group,
            };
            pass.set_bind_group(1, texture_bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.indices.len() as u32, 0, 0..1);
        }
        // Fire-and-forget: enqueue and return without waiting.
        self.queue.submit(std::iter::once(encoder.finish()));
        self.cleared = true;

        self.vertices.clear();
        self.indices.clear();
    }
}

/// Upload a bitmap and build its texture+sampler bind group.
fn create_texture_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    bitmap: &Bitmap,
    label: &str,
) -> wgpu::BindGroup {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: bitmap.width(),
                height: bitmap.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        bitmap.data(),
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
