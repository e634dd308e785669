//! Rendering system with wgpu pipelines: scene pass into an HDR target,
//! then a fullscreen post pass (depth of field + bloom) onto the surface.

mod types;

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use bytemuck::Zeroable;
use thiserror::Error;
use wgpu::util::DeviceExt;

pub use types::{
    DrawList, InstanceRaw, LineVertex, MeshBatch, MeshData, MeshId, PostUniforms, SceneUniforms,
    Vertex,
};

use crate::params::RenderConfig;

const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// RGBA8 pixels of the baked texture, or a single white texel when the
/// file is missing or unreadable
pub fn texture_pixels(path: &Path) -> (Vec<u8>, u32, u32) {
    match image::open(path) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            log::info!("Loaded texture {} ({}x{})", path.display(), width, height);
            (rgba.into_raw(), width, height)
        }
        Err(e) => {
            log::warn!(
                "Texture {} unavailable ({}); using flat tint",
                path.display(),
                e
            );
            (vec![255; 4], 1, 1)
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Vertex buffer rewritten every frame, grown when a frame needs more
struct DynamicBuffer {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl DynamicBuffer {
    fn new(device: &wgpu::Device, label: &'static str, capacity: u64) -> Self {
        Self {
            label,
            buffer: Self::allocate(device, label, capacity),
            capacity,
        }
    }

    fn allocate(device: &wgpu::Device, label: &'static str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.capacity);
            log::debug!("{} grown to {} bytes", self.label, self.capacity);
        }
        queue.write_buffer(&self.buffer, 0, bytes);
    }
}

/// Offscreen color + depth the scene pass renders into
struct Targets {
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let target = |label, format| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        Self {
            color_view: target("Scene Color", HDR_FORMAT),
            depth_view: target("Scene Depth", DEPTH_FORMAT),
        }
    }
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    mesh_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    post_pipeline: wgpu::RenderPipeline,
    scene_uniform_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    post_uniform_buffer: wgpu::Buffer,
    post_bind_group_layout: wgpu::BindGroupLayout,
    post_bind_group: wgpu::BindGroup,
    post_sampler: wgpu::Sampler,
    targets: Targets,
    meshes: HashMap<MeshId, GpuMesh>,
    instances: DynamicBuffer,
    lines: DynamicBuffer,
    clear_color: wgpu::Color,
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(
        window: Arc<winit::window::Window>,
        render_config: &RenderConfig,
        meshes: &[(MeshId, MeshData)],
        texture_path: &Path,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Surface needs a 'static window, hence the Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });
        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("post.wgsl").into()),
        });

        // Scene uniforms + baked texture
        let scene_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SceneUniforms::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let texture_view = Self::upload_texture(&device, &queue, texture_path);
        let texture_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Baked Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture_sampler),
                },
            ],
        });

        let scene_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&scene_bind_group_layout],
                push_constant_ranges: &[],
            });

        let mesh_pipeline = Self::scene_pipeline(
            &device,
            &scene_pipeline_layout,
            &scene_shader,
            SceneStage::Mesh { depth_write: true },
        );
        let overlay_pipeline = Self::scene_pipeline(
            &device,
            &scene_pipeline_layout,
            &scene_shader,
            SceneStage::Mesh { depth_write: false },
        );
        let line_pipeline = Self::scene_pipeline(
            &device,
            &scene_pipeline_layout,
            &scene_shader,
            SceneStage::Lines,
        );

        // Post pass
        let post_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Post Uniform Buffer"),
            contents: bytemuck::cast_slice(&[PostUniforms::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let post_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let post_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Post Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Depth,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let targets = Targets::new(&device, width, height);
        let post_bind_group = Self::post_bind_group(
            &device,
            &post_bind_group_layout,
            &post_uniform_buffer,
            &targets,
            &post_sampler,
        );

        let post_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&post_bind_group_layout],
            push_constant_ranges: &[],
        });

        let post_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Post Pipeline"),
            layout: Some(&post_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &post_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &post_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let meshes = meshes
            .iter()
            .map(|(id, mesh)| (*id, Self::upload_mesh(&device, *id, mesh)))
            .collect();

        let [r, g, b] = render_config.clear_color;

        Ok(Self {
            instances: DynamicBuffer::new(&device, "Instance Buffer", 64 * 1024),
            lines: DynamicBuffer::new(&device, "Line Buffer", 64 * 1024),
            surface,
            device,
            queue,
            config,
            mesh_pipeline,
            overlay_pipeline,
            line_pipeline,
            post_pipeline,
            scene_uniform_buffer,
            scene_bind_group,
            post_uniform_buffer,
            post_bind_group_layout,
            post_bind_group,
            post_sampler,
            targets,
            meshes,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        })
    }

    fn upload_mesh(device: &wgpu::Device, id: MeshId, mesh: &MeshData) -> GpuMesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", id)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", id)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    fn upload_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> wgpu::TextureView {
        let (pixels, width, height) = texture_pixels(path);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Baked Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn post_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &wgpu::Buffer,
        targets: &Targets,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Post Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&targets.color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&targets.depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn scene_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        stage: SceneStage,
    ) -> wgpu::RenderPipeline {
        let mesh_buffers = [Vertex::layout(), InstanceRaw::layout()];
        let line_buffers = [LineVertex::layout()];

        let (label, vs, fs, buffers, topology, depth_write) = match stage {
            SceneStage::Mesh { depth_write: true } => (
                "Mesh Pipeline",
                "vs_mesh",
                "fs_mesh",
                &mesh_buffers[..],
                wgpu::PrimitiveTopology::TriangleList,
                true,
            ),
            SceneStage::Mesh { depth_write: false } => (
                "Overlay Pipeline",
                "vs_mesh",
                "fs_mesh",
                &mesh_buffers[..],
                wgpu::PrimitiveTopology::TriangleList,
                false,
            ),
            SceneStage::Lines => (
                "Line Pipeline",
                "vs_line",
                "fs_line",
                &line_buffers[..],
                wgpu::PrimitiveTopology::LineStrip,
                true,
            ),
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(vs),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fs),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Plane and hover shell are seen from both sides
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_write,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Current surface size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Reconfigure the surface and offscreen targets; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.targets = Targets::new(&self.device, width, height);
        self.post_bind_group = Self::post_bind_group(
            &self.device,
            &self.post_bind_group_layout,
            &self.post_uniform_buffer,
            &self.targets,
            &self.post_sampler,
        );
    }

    /// Reconfigure with the current size (after a lost or outdated surface)
    pub fn reconfigure(&mut self) {
        let (width, height) = self.size();
        self.resize(width, height);
    }

    /// Upload this frame's data and render it
    pub fn render(
        &mut self,
        draw: &DrawList,
        scene: &SceneUniforms,
        post: &PostUniforms,
    ) -> Result<(), wgpu::SurfaceError> {
        self.queue.write_buffer(
            &self.scene_uniform_buffer,
            0,
            bytemuck::cast_slice(&[*scene]),
        );
        self.queue
            .write_buffer(&self.post_uniform_buffer, 0, bytemuck::cast_slice(&[*post]));

        let (instances, batch_ranges) = pack_instances(draw);
        let (line_vertices, line_ranges) = pack_lines(draw);
        self.instances
            .write(&self.device, &self.queue, bytemuck::cast_slice(&instances));
        self.lines
            .write(&self.device, &self.queue, bytemuck::cast_slice(&line_vertices));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.scene_bind_group, &[]);

            let (opaque, overlay) = batch_ranges.split_at(draw.batches.len());

            pass.set_pipeline(&self.mesh_pipeline);
            self.draw_batches(&mut pass, draw.batches.iter().zip(opaque));

            if !line_ranges.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.lines.buffer.slice(..));
                for range in &line_ranges {
                    pass.draw(range.clone(), 0..1);
                }
            }

            pass.set_pipeline(&self.overlay_pipeline);
            self.draw_batches(&mut pass, draw.overlays.iter().zip(overlay));
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Post Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.post_pipeline);
            pass.set_bind_group(0, &self.post_bind_group, &[]);
            pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn draw_batches<'a>(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        batches: impl Iterator<Item = (&'a MeshBatch, &'a Range<u32>)>,
    ) {
        for (batch, range) in batches {
            let Some(mesh) = self.meshes.get(&batch.mesh) else {
                continue;
            };
            if range.is_empty() {
                continue;
            }
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, self.instances.buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, range.clone());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SceneStage {
    Mesh { depth_write: bool },
    Lines,
}

/// Flatten opaque batches then overlays into one instance array; returns
/// the instance range of each batch in that order
fn pack_instances(draw: &DrawList) -> (Vec<InstanceRaw>, Vec<Range<u32>>) {
    let mut instances = Vec::with_capacity(draw.instance_count());
    let mut ranges = Vec::with_capacity(draw.batches.len() + draw.overlays.len());
    for batch in draw.batches.iter().chain(draw.overlays.iter()) {
        let start = instances.len() as u32;
        instances.extend_from_slice(&batch.instances);
        ranges.push(start..instances.len() as u32);
    }
    (instances, ranges)
}

/// Flatten line strips into one vertex array; returns each strip's range
fn pack_lines(draw: &DrawList) -> (Vec<LineVertex>, Vec<Range<u32>>) {
    let mut vertices = Vec::with_capacity(draw.line_vertex_count());
    let mut ranges = Vec::with_capacity(draw.lines.len());
    for strip in &draw.lines {
        let start = vertices.len() as u32;
        vertices.extend_from_slice(strip);
        ranges.push(start..vertices.len() as u32);
    }
    (vertices, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3, Vec4};

    #[test]
    fn test_pack_instances_keeps_batch_order() {
        let mut draw = DrawList::default();
        let one = InstanceRaw::flat(Mat4::IDENTITY, Vec3::ONE, 1.0);
        draw.batches.push(MeshBatch {
            mesh: MeshId::Cube,
            instances: vec![one; 2],
        });
        draw.batches.push(MeshBatch {
            mesh: MeshId::Bar,
            instances: vec![one; 3],
        });
        draw.overlays.push(MeshBatch {
            mesh: MeshId::Sparkle,
            instances: vec![one; 4],
        });

        let (instances, ranges) = pack_instances(&draw);
        assert_eq!(instances.len(), 9);
        assert_eq!(ranges, vec![0..2, 2..5, 5..9]);
    }

    #[test]
    fn test_pack_lines_ranges() {
        let mut draw = DrawList::default();
        let points = [Vec3::ZERO, Vec3::X, Vec3::Y];
        draw.push_line(&points, Mat4::IDENTITY, Vec4::ONE);
        draw.push_line(&points[..2], Mat4::IDENTITY, Vec4::ONE);

        let (vertices, ranges) = pack_lines(&draw);
        assert_eq!(vertices.len(), 5);
        assert_eq!(ranges, vec![0..3, 3..5]);
    }

    #[test]
    fn test_missing_texture_falls_back_to_white() {
        let (pixels, width, height) = texture_pixels(Path::new("/nonexistent/baked.png"));
        assert_eq!((width, height), (1, 1));
        assert_eq!(pixels, vec![255; 4]);
    }

    #[test]
    fn test_texture_pixels_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baked.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let (pixels, width, height) = texture_pixels(&path);
        assert_eq!((width, height), (3, 2));
        assert_eq!(&pixels[..4], &[10, 20, 30, 255]);
    }
}
