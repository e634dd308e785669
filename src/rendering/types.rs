//! GPU-facing data: vertex layouts, uniforms, meshes and the per-frame draw list.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Mesh vertex (position, normal, texture coordinate)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-instance data for the mesh pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    /// Linear RGB + alpha
    pub color: [f32; 4],
    /// x: texture weight (0 = flat color), y: lit (0 or 1)
    pub params: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4,
        7 => Float32x4, 8 => Float32x4
    ];

    pub fn new(model: Mat4, color: Vec4, texture_weight: f32, lit: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: color.to_array(),
            params: [texture_weight, if lit { 1.0 } else { 0.0 }, 0.0, 0.0],
        }
    }

    /// Unlit, untextured
    pub fn flat(model: Mat4, color: Vec3, alpha: f32) -> Self {
        Self::new(model, color.extend(alpha), 0.0, false)
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Vertex of a line strip
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Scene pass uniforms (camera + light)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    /// Direction towards the key light (xyz), w unused
    pub light_dir: [f32; 4],
    /// x: ambient intensity, y: key light intensity
    pub lighting: [f32; 4],
}

/// Post pass uniforms (depth of field + bloom)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PostUniforms {
    pub texel_size: [f32; 2],
    pub near: f32,
    pub far: f32,
    pub focus_distance: f32,
    pub focus_range: f32,
    pub bokeh_scale: f32,
    pub bloom_threshold: f32,
    pub bloom_intensity: f32,
    pub bloom_radius: f32,
    pub _padding: [f32; 2],
}

/// Indexed triangle mesh on the CPU
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned box of `size` centred on `center`, with per-face
    /// normals and UVs covering each face
    pub fn cuboid(size: Vec3, center: Vec3) -> Self {
        let h = size * 0.5;
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = MeshData::default();
        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = normal + u * su + v * sv;
                mesh.vertices.push(Vertex {
                    position: (center + corner * h).to_array(),
                    normal: normal.to_array(),
                    uv: [(su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5],
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Horizontal square of side `size` at height `y`, facing up
    pub fn plane(size: f32, y: f32) -> Self {
        let h = size * 0.5;
        let corners = [(-h, h), (h, h), (h, -h), (-h, -h)];
        let vertices = corners
            .iter()
            .map(|&(x, z)| Vertex {
                position: [x, y, z],
                normal: [0.0, 1.0, 0.0],
                uv: [x / size + 0.5, z / size + 0.5],
            })
            .collect();
        Self {
            vertices,
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

/// Meshes uploaded once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshId {
    Cube,
    Plane,
    Bar,
    Sparkle,
}

/// Instances of one mesh
#[derive(Debug, Clone)]
pub struct MeshBatch {
    pub mesh: MeshId,
    pub instances: Vec<InstanceRaw>,
}

/// Everything drawn in one frame, in submission order
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub batches: Vec<MeshBatch>,
    /// Each inner vector is one line strip
    pub lines: Vec<Vec<LineVertex>>,
    /// Drawn after lines (translucent overlays)
    pub overlays: Vec<MeshBatch>,
}

impl DrawList {
    pub fn clear(&mut self) {
        self.batches.clear();
        self.lines.clear();
        self.overlays.clear();
    }

    pub fn push_line(&mut self, points: &[Vec3], model: Mat4, color: Vec4) {
        if points.len() < 2 {
            return;
        }
        self.lines.push(
            points
                .iter()
                .map(|p| LineVertex {
                    position: model.transform_point3(*p).to_array(),
                    color: color.to_array(),
                })
                .collect(),
        );
    }

    pub fn instance_count(&self) -> usize {
        self.batches
            .iter()
            .chain(self.overlays.iter())
            .map(|b| b.instances.len())
            .sum()
    }

    pub fn line_vertex_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }
}
