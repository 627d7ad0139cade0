//! Packed light list for the forward pass.

use bytemuck::{Pod, Zeroable};

use crate::scene::{FlatLight, LightKind};

/// Lights beyond this are dropped with a warning
pub const MAX_LIGHTS: usize = 8;

/// Reflection fill standing in for an environment map: rgb, strength
pub const ENVIRONMENT_FILL: [f32; 4] = [0.62, 0.58, 0.52, 0.6];

const KIND_POINT: f32 = 0.0;
const KIND_SPOT: f32 = 1.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz = world position, w = kind
    pub position: [f32; 4],
    /// rgb = linear color times intensity, w = range
    pub color: [f32; 4],
    /// xyz = spot direction, w = cosine of the outer cone
    pub direction: [f32; 4],
    /// x = cosine of the inner cone
    pub cone: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightsUniform {
    /// Summed ambient lights, rgb
    pub ambient: [f32; 4],
    pub environment: [f32; 4],
    /// x = number of used entries in `lights`
    pub count: [u32; 4],
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl LightsUniform {
    pub fn pack(lights: &[FlatLight]) -> Self {
        let mut uniform = Self {
            ambient: [0.0; 4],
            environment: ENVIRONMENT_FILL,
            count: [0; 4],
            lights: [GpuLight::default(); MAX_LIGHTS],
        };

        let mut used = 0;
        for flat in lights {
            let [r, g, b] = flat.light.color.to_linear().map(|c| c * flat.light.intensity);
            let p = flat.position;
            let gpu = match flat.light.kind {
                LightKind::Ambient => {
                    uniform.ambient[0] += r;
                    uniform.ambient[1] += g;
                    uniform.ambient[2] += b;
                    continue;
                }
                LightKind::Point { range } => GpuLight {
                    position: [p.x, p.y, p.z, KIND_POINT],
                    color: [r, g, b, range],
                    ..Default::default()
                },
                LightKind::Spot { range, angle, penumbra, .. } => {
                    let d = flat.direction;
                    GpuLight {
                        position: [p.x, p.y, p.z, KIND_SPOT],
                        color: [r, g, b, range],
                        direction: [d.x, d.y, d.z, angle.cos()],
                        cone: [(angle * (1.0 - penumbra)).cos(), 0.0, 0.0, 0.0],
                    }
                }
            };

            if used == MAX_LIGHTS {
                log::warn!("More than {} lights in scene, extra lights ignored", MAX_LIGHTS);
                break;
            }
            uniform.lights[used] = gpu;
            used += 1;
        }
        uniform.count[0] = used as u32;
        uniform
    }
}

/// GPU buffer for the light list
pub struct LightBuffer {
    buffer: wgpu::Buffer,
}

impl LightBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lights_uniform"),
            size: std::mem::size_of::<LightsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn update(&self, queue: &wgpu::Queue, lights: &[FlatLight]) {
        let uniform = LightsUniform::pack(lights);
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}
