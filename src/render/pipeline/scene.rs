//! Forward pass: lit and unlit instanced meshes into the HDR target

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::render::buffer::InstanceBuffer;
use crate::render::mesh::Vertex;
use crate::render::texture::{DEPTH_FORMAT, HDR_FORMAT};
use crate::scene::{DrawBatch, Material};

/// Dynamic-offset stride for batch uniforms
pub const BATCH_STRIDE: u64 = 256;

/// Per-draw uniform: node world matrix and material.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BatchUniform {
    pub world: [[f32; 4]; 4],
    /// Linear base color, a = opacity
    pub color: [f32; 4],
    /// Linear emissive radiance
    pub emissive: [f32; 4],
    /// roughness, metalness, unlit flag, unused
    pub surface: [f32; 4],
}

impl BatchUniform {
    pub fn from_batch(batch: &DrawBatch) -> Self {
        let Material { color, roughness, metalness, opacity, unlit, .. } = batch.material;
        let [r, g, b] = color.to_linear();
        let [er, eg, eb] = batch.material.emissive_linear();
        Self {
            world: batch.world_transform.to_cols_array_2d(),
            color: [r, g, b, opacity],
            emissive: [er, eg, eb, 0.0],
            surface: [roughness, metalness, if unlit { 1.0 } else { 0.0 }, 0.0],
        }
    }
}

pub struct ScenePipeline {
    opaque: wgpu::RenderPipeline,
    transparent: wgpu::RenderPipeline,
    frame_layout: wgpu::BindGroupLayout,
    batch_layout: wgpu::BindGroupLayout,
}

impl ScenePipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/scene.wgsl").into()),
        });

        let uniform_entry = |binding: u32, visibility: wgpu::ShaderStages, dynamic: bool, size: Option<NonZeroU64>| {
            wgpu::BindGroupLayoutEntry {
                binding,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: dynamic,
                    min_binding_size: size,
                },
                count: None,
            }
        };

        // Group 0: camera + lights, once per frame
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_frame_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, false, None),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT, false, None),
            ],
        });

        // Group 1: one batch uniform, selected by dynamic offset
        let batch_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_batch_layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                true,
                NonZeroU64::new(std::mem::size_of::<BatchUniform>() as u64),
            )],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &batch_layout],
            immediate_size: 0,
        });

        let build = |label: &str, blend: wgpu::BlendState, depth_write_enabled: bool, cull_mode: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::layout(), InstanceBuffer::layout()],
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        let opaque = build("scene_opaque_pipeline", wgpu::BlendState::REPLACE, true, Some(wgpu::Face::Back));
        // Alpha accumulates so post can tell drawn pixels from background
        let transparent = build(
            "scene_transparent_pipeline",
            wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            false,
            None,
        );

        Self { opaque, transparent, frame_layout, batch_layout }
    }

    pub fn create_frame_bind_group(
        &self,
        device: &wgpu::Device,
        camera: &wgpu::Buffer,
        lights: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_frame_bind_group"),
            layout: &self.frame_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: camera.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: lights.as_entire_binding() },
            ],
        })
    }

    pub fn create_batch_bind_group(&self, device: &wgpu::Device, batches: &wgpu::Buffer) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_batch_bind_group"),
            layout: &self.batch_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: batches,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<BatchUniform>() as u64),
                }),
            }],
        })
    }

    /// Per-batch layout, shared with passes that draw the same batches
    pub fn batch_layout(&self) -> &wgpu::BindGroupLayout {
        &self.batch_layout
    }

    pub fn pipeline_for(&self, material: &Material) -> &wgpu::RenderPipeline {
        if material.is_transparent() {
            &self.transparent
        } else {
            &self.opaque
        }
    }
}
