//! Contact shadow passes: casters rendered from below into a darkness map,
//! two rounds of separable blur, then a ground quad drawn in the scene pass.

use bytemuck::{Pod, Zeroable};

use crate::render::buffer::InstanceBuffer;
use crate::render::mesh::Vertex;
use crate::render::texture::{DEPTH_FORMAT, HDR_FORMAT};
use crate::scene::ContactShadowSettings;

/// Darkness map size, square
pub const CONTACT_SHADOW_RESOLUTION: u32 = 512;
pub const CONTACT_SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CasterUniform {
    pub view_proj: [[f32; 4]; 4],
    /// x = darkness
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BlurUniform {
    /// xy = uv offset per tap
    pub step: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PlaneUniform {
    /// xyz = quad center, w = side length
    pub center_scale: [f32; 4],
    /// x = opacity
    pub params: [f32; 4],
}

impl CasterUniform {
    pub fn new(settings: &ContactShadowSettings) -> Self {
        Self {
            view_proj: settings.projection().to_cols_array_2d(),
            params: [settings.darkness, 0.0, 0.0, 0.0],
        }
    }
}

impl PlaneUniform {
    pub fn new(settings: &ContactShadowSettings) -> Self {
        let c = settings.center;
        Self {
            center_scale: [c.x, c.y, c.z, settings.scale],
            params: [settings.opacity, 0.0, 0.0, 0.0],
        }
    }
}

fn blur_uniforms(settings: &ContactShadowSettings) -> [BlurUniform; 4] {
    settings.blur_steps().map(|step| BlurUniform { step: [step.x, step.y, 0.0, 0.0] })
}

pub struct ContactShadowPipeline {
    caster: wgpu::RenderPipeline,
    blur: wgpu::RenderPipeline,
    plane: wgpu::RenderPipeline,

    caster_buffer: wgpu::Buffer,
    caster_group: wgpu::BindGroup,
    blur_buffers: [wgpu::Buffer; 4],
    /// Ping-pong: a → b, b → a, a → b, b → a
    blur_groups: [wgpu::BindGroup; 4],
    plane_buffer: wgpu::Buffer,
    plane_group: wgpu::BindGroup,
    camera_group: wgpu::BindGroup,

    #[allow(dead_code)]
    map_a: wgpu::Texture,
    #[allow(dead_code)]
    map_b: wgpu::Texture,
    map_a_view: wgpu::TextureView,
    map_b_view: wgpu::TextureView,
}

impl ContactShadowPipeline {
    /// `batch_layout` is the scene's per-batch layout, so casters reuse the
    /// batch uniforms already written for the frame.
    pub fn new(device: &wgpu::Device, batch_layout: &wgpu::BindGroupLayout, camera: &wgpu::Buffer) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("contact_shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/shadow.wgsl").into()),
        });

        let uniform_entry = |binding: u32, visibility: wgpu::ShaderStages| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let map_entry = wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let caster_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("contact_caster_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let blur_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("contact_blur_layout"),
            entries: &[map_entry, sampler_entry, uniform_entry(3, wgpu::ShaderStages::FRAGMENT)],
        });
        let plane_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("contact_plane_layout"),
            entries: &[
                map_entry,
                sampler_entry,
                uniform_entry(4, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("contact_camera_layout"),
            entries: &[uniform_entry(1, wgpu::ShaderStages::VERTEX)],
        });

        let layout = |label: &str, groups: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: groups,
                immediate_size: 0,
            })
        };
        let caster_pipeline_layout = layout("contact_caster_pipeline_layout", &[&caster_layout, batch_layout]);
        let blur_pipeline_layout = layout("contact_blur_pipeline_layout", &[&blur_layout]);
        let plane_pipeline_layout = layout("contact_plane_pipeline_layout", &[&plane_layout, &camera_layout]);

        let caster = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("contact_caster_pipeline"),
            layout: Some(&caster_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_caster"),
                buffers: &[Vertex::layout(), InstanceBuffer::layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_caster"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CONTACT_SHADOW_FORMAT,
                    // Nearest caster wins without a depth buffer
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Max,
                        },
                        alpha: wgpu::BlendComponent::REPLACE,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let blur = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("contact_blur_pipeline"),
            layout: Some(&blur_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_fullscreen"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_blur"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CONTACT_SHADOW_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let plane = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("contact_plane_pipeline"),
            layout: Some(&plane_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_plane"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_plane"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                        // Coverage darkens the background gradient in composite
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("contact_shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let caster_buffer = uniform_buffer("contact_caster_uniform", std::mem::size_of::<CasterUniform>());
        let plane_buffer = uniform_buffer("contact_plane_uniform", std::mem::size_of::<PlaneUniform>());
        let blur_buffers: [wgpu::Buffer; 4] =
            std::array::from_fn(|_| uniform_buffer("contact_blur_uniform", std::mem::size_of::<BlurUniform>()));

        let map = |label: &str| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: CONTACT_SHADOW_RESOLUTION,
                    height: CONTACT_SHADOW_RESOLUTION,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: CONTACT_SHADOW_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let map_a = map("contact_shadow_a");
        let map_b = map("contact_shadow_b");
        let map_a_view = map_a.create_view(&wgpu::TextureViewDescriptor::default());
        let map_b_view = map_b.create_view(&wgpu::TextureViewDescriptor::default());

        let caster_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("contact_caster_bind_group"),
            layout: &caster_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: caster_buffer.as_entire_binding() }],
        });

        let sampled_group = |label: &str, layout: &wgpu::BindGroupLayout, source: &wgpu::TextureView, binding: u32, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(source) },
                    wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&sampler) },
                    wgpu::BindGroupEntry { binding, resource: buffer.as_entire_binding() },
                ],
            })
        };
        let blur_groups = std::array::from_fn(|i| {
            let source = if i % 2 == 0 { &map_a_view } else { &map_b_view };
            sampled_group("contact_blur_bind_group", &blur_layout, source, 3, &blur_buffers[i])
        });
        // Blur rounds end in map a
        let plane_group = sampled_group("contact_plane_bind_group", &plane_layout, &map_a_view, 4, &plane_buffer);

        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("contact_camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry { binding: 1, resource: camera.as_entire_binding() }],
        });

        Self {
            caster,
            blur,
            plane,
            caster_buffer,
            caster_group,
            blur_buffers,
            blur_groups,
            plane_buffer,
            plane_group,
            camera_group,
            map_a,
            map_b,
            map_a_view,
            map_b_view,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, settings: &ContactShadowSettings) {
        queue.write_buffer(&self.caster_buffer, 0, bytemuck::bytes_of(&CasterUniform::new(settings)));
        queue.write_buffer(&self.plane_buffer, 0, bytemuck::bytes_of(&PlaneUniform::new(settings)));
        for (buffer, uniform) in self.blur_buffers.iter().zip(blur_uniforms(settings)) {
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    /// Render the darkness map and blur it. `draw_casters` issues the
    /// instanced draws; group 0 and the pipeline are already bound, group 1
    /// is the batch uniform group.
    pub fn render_map(&self, encoder: &mut wgpu::CommandEncoder, draw_casters: impl FnOnce(&mut wgpu::RenderPass<'_>)) {
        {
            let mut pass = begin_map_pass(encoder, "contact_caster_pass", &self.map_a_view);
            pass.set_pipeline(&self.caster);
            pass.set_bind_group(0, &self.caster_group, &[]);
            draw_casters(&mut pass);
        }

        for (i, group) in self.blur_groups.iter().enumerate() {
            let target = if i % 2 == 0 { &self.map_b_view } else { &self.map_a_view };
            let mut pass = begin_map_pass(encoder, "contact_blur_pass", target);
            pass.set_pipeline(&self.blur);
            pass.set_bind_group(0, group, &[]);
            pass.draw(0..3, 0..1);
        }
    }

    /// Draw the ground quad inside the scene pass. Leaves groups 0 and 1
    /// bound to shadow resources; rebind before drawing batches again.
    pub fn draw_plane(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.plane);
        pass.set_bind_group(0, &self.plane_group, &[]);
        pass.set_bind_group(1, &self.camera_group, &[]);
        pass.draw(0..6, 0..1);
    }
}

fn begin_map_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<CasterUniform>(), 80);
        assert_eq!(std::mem::size_of::<BlurUniform>(), 16);
        assert_eq!(std::mem::size_of::<PlaneUniform>(), 32);
    }

    #[test]
    fn test_plane_uniform() {
        let settings = ContactShadowSettings { center: Vec3::new(0.0, -1.0, 2.0), ..Default::default() };
        let uniform = PlaneUniform::new(&settings);
        assert_eq!(uniform.center_scale, [0.0, -1.0, 2.0, 25.0]);
        assert_eq!(uniform.params[0], 0.7);
    }

    #[test]
    fn test_caster_uniform_carries_projection() {
        let settings = ContactShadowSettings::default();
        let uniform = CasterUniform::new(&settings);
        assert_eq!(uniform.view_proj, settings.projection().to_cols_array_2d());
        assert_eq!(uniform.params[0], 1.0);
    }

    #[test]
    fn test_blur_rounds_alternate_axes() {
        let uniforms = blur_uniforms(&ContactShadowSettings::default());
        assert!(uniforms[0].step[0] > 0.0 && uniforms[0].step[1] == 0.0);
        assert!(uniforms[1].step[0] == 0.0 && uniforms[1].step[1] > 0.0);
        assert!(uniforms[2].step[0] < uniforms[0].step[0]);
    }
}
