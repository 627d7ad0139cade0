//! Post-processing: bloom, tone mapping, vignette, grain and the background
//! gradient, as four fullscreen passes.

use bytemuck::{Pod, Zeroable};

use crate::render::texture::{RenderTargets, HDR_FORMAT};
use crate::scene::PostSettings;

/// Post-process uniform data (must match shader struct exactly)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PostUniform {
    pub background_inner: [f32; 4],
    pub background_outer: [f32; 4],
    /// xy = gradient center in uv, zw = output size in pixels
    pub center_resolution: [f32; 4],
    /// threshold, intensity, spread, exposure
    pub bloom: [f32; 4],
    /// vignette offset, vignette darkness, grain, elapsed seconds
    pub effects: [f32; 4],
    /// x = 1 when the output needs sRGB encoding in the shader
    pub flags: [f32; 4],
}

impl PostUniform {
    pub fn new(settings: &PostSettings, size: (u32, u32), elapsed: f32, encode_srgb: bool) -> Self {
        let [ir, ig, ib] = settings.background.inner.to_linear();
        let [or, og, ob] = settings.background.outer.to_linear();
        let center = settings.background.center;
        Self {
            background_inner: [ir, ig, ib, 1.0],
            background_outer: [or, og, ob, 1.0],
            center_resolution: [center.x, center.y, size.0 as f32, size.1 as f32],
            bloom: [
                settings.bloom.threshold,
                settings.bloom.intensity,
                settings.bloom.radius,
                settings.exposure,
            ],
            effects: [settings.vignette.offset, settings.vignette.darkness, settings.grain, elapsed],
            flags: [if encode_srgb { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

/// Bind groups tied to the current render targets.
pub struct PostBindings {
    bright: wgpu::BindGroup,
    blur_h: wgpu::BindGroup,
    blur_v: wgpu::BindGroup,
    composite: wgpu::BindGroup,
}

pub struct PostPipeline {
    bright: wgpu::RenderPipeline,
    blur_h: wgpu::RenderPipeline,
    blur_v: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    encode_srgb: bool,
}

impl PostPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/post.wgsl").into()),
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        // Bind group layout: source, auxiliary texture, sampler, params
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post_bind_group_layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let build = |label: &str, entry_point: &str, format: wgpu::TextureFormat| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
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
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("post_uniform"),
            size: std::mem::size_of::<PostUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            bright: build("bloom_bright_pipeline", "fs_bright", HDR_FORMAT),
            blur_h: build("bloom_blur_h_pipeline", "fs_blur_h", HDR_FORMAT),
            blur_v: build("bloom_blur_v_pipeline", "fs_blur_v", HDR_FORMAT),
            composite: build("post_composite_pipeline", "fs_composite", surface_format),
            bind_group_layout,
            sampler,
            uniform_buffer,
            encode_srgb: !surface_format.is_srgb(),
        }
    }

    /// Build the bind groups for each pass. Call again after resize.
    ///
    /// No pass samples the texture it writes: bright reads hdr into
    /// bloom_a, blur_h reads bloom_a into bloom_b, blur_v reads bloom_b
    /// back into bloom_a, composite reads hdr and bloom_a.
    pub fn create_bindings(&self, device: &wgpu::Device, targets: &RenderTargets) -> PostBindings {
        let group = |label: &str, source: &wgpu::TextureView, aux: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(source) },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(aux) },
                    wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                    wgpu::BindGroupEntry { binding: 3, resource: self.uniform_buffer.as_entire_binding() },
                ],
            })
        };

        PostBindings {
            bright: group("bloom_bright_bind_group", targets.hdr_view(), targets.bloom_b_view()),
            blur_h: group("bloom_blur_h_bind_group", targets.bloom_a_view(), targets.hdr_view()),
            blur_v: group("bloom_blur_v_bind_group", targets.bloom_b_view(), targets.hdr_view()),
            composite: group("post_composite_bind_group", targets.hdr_view(), targets.bloom_a_view()),
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, settings: &PostSettings, size: (u32, u32), elapsed: f32) {
        let uniform = PostUniform::new(settings, size, elapsed, self.encode_srgb);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        bindings: &PostBindings,
        targets: &RenderTargets,
        output: &wgpu::TextureView,
    ) {
        let passes = [
            ("bloom_bright_pass", &self.bright, &bindings.bright, targets.bloom_a_view()),
            ("bloom_blur_h_pass", &self.blur_h, &bindings.blur_h, targets.bloom_b_view()),
            ("bloom_blur_v_pass", &self.blur_v, &bindings.blur_v, targets.bloom_a_view()),
            ("post_composite_pass", &self.composite, &bindings.composite, output),
        ];

        for (label, pipeline, bind_group, target) in passes {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1); // Fullscreen triangle
        }
    }
}
