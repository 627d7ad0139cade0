//! Image viewer overlay: dimmed backdrop with a close mark, and the
//! selected photo fitted to the screen.

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;

/// Largest share of the screen the photo may cover
pub const MAX_WIDTH_FRACTION: f32 = 0.9;
pub const MAX_HEIGHT_FRACTION: f32 = 0.85;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OverlayUniform {
    /// Photo rectangle in NDC: min x, min y, max x, max y
    pub rect: [f32; 4],
    /// width, height, has image, encode sRGB
    pub screen: [f32; 4],
}

/// Aspect-fit an image into the allowed part of the screen, centered.
/// Returns the rectangle in NDC.
pub fn fit_rect(image: (u32, u32), screen: (u32, u32)) -> [f32; 4] {
    let (iw, ih) = (image.0.max(1) as f32, image.1.max(1) as f32);
    let (sw, sh) = (screen.0.max(1) as f32, screen.1.max(1) as f32);
    let scale = (sw * MAX_WIDTH_FRACTION / iw).min(sh * MAX_HEIGHT_FRACTION / ih);
    let half_w = iw * scale / sw;
    let half_h = ih * scale / sh;
    [-half_w, -half_h, half_w, half_h]
}

pub struct OverlayPipeline {
    backdrop: wgpu::RenderPipeline,
    image: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    image_size: Option<(u32, u32)>,
    encode_srgb: bool,
}

impl OverlayPipeline {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/overlay.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay_bind_group_layout"),
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let build = |label: &str, vs: &str, fs: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(vs),
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
                    entry_point: Some(fs),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("overlay_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("overlay_uniform"),
            size: std::mem::size_of::<OverlayUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Placeholder until a photo is loaded
        let placeholder = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 0]));
        let view = upload_texture(device, queue, &placeholder);

        let backdrop = build("overlay_backdrop_pipeline", "vs_backdrop", "fs_backdrop");
        let image = build("overlay_image_pipeline", "vs_image", "fs_image");
        let bind_group = create_bind_group(device, &bind_group_layout, &uniform_buffer, &view, &sampler);

        Self {
            backdrop,
            image,
            bind_group_layout,
            sampler,
            uniform_buffer,
            bind_group,
            image_size: None,
            encode_srgb: !surface_format.is_srgb(),
        }
    }

    /// Replace the displayed photo; `None` shows only the backdrop.
    pub fn set_image(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, image: Option<&RgbaImage>) {
        let Some(image) = image else {
            self.image_size = None;
            return;
        };
        let view = upload_texture(device, queue, image);
        self.bind_group = create_bind_group(device, &self.bind_group_layout, &self.uniform_buffer, &view, &self.sampler);
        self.image_size = Some(image.dimensions());
    }

    pub fn has_image(&self) -> bool {
        self.image_size.is_some()
    }

    pub fn update(&self, queue: &wgpu::Queue, screen: (u32, u32)) {
        let rect = self.image_size.map_or([0.0; 4], |size| fit_rect(size, screen));
        let uniform = OverlayUniform {
            rect,
            screen: [
                screen.0 as f32,
                screen.1 as f32,
                if self.has_image() { 1.0 } else { 0.0 },
                if self.encode_srgb { 1.0 } else { 0.0 },
            ],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draw over the already composited frame.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("overlay_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_pipeline(&self.backdrop);
        pass.draw(0..3, 0..1);
        if self.has_image() {
            pass.set_pipeline(&self.image);
            pass.draw(0..6, 0..1);
        }
    }
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage) -> wgpu::TextureView {
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("viewer_image"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform: &wgpu::Buffer,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("overlay_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(view) },
            wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(sampler) },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_image_is_width_bound() {
        let [x0, y0, x1, y1] = fit_rect((2000, 500), (1000, 1000));
        assert!((x1 - MAX_WIDTH_FRACTION).abs() < 1e-6);
        assert!((x0 + x1).abs() < 1e-6);
        assert!((y1 - MAX_WIDTH_FRACTION * 0.25).abs() < 1e-6);
        assert!((y0 + y1).abs() < 1e-6);
    }

    #[test]
    fn test_tall_image_is_height_bound() {
        let [_, _, x1, y1] = fit_rect((400, 800), (1280, 720));
        assert!((y1 - MAX_HEIGHT_FRACTION).abs() < 1e-6);
        // Aspect survives in pixels
        let width_px = x1 * 1280.0;
        let height_px = y1 * 720.0;
        assert!((width_px / height_px - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_sizes() {
        let rect = fit_rect((0, 0), (0, 0));
        assert!(rect.iter().all(|v| v.is_finite()));
    }
}
