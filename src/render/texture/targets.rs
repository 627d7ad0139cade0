//! Offscreen render targets for the forward and post passes

use wgpu::{Device, Extent3d, Texture, TextureView};

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Scene color, depth and the two half-resolution bloom buffers.
///
/// - hdr: linear scene radiance, alpha 0 where nothing was drawn
/// - depth: forward pass depth
/// - bloom_a / bloom_b: ping-pong targets for the bright pass and blur
pub struct RenderTargets {
    #[allow(dead_code)]
    hdr: Texture,
    #[allow(dead_code)]
    depth: Texture,
    #[allow(dead_code)]
    bloom_a: Texture,
    #[allow(dead_code)]
    bloom_b: Texture,

    hdr_view: TextureView,
    depth_view: TextureView,
    bloom_a_view: TextureView,
    bloom_b_view: TextureView,

    width: u32,
    height: u32,
}

impl RenderTargets {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let full = Extent3d { width, height, depth_or_array_layers: 1 };
        let half = Extent3d {
            width: (width / 2).max(1),
            height: (height / 2).max(1),
            depth_or_array_layers: 1,
        };
        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        let hdr = create_texture(device, "scene_hdr", full, HDR_FORMAT, sampled);
        let depth = create_texture(device, "scene_depth", full, DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT);
        let bloom_a = create_texture(device, "bloom_a", half, HDR_FORMAT, sampled);
        let bloom_b = create_texture(device, "bloom_b", half, HDR_FORMAT, sampled);

        let view = |t: &Texture| t.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            hdr_view: view(&hdr),
            depth_view: view(&depth),
            bloom_a_view: view(&bloom_a),
            bloom_b_view: view(&bloom_b),
            hdr,
            depth,
            bloom_a,
            bloom_b,
            width,
            height,
        }
    }

    pub fn hdr_view(&self) -> &TextureView {
        &self.hdr_view
    }

    pub fn depth_view(&self) -> &TextureView {
        &self.depth_view
    }

    pub fn bloom_a_view(&self) -> &TextureView {
        &self.bloom_a_view
    }

    pub fn bloom_b_view(&self) -> &TextureView {
        &self.bloom_b_view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn create_texture(
    device: &Device,
    label: &str,
    size: Extent3d,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}
