//! Frame renderer: uploads what changed in the flattened scene, renders the
//! contact shadow, draws the scene into HDR, post-processes to the surface
//! and overlays the viewer.

use std::collections::HashMap;

use image::RgbaImage;

use crate::core::camera::Camera;
use crate::core::Result;
use crate::scene::{ComposedFrame, DrawBatch, SceneNodeId};
use super::buffer::{CameraBuffer, InstanceBuffer, LightBuffer};
use super::context::GpuContext;
use super::mesh::MeshCache;
use super::pipeline::{
    BatchUniform, ContactShadowPipeline, OverlayPipeline, PostBindings, PostPipeline, ScenePipeline, BATCH_STRIDE,
};
use super::texture::RenderTargets;

/// Initial batch uniform slots; grows on demand
const INITIAL_BATCH_CAPACITY: usize = 32;

struct BatchBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
}

impl BatchBuffer {
    fn new(device: &wgpu::Device, pipeline: &ScenePipeline, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("batch_uniforms"),
            size: capacity as u64 * BATCH_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = pipeline.create_batch_bind_group(device, &buffer);
        Self { buffer, bind_group, capacity }
    }
}

pub struct Renderer {
    scene: ScenePipeline,
    contact_shadow: ContactShadowPipeline,
    post: PostPipeline,
    overlay: OverlayPipeline,
    targets: RenderTargets,
    post_bindings: PostBindings,
    camera: CameraBuffer,
    lights: LightBuffer,
    frame_bind_group: wgpu::BindGroup,
    batches: BatchBuffer,
    meshes: MeshCache,
    instances: HashMap<SceneNodeId, InstanceBuffer>,
}

impl Renderer {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;
        let (width, height) = gpu.size();

        let scene = ScenePipeline::new(device);
        let post = PostPipeline::new(device, gpu.format());
        let overlay = OverlayPipeline::new(device, &gpu.queue, gpu.format());
        let targets = RenderTargets::new(device, width, height);
        let post_bindings = post.create_bindings(device, &targets);
        let camera = CameraBuffer::new(device);
        let lights = LightBuffer::new(device);
        let frame_bind_group = scene.create_frame_bind_group(device, camera.buffer(), lights.buffer());
        let contact_shadow = ContactShadowPipeline::new(device, scene.batch_layout(), camera.buffer());
        let batches = BatchBuffer::new(device, &scene, INITIAL_BATCH_CAPACITY);

        log::info!("Renderer ready at {}x{} ({:?})", width, height, gpu.format());

        Self {
            scene,
            contact_shadow,
            post,
            overlay,
            targets,
            post_bindings,
            camera,
            lights,
            frame_bind_group,
            batches,
            meshes: MeshCache::default(),
            instances: HashMap::new(),
        }
    }

    /// Recreate size-dependent targets. Call after `GpuContext::resize`.
    pub fn resize(&mut self, gpu: &GpuContext) {
        let (width, height) = gpu.size();
        if self.targets.size() == (width, height) {
            return;
        }
        self.targets = RenderTargets::new(&gpu.device, width, height);
        self.post_bindings = self.post.create_bindings(&gpu.device, &self.targets);
    }

    /// Photo shown while the viewer is open
    pub fn set_viewer_image(&mut self, gpu: &GpuContext, image: Option<&RgbaImage>) {
        self.overlay.set_image(&gpu.device, &gpu.queue, image);
    }

    pub fn render(
        &mut self,
        gpu: &GpuContext,
        camera: &Camera,
        frame: &ComposedFrame,
        elapsed: f32,
        viewer_open: bool,
    ) -> Result<()> {
        let output = gpu.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.camera.update(&gpu.queue, camera, elapsed);
        self.lights.update(&gpu.queue, &frame.scene.lights);
        self.post.update(&gpu.queue, &frame.post, gpu.size(), elapsed);
        self.contact_shadow.update(&gpu.queue, &frame.contact_shadow);
        if viewer_open {
            self.overlay.update(&gpu.queue, gpu.size());
        }

        // Resolve meshes, instance buffers and batch uniforms up front
        let mut draws = Vec::with_capacity(frame.scene.batches.len());
        let mut uniforms = Vec::new();
        for batch in frame.scene.sorted_for_draw() {
            if batch.instances.is_empty() {
                continue;
            }
            let mesh = self.meshes.ensure(&gpu.device, &batch.geometry);
            self.instances
                .entry(batch.node)
                .or_insert_with(|| InstanceBuffer::new(&gpu.device, batch.instance_count()))
                .sync(&gpu.device, &gpu.queue, &batch.instances, batch.revision);

            let slot = draws.len();
            uniforms.resize((slot + 1) * BATCH_STRIDE as usize, 0u8);
            let start = slot * BATCH_STRIDE as usize;
            let uniform = BatchUniform::from_batch(batch);
            let bytes = bytemuck::bytes_of(&uniform);
            uniforms[start..start + bytes.len()].copy_from_slice(bytes);
            draws.push((batch, mesh, slot));
        }

        if draws.len() > self.batches.capacity {
            let capacity = draws.len().next_power_of_two();
            log::debug!("Batch uniform buffer grown to {} slots", capacity);
            self.batches = BatchBuffer::new(&gpu.device, &self.scene, capacity);
        }
        if !uniforms.is_empty() {
            gpu.queue.write_buffer(&self.batches.buffer, 0, &uniforms);
        }

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        self.contact_shadow.render_map(&mut encoder, |pass| {
            for (batch, mesh, slot) in &draws {
                self.draw_batch(pass, batch, *mesh, *slot);
            }
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.targets.hdr_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        // Alpha 0 marks background for the composite pass
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.targets.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            // Opaque batches, the shadow quad, then transparent batches over it
            let (transparent, opaque): (Vec<_>, Vec<_>) =
                draws.iter().partition(|(batch, _, _)| batch.material.is_transparent());

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (batch, mesh, slot) in opaque {
                pass.set_pipeline(self.scene.pipeline_for(&batch.material));
                self.draw_batch(&mut pass, batch, mesh, slot);
            }

            self.contact_shadow.draw_plane(&mut pass);

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (batch, mesh, slot) in transparent {
                pass.set_pipeline(self.scene.pipeline_for(&batch.material));
                self.draw_batch(&mut pass, batch, mesh, slot);
            }
        }

        self.post.render(&mut encoder, &self.post_bindings, &self.targets, &view);
        if viewer_open {
            self.overlay.render(&mut encoder, &view);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Bind one batch's uniforms and buffers and issue its draw.
    /// The pipeline and group 0 must already be set.
    fn draw_batch(&self, pass: &mut wgpu::RenderPass<'_>, batch: &DrawBatch, mesh: usize, slot: usize) {
        let (Some(mesh), Some(instances)) = (self.meshes.get(mesh), self.instances.get(&batch.node)) else {
            return;
        };
        pass.set_bind_group(1, &self.batches.bind_group, &[(slot as u64 * BATCH_STRIDE) as u32]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, instances.buffer().slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..instances.len() as u32);
    }
}
