//! Per-node instance buffers, re-uploaded only when the node's revision moves.

use crate::scene::InstanceData;

pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    /// Capacity in instances
    capacity: usize,
    len: usize,
    revision: Option<u64>,
}

impl InstanceBuffer {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            buffer: Self::allocate(device, capacity),
            capacity,
            len: 0,
            revision: None,
        }
    }

    fn allocate(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Upload `instances` unless `revision` is already resident.
    /// Returns `true` if anything was written.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        instances: &[InstanceData],
        revision: u64,
    ) -> bool {
        if self.revision == Some(revision) {
            return false;
        }
        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.capacity);
            log::debug!("Instance buffer grown to {} instances", self.capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(instances));
        }
        self.len = instances.len();
        self.revision = Some(revision);
        true
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_instance_data() {
        let layout = InstanceBuffer::layout();
        assert_eq!(layout.array_stride, 80);
        let last = InstanceBuffer::ATTRIBUTES[4];
        assert_eq!(last.offset, std::mem::offset_of!(InstanceData, color) as u64);
        assert_eq!(last.shader_location, 6);
    }
}
