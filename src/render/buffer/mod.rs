//! GPU buffer management

pub mod camera_buffer;
pub mod instance_buffer;
pub mod light_buffer;

pub use camera_buffer::{CameraBuffer, CameraUniform};
pub use instance_buffer::InstanceBuffer;
pub use light_buffer::{GpuLight, LightBuffer, LightsUniform, MAX_LIGHTS};
