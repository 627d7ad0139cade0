//! Rendering system and GPU interfaces

pub mod buffer;
pub mod context;
pub mod mesh;
pub mod pipeline;
pub mod renderer;
pub mod texture;

pub use context::GpuContext;
pub use renderer::Renderer;
