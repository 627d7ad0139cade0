//! Render target textures

pub mod targets;

pub use targets::{RenderTargets, DEPTH_FORMAT, HDR_FORMAT};
