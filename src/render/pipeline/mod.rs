//! Render pipelines

pub mod overlay;
pub mod post;
pub mod scene;
pub mod shadow;

pub use overlay::{fit_rect, OverlayPipeline, OverlayUniform};
pub use post::{PostBindings, PostPipeline, PostUniform};
pub use scene::{BatchUniform, ScenePipeline, BATCH_STRIDE};
pub use shadow::ContactShadowPipeline;
