//! Retained-mode scene graph and the composer that builds the tree scene

pub mod composer;
pub mod flatten;
pub mod graph;
pub mod lighting;
pub mod motion;
pub mod node;
pub mod post;
pub mod shadow;

pub use composer::{CameraRig, ComposedFrame, SceneComposer, SceneIds, SyncChanges};
pub use flatten::{DrawBatch, FlatLight, FlatScene};
pub use graph::SceneGraph;
pub use motion::FloatMotion;
pub use node::{
    Geometry, InstanceData, Light, LightKind, LocalTransform, Material, NodeContent, SceneNode, SceneNodeId,
};
pub use post::PostSettings;
pub use shadow::ContactShadowSettings;
