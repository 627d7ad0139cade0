//! Flattened scene graph output for GPU upload.
//!
//! `FlatScene` is the result of walking the scene graph: one draw batch per
//! visible mesh or instanced node and one entry per visible light.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use super::node::{Geometry, InstanceData, Light, LightKind, Material, SceneNodeId};

/// One draw call: a mesh, its material and the instances to draw.
#[derive(Clone, Debug)]
pub struct DrawBatch {
    /// Source node; with `revision` it identifies the instance buffer contents.
    pub node: SceneNodeId,
    pub geometry: Geometry,
    pub material: Material,
    /// World transform of the node, applied on top of each instance model.
    pub world_transform: Mat4,
    pub instances: Arc<[InstanceData]>,
    pub revision: u64,
}

impl DrawBatch {
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// A light resolved into world space.
#[derive(Clone, Copy, Debug)]
pub struct FlatLight {
    pub light: Light,
    pub position: Vec3,
    /// Unit vector for spot lights, zero otherwise
    pub direction: Vec3,
}

impl FlatLight {
    pub fn resolve(light: Light, world: &Mat4) -> Self {
        let position = world.transform_point3(Vec3::ZERO);
        let direction = match light.kind {
            LightKind::Spot { target, .. } => (target - position).normalize_or_zero(),
            _ => Vec3::ZERO,
        };
        Self { light, position, direction }
    }
}

/// Everything visible this frame.
#[derive(Clone, Debug, Default)]
pub struct FlatScene {
    pub batches: Vec<DrawBatch>,
    pub lights: Vec<FlatLight>,
}

impl FlatScene {
    pub fn batch(&self, node: SceneNodeId) -> Option<&DrawBatch> {
        self.batches.iter().find(|b| b.node == node)
    }

    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(DrawBatch::instance_count).sum()
    }

    /// Opaque batches first, then transparent ones
    pub fn sorted_for_draw(&self) -> impl Iterator<Item = &DrawBatch> {
        let opaque = self.batches.iter().filter(|b| !b.material.is_transparent());
        let transparent = self.batches.iter().filter(|b| b.material.is_transparent());
        opaque.chain(transparent)
    }
}
