//! Scene graph node types
//!
//! Core types for the CPU-side scene graph: node IDs, transforms, geometry,
//! materials, lights and the content variants a node can hold.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use crate::config::Rgb;

/// Unique identifier for a scene graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneNodeId(pub u64);

/// Local transform relative to the parent node.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

impl LocalTransform {
    /// Identity transform (no translation, rotation, or scaling).
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a translation-only transform.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Convert to a 4x4 matrix.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.position,
        )
    }
}

/// Mesh shapes the renderer knows how to build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    Box { width: f32, height: f32, depth: f32 },
    /// Subdivided icosahedron; detail 0 is the plain 20-face solid
    Icosahedron { radius: f32, detail: u32 },
    Octahedron { radius: f32 },
    Dodecahedron { radius: f32 },
    /// Open-ended along y, centered on the origin
    Cylinder { radius_top: f32, radius_bottom: f32, height: f32, segments: u32 },
}

impl Geometry {
    pub const UNIT_CUBE: Geometry = Geometry::Box { width: 1.0, height: 1.0, depth: 1.0 };

    /// Radius of a sphere around the origin enclosing the mesh
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Geometry::Box { width, height, depth } => Vec3::new(width, height, depth).length() * 0.5,
            Geometry::Icosahedron { radius, .. }
            | Geometry::Octahedron { radius }
            | Geometry::Dodecahedron { radius } => radius,
            Geometry::Cylinder { radius_top, radius_bottom, height, .. } => {
                Vec3::new(radius_top.max(radius_bottom), height * 0.5, 0.0).length()
            }
        }
    }
}

/// Surface description, authored in sRGB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub emissive: Rgb,
    pub emissive_intensity: f32,
    pub roughness: f32,
    pub metalness: f32,
    /// Below 1.0 the batch is alpha blended
    pub opacity: f32,
    /// Skip lighting and output `color` directly
    pub unlit: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            emissive: Rgb::BLACK,
            emissive_intensity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            unlit: false,
        }
    }
}

impl Material {
    pub fn standard(color: Rgb, roughness: f32, metalness: f32) -> Self {
        Self { color, roughness, metalness, ..Default::default() }
    }

    pub fn with_emissive(mut self, emissive: Rgb, intensity: f32) -> Self {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
        self
    }

    pub fn unlit(color: Rgb, opacity: f32) -> Self {
        Self { color, opacity, unlit: true, ..Default::default() }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    /// Linear emissive radiance
    pub fn emissive_linear(&self) -> [f32; 3] {
        self.emissive.to_linear().map(|c| c * self.emissive_intensity)
    }
}

/// Per-instance GPU record: local model matrix and a linear tint.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl InstanceData {
    pub const IDENTITY: InstanceData = InstanceData {
        model: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
        color: [1.0; 4],
    };

    pub fn new(model: Mat4, color: [f32; 3]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: [color[0], color[1], color[2], 1.0],
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

/// Light source kinds. Position and direction come from the node transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Omnidirectional; contribution reaches zero at `range`
    Point { range: f32 },
    /// Cone aimed at `target` (world space); `angle` is the half-angle
    Spot { range: f32, angle: f32, penumbra: f32, target: Vec3 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Rgb,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: Rgb, intensity: f32) -> Self {
        Self { kind: LightKind::Ambient, color, intensity }
    }

    pub fn point(color: Rgb, intensity: f32, range: f32) -> Self {
        Self { kind: LightKind::Point { range }, color, intensity }
    }

    pub fn spot(color: Rgb, intensity: f32, range: f32, angle: f32, penumbra: f32) -> Self {
        Self {
            kind: LightKind::Spot { range, angle, penumbra, target: Vec3::ZERO },
            color,
            intensity,
        }
    }
}

/// What a scene node contains.
#[derive(Clone, Debug)]
pub enum NodeContent {
    /// A grouping node with no geometry of its own.
    Group,

    /// A single mesh drawn at the node's transform.
    Mesh {
        geometry: Geometry,
        material: Material,
    },

    /// One mesh drawn many times. `revision` changes whenever `instances` is
    /// replaced, so uploads can be skipped for unchanged buffers.
    Instanced {
        geometry: Geometry,
        material: Material,
        instances: Arc<[InstanceData]>,
        revision: u64,
    },

    Light(Light),
}

impl NodeContent {
    pub fn instanced(geometry: Geometry, material: Material) -> Self {
        NodeContent::Instanced {
            geometry,
            material,
            instances: Arc::from(Vec::new()),
            revision: 0,
        }
    }
}

/// A single node in the scene graph.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub id: SceneNodeId,
    pub name: String,
    pub parent: Option<SceneNodeId>,
    pub children: Vec<SceneNodeId>,
    pub local_transform: LocalTransform,
    /// Cached world transform (recomputed during propagation).
    pub world_transform: Mat4,
    pub visible: bool,
    pub content: NodeContent,
}

impl SceneNode {
    /// Create a new scene node.
    pub fn new(id: SceneNodeId, name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local_transform: LocalTransform::identity(),
            world_transform: Mat4::IDENTITY,
            visible: true,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_transform_identity() {
        let t = LocalTransform::identity();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.to_mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn test_local_transform_from_position() {
        let pos = Vec3::new(10.0, 5.0, -3.0);
        let t = LocalTransform::from_position(pos);
        let (_, _, translation) = t.to_mat4().to_scale_rotation_translation();
        assert!((translation - pos).length() < 1e-5);
    }

    #[test]
    fn test_instance_data_layout() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
        assert_eq!(InstanceData::IDENTITY.model(), Mat4::IDENTITY);

        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let instance = InstanceData::new(m, [0.5, 0.25, 1.0]);
        assert_eq!(instance.model(), m);
        assert_eq!(instance.color, [0.5, 0.25, 1.0, 1.0]);
    }

    #[test]
    fn test_bounding_radius() {
        assert!((Geometry::UNIT_CUBE.bounding_radius() - 0.866).abs() < 1e-3);
        assert_eq!(Geometry::Octahedron { radius: 0.7 }.bounding_radius(), 0.7);
    }

    #[test]
    fn test_material_flags() {
        assert!(Material::unlit(Rgb::WHITE, 0.8).is_transparent());
        assert!(!Material::standard(Rgb::WHITE, 0.5, 0.5).is_transparent());
        let m = Material::default().with_emissive(Rgb::WHITE, 2.0);
        assert!(m.emissive_linear().iter().all(|c| (c - 2.0).abs() < 1e-5));
    }

    #[test]
    fn test_scene_node_new() {
        let node = SceneNode::new(SceneNodeId(0), "root", NodeContent::Group);
        assert_eq!(node.name, "root");
        assert!(node.parent.is_none());
        assert!(node.children.is_empty());
        assert!(node.visible);
    }
}
