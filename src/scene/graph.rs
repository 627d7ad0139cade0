//! Scene graph: CPU-side hierarchy of nodes.
//!
//! Nodes are created once and then changed through targeted operations
//! (`set_transform`, `set_visible`, the `patch_*` family). Each frame,
//! `flatten()` walks the tree and produces a [`FlatScene`] that the renderer
//! consumes directly.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use crate::config::Rgb;

use super::flatten::{DrawBatch, FlatLight, FlatScene};
use super::node::{InstanceData, LocalTransform, Material, NodeContent, SceneNode, SceneNodeId};

/// CPU-side scene graph.
pub struct SceneGraph {
    nodes: HashMap<SceneNodeId, SceneNode>,
    root: SceneNodeId,
    next_id: u64,
    /// Shared counter so every patch gets a unique revision
    next_revision: u64,
    /// Single instance used for plain meshes
    single: Arc<[InstanceData]>,
    dirty: bool,
}

impl SceneGraph {
    /// Create a new scene graph with a root Group node.
    pub fn new() -> Self {
        let root_id = SceneNodeId(0);
        let root_node = SceneNode::new(root_id, "root", NodeContent::Group);

        let mut nodes = HashMap::new();
        nodes.insert(root_id, root_node);

        Self {
            nodes,
            root: root_id,
            next_id: 1,
            next_revision: 1,
            single: Arc::from(vec![InstanceData::IDENTITY]),
            dirty: true,
        }
    }

    /// Get the root node ID.
    pub fn root(&self) -> SceneNodeId {
        self.root
    }

    /// Allocate a fresh node ID.
    fn alloc_id(&mut self) -> SceneNodeId {
        let id = SceneNodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_revision(&mut self) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;
        revision
    }

    /// Add a child node under `parent`. Returns the new node's ID.
    pub fn add_child(
        &mut self,
        parent: SceneNodeId,
        name: impl Into<String>,
        content: NodeContent,
    ) -> SceneNodeId {
        let id = self.alloc_id();
        let mut node = SceneNode::new(id, name, content);
        node.parent = Some(parent);

        self.nodes.insert(id, node);

        // Register as child of parent
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }

        self.dirty = true;
        id
    }

    /// Add a child with an initial transform.
    pub fn add_child_at(
        &mut self,
        parent: SceneNodeId,
        name: impl Into<String>,
        transform: LocalTransform,
        content: NodeContent,
    ) -> SceneNodeId {
        let id = self.add_child(parent, name, content);
        self.set_transform(id, transform);
        id
    }

    /// Remove a node and its entire subtree. Cannot remove the root.
    pub fn remove(&mut self, id: SceneNodeId) {
        if id == self.root {
            return;
        }

        // Collect subtree IDs (BFS)
        let mut to_remove = vec![id];
        let mut i = 0;
        while i < to_remove.len() {
            let current = to_remove[i];
            if let Some(node) = self.nodes.get(&current) {
                to_remove.extend_from_slice(&node.children);
            }
            i += 1;
        }

        // Detach from parent
        if let Some(parent_id) = self.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|c| *c != id);
            }
        }

        // Remove all nodes in subtree
        for nid in to_remove {
            self.nodes.remove(&nid);
        }

        self.dirty = true;
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    fn is_ancestor(&self, ancestor: SceneNodeId, id: SceneNodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(|n| n.parent);
        }
        false
    }

    /// Move a node to a new parent.
    ///
    /// Ignored for the root, for unknown nodes and for moves that would
    /// place a node under its own subtree.
    pub fn reparent(&mut self, id: SceneNodeId, new_parent: SceneNodeId) {
        if id == self.root
            || !self.nodes.contains_key(&id)
            || !self.nodes.contains_key(&new_parent)
            || self.is_ancestor(id, new_parent)
        {
            return;
        }

        // Detach from old parent
        if let Some(old_parent_id) = self.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(old_parent) = self.nodes.get_mut(&old_parent_id) {
                old_parent.children.retain(|c| *c != id);
            }
        }

        // Attach to new parent
        if let Some(new_parent_node) = self.nodes.get_mut(&new_parent) {
            new_parent_node.children.push(id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(new_parent);
        }

        self.dirty = true;
    }

    /// Set the local transform of a node.
    pub fn set_transform(&mut self, id: SceneNodeId, transform: LocalTransform) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.local_transform = transform;
            self.dirty = true;
        }
    }

    /// Set the visibility of a node.
    pub fn set_visible(&mut self, id: SceneNodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
            self.dirty = true;
        }
    }

    /// Replace the instances of an `Instanced` node.
    ///
    /// Returns the new revision, or `None` if the node is missing or not instanced.
    pub fn patch_instances(&mut self, id: SceneNodeId, data: impl Into<Arc<[InstanceData]>>) -> Option<u64> {
        let new_revision = self.alloc_revision();
        let node = self.nodes.get_mut(&id)?;
        match &mut node.content {
            NodeContent::Instanced { instances, revision, .. } => {
                *instances = data.into();
                *revision = new_revision;
                self.dirty = true;
                Some(new_revision)
            }
            _ => None,
        }
    }

    /// Recolor a `Light` node. Returns `false` if the node is not a light.
    pub fn patch_light_color(&mut self, id: SceneNodeId, color: Rgb) -> bool {
        match self.nodes.get_mut(&id).map(|n| &mut n.content) {
            Some(NodeContent::Light(light)) => {
                light.color = color;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    /// Swap the material of a `Mesh` or `Instanced` node.
    pub fn patch_material(&mut self, id: SceneNodeId, new_material: Material) -> bool {
        match self.nodes.get_mut(&id).map(|n| &mut n.content) {
            Some(NodeContent::Mesh { material, .. }) | Some(NodeContent::Instanced { material, .. }) => {
                *material = new_material;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    /// Current instance revision of an `Instanced` node
    pub fn revision(&self, id: SceneNodeId) -> Option<u64> {
        match self.nodes.get(&id).map(|n| &n.content) {
            Some(NodeContent::Instanced { revision, .. }) => Some(*revision),
            _ => None,
        }
    }

    /// Get an immutable reference to a node.
    pub fn get(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node.
    pub fn get_mut(&mut self, id: SceneNodeId) -> Option<&mut SceneNode> {
        self.dirty = true;
        self.nodes.get_mut(&id)
    }

    /// Iterate over the children of a node.
    pub fn children(&self, id: SceneNodeId) -> impl Iterator<Item = SceneNodeId> + '_ {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
    }

    /// First node with the given name, searching depth-first from the root.
    pub fn find_by_name(&self, name: &str) -> Option<SceneNodeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.nodes.get(&id)?;
            if node.name == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// World transform of a node, computed from the current local transforms.
    pub fn world_transform(&self, id: SceneNodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut world = node.local_transform.to_mat4();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            world = parent.local_transform.to_mat4() * world;
            node = parent;
        }
        Some(world)
    }

    /// Whether anything changed since the last `flatten`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Walk the tree, propagate transforms, and collect visible batches and lights.
    pub fn flatten(&mut self) -> FlatScene {
        // Propagate world transforms from root downward
        self.propagate_transforms(self.root, Mat4::IDENTITY);

        let mut out = FlatScene::default();
        self.collect_visible(self.root, &mut out);
        self.dirty = false;
        out
    }

    /// Recursively propagate world transforms.
    fn propagate_transforms(&mut self, node_id: SceneNodeId, parent_world: Mat4) {
        let (local_mat, children) = {
            let node = match self.nodes.get(&node_id) {
                Some(n) => n,
                None => return,
            };
            (node.local_transform.to_mat4(), node.children.clone())
        };

        let world = parent_world * local_mat;

        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.world_transform = world;
        }

        for child_id in children {
            self.propagate_transforms(child_id, world);
        }
    }

    /// Recursively collect visible batches and lights.
    fn collect_visible(&self, node_id: SceneNodeId, out: &mut FlatScene) {
        let node = match self.nodes.get(&node_id) {
            Some(n) => n,
            None => return,
        };

        if !node.visible {
            return;
        }

        match &node.content {
            NodeContent::Group => {}
            NodeContent::Mesh { geometry, material } => {
                out.batches.push(DrawBatch {
                    node: node.id,
                    geometry: *geometry,
                    material: *material,
                    world_transform: node.world_transform,
                    instances: Arc::clone(&self.single),
                    revision: 0,
                });
            }
            NodeContent::Instanced { geometry, material, instances, revision } => {
                if !instances.is_empty() {
                    out.batches.push(DrawBatch {
                        node: node.id,
                        geometry: *geometry,
                        material: *material,
                        world_transform: node.world_transform,
                        instances: Arc::clone(instances),
                        revision: *revision,
                    });
                }
            }
            NodeContent::Light(light) => {
                out.lights.push(FlatLight::resolve(*light, &node.world_transform));
            }
        }

        // Recurse into children
        for &child_id in &node.children {
            self.collect_visible(child_id, out);
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use crate::scene::node::{Geometry, Light};

    fn cube() -> NodeContent {
        NodeContent::Mesh { geometry: Geometry::UNIT_CUBE, material: Material::default() }
    }

    #[test]
    fn test_new_scene_graph() {
        let graph = SceneGraph::new();
        assert_eq!(graph.node_count(), 1); // root only
        assert_eq!(graph.get(graph.root()).unwrap().name, "root");
    }

    #[test]
    fn test_add_multiple_children() {
        let mut graph = SceneGraph::new();
        let root = graph.root();

        let a = graph.add_child(root, "a", NodeContent::Group);
        let b = graph.add_child(root, "b", NodeContent::Group);
        let c = graph.add_child(a, "c", NodeContent::Group);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.children(root).count(), 2);
        assert!(graph.children(a).any(|x| x == c));
        assert_eq!(graph.children(b).count(), 0);
        assert_eq!(graph.get(c).unwrap().parent, Some(a));
    }

    #[test]
    fn test_remove_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.add_child(root, "parent", NodeContent::Group);
        let child1 = graph.add_child(parent, "c1", NodeContent::Group);
        let _child2 = graph.add_child(parent, "c2", NodeContent::Group);
        let grandchild = graph.add_child(child1, "gc", NodeContent::Group);

        graph.remove(parent);

        assert_eq!(graph.node_count(), 1);
        assert!(graph.get(grandchild).is_none());
        assert_eq!(graph.children(root).count(), 0);

        graph.remove(root);
        assert_eq!(graph.node_count(), 1); // root survives
    }

    #[test]
    fn test_reparent() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "a", NodeContent::Group);
        let b = graph.add_child(root, "b", NodeContent::Group);
        let c = graph.add_child(a, "c", NodeContent::Group);

        graph.reparent(c, b);

        assert_eq!(graph.children(a).count(), 0);
        assert!(graph.children(b).any(|x| x == c));
        assert_eq!(graph.get(c).unwrap().parent, Some(b));
    }

    #[test]
    fn test_reparent_into_own_subtree_is_ignored() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_child(root, "a", NodeContent::Group);
        let b = graph.add_child(a, "b", NodeContent::Group);

        graph.reparent(a, b);

        assert_eq!(graph.get(a).unwrap().parent, Some(root));
        assert_eq!(graph.get(b).unwrap().parent, Some(a));
    }

    #[test]
    fn test_find_by_name() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add_child(root, "tree", NodeContent::Group);
        let trunk = graph.add_child(group, "trunk", cube());

        assert_eq!(graph.find_by_name("trunk"), Some(trunk));
        assert_eq!(graph.find_by_name("tree"), Some(group));
        assert_eq!(graph.find_by_name("missing"), None);
    }

    #[test]
    fn test_flatten_transform_propagation() {
        let mut graph = SceneGraph::new();
        let root = graph.root();

        let parent = graph.add_child(root, "parent", NodeContent::Group);
        graph.set_transform(parent, LocalTransform::from_position(Vec3::new(10.0, 0.0, 0.0)));
        let child = graph.add_child(parent, "mesh", cube());
        graph.set_transform(child, LocalTransform::from_position(Vec3::new(5.0, 0.0, 0.0)));

        let scene = graph.flatten();
        assert_eq!(scene.batches.len(), 1);
        let origin = scene.batches[0].world_transform.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(15.0, 0.0, 0.0)).length() < 1e-4);
        assert_eq!(graph.world_transform(child), Some(scene.batches[0].world_transform));
    }

    #[test]
    fn test_flatten_skips_hidden_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add_child(root, "group", NodeContent::Group);
        graph.add_child(group, "mesh", cube());
        graph.add_child(group, "light", NodeContent::Light(Light::point(Rgb::WHITE, 1.0, 5.0)));
        graph.add_child(root, "visible", cube());

        graph.set_visible(group, false);
        let scene = graph.flatten();
        assert_eq!(scene.batches.len(), 1);
        assert!(scene.lights.is_empty());

        graph.set_visible(group, true);
        let scene = graph.flatten();
        assert_eq!(scene.batches.len(), 2);
        assert_eq!(scene.lights.len(), 1);
    }

    #[test]
    fn test_patch_instances_bumps_revision() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let id = graph.add_child(root, "ornaments", NodeContent::instanced(Geometry::UNIT_CUBE, Material::default()));

        // Empty instanced nodes produce no batch
        assert!(graph.flatten().batches.is_empty());

        let r1 = graph.patch_instances(id, vec![InstanceData::IDENTITY; 3]).unwrap();
        let r2 = graph.patch_instances(id, vec![InstanceData::IDENTITY; 2]).unwrap();
        assert!(r2 > r1);
        assert_eq!(graph.revision(id), Some(r2));

        let scene = graph.flatten();
        assert_eq!(scene.batch(id).unwrap().instance_count(), 2);
        assert_eq!(scene.batch(id).unwrap().revision, r2);
    }

    #[test]
    fn test_patch_wrong_kind_is_rejected() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add_child(root, "group", NodeContent::Group);
        let light = graph.add_child(root, "light", NodeContent::Light(Light::point(Rgb::WHITE, 1.0, 5.0)));

        assert!(graph.patch_instances(group, vec![InstanceData::IDENTITY]).is_none());
        assert!(!graph.patch_light_color(group, Rgb::BLACK));
        assert!(!graph.patch_material(light, Material::default()));
        assert!(graph.patch_light_color(light, Rgb::BLACK));
        assert_eq!(graph.flatten().lights[0].light.color, Rgb::BLACK);
    }

    #[test]
    fn test_patch_material() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mesh = graph.add_child(root, "mesh", cube());
        let red = Material::standard(Rgb::new(255, 0, 0), 0.5, 0.0);
        assert!(graph.patch_material(mesh, red));
        assert_eq!(graph.flatten().batches[0].material, red);
    }

    #[test]
    fn test_dirty_flag() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let id = graph.add_child(root, "a", NodeContent::Group);
        graph.flatten();
        assert!(!graph.is_dirty());
        graph.set_transform(id, LocalTransform::from_position(Vec3::X));
        assert!(graph.is_dirty());
    }
}
