//! Builds the tree scene and keeps it in step with the configuration.
//!
//! The composer owns the scene graph. Configuration changes arrive through
//! [`SceneComposer::sync`], time through [`SceneComposer::tick`], and the
//! renderer pulls a [`ComposedFrame`] once per redraw.

use std::f32::consts::PI;
use std::sync::Arc;

use glam::{Quat, Vec3};
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::app::ClickTarget;
use crate::config::{AppSettings, OrnamentTheme, Rgb, TreeConfig};
use crate::core::camera::Camera;
use crate::core::camera_controller::OrbitController;
use crate::generation::{
    Memo, OrnamentShape, Palette, PaletteColor, Starfield, StarfieldParams, TreeGenerator, TreeLayout,
    unit,
};
use crate::math::{Aabb, Ray};
use crate::snow::{SnowParams, SnowSimulator};

use super::flatten::FlatScene;
use super::graph::SceneGraph;
use super::lighting;
use super::motion::FloatMotion;
use super::node::{Geometry, InstanceData, LocalTransform, Material, NodeContent, SceneNodeId};
use super::post::PostSettings;
use super::shadow::ContactShadowSettings;

/// Where the tree group stands
const TREE_POSITION: Vec3 = Vec3::new(0.0, -2.5, 0.0);
/// Ornament group offset inside the tree group
const ORNAMENT_OFFSET: Vec3 = Vec3::new(0.0, -1.5, 0.0);
const STAR_POSITION: Vec3 = Vec3::new(0.0, 5.2, 0.0);
/// Pick sphere around the star, wide enough for the bars
const STAR_PICK_RADIUS: f32 = 1.6;
/// Extra radius around the cone for ornaments sticking out of it
const CONE_PICK_MARGIN: f32 = 0.45;
const PICK_STEP: f32 = 0.05;

/// Initial camera placement and orbit limits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 13.0),
            target: Vec3::ZERO,
            fov_degrees: 50.0,
            min_polar: PI / 3.0,
            max_polar: PI / 1.9,
            min_distance: 8.0,
            max_distance: 20.0,
        }
    }
}

impl CameraRig {
    pub fn camera(&self, aspect: f32) -> Camera {
        Camera::look_at(self.position, self.target, self.fov_degrees, aspect)
    }

    pub fn orbit(&self, camera: &Camera) -> OrbitController {
        OrbitController::from_camera(camera, self.target)
            .with_polar_limits(self.min_polar, self.max_polar)
            .with_distance_limits(self.min_distance, self.max_distance)
    }
}

/// What changed during a [`SceneComposer::sync`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncChanges {
    pub tree_regenerated: bool,
    pub light_changed: bool,
    pub snow_toggled: bool,
}

/// Renderable output for one frame.
#[derive(Clone, Debug)]
pub struct ComposedFrame {
    pub scene: FlatScene,
    pub post: PostSettings,
    pub contact_shadow: ContactShadowSettings,
    pub snow_active: bool,
}

/// Node handles the composer patches after construction.
#[derive(Clone, Copy, Debug)]
pub struct SceneIds {
    pub tree: SceneNodeId,
    pub ornaments: SceneNodeId,
    pub trunk: SceneNodeId,
    pub boxes: SceneNodeId,
    pub spheres: SceneNodeId,
    pub diamonds: SceneNodeId,
    pub star_float: SceneNodeId,
    pub star: SceneNodeId,
    pub fill_light: SceneNodeId,
    pub starfield: SceneNodeId,
    pub snow: SceneNodeId,
}

impl SceneIds {
    pub fn bucket(&self, shape: OrnamentShape) -> SceneNodeId {
        match shape {
            OrnamentShape::Box => self.boxes,
            OrnamentShape::Sphere => self.spheres,
            OrnamentShape::Diamond => self.diamonds,
        }
    }
}

pub struct SceneComposer {
    graph: SceneGraph,
    ids: SceneIds,
    palette: Palette,
    generator: TreeGenerator,
    layouts: Memo<OrnamentTheme, TreeLayout>,
    rng: SmallRng,
    snow: SnowSimulator,
    starfield: StarfieldParams,
    star_motion: FloatMotion,
    post: PostSettings,
    contact_shadow: ContactShadowSettings,
    rig: CameraRig,
    /// Last config passed to `sync`
    config: Arc<TreeConfig>,
    rotation_angle: f32,
    starfield_angle: f32,
}

impl SceneComposer {
    /// Build the full scene for the default configuration.
    pub fn new(settings: &AppSettings, palette: Palette, mut rng: SmallRng) -> Self {
        let config = Arc::new(TreeConfig::default());
        let generator = TreeGenerator::new(settings.tree.clone());

        let snow_rng = SmallRng::seed_from_u64(rng.next_u64());
        let snow = SnowSimulator::new(SnowParams::default().with_count(settings.snow_count), snow_rng);
        let starfield = Starfield::generate(settings.starfield.clone(), &mut rng);
        let star_motion = FloatMotion::new(2.0, 0.5, 0.5).with_offset(unit(&mut rng) * 10_000.0);

        let (graph, ids) = build_graph(&palette, &config, &starfield);

        let mut composer = Self {
            graph,
            ids,
            palette,
            generator,
            layouts: Memo::new(),
            rng,
            snow,
            starfield: settings.starfield.clone(),
            star_motion,
            post: PostSettings::default(),
            contact_shadow: ContactShadowSettings::default(),
            rig: CameraRig::default(),
            config,
            rotation_angle: 0.0,
            starfield_angle: 0.0,
        };
        composer.rebuild_ornaments(OrnamentTheme::default());
        composer.write_snow();
        composer.graph.set_visible(composer.ids.snow, composer.config.show_snow);

        log::info!(
            "Scene ready: {} nodes, {} snowflakes, {} stars",
            composer.graph.node_count(),
            composer.snow.len(),
            composer.starfield.count
        );
        composer
    }

    /// Bring the scene in line with `config`.
    ///
    /// The tree is regenerated only when the theme changes; a light change
    /// only recolors the fill light.
    pub fn sync(&mut self, config: &TreeConfig) -> SyncChanges {
        let mut changes = SyncChanges::default();

        if config.ornament_theme != self.config.ornament_theme {
            self.rebuild_ornaments(config.ornament_theme);
            changes.tree_regenerated = true;
        }

        if config.light_color != self.config.light_color {
            self.graph.patch_light_color(self.ids.fill_light, config.light_color);
            changes.light_changed = true;
        }

        if config.show_snow != self.config.show_snow {
            self.graph.set_visible(self.ids.snow, config.show_snow);
            if config.show_snow {
                // Stale transforms from when it was hidden must not flash
                self.write_snow();
            }
            changes.snow_toggled = true;
        }

        if *config != *self.config {
            self.config = Arc::new(config.clone());
        }
        changes
    }

    /// Advance animation by `delta` seconds; `elapsed` is time since start.
    pub fn tick(&mut self, elapsed: f32, delta: f32) {
        self.rotation_angle += self.config.rotation_speed * delta;
        self.graph.set_transform(
            self.ids.tree,
            LocalTransform::from_position(TREE_POSITION)
                .with_rotation(Quat::from_rotation_y(self.rotation_angle)),
        );

        let (offset, sway) = self.star_motion.sample(elapsed);
        self.graph.set_transform(
            self.ids.star_float,
            LocalTransform::from_position(offset).with_rotation(sway),
        );

        self.starfield_angle += self.starfield.angular_velocity() * delta;
        self.graph.set_transform(
            self.ids.starfield,
            LocalTransform::identity().with_rotation(Quat::from_rotation_y(self.starfield_angle)),
        );

        if self.config.show_snow {
            self.snow.tick(elapsed, delta);
            self.write_snow();
        }
    }

    /// Resolve a click ray against the tree.
    pub fn pick(&self, ray: &Ray) -> ClickTarget {
        if self.hits_star(ray) || self.hits_cone(ray) {
            ClickTarget::Tree
        } else {
            ClickTarget::Background
        }
    }

    fn hits_star(&self, ray: &Ray) -> bool {
        self.graph
            .world_transform(self.ids.star)
            .map(|m| m.transform_point3(Vec3::ZERO))
            .is_some_and(|center| ray.intersects_sphere(center, STAR_PICK_RADIUS).is_some())
    }

    fn hits_cone(&self, ray: &Ray) -> bool {
        let Some(world) = self.graph.world_transform(self.ids.ornaments) else {
            return false;
        };
        let local = ray.transform(&world.inverse());
        let p = self.generator.params();
        let m = CONE_PICK_MARGIN;
        let r = p.max_radius + m;
        let bounds = Aabb::new(Vec3::new(-r, p.base_y - m, -r), Vec3::new(r, p.apex_y() + m, r));

        let Some((t_near, t_far)) = local.intersects_aabb(&bounds) else {
            return false;
        };
        let mut t = t_near;
        while t <= t_far {
            let point = local.at(t);
            let planar = (point.x * point.x + point.z * point.z).sqrt();
            if planar <= p.radius_at(point.y) + m {
                return true;
            }
            t += PICK_STEP;
        }
        false
    }

    /// Flatten the scene for drawing.
    pub fn frame(&mut self) -> ComposedFrame {
        ComposedFrame {
            scene: self.graph.flatten(),
            post: self.post,
            contact_shadow: self.contact_shadow,
            snow_active: self.config.show_snow,
        }
    }

    fn rebuild_ornaments(&mut self, theme: OrnamentTheme) {
        let generator = &self.generator;
        let rng = &mut self.rng;
        let layout = self.layouts.get_or_compute(&theme, |theme| generator.generate(*theme, rng));

        for bucket in layout.buckets() {
            let instances: Vec<InstanceData> = bucket
                .instances
                .iter()
                .map(|i| InstanceData::new(i.transform(), self.palette.linear(i.color)))
                .collect();
            self.graph.patch_instances(self.ids.bucket(bucket.shape), instances);
        }
        log::debug!(
            "Ornaments rebuilt for {} theme ({} instances, colors {:?})",
            theme.name(),
            layout.len(),
            layout.color_histogram()
        );
    }

    fn write_snow(&mut self) {
        let instances: Vec<InstanceData> = self
            .snow
            .transforms()
            .iter()
            .map(|m| InstanceData::new(*m, [1.0; 3]))
            .collect();
        self.graph.patch_instances(self.ids.snow, instances);
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn ids(&self) -> &SceneIds {
        &self.ids
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn snow(&self) -> &SnowSimulator {
        &self.snow
    }

    /// Current tree layout, if one has been generated
    pub fn layout(&self) -> Option<&Arc<TreeLayout>> {
        self.layouts.peek(&self.config.ornament_theme)
    }

    pub fn rotation_angle(&self) -> f32 {
        self.rotation_angle
    }
}

/// Create every node; ornament and snow buckets start empty.
fn build_graph(palette: &Palette, config: &TreeConfig, starfield: &Starfield) -> (SceneGraph, SceneIds) {
    let mut graph = SceneGraph::new();
    let root = graph.root();

    let mut fill_light = None;
    for placed in lighting::rig(config.light_color) {
        let id = graph.add_child_at(
            root,
            placed.name,
            LocalTransform::from_position(placed.position),
            NodeContent::Light(placed.light),
        );
        if placed.name == lighting::FILL_LIGHT {
            fill_light = Some(id);
        }
    }
    let fill_light = fill_light.unwrap_or(root);

    let tree = graph.add_child_at(root, "tree", LocalTransform::from_position(TREE_POSITION), NodeContent::Group);
    let ornaments = graph.add_child_at(
        tree,
        "ornaments",
        LocalTransform::from_position(ORNAMENT_OFFSET),
        NodeContent::Group,
    );
    let trunk = graph.add_child_at(
        ornaments,
        "trunk",
        LocalTransform::from_position(Vec3::new(0.0, 1.5, 0.0)),
        NodeContent::Mesh {
            geometry: Geometry::Cylinder { radius_top: 0.2, radius_bottom: 0.8, height: 8.0, segments: 8 },
            material: Material::standard(Rgb::hex(0x051005), 0.9, 0.0),
        },
    );
    let boxes = graph.add_child(
        ornaments,
        "boxes",
        NodeContent::instanced(Geometry::UNIT_CUBE, Material::standard(Rgb::WHITE, 0.2, 0.8)),
    );
    let spheres = graph.add_child(
        ornaments,
        "spheres",
        NodeContent::instanced(
            Geometry::Icosahedron { radius: 0.6, detail: 1 },
            Material::standard(Rgb::WHITE, 0.1, 0.9),
        ),
    );
    let diamonds = graph.add_child(
        ornaments,
        "diamonds",
        NodeContent::instanced(
            Geometry::Octahedron { radius: 0.7 },
            Material::standard(Rgb::WHITE, 0.1, 1.0).with_emissive(Rgb::hex(0x443300), 0.2),
        ),
    );

    let gold = palette.get(PaletteColor::Gold);
    let star_float = graph.add_child(tree, "star_float", NodeContent::Group);
    let star = graph.add_child_at(star_float, "star", LocalTransform::from_position(STAR_POSITION), NodeContent::Group);
    graph.add_child(
        star,
        "star_core",
        NodeContent::Mesh {
            geometry: Geometry::Icosahedron { radius: 0.9, detail: 0 },
            material: Material::standard(gold, 0.0, 1.0).with_emissive(gold, 2.0),
        },
    );
    for i in 0..3 {
        graph.add_child_at(
            star,
            format!("star_bar_{i}"),
            LocalTransform::identity().with_rotation(Quat::from_rotation_z(i as f32 * PI / 3.0)),
            NodeContent::Mesh {
                geometry: Geometry::Box { width: 0.2, height: 3.0, depth: 0.2 },
                material: Material::standard(gold, 1.0, 0.0).with_emissive(gold, 1.0),
            },
        );
    }
    graph.add_child(star, "star_light", NodeContent::Light(lighting::star_glow()));

    let stars = graph.add_child(
        root,
        "starfield",
        NodeContent::instanced(Geometry::Octahedron { radius: 1.0 }, Material::unlit(Rgb::WHITE, 1.0)),
    );
    let star_instances: Vec<InstanceData> = starfield
        .stars
        .iter()
        .map(|s| InstanceData::new(s.transform(), [1.0; 3]))
        .collect();
    graph.patch_instances(stars, star_instances);

    let snow = graph.add_child(
        root,
        "snow",
        NodeContent::instanced(Geometry::Dodecahedron { radius: 1.0 }, Material::unlit(Rgb::WHITE, 0.8)),
    );

    let ids = SceneIds {
        tree,
        ornaments,
        trunk,
        boxes,
        spheres,
        diamonds,
        star_float,
        star,
        fill_light,
        starfield: stars,
        snow,
    };
    (graph, ids)
}
