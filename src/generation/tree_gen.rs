//! Ornament layout generator.
//!
//! Scatters candidates through a cone, colors them from the active theme's
//! weighted table and sorts them into one bucket per shape. Every candidate
//! lands in exactly one bucket.

use std::collections::BTreeMap;
use std::f32::consts::{PI, TAU};

use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::OrnamentTheme;
use crate::math::Aabb;
use super::palette::PaletteColor;
use super::unit;
use super::weights::WeightedTable;

/// Geometric ornament kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrnamentShape {
    Box,
    Sphere,
    Diamond,
}

impl OrnamentShape {
    pub const ALL: [OrnamentShape; 3] = [Self::Box, Self::Sphere, Self::Diamond];

    /// Whether instances of this shape are oriented
    pub fn is_rotated(self) -> bool {
        !matches!(self, Self::Sphere)
    }
}

/// Cone and scale parameters for a layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Candidates drawn per layout
    pub candidate_count: usize,
    /// Height of the cone base
    pub base_y: f32,
    pub height: f32,
    /// Planar radius at the base
    pub max_radius: f32,
    /// Lower bound of the squared radial fraction; keeps the core from emptying
    pub fill_floor: f32,
    pub scale_min: f32,
    pub scale_max: f32,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            candidate_count: 750,
            base_y: -3.5,
            height: 10.0,
            max_radius: 4.0,
            fill_floor: 0.2,
            scale_min: 0.15,
            scale_max: 0.5,
        }
    }
}

impl TreeParams {
    /// Planar cone radius at height `y` (0 at and above the apex)
    pub fn radius_at(&self, y: f32) -> f32 {
        let fraction = ((y - self.base_y) / self.height).clamp(0.0, 1.0);
        self.max_radius * (1.0 - fraction)
    }

    pub fn apex_y(&self) -> f32 {
        self.base_y + self.height
    }
}

/// One generated ornament, in ornament-group space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedInstance {
    pub position: Vec3,
    pub scale: f32,
    /// Euler XYZ, each component in `[0, π)`; `None` for spheres
    pub rotation: Option<Vec3>,
    pub color: PaletteColor,
}

impl PlacedInstance {
    /// Local transform: translate, rotate, uniform scale
    pub fn transform(&self) -> Mat4 {
        let rotation = self
            .rotation
            .map_or(Quat::IDENTITY, |r| Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z));
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }
}

/// All instances of one shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeBucket {
    pub shape: OrnamentShape,
    pub instances: Vec<PlacedInstance>,
}

impl ShapeBucket {
    fn new(shape: OrnamentShape) -> Self {
        Self { shape, instances: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// A generated tree: three disjoint buckets.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeLayout {
    pub theme: OrnamentTheme,
    pub boxes: ShapeBucket,
    pub spheres: ShapeBucket,
    pub diamonds: ShapeBucket,
}

impl TreeLayout {
    fn empty(theme: OrnamentTheme) -> Self {
        Self {
            theme,
            boxes: ShapeBucket::new(OrnamentShape::Box),
            spheres: ShapeBucket::new(OrnamentShape::Sphere),
            diamonds: ShapeBucket::new(OrnamentShape::Diamond),
        }
    }

    pub fn bucket(&self, shape: OrnamentShape) -> &ShapeBucket {
        match shape {
            OrnamentShape::Box => &self.boxes,
            OrnamentShape::Sphere => &self.spheres,
            OrnamentShape::Diamond => &self.diamonds,
        }
    }

    fn bucket_mut(&mut self, shape: OrnamentShape) -> &mut ShapeBucket {
        match shape {
            OrnamentShape::Box => &mut self.boxes,
            OrnamentShape::Sphere => &mut self.spheres,
            OrnamentShape::Diamond => &mut self.diamonds,
        }
    }

    pub fn buckets(&self) -> [&ShapeBucket; 3] {
        [&self.boxes, &self.spheres, &self.diamonds]
    }

    /// Total instances across buckets
    pub fn len(&self) -> usize {
        self.buckets().iter().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedInstance> {
        self.boxes
            .instances
            .iter()
            .chain(&self.spheres.instances)
            .chain(&self.diamonds.instances)
    }

    /// Instance count per color
    pub fn color_histogram(&self) -> BTreeMap<PaletteColor, usize> {
        let mut histogram = BTreeMap::new();
        for instance in self.iter() {
            *histogram.entry(instance.color).or_insert(0) += 1;
        }
        histogram
    }

    /// Bounds of instance centers
    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.iter();
        let first = iter.next()?.position;
        Some(iter.fold(Aabb::new(first, first), |mut aabb, i| {
            aabb.expand(i.position);
            aabb
        }))
    }
}

/// Draws [`TreeLayout`]s.
pub struct TreeGenerator {
    params: TreeParams,
    gold: WeightedTable<PaletteColor>,
    red: WeightedTable<PaletteColor>,
    silver: WeightedTable<PaletteColor>,
    shapes: WeightedTable<OrnamentShape>,
}

impl TreeGenerator {
    pub fn new(params: TreeParams) -> Self {
        use PaletteColor::*;

        // Constant tables with positive weights always build
        let table = |weights: &[(PaletteColor, f32)]| {
            WeightedTable::new(weights).unwrap_or_else(|| unreachable!())
        };
        Self {
            params,
            gold: table(&[(Gold, 0.60), (Green, 0.20), (Red, 0.15), (Black, 0.05)]),
            red: table(&[(Red, 0.60), (Gold, 0.20), (Green, 0.15), (Black, 0.05)]),
            silver: table(&[(Silver, 0.60), (Gold, 0.20), (Green, 0.15), (Black, 0.05)]),
            shapes: WeightedTable::new(&[
                (OrnamentShape::Box, 0.45),
                (OrnamentShape::Sphere, 0.30),
                (OrnamentShape::Diamond, 0.25),
            ])
            .unwrap_or_else(|| unreachable!()),
        }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Color table for a theme
    pub fn color_table(&self, theme: OrnamentTheme) -> &WeightedTable<PaletteColor> {
        match theme {
            OrnamentTheme::Gold => &self.gold,
            OrnamentTheme::Red => &self.red,
            OrnamentTheme::Silver => &self.silver,
        }
    }

    /// Generate a full layout for `theme`.
    pub fn generate<R: Rng + ?Sized>(&self, theme: OrnamentTheme, rng: &mut R) -> TreeLayout {
        let p = &self.params;
        let colors = self.color_table(theme);
        let mut layout = TreeLayout::empty(theme);

        for _ in 0..p.candidate_count {
            let y = p.base_y + unit(rng) * p.height;
            let radius_at_height = p.radius_at(y);
            let r = radius_at_height * (p.fill_floor + (1.0 - p.fill_floor) * unit(rng)).sqrt();
            let theta = unit(rng) * TAU;
            let position = Vec3::new(r * theta.cos(), y, r * theta.sin());

            let scale = p.scale_min + unit(rng) * (p.scale_max - p.scale_min);
            let color = colors.pick(unit(rng));
            let rotation = Vec3::new(unit(rng) * PI, unit(rng) * PI, unit(rng) * PI);
            let shape = self.shapes.pick(unit(rng));

            layout.bucket_mut(shape).instances.push(PlacedInstance {
                position,
                scale,
                rotation: shape.is_rotated().then_some(rotation),
                color,
            });
        }

        log::debug!(
            "Generated {} tree: {} boxes, {} spheres, {} diamonds",
            theme.name(),
            layout.boxes.len(),
            layout.spheres.len(),
            layout.diamonds.len()
        );
        layout
    }
}

impl Default for TreeGenerator {
    fn default() -> Self {
        Self::new(TreeParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn layout(theme: OrnamentTheme, count: usize, seed: u64) -> TreeLayout {
        let generator = TreeGenerator::new(TreeParams { candidate_count: count, ..Default::default() });
        generator.generate(theme, &mut SmallRng::seed_from_u64(seed))
    }

    #[test]
    fn test_buckets_partition_candidates() {
        let tree = layout(OrnamentTheme::Gold, 750, 1);
        assert_eq!(tree.len(), 750);
        assert_eq!(tree.iter().count(), 750);
        for shape in OrnamentShape::ALL {
            assert!(tree.bucket(shape).instances.len() > 0, "{shape:?} empty");
            assert_eq!(tree.bucket(shape).shape, shape);
        }
    }

    #[test]
    fn test_instances_stay_inside_cone() {
        let params = TreeParams::default();
        let tree = layout(OrnamentTheme::Red, 2000, 2);
        for instance in tree.iter() {
            let p = instance.position;
            assert!(p.y >= params.base_y && p.y < params.apex_y());
            let planar = (p.x * p.x + p.z * p.z).sqrt();
            assert!(planar <= params.radius_at(p.y) + 1e-4, "{p:?} outside cone");
        }
    }

    #[test]
    fn test_scale_and_rotation_ranges() {
        let tree = layout(OrnamentTheme::Silver, 1000, 3);
        for instance in tree.iter() {
            assert!(instance.scale >= 0.15 && instance.scale < 0.5);
        }
        assert!(tree.spheres.instances.iter().all(|i| i.rotation.is_none()));
        for instance in tree.boxes.instances.iter().chain(&tree.diamonds.instances) {
            let r = instance.rotation.unwrap();
            for c in [r.x, r.y, r.z] {
                assert!((0.0..PI).contains(&c));
            }
        }
    }

    #[test]
    fn test_gold_color_distribution() {
        // Chi-square, 3 degrees of freedom; 16.27 is the p = 0.001 cutoff
        let n = 6000;
        let tree = layout(OrnamentTheme::Gold, n, 4);
        let histogram = tree.color_histogram();
        let expected = [
            (PaletteColor::Gold, 0.60),
            (PaletteColor::Green, 0.20),
            (PaletteColor::Red, 0.15),
            (PaletteColor::Black, 0.05),
        ];
        let chi2: f64 = expected
            .iter()
            .map(|(color, p)| {
                let e = n as f64 * p;
                let o = *histogram.get(color).unwrap_or(&0) as f64;
                (o - e).powi(2) / e
            })
            .sum();
        assert!(chi2 < 16.27, "chi2 = {chi2}");
        assert!(!histogram.contains_key(&PaletteColor::Silver));
    }

    #[test]
    fn test_red_theme_is_mostly_red() {
        let tree = layout(OrnamentTheme::Red, 5000, 5);
        let histogram = tree.color_histogram();
        let (modal, _) = histogram.iter().max_by_key(|(_, count)| **count).unwrap();
        assert_eq!(*modal, PaletteColor::Red);
    }

    #[test]
    fn test_same_seed_same_layout() {
        assert_eq!(layout(OrnamentTheme::Gold, 300, 9), layout(OrnamentTheme::Gold, 300, 9));
    }

    #[test]
    fn test_transform_places_instance() {
        let instance = PlacedInstance {
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: 0.5,
            rotation: None,
            color: PaletteColor::Gold,
        };
        let p = instance.transform().transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.5, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_bounds() {
        let tree = layout(OrnamentTheme::Gold, 500, 6);
        let bounds = tree.bounds().unwrap();
        assert!(bounds.min.y >= -3.5 && bounds.max.y < 6.5);
        assert!(bounds.max.x <= 4.0 && bounds.min.x >= -4.0);
        assert!(layout(OrnamentTheme::Gold, 0, 6).bounds().is_none());
    }
}
