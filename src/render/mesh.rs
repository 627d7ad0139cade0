//! Triangle meshes for the scene geometries.
//!
//! Polyhedra follow the usual construction: base solid, each face split into
//! `(detail + 1)^2` triangles, every vertex pushed out to the radius. Detail 0
//! gets flat face normals, higher detail gets smooth ones.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::scene::Geometry;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position: position.to_array(), normal: normal.to_array() }
    }
}

/// CPU-side mesh, counter-clockwise front faces.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn build(geometry: &Geometry) -> Self {
        match *geometry {
            Geometry::Box { width, height, depth } => cuboid(Vec3::new(width, height, depth) * 0.5),
            Geometry::Icosahedron { radius, detail } => polyhedron(&icosahedron(), radius, detail),
            Geometry::Octahedron { radius } => polyhedron(&octahedron(), radius, 0),
            Geometry::Dodecahedron { radius } => polyhedron(&dodecahedron(), radius, 0),
            Geometry::Cylinder { radius_top, radius_bottom, height, segments } => {
                cylinder(radius_top, radius_bottom, height, segments.max(3))
            }
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append a triangle, flipping it if its winding faces away from `outward`.
    fn push_triangle(&mut self, corners: [Vertex; 3], outward: Vec3) {
        let [a, b, c] = corners.map(|v| Vec3::from(v.position));
        let base = self.vertices.len() as u32;
        if (b - a).cross(c - a).dot(outward) < 0.0 {
            self.vertices.extend([corners[0], corners[2], corners[1]]);
        } else {
            self.vertices.extend(corners);
        }
        self.indices.extend([base, base + 1, base + 2]);
    }
}

struct Solid {
    vertices: Vec<Vec3>,
    faces: Vec<[usize; 3]>,
}

fn icosahedron() -> Solid {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    Solid {
        vertices: vec![
            Vec3::new(-1.0, t, 0.0), Vec3::new(1.0, t, 0.0), Vec3::new(-1.0, -t, 0.0), Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t), Vec3::new(0.0, 1.0, t), Vec3::new(0.0, -1.0, -t), Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0), Vec3::new(t, 0.0, 1.0), Vec3::new(-t, 0.0, -1.0), Vec3::new(-t, 0.0, 1.0),
        ],
        faces: vec![
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ],
    }
}

fn octahedron() -> Solid {
    Solid {
        vertices: vec![Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z],
        faces: vec![
            [0, 2, 4], [0, 4, 3], [0, 3, 5], [0, 5, 2],
            [1, 2, 5], [1, 5, 3], [1, 3, 4], [1, 4, 2],
        ],
    }
}

fn dodecahedron() -> Solid {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let r = 1.0 / t;
    Solid {
        vertices: vec![
            Vec3::new(-1.0, -1.0, -1.0), Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0), Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, -1.0), Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, -1.0), Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, -r, -t), Vec3::new(0.0, -r, t),
            Vec3::new(0.0, r, -t), Vec3::new(0.0, r, t),
            Vec3::new(-r, -t, 0.0), Vec3::new(-r, t, 0.0),
            Vec3::new(r, -t, 0.0), Vec3::new(r, t, 0.0),
            Vec3::new(-t, 0.0, -r), Vec3::new(t, 0.0, -r),
            Vec3::new(-t, 0.0, r), Vec3::new(t, 0.0, r),
        ],
        faces: vec![
            [3, 11, 7], [3, 7, 15], [3, 15, 13],
            [7, 19, 17], [7, 17, 6], [7, 6, 15],
            [17, 4, 8], [17, 8, 10], [17, 10, 6],
            [8, 0, 16], [8, 16, 2], [8, 2, 10],
            [0, 12, 1], [0, 1, 18], [0, 18, 16],
            [6, 10, 2], [6, 2, 13], [6, 13, 15],
            [2, 16, 18], [2, 18, 3], [2, 3, 13],
            [18, 1, 9], [18, 9, 11], [18, 11, 3],
            [4, 14, 12], [4, 12, 0], [4, 0, 8],
            [11, 9, 5], [11, 5, 19], [11, 19, 7],
            [19, 5, 14], [19, 14, 4], [19, 4, 17],
            [1, 12, 14], [1, 14, 5], [1, 5, 9],
        ],
    }
}

fn polyhedron(solid: &Solid, radius: f32, detail: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let cols = detail as usize + 1;
    let project = |p: Vec3| p.normalize() * radius;

    for face in &solid.faces {
        let [a, b, c] = face.map(|i| solid.vertices[i]);

        // Rows of points from the a-c edge towards b
        let mut rows: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
        for i in 0..=cols {
            let t = i as f32 / cols as f32;
            let aj = a.lerp(c, t);
            let bj = b.lerp(c, t);
            let rows_in = cols - i;
            let row = (0..=rows_in)
                .map(|j| if rows_in == 0 { aj } else { aj.lerp(bj, j as f32 / rows_in as f32) })
                .collect();
            rows.push(row);
        }

        for i in 0..cols {
            for j in 0..2 * (cols - i) - 1 {
                let k = j / 2;
                let corners = if j % 2 == 0 {
                    [rows[i][k + 1], rows[i + 1][k], rows[i][k]]
                } else {
                    [rows[i][k + 1], rows[i + 1][k + 1], rows[i + 1][k]]
                };
                let corners = corners.map(project);
                let centroid = (corners[0] + corners[1] + corners[2]) / 3.0;
                let flat = (corners[1] - corners[0]).cross(corners[2] - corners[0]).normalize_or_zero();
                let flat = if flat.dot(centroid) < 0.0 { -flat } else { flat };
                let vertices = corners.map(|p| {
                    let normal = if detail == 0 { flat } else { p.normalize() };
                    Vertex::new(p, normal)
                });
                mesh.push_triangle(vertices, centroid);
            }
        }
    }
    mesh
}

fn cuboid(half: Vec3) -> MeshData {
    let mut mesh = MeshData::default();
    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        for normal in [axis, -axis] {
            // Two tangents spanning the face
            let u = if axis == Vec3::Y { Vec3::X } else { Vec3::Y };
            let v = normal.cross(u);
            let center = normal * half;
            let corner = |su: f32, sv: f32| {
                Vertex::new(center + u * half * su + v * half * sv, normal)
            };
            let quad = [corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)];
            mesh.push_triangle([quad[0], quad[1], quad[2]], normal);
            mesh.push_triangle([quad[0], quad[2], quad[3]], normal);
        }
    }
    mesh
}

/// Side wall only, smooth normals tilted by the taper.
fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = height * 0.5;
    let slope = (radius_bottom - radius_top) / height;

    let ring = |i: u32| {
        let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
        let (sin, cos) = theta.sin_cos();
        let normal = Vec3::new(sin, slope, cos).normalize();
        (
            Vertex::new(Vec3::new(radius_top * sin, half, radius_top * cos), normal),
            Vertex::new(Vec3::new(radius_bottom * sin, -half, radius_bottom * cos), normal),
        )
    };

    for i in 0..segments {
        let (top_a, bottom_a) = ring(i);
        let (top_b, bottom_b) = ring(i + 1);
        let outward = Vec3::from(top_a.normal) + Vec3::from(top_b.normal);
        mesh.push_triangle([top_a, bottom_a, bottom_b], outward);
        mesh.push_triangle([top_a, bottom_b, top_b], outward);
    }
    mesh
}

/// A mesh resident on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let data = MeshData::build(geometry);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_indices"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vertex_buffer, index_buffer, index_count: data.indices.len() as u32 }
    }
}

/// Uploaded meshes keyed by geometry. The scene uses a handful of shapes,
/// so a linear scan is enough.
#[derive(Default)]
pub struct MeshCache {
    meshes: Vec<(Geometry, GpuMesh)>,
}

impl MeshCache {
    /// Index of the mesh for `geometry`, uploading it on first use.
    pub fn ensure(&mut self, device: &wgpu::Device, geometry: &Geometry) -> usize {
        if let Some(index) = self.meshes.iter().position(|(g, _)| g == geometry) {
            return index;
        }
        log::debug!("Uploading mesh for {:?}", geometry);
        self.meshes.push((*geometry, GpuMesh::upload(device, geometry)));
        self.meshes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&GpuMesh> {
        self.meshes.get(index).map(|(_, mesh)| mesh)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_on_sphere(mesh: &MeshData, radius: f32) {
        for v in &mesh.vertices {
            let len = Vec3::from(v.position).length();
            assert!((len - radius).abs() < 1e-4, "vertex at {len}, expected {radius}");
        }
    }

    fn assert_outward(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let centroid = (a + b + c) / 3.0;
            assert!((b - a).cross(c - a).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_icosahedron_detail() {
        let plain = MeshData::build(&Geometry::Icosahedron { radius: 0.9, detail: 0 });
        assert_eq!(plain.triangle_count(), 20);
        assert_on_sphere(&plain, 0.9);
        assert_outward(&plain);

        let fine = MeshData::build(&Geometry::Icosahedron { radius: 0.6, detail: 1 });
        assert_eq!(fine.triangle_count(), 80);
        assert_on_sphere(&fine, 0.6);
        assert_outward(&fine);
        // Smooth normals point along the position
        for v in &fine.vertices {
            let p = Vec3::from(v.position).normalize();
            assert!(p.dot(Vec3::from(v.normal)) > 0.999);
        }
    }

    #[test]
    fn test_octahedron_and_dodecahedron() {
        let octa = MeshData::build(&Geometry::Octahedron { radius: 0.7 });
        assert_eq!(octa.triangle_count(), 8);
        assert_on_sphere(&octa, 0.7);
        assert_outward(&octa);

        let dodeca = MeshData::build(&Geometry::Dodecahedron { radius: 1.0 });
        assert_eq!(dodeca.triangle_count(), 36);
        assert_on_sphere(&dodeca, 1.0);
        assert_outward(&dodeca);
    }

    #[test]
    fn test_flat_normals_are_unit() {
        let mesh = MeshData::build(&Geometry::Octahedron { radius: 2.0 });
        for v in &mesh.vertices {
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_box_extent() {
        let mesh = MeshData::build(&Geometry::Box { width: 0.2, height: 3.0, depth: 0.2 });
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertices.len(), 36);
        for v in &mesh.vertices {
            assert!((v.position[0].abs() - 0.1).abs() < 1e-6);
            assert!((v.position[1].abs() - 1.5).abs() < 1e-6);
            assert!((v.position[2].abs() - 0.1).abs() < 1e-6);
        }
        assert_outward(&mesh);
    }

    #[test]
    fn test_cylinder_taper() {
        let mesh = MeshData::build(&Geometry::Cylinder {
            radius_top: 0.2,
            radius_bottom: 0.8,
            height: 8.0,
            segments: 8,
        });
        assert_eq!(mesh.triangle_count(), 16);
        for v in &mesh.vertices {
            let planar = (v.position[0].powi(2) + v.position[2].powi(2)).sqrt();
            let expected = if v.position[1] > 0.0 { 0.2 } else { 0.8 };
            assert!((planar - expected).abs() < 1e-5);
            // Wider at the bottom, so normals tilt upward
            assert!(v.normal[1] > 0.0);
        }
    }

    #[test]
    fn test_cylinder_segment_floor() {
        let mesh = MeshData::build(&Geometry::Cylinder {
            radius_top: 1.0,
            radius_bottom: 1.0,
            height: 1.0,
            segments: 1,
        });
        assert_eq!(mesh.triangle_count(), 6);
    }
}
