// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Each operand is converted to convex polygons and organised into a BSP
//! tree. Booleans are expressed as clip / invert sequences over the two
//! trees, and the surviving polygons are fanned back into a mesh.
//!
//! A face split by a plane of the other operand no longer shares its edge
//! points with its neighbor. Shared edges are subdivided at every welded
//! vertex lying on them before triangulating, so results stay closed.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

/// Distance below which a point is treated as lying on a plane
const PLANE_EPSILON: f64 = 1e-7;

/// Area below which an input triangle is discarded
const MIN_TRIANGLE_AREA: f64 = 1e-12;

/// Distance within which a vertex counts as lying on a polygon edge
const EDGE_EPSILON: f64 = 1e-6;

/// Stack headroom kept free before recursing deeper into a tree
const STACK_RED_ZONE: usize = 64 * 1024;

/// Stack segment allocated when the red zone is reached
const STACK_GROWTH: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Coplanar,
    Front,
    Back,
    Spanning,
}

impl Side {
    fn of(distance: f64) -> Self {
        if distance < -PLANE_EPSILON {
            Side::Back
        } else if distance > PLANE_EPSILON {
            Side::Front
        } else {
            Side::Coplanar
        }
    }

    fn combine(self, other: Side) -> Side {
        match (self, other) {
            (Side::Coplanar, s) | (s, Side::Coplanar) => s,
            (a, b) if a == b => a,
            _ => Side::Spanning,
        }
    }
}

/// Destination lists for `Plane::split_polygon`
struct SplitTargets<'a> {
    coplanar_front: &'a mut Vec<Polygon>,
    coplanar_back: &'a mut Vec<Polygon>,
    front: &'a mut Vec<Polygon>,
    back: &'a mut Vec<Polygon>,
}

impl Plane {
    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn distance(&self, vertex: &Vertex) -> f64 {
        self.normal.dot(&vertex.position.coords) - self.w
    }

    fn split_polygon(&self, polygon: Polygon, out: SplitTargets<'_>) {
        let sides: Vec<Side> = polygon
            .vertices
            .iter()
            .map(|v| Side::of(self.distance(v)))
            .collect();
        let polygon_side = sides.iter().fold(Side::Coplanar, |acc, s| acc.combine(*s));

        match polygon_side {
            Side::Coplanar => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    out.coplanar_front.push(polygon);
                } else {
                    out.coplanar_back.push(polygon);
                }
            }
            Side::Front => out.front.push(polygon),
            Side::Back => out.back.push(polygon),
            Side::Spanning => {
                let count = polygon.vertices.len();
                let mut front = Vec::with_capacity(count + 1);
                let mut back = Vec::with_capacity(count + 1);

                for i in 0..count {
                    let j = (i + 1) % count;
                    let (si, sj) = (sides[i], sides[j]);
                    let vi = &polygon.vertices[i];
                    let vj = &polygon.vertices[j];

                    if si != Side::Back {
                        front.push(*vi);
                    }
                    if si != Side::Front {
                        back.push(*vi);
                    }
                    if si.combine(sj) == Side::Spanning {
                        let denom = self.normal.dot(&(vj.position - vi.position));
                        let t = (self.w - self.normal.dot(&vi.position.coords)) / denom;
                        let v = vi.interpolate(vj, t);
                        front.push(v);
                        back.push(v);
                    }
                }

                if front.len() >= 3 {
                    out.front.push(Polygon::with_plane(front, polygon.plane));
                }
                if back.len() >= 3 {
                    out.back.push(Polygon::with_plane(back, polygon.plane));
                }
            }
        }
    }
}

/// Convex planar polygon
#[derive(Debug, Clone)]
struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
}

impl Polygon {
    /// Build from a triangle; `None` when the triangle has no area
    fn from_triangle(vertices: [Vertex; 3]) -> Option<Self> {
        let [a, b, c] = vertices;
        let cross = (b.position - a.position).cross(&(c.position - a.position));
        if cross.norm() * 0.5 < MIN_TRIANGLE_AREA {
            return None;
        }
        let normal = cross.normalize();
        Some(Self {
            vertices: vertices.to_vec(),
            plane: Plane {
                normal,
                w: normal.dot(&a.position.coords),
            },
        })
    }

    fn with_plane(vertices: Vec<Vertex>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.normal = -v.normal;
        }
        self.plane.flip();
    }
}

/// BSP tree node
#[derive(Debug, Default)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<Polygon>,
}

impl BspNode {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            let plane = *self.plane.get_or_insert(polygons[0].plane);

            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                plane.split_polygon(
                    polygon,
                    SplitTargets {
                        coplanar_front: &mut coplanar_front,
                        coplanar_back: &mut coplanar_back,
                        front: &mut front,
                        back: &mut back,
                    },
                );
            }
            self.polygons.append(&mut coplanar_front);
            self.polygons.append(&mut coplanar_back);

            if !front.is_empty() {
                self.front.get_or_insert_with(Box::default).build(front);
            }
            if !back.is_empty() {
                self.back.get_or_insert_with(Box::default).build(back);
            }
        });
    }

    /// Swap solid and empty space
    fn invert(&mut self) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            for polygon in &mut self.polygons {
                polygon.flip();
            }
            if let Some(plane) = &mut self.plane {
                plane.flip();
            }
            if let Some(front) = &mut self.front {
                front.invert();
            }
            if let Some(back) = &mut self.back {
                back.invert();
            }
            std::mem::swap(&mut self.front, &mut self.back);
        });
    }

    /// Remove the parts of `polygons` that lie inside this tree's solid
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                plane.split_polygon(
                    polygon,
                    SplitTargets {
                        coplanar_front: &mut coplanar_front,
                        coplanar_back: &mut coplanar_back,
                        front: &mut front,
                        back: &mut back,
                    },
                );
            }
            front.append(&mut coplanar_front);
            back.append(&mut coplanar_back);

            let mut result = match &self.front {
                Some(node) => node.clip_polygons(front),
                None => front,
            };
            if let Some(node) = &self.back {
                result.extend(node.clip_polygons(back));
            }
            result
        })
    }

    /// Remove everything in this tree that lies inside `other`
    fn clip_to(&mut self, other: &BspNode) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
            if let Some(front) = &mut self.front {
                front.clip_to(other);
            }
            if let Some(back) = &mut self.back {
                back.clip_to(other);
            }
        });
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = Vec::new();
        self.collect_polygons(&mut result);
        result
    }

    fn collect_polygons(&self, out: &mut Vec<Polygon>) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            out.extend(self.polygons.iter().cloned());
            if let Some(front) = &self.front {
                front.collect_polygons(out);
            }
            if let Some(back) = &self.back {
                back.collect_polygons(out);
            }
        });
    }
}

fn mesh_to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    mesh.triangles
        .iter()
        .filter_map(|tri| {
            Polygon::from_triangle([
                mesh.vertices[tri.indices[0]],
                mesh.vertices[tri.indices[1]],
                mesh.vertices[tri.indices[2]],
            ])
        })
        .collect()
}

/// Triangulate polygons back into a mesh, sharing coincident vertices
fn polygons_to_mesh(polygons: &[Polygon]) -> Mesh {
    let corner_count: usize = polygons.iter().map(|p| p.vertices.len()).sum();
    let mut mesh = Mesh::with_capacity(corner_count, corner_count);
    let mut cells: HashMap<(i64, i64, i64), usize> = HashMap::with_capacity(corner_count);
    let inv = 1.0 / PLANE_EPSILON;

    let mut rings: Vec<(Vec<usize>, Vector3<f64>)> = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let normal = polygon.plane.normal;
        let mut ring: Vec<usize> = Vec::with_capacity(polygon.vertices.len());
        for vertex in &polygon.vertices {
            let p = vertex.position;
            let key = (
                (p.x * inv).round() as i64,
                (p.y * inv).round() as i64,
                (p.z * inv).round() as i64,
            );
            let index = *cells
                .entry(key)
                .or_insert_with(|| mesh.add_vertex(Vertex::new(p, normal)));
            if ring.last() != Some(&index) {
                ring.push(index);
            }
        }
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() >= 3 {
            rings.push((ring, normal));
        }
    }

    let positions: Vec<Point3<f64>> = mesh.vertices.iter().map(|v| v.position).collect();
    let mut by_x: Vec<usize> = (0..positions.len()).collect();
    by_x.sort_by(|&a, &b| positions[a].x.total_cmp(&positions[b].x));

    for (ring, normal) in &rings {
        let ring = subdivide_edges(ring, &positions, &by_x);
        triangulate(&mut mesh, &ring, *normal);
    }

    mesh.remove_degenerate_triangles(MIN_TRIANGLE_AREA);
    mesh.remove_orphaned_vertices();
    mesh
}

/// Insert every vertex lying strictly inside an edge of `ring`, in order
/// along that edge. `by_x` indexes `positions` sorted by x.
fn subdivide_edges(ring: &[usize], positions: &[Point3<f64>], by_x: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(ring.len());
    let mut on_edge: Vec<(f64, usize)> = Vec::new();

    for (i, &a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        out.push(a);

        let (pa, pb) = (positions[a], positions[b]);
        let edge = pb - pa;
        let length_sq = edge.norm_squared();
        if length_sq <= EDGE_EPSILON * EDGE_EPSILON {
            continue;
        }

        let lo = pa.x.min(pb.x) - EDGE_EPSILON;
        let hi = pa.x.max(pb.x) + EDGE_EPSILON;
        let start = by_x.partition_point(|&k| positions[k].x < lo);

        on_edge.clear();
        for &k in by_x[start..].iter().take_while(|&&k| positions[k].x <= hi) {
            if ring.contains(&k) {
                continue;
            }
            let offset = positions[k] - pa;
            let t = offset.dot(&edge) / length_sq;
            if t <= 0.0 || t >= 1.0 {
                continue;
            }
            if (offset - edge * t).norm() < EDGE_EPSILON {
                on_edge.push((t, k));
            }
        }
        on_edge.sort_by(|x, y| x.0.total_cmp(&y.0));
        out.extend(on_edge.iter().map(|&(_, k)| k));
    }
    out
}

/// Fan a convex ring from its first corner. When that would produce a
/// sliver (collinear points on an edge through the corner), fan from an
/// added center vertex instead so every boundary edge keeps its triangle.
fn triangulate(mesh: &mut Mesh, ring: &[usize], normal: Vector3<f64>) {
    let area = |a: usize, b: usize, c: usize| {
        let (pa, pb, pc) = (
            mesh.vertices[a].position,
            mesh.vertices[b].position,
            mesh.vertices[c].position,
        );
        (pb - pa).cross(&(pc - pa)).norm() * 0.5
    };
    let fan_is_clean = ring[1..]
        .windows(2)
        .all(|pair| area(ring[0], pair[0], pair[1]) > MIN_TRIANGLE_AREA);

    if fan_is_clean || ring.len() == 3 {
        for pair in ring[1..].windows(2) {
            mesh.add_triangle(Triangle::new([ring[0], pair[0], pair[1]]));
        }
        return;
    }

    let sum = ring
        .iter()
        .fold(Vector3::zeros(), |acc, &k| acc + mesh.vertices[k].position.coords);
    let center = Point3::from(sum / ring.len() as f64);
    let hub = mesh.add_vertex(Vertex::new(center, normal));
    for (i, &a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        mesh.add_triangle(Triangle::new([hub, a, b]));
    }
}

/// A ∪ B
pub fn csg_union(a: &Mesh, b: &Mesh) -> Mesh {
    let mut tree_a = BspNode::new(mesh_to_polygons(a));
    let mut tree_b = BspNode::new(mesh_to_polygons(b));

    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());

    polygons_to_mesh(&tree_a.all_polygons())
}

/// A − B
pub fn csg_difference(a: &Mesh, b: &Mesh) -> Mesh {
    let mut tree_a = BspNode::new(mesh_to_polygons(a));
    let mut tree_b = BspNode::new(mesh_to_polygons(b));

    tree_a.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    polygons_to_mesh(&tree_a.all_polygons())
}

/// A ∩ B
pub fn csg_intersection(a: &Mesh, b: &Mesh) -> Mesh {
    let mut tree_a = BspNode::new(mesh_to_polygons(a));
    let mut tree_b = BspNode::new(mesh_to_polygons(b));

    tree_a.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    polygons_to_mesh(&tree_a.all_polygons())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::analytics::signed_volume;
    use crate::geometry::mesh_utils::{find_boundary_edges, is_closed};
    use crate::geometry::{Axis, Primitive};
    use nalgebra::{Point3, Vector3};

    fn cube(size: f64, center: [f64; 3]) -> Mesh {
        Primitive::cuboid(
            Vector3::repeat(size),
            Point3::new(center[0], center[1], center[2]),
        )
        .to_mesh()
    }

    fn assert_volume(mesh: &Mesh, expected: f64) {
        let volume = signed_volume(mesh);
        assert!(
            (volume - expected).abs() < 1e-6 * expected.max(1.0),
            "volume {} != expected {}",
            volume,
            expected
        );
    }

    #[test]
    fn test_union_of_overlapping_cubes() {
        let result = csg_union(&cube(10.0, [0.0; 3]), &cube(10.0, [5.0, 0.0, 0.0]));
        assert_volume(&result, 1500.0);

        let bbox = result.bounding_box();
        assert!((bbox.min.x + 5.0).abs() < 1e-9);
        assert!((bbox.max.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_difference_of_overlapping_cubes() {
        let result = csg_difference(&cube(10.0, [0.0; 3]), &cube(10.0, [5.0, 0.0, 0.0]));
        assert_volume(&result, 500.0);
        assert!((result.bounding_box().max.x).abs() < 1e-9);
    }

    #[test]
    fn test_intersection_of_overlapping_cubes() {
        let result = csg_intersection(&cube(10.0, [0.0; 3]), &cube(10.0, [5.0, 5.0, 0.0]));
        assert_volume(&result, 250.0);
    }

    #[test]
    fn test_hollowing_a_block() {
        let result = csg_difference(&cube(70.0, [0.0; 3]), &cube(50.0, [0.0; 3]));
        assert_volume(&result, 343_000.0 - 125_000.0);
        assert!(result.bounding_box().approx_eq(&cube(70.0, [0.0; 3]).bounding_box(), 1e-9));
        assert!(is_closed(&result));
    }

    #[test]
    fn test_cut_shell_has_no_t_junctions() {
        // The cap at z = 0 and the side walls are split at different points
        // along their shared edges
        let shell = csg_difference(&cube(70.0, [0.0; 3]), &cube(50.0, [0.0; 3]));
        let upper = Primitive::cuboid(Vector3::new(90.0, 90.0, 45.0), Point3::new(0.0, 0.0, 22.5))
            .to_mesh();
        let half = csg_intersection(&shell, &upper);

        assert_volume(&half, 109_000.0);
        assert!(find_boundary_edges(&half).is_empty());
        assert!(is_closed(&half));

        let mut peg = Primitive::cylinder(2.5, 10.0, Axis::Z, 16).to_mesh();
        peg.translate(&Vector3::new(30.0, 30.0, 0.0));
        let keyed = csg_difference(&half, &peg);
        assert!(is_closed(&keyed));
    }

    #[test]
    fn test_collinear_edge_points_keep_ring_closed() {
        let positions: [Point3<f64>; 6] = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let mut by_x: Vec<usize> = (0..positions.len()).collect();
        by_x.sort_by(|&a, &b| positions[a].x.total_cmp(&positions[b].x));

        // Points 3 and 4 lie on the first edge, point 5 lies on no edge
        let ring = subdivide_edges(&[0, 1, 2], &positions, &by_x);
        assert_eq!(ring, vec![0, 3, 4, 1, 2]);

        let mut mesh = Mesh::new();
        for p in &positions {
            mesh.add_vertex(Vertex::new(*p, Vector3::z()));
        }
        triangulate(&mut mesh, &ring, Vector3::z());
        // Fanning from corner 0 would flatten (0, 3, 4), so a hub is added
        assert_eq!(mesh.vertices.len(), positions.len() + 1);
        assert_eq!(mesh.triangles.len(), ring.len());
        assert!(mesh.triangles.iter().all(|t| mesh.face_normal(t).is_some()));
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let result = csg_intersection(&cube(2.0, [0.0; 3]), &cube(2.0, [10.0, 0.0, 0.0]));
        assert!(result.is_empty());
    }

    #[test]
    fn test_cylinder_through_block() {
        let block = cube(20.0, [0.0; 3]);
        let mut rod = Primitive::cylinder(2.0, 30.0, Axis::X, 16).to_mesh();
        rod.translate(&Vector3::new(0.0, 0.0, 3.0));

        let rod_volume = signed_volume(&rod);
        let inside = csg_intersection(&block, &rod);
        // Two thirds of the rod length is inside the block
        assert_volume(&inside, rod_volume * 20.0 / 30.0);

        let drilled = csg_difference(&block, &rod);
        assert_volume(&drilled, 8000.0 - rod_volume * 20.0 / 30.0);
        assert!(is_closed(&drilled));
    }

    #[test]
    fn test_degenerate_triangles_are_ignored() {
        let mut mesh = cube(4.0, [0.0; 3]);
        let n = Vector3::z();
        let a = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, 0.0), n));
        let b = mesh.add_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0), n));
        let c = mesh.add_vertex(Vertex::new(Point3::new(2.0, 0.0, 0.0), n));
        mesh.add_triangle(Triangle::new([a, b, c]));

        assert_eq!(mesh_to_polygons(&mesh).len(), 12);
    }
}
