// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation and repair utilities

use super::{Mesh, Triangle};
use std::collections::{HashMap, HashSet};

/// Undirected edge, smaller index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub v0: usize,
    pub v1: usize,
}

impl Edge {
    pub fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

fn triangle_edges(triangle: &Triangle) -> [(usize, usize); 3] {
    let [a, b, c] = triangle.indices;
    [(a, b), (b, c), (c, a)]
}

/// Build edge count map for a mesh
pub fn build_edge_counts(mesh: &Mesh) -> HashMap<Edge, u32> {
    let mut edge_counts: HashMap<Edge, u32> = HashMap::with_capacity(mesh.triangles.len() * 3 / 2);

    for triangle in &mesh.triangles {
        for (a, b) in triangle_edges(triangle) {
            *edge_counts.entry(Edge::new(a, b)).or_insert(0) += 1;
        }
    }

    edge_counts
}

/// Check if mesh is manifold (each edge shared by at most 2 triangles)
pub fn is_manifold(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count <= 2)
}

/// Check if mesh is closed (each edge shared by exactly 2 triangles)
pub fn is_closed(mesh: &Mesh) -> bool {
    !mesh.triangles.is_empty() && build_edge_counts(mesh).values().all(|&count| count == 2)
}

/// Find all boundary edges (edges shared by exactly 1 triangle)
pub fn find_boundary_edges(mesh: &Mesh) -> HashSet<Edge> {
    build_edge_counts(mesh)
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(edge, _)| edge)
        .collect()
}

/// Mesh validation report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshValidation {
    pub is_manifold: bool,
    pub is_closed: bool,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
}

pub fn validate_mesh(mesh: &Mesh) -> MeshValidation {
    let edge_counts = build_edge_counts(mesh);

    MeshValidation {
        is_manifold: edge_counts.values().all(|&count| count <= 2),
        is_closed: !mesh.triangles.is_empty() && edge_counts.values().all(|&count| count == 2),
        edge_count: edge_counts.len(),
        boundary_edge_count: edge_counts.values().filter(|&&count| count == 1).count(),
    }
}

/// Close boundary loops with triangle fans.
///
/// Each hole is traced along its directed boundary half-edges and capped with
/// triangles wound opposite to the rim, so the caps face the same way as the
/// surrounding surface. Boundaries that do not form simple loops (for example
/// at non-manifold vertices) are left untouched. Returns the number of holes
/// filled.
pub fn fill_holes(mesh: &mut Mesh) -> usize {
    let mut directed: HashSet<(usize, usize)> = HashSet::new();
    for triangle in &mesh.triangles {
        for edge in triangle_edges(triangle) {
            directed.insert(edge);
        }
    }

    // Half-edges without a twin form the rims of holes
    let mut next: HashMap<usize, usize> = HashMap::new();
    let mut ambiguous: HashSet<usize> = HashSet::new();
    for &(a, b) in &directed {
        if !directed.contains(&(b, a)) && next.insert(a, b).is_some() {
            ambiguous.insert(a);
        }
    }

    let mut starts: Vec<usize> = next.keys().copied().collect();
    starts.sort_unstable();

    let mut visited: HashSet<usize> = HashSet::new();
    let mut filled = 0;

    for start in starts {
        if visited.contains(&start) {
            continue;
        }

        let mut rim = vec![start];
        let mut current = start;
        let closed = loop {
            if ambiguous.contains(&current) {
                break false;
            }
            let Some(&following) = next.get(&current) else {
                break false;
            };
            if following == start {
                break true;
            }
            if rim.len() > next.len() || rim.contains(&following) {
                break false;
            }
            rim.push(following);
            current = following;
        };

        visited.extend(rim.iter().copied());
        if !closed || rim.len() < 3 {
            continue;
        }

        // The rim runs with the surface winding; the cap runs against it
        let anchor = rim[0];
        for pair in rim[1..].windows(2) {
            mesh.add_triangle(Triangle::new([anchor, pair[1], pair[0]]));
        }
        filled += 1;
    }

    if filled > 0 {
        mesh.recompute_normals();
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::analytics::signed_volume;
    use crate::geometry::{Axis, Primitive};
    use nalgebra::{Point3, Vector3};

    fn welded_cube() -> Mesh {
        let mut mesh = Primitive::cuboid(Vector3::new(10.0, 10.0, 10.0), Point3::origin()).to_mesh();
        mesh.weld_vertices(1e-6);
        mesh
    }

    #[test]
    fn test_cube_soup_is_manifold_but_open() {
        let mesh = Primitive::cuboid(Vector3::new(10.0, 10.0, 10.0), Point3::origin()).to_mesh();
        assert!(is_manifold(&mesh));
        assert!(!is_closed(&mesh));
    }

    #[test]
    fn test_welded_cube_is_closed() {
        let validation = validate_mesh(&welded_cube());

        assert!(validation.is_manifold);
        assert!(validation.is_closed);
        assert_eq!(validation.edge_count, 18);
        assert_eq!(validation.boundary_edge_count, 0);
    }

    #[test]
    fn test_cylinder_is_closed() {
        let mesh = Primitive::cylinder(5.0, 10.0, Axis::Z, 32).to_mesh();
        assert!(is_closed(&mesh), "Cylinder should be closed");
        assert!(find_boundary_edges(&mesh).is_empty());
    }

    #[test]
    fn test_empty_mesh_is_not_closed() {
        assert!(!is_closed(&Mesh::new()));
    }

    #[test]
    fn test_fill_single_missing_triangle() {
        let mut mesh = welded_cube();
        let removed = mesh.triangles.remove(0);
        assert!(!is_closed(&mesh));
        assert_eq!(find_boundary_edges(&mesh).len(), 3);

        let filled = fill_holes(&mut mesh);

        assert_eq!(filled, 1);
        assert!(is_closed(&mesh));
        assert_eq!(mesh.triangle_count(), 12);
        let cap = mesh.triangles[11];
        let rotations = [
            removed.indices,
            [removed.indices[1], removed.indices[2], removed.indices[0]],
            [removed.indices[2], removed.indices[0], removed.indices[1]],
        ];
        assert!(rotations.contains(&cap.indices));
        assert!((signed_volume(&mesh) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_fill_missing_cylinder_cap() {
        let mut mesh = Primitive::cylinder(5.0, 10.0, Axis::Z, 16).to_mesh();
        let full_volume = signed_volume(&mesh);

        // Drop the bottom cap fan and its center vertex stays orphaned
        let cap_center = 0;
        mesh.triangles.retain(|t| !t.indices.contains(&cap_center));
        assert!(!is_closed(&mesh));

        assert_eq!(fill_holes(&mut mesh), 1);
        assert!(is_closed(&mesh));
        assert!((signed_volume(&mesh) - full_volume).abs() < 1e-6);
    }

    #[test]
    fn test_fill_holes_on_closed_mesh_is_noop() {
        let mut mesh = welded_cube();
        assert_eq!(fill_holes(&mut mesh), 0);
        assert_eq!(mesh.triangle_count(), 12);
    }
}
