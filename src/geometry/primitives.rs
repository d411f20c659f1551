// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Principal axis a cylinder is aligned with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Geometric primitives.
///
/// Every primitive is centered on its own origin, so placing one only needs a
/// translation.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Cuboid { extents: Vector3<f64>, center: Point3<f64> },
    Cylinder { radius: f64, height: f64, axis: Axis, segments: u32 },
}

impl Primitive {
    pub fn cuboid(extents: Vector3<f64>, center: Point3<f64>) -> Self {
        Self::Cuboid { extents, center }
    }

    pub fn cylinder(radius: f64, height: f64, axis: Axis, segments: u32) -> Self {
        let segments = if segments >= 3 { segments } else { 32 };
        Self::Cylinder {
            radius,
            height,
            axis,
            segments,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cuboid { extents, center } => generate_cuboid_mesh(*extents, *center),
            Self::Cylinder {
                radius,
                height,
                axis,
                segments,
            } => generate_cylinder_mesh(*radius, *height, *axis, *segments),
        }
    }
}

fn generate_cuboid_mesh(extents: Vector3<f64>, center: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(36, 12);

    let half = extents / 2.0;
    let (min_x, max_x) = (center.x - half.x, center.x + half.x);
    let (min_y, max_y) = (center.y - half.y, center.y + half.y);
    let (min_z, max_z) = (center.z - half.z, center.z + half.z);

    let positions = [
        Point3::new(min_x, min_y, min_z),
        Point3::new(max_x, min_y, min_z),
        Point3::new(max_x, max_y, min_z),
        Point3::new(min_x, max_y, min_z),
        Point3::new(min_x, min_y, max_z),
        Point3::new(max_x, min_y, max_z),
        Point3::new(max_x, max_y, max_z),
        Point3::new(min_x, max_y, max_z),
    ];

    // Counter-clockwise seen from outside
    let faces = [
        // z+
        ([4, 5, 6], Vector3::new(0.0, 0.0, 1.0)),
        ([4, 6, 7], Vector3::new(0.0, 0.0, 1.0)),
        // z-
        ([1, 0, 3], Vector3::new(0.0, 0.0, -1.0)),
        ([1, 3, 2], Vector3::new(0.0, 0.0, -1.0)),
        // x+
        ([5, 1, 2], Vector3::new(1.0, 0.0, 0.0)),
        ([5, 2, 6], Vector3::new(1.0, 0.0, 0.0)),
        // x-
        ([0, 4, 7], Vector3::new(-1.0, 0.0, 0.0)),
        ([0, 7, 3], Vector3::new(-1.0, 0.0, 0.0)),
        // y+
        ([7, 6, 2], Vector3::new(0.0, 1.0, 0.0)),
        ([7, 2, 3], Vector3::new(0.0, 1.0, 0.0)),
        // y-
        ([0, 1, 5], Vector3::new(0.0, -1.0, 0.0)),
        ([0, 5, 4], Vector3::new(0.0, -1.0, 0.0)),
    ];

    for (indices, normal) in faces {
        let v0 = mesh.add_vertex(Vertex::new(positions[indices[0]], normal));
        let v1 = mesh.add_vertex(Vertex::new(positions[indices[1]], normal));
        let v2 = mesh.add_vertex(Vertex::new(positions[indices[2]], normal));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }

    mesh
}

/// Cylinder centered on the origin, built along z and then turned onto `axis`
fn generate_cylinder_mesh(radius: f64, height: f64, axis: Axis, segments: u32) -> Mesh {
    let mut mesh = Mesh::with_capacity(2 + 2 * segments as usize, 4 * segments as usize);
    let half = height / 2.0;

    let bottom_center_idx = mesh.add_vertex(Vertex::new(
        Point3::new(0.0, 0.0, -half),
        Vector3::new(0.0, 0.0, -1.0),
    ));
    let top_center_idx = mesh.add_vertex(Vertex::new(
        Point3::new(0.0, 0.0, half),
        Vector3::new(0.0, 0.0, 1.0),
    ));

    let mut bottom_indices = Vec::with_capacity(segments as usize);
    let mut top_indices = Vec::with_capacity(segments as usize);

    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        let radial = Vector3::new(cos, sin, 0.0);

        bottom_indices.push(mesh.add_vertex(Vertex::new(
            Point3::new(radius * cos, radius * sin, -half),
            radial,
        )));
        top_indices.push(mesh.add_vertex(Vertex::new(
            Point3::new(radius * cos, radius * sin, half),
            radial,
        )));
    }

    let n = segments as usize;
    for i in 0..n {
        let next = (i + 1) % n;
        let (bi, ti) = (bottom_indices[i], top_indices[i]);
        let (bn, tn) = (bottom_indices[next], top_indices[next]);

        mesh.add_triangle(Triangle::new([bottom_center_idx, bn, bi]));
        mesh.add_triangle(Triangle::new([top_center_idx, ti, tn]));
        mesh.add_triangle(Triangle::new([bi, bn, ti]));
        mesh.add_triangle(Triangle::new([ti, bn, tn]));
    }

    match axis {
        Axis::Z => {}
        Axis::X => {
            let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
            mesh.transform(&rotation.to_homogeneous());
        }
        Axis::Y => {
            let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2);
            mesh.transform(&rotation.to_homogeneous());
        }
    }

    mesh
}
