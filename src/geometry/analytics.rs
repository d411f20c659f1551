// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::{mesh_utils, Mesh};
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Enclosed volume in cubic units
    pub volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Every edge is shared by exactly two triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            vertex_count: 0,
            triangle_count: 0,
            is_watertight: false,
        }
    }

    /// Extents along x, y and z
    pub fn size(&self) -> [f64; 3] {
        [
            self.bbox[3] - self.bbox[0],
            self.bbox[4] - self.bbox[1],
            self.bbox[5] - self.bbox[2],
        ]
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    if mesh.vertices.is_empty() || mesh.triangles.is_empty() {
        return GeometryStats::empty();
    }

    let bbox = mesh.bounding_box();

    GeometryStats {
        volume: signed_volume(mesh),
        surface_area: surface_area(mesh),
        bbox: [
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z,
        ],
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        is_watertight: mesh_utils::is_closed(mesh),
    }
}

/// Signed enclosed volume (divergence theorem over origin tetrahedra).
///
/// Positive for outward-facing winding. Exact for any geometrically closed
/// surface, including ones with T-junctions left by plane splitting.
pub fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let v0 = &mesh.vertices[triangle.indices[0]].position.coords;
            let v1 = &mesh.vertices[triangle.indices[1]].position.coords;
            let v2 = &mesh.vertices[triangle.indices[2]].position.coords;
            v0.dot(&v1.cross(v2)) / 6.0
        })
        .sum()
}

/// Total surface area
pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let v0 = &mesh.vertices[triangle.indices[0]].position;
            let v1 = &mesh.vertices[triangle.indices[1]].position;
            let v2 = &mesh.vertices[triangle.indices[2]].position;
            (v1 - v0).cross(&(v2 - v0)).norm() / 2.0
        })
        .sum()
}
