// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry kernel interface used by the mold pipeline

use crate::error::{MoldError, MoldResult};
use crate::geometry::{analytics, csg, mesh_utils, Axis, BoundingBox, Mesh, Primitive};
use crate::io::{self, StlFormat};
use nalgebra::{Point3, Vector3};
use std::path::Path;

/// The geometry capabilities mold generation relies on.
///
/// The pipeline only sequences these calls and supplies their parameters, so
/// any implementation with exact boolean semantics can drive it, including
/// test doubles that never touch a mesh.
pub trait GeometryKernel {
    type Solid: Clone;

    /// Read a solid from a mesh file
    fn load(&self, path: &Path) -> MoldResult<Self::Solid>;

    /// Write a solid to a mesh file
    fn export(&self, solid: &Self::Solid, path: &Path) -> MoldResult<()>;

    /// Closed surface without holes or non-manifold edges
    fn is_watertight(&self, solid: &Self::Solid) -> bool;

    /// Number of edges bordering a hole
    fn open_edges(&self, solid: &Self::Solid) -> usize;

    /// Fill holes once; fails if the result is still open
    fn repair(&self, solid: &Self::Solid) -> MoldResult<Self::Solid>;

    fn bounding_box(&self, solid: &Self::Solid) -> BoundingBox;

    /// Enclosed volume, zero for an empty solid
    fn volume(&self, solid: &Self::Solid) -> f64;

    /// Axis-aligned box with the given extents centered on `center`
    fn cuboid(&self, extents: Vector3<f64>, center: Point3<f64>) -> Self::Solid;

    /// Cylinder along `axis` centered on `center`
    fn cylinder(&self, radius: f64, height: f64, axis: Axis, center: Point3<f64>) -> Self::Solid;

    fn union(&self, a: &Self::Solid, b: &Self::Solid) -> MoldResult<Self::Solid>;

    fn difference(&self, a: &Self::Solid, b: &Self::Solid) -> MoldResult<Self::Solid>;

    fn intersection(&self, a: &Self::Solid, b: &Self::Solid) -> MoldResult<Self::Solid>;
}

/// Mesh kernel backed by the BSP booleans in [`crate::geometry::csg`]
#[derive(Debug, Clone)]
pub struct CsgKernel {
    segments: u32,
    format: StlFormat,
}

impl CsgKernel {
    pub fn new(segments: u32) -> Self {
        Self {
            segments: segments.max(3),
            format: StlFormat::Binary,
        }
    }

    /// Choose the STL flavour used by `export`
    pub fn with_format(mut self, format: StlFormat) -> Self {
        self.format = format;
        self
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn format(&self) -> StlFormat {
        self.format
    }
}

impl Default for CsgKernel {
    fn default() -> Self {
        Self::new(32)
    }
}

impl GeometryKernel for CsgKernel {
    type Solid = Mesh;

    fn load(&self, path: &Path) -> MoldResult<Mesh> {
        io::import_stl(path)
    }

    fn export(&self, solid: &Mesh, path: &Path) -> MoldResult<()> {
        io::export_stl(solid, path, self.format)
    }

    fn is_watertight(&self, solid: &Mesh) -> bool {
        mesh_utils::is_closed(solid)
    }

    fn open_edges(&self, solid: &Mesh) -> usize {
        mesh_utils::validate_mesh(solid).boundary_edge_count
    }

    fn repair(&self, solid: &Mesh) -> MoldResult<Mesh> {
        let mut repaired = solid.clone();
        let filled = mesh_utils::fill_holes(&mut repaired);
        tracing::debug!(filled, "filled holes");

        let validation = mesh_utils::validate_mesh(&repaired);
        if !validation.is_closed {
            return Err(MoldError::RepairFailed {
                boundary_edges: validation.boundary_edge_count,
            });
        }
        Ok(repaired)
    }

    fn bounding_box(&self, solid: &Mesh) -> BoundingBox {
        solid.bounding_box()
    }

    fn volume(&self, solid: &Mesh) -> f64 {
        analytics::signed_volume(solid)
    }

    fn cuboid(&self, extents: Vector3<f64>, center: Point3<f64>) -> Mesh {
        Primitive::cuboid(extents, center).to_mesh()
    }

    fn cylinder(&self, radius: f64, height: f64, axis: Axis, center: Point3<f64>) -> Mesh {
        let mut mesh = Primitive::cylinder(radius, height, axis, self.segments).to_mesh();
        mesh.translate(&center.coords);
        mesh
    }

    fn union(&self, a: &Mesh, b: &Mesh) -> MoldResult<Mesh> {
        Ok(csg::csg_union(a, b))
    }

    fn difference(&self, a: &Mesh, b: &Mesh) -> MoldResult<Mesh> {
        Ok(csg::csg_difference(a, b))
    }

    fn intersection(&self, a: &Mesh, b: &Mesh) -> MoldResult<Mesh> {
        Ok(csg::csg_intersection(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cylinder_is_placed_at_center() {
        let kernel = CsgKernel::new(24);
        let rod = kernel.cylinder(2.0, 10.0, Axis::X, Point3::new(-25.0, 0.0, -10.0));

        let bbox = kernel.bounding_box(&rod);
        assert_relative_eq!(bbox.min.x, -30.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.max.x, -20.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.center().z, -10.0, epsilon = 1e-9);
        assert!(kernel.is_watertight(&rod));
    }

    #[test]
    fn test_boolean_round_trip_volumes() -> MoldResult<()> {
        let kernel = CsgKernel::default();
        let block = kernel.cuboid(Vector3::new(20.0, 20.0, 20.0), Point3::origin());
        let core = kernel.cuboid(Vector3::new(10.0, 10.0, 10.0), Point3::origin());

        let shell = kernel.difference(&block, &core)?;
        assert_relative_eq!(kernel.volume(&shell), 7000.0, epsilon = 1e-6);

        let refilled = kernel.union(&shell, &core)?;
        assert_relative_eq!(kernel.volume(&refilled), 8000.0, epsilon = 1e-6);

        let overlap = kernel.intersection(&shell, &core)?;
        assert!(kernel.volume(&overlap).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_repair_closes_hole() -> MoldResult<()> {
        let kernel = CsgKernel::default();
        let mut cube = kernel.cuboid(Vector3::new(4.0, 4.0, 4.0), Point3::origin());
        cube.weld_vertices(1e-6);
        cube.triangles.pop();
        assert!(!kernel.is_watertight(&cube));
        assert_eq!(kernel.open_edges(&cube), 3);

        let repaired = kernel.repair(&cube)?;
        assert!(kernel.is_watertight(&repaired));
        assert_relative_eq!(kernel.volume(&repaired), 64.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_repair_gives_up_on_unclosable_mesh() {
        let kernel = CsgKernel::default();
        let mut cube = kernel.cuboid(Vector3::new(4.0, 4.0, 4.0), Point3::origin());
        cube.weld_vertices(1e-6);
        // Duplicate a face: an edge used three times cannot be fixed by capping
        let extra = cube.triangles[0];
        cube.triangles.push(extra);

        let err = kernel.repair(&cube).unwrap_err();
        assert!(matches!(err, MoldError::RepairFailed { .. }));
    }
}
