// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL importer

use crate::error::{MoldError, MoldResult};
use crate::geometry::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Positions closer than this are merged on import
pub const WELD_EPSILON: f64 = 1e-6;

/// Read an ASCII or binary STL file into an indexed mesh.
///
/// Coincident corners are welded so that edge connectivity (and with it the
/// watertightness test) reflects the actual surface rather than the
/// per-facet layout of the file.
pub fn import_stl(path: &Path) -> MoldResult<Mesh> {
    if !path.exists() {
        return Err(MoldError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| MoldError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let stl = stl_io::read_stl(&mut reader).map_err(|source| MoldError::Stl {
        path: path.to_path_buf(),
        source,
    })?;

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.add_vertex(Vertex::new(
            Point3::new(v[0] as f64, v[1] as f64, v[2] as f64),
            Vector3::zeros(),
        ));
    }
    for face in &stl.faces {
        mesh.add_triangle(Triangle::new(face.vertices));
    }

    let welded = mesh.weld_vertices(WELD_EPSILON);
    mesh.remove_orphaned_vertices();
    mesh.recompute_normals();

    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        welded,
        "imported STL"
    );

    if mesh.is_empty() {
        return Err(MoldError::EmptyMesh {
            what: path.display().to_string(),
        });
    }
    Ok(mesh)
}
