// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL exporter

use crate::error::{MoldError, MoldResult};
use crate::geometry::Mesh;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// STL flavour to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

/// Export mesh to STL
pub fn export_stl(mesh: &Mesh, path: &Path, format: StlFormat) -> MoldResult<()> {
    let file = File::create(path).map_err(|e| MoldError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    match format {
        StlFormat::Binary => write_binary(mesh, &mut writer),
        StlFormat::Ascii => write_ascii(mesh, &mut writer),
    }
    .and_then(|_| writer.flush())
    .map_err(|e| MoldError::io(path, e))
}

fn facet_normal(mesh: &Mesh, triangle: &crate::geometry::Triangle) -> Vector3<f64> {
    mesh.face_normal(triangle).unwrap_or_else(Vector3::zeros)
}

fn write_binary<W: Write>(mesh: &Mesh, writer: &mut W) -> std::io::Result<()> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let vertex = |index: usize| {
        let p = mesh.vertices[index].position;
        StlVertex::new([p.x as f32, p.y as f32, p.z as f32])
    };

    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let n = facet_normal(mesh, tri);
            StlTriangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [vertex(tri.indices[0]), vertex(tri.indices[1]), vertex(tri.indices[2])],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}

fn write_ascii<W: Write>(mesh: &Mesh, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "solid polymold")?;

    for tri in &mesh.triangles {
        let n = facet_normal(mesh, tri);
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for &index in &tri.indices {
            let p = mesh.vertices[index].position;
            writeln!(writer, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }

    writeln!(writer, "endsolid polymold")
}
