// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end mold generation through the mesh kernel

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use polymold::geometry::{mesh_utils, Primitive};
use polymold::io::{self, StlFormat};
use polymold::{
    CsgKernel, GeometryKernel, HalfSide, MoldConfig, MoldError, MoldPipeline, WatertightPolicy,
};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Area of the regular polygon the kernel uses for a cylinder cross-section
fn facet_area(radius: f64, segments: u32) -> f64 {
    let n = segments as f64;
    0.5 * n * radius * radius * (2.0 * PI / n).sin()
}

fn write_cube(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut cube = Primitive::cuboid(Vector3::repeat(50.0), Point3::origin()).to_mesh();
    cube.weld_vertices(1e-6);
    let path = dir.join(name);
    io::export_stl(&cube, &path, StlFormat::Binary)?;
    Ok(path)
}

fn pipeline(config: MoldConfig) -> Result<MoldPipeline<CsgKernel>> {
    let kernel = CsgKernel::new(config.segments);
    Ok(MoldPipeline::new(kernel, config)?)
}

#[test]
fn test_cube_mold_end_to_end() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_cube(dir.path(), "cube.stl")?;
    let pipeline = pipeline(MoldConfig::default())?;

    let report = pipeline.run_file(&input, dir.path())?;

    // Enclosure and split
    assert_relative_eq!(report.block_bounds.size(), Vector3::repeat(70.0), epsilon = 1e-9);
    assert_relative_eq!(report.split_z, 0.0, epsilon = 1e-9);

    // Keys
    let mut xy: Vec<(f64, f64)> = report.keys.centers.iter().map(|c| (c.x, c.y)).collect();
    xy.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(xy, vec![(-15.0, -15.0), (-15.0, 15.0), (15.0, -15.0), (15.0, 15.0)]);
    assert_eq!(report.keys.radius, 2.5);
    assert_eq!(report.keys.height, 10.0);

    // Spout: 28 long from x = -39 to -11, crossing the cavity wall at x = -25
    assert_eq!(report.spout.target, HalfSide::Bottom);
    assert_relative_eq!(report.spout.length, 28.0);
    assert_relative_eq!(report.spout.center.x, -25.0);

    // Inset from the object corners, the keys stand in the cavity void. The
    // top half loses nothing to them, the bottom half gains four whole pegs
    // and the run flags all four. The spout removes the 10 mm it bores
    // through the bottom wall.
    assert_eq!(report.keys_in_cavity, 4);
    let key_volume = facet_area(2.5, 32) * 10.0;
    let spout_in_wall = facet_area(10.0 / 3.0, 32) * 10.0;
    assert_relative_eq!(report.top_volume, 109000.0, max_relative = 1e-6);
    assert_relative_eq!(
        report.bottom_volume,
        109000.0 + 4.0 * key_volume - spout_in_wall,
        max_relative = 1e-6
    );

    assert!(report.outputs.top.exists());
    assert!(report.outputs.bottom.exists());
    assert_eq!(report.outputs.top, dir.path().join("cube_mold_top.stl"));
    assert_eq!(report.outputs.bottom, dir.path().join("cube_mold_bottom.stl"));
    Ok(())
}

#[test]
fn test_halves_reload_with_reported_volumes() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_cube(dir.path(), "cube.stl")?;
    let pipeline = pipeline(MoldConfig::default())?;
    let report = pipeline.run_file(&input, dir.path())?;

    let kernel = pipeline.kernel();
    let top = kernel.load(&report.outputs.top)?;
    let bottom = kernel.load(&report.outputs.bottom)?;

    // f32 STL coordinates cost a little precision
    assert_relative_eq!(kernel.volume(&top), report.top_volume, max_relative = 1e-4);
    assert_relative_eq!(kernel.volume(&bottom), report.bottom_volume, max_relative = 1e-4);
    assert!(kernel.bounding_box(&top).min.z >= -1e-4);
    assert!(kernel.bounding_box(&bottom).min.z < -34.9);
    assert!(kernel.is_watertight(&top) && kernel.is_watertight(&bottom));
    Ok(())
}

#[test]
fn test_spout_offset_outside_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_cube(dir.path(), "cube.stl")?;
    let pipeline = pipeline(MoldConfig {
        spout_offset: [0.0, 100.0, 0.0],
        ..MoldConfig::default()
    })?;

    let err = pipeline.run_file(&input, dir.path()).unwrap_err();
    assert!(matches!(err, MoldError::SpoutMissesCavity { .. }));
    assert!(err.to_string().contains("does not intersect the cavity"));

    // Nothing is written for a rejected mold
    assert!(!dir.path().join("cube_mold_top.stl").exists());
    assert!(!dir.path().join("cube_mold_bottom.stl").exists());
    Ok(())
}

#[test]
fn test_runs_are_repeatable() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_cube(dir.path(), "cube.stl")?;
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    std::fs::create_dir(&first)?;
    std::fs::create_dir(&second)?;

    let pipeline = pipeline(MoldConfig::default())?;
    let a = pipeline.run_file(&input, &first)?;
    let b = pipeline.run_file(&input, &second)?;

    assert_eq!(std::fs::read(&a.outputs.top)?, std::fs::read(&b.outputs.top)?);
    assert_eq!(std::fs::read(&a.outputs.bottom)?, std::fs::read(&b.outputs.bottom)?);
    assert_eq!(a.top_volume, b.top_volume);
    assert_eq!(a.bottom_volume, b.bottom_volume);
    Ok(())
}

#[test]
fn test_open_input_rejected_or_repaired() -> Result<()> {
    let dir = TempDir::new()?;
    let mut cube = Primitive::cuboid(Vector3::repeat(50.0), Point3::origin()).to_mesh();
    cube.weld_vertices(1e-6);
    cube.triangles.pop();
    assert!(!mesh_utils::is_closed(&cube));
    let input = dir.path().join("open.stl");
    io::export_stl(&cube, &input, StlFormat::Binary)?;

    let strict = pipeline(MoldConfig::default())?;
    let err = strict.run_file(&input, dir.path()).unwrap_err();
    assert!(matches!(err, MoldError::NotWatertight { boundary_edges: 3 }));
    assert!(!dir.path().join("open_mold_top.stl").exists());

    let lenient = pipeline(MoldConfig {
        watertight_policy: WatertightPolicy::Repair,
        ..MoldConfig::default()
    })?;
    let report = lenient.run_file(&input, dir.path())?;
    assert!(report.repaired);
    assert_relative_eq!(report.top_volume, 109000.0, max_relative = 1e-6);
    Ok(())
}

#[test]
fn test_simple_spout_opens_top_half() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_cube(dir.path(), "cube.stl")?;
    let pipeline = pipeline(MoldConfig {
        spout_variant: polymold::SpoutVariant::Simple,
        ..MoldConfig::default()
    })?;

    let report = pipeline.run_file(&input, dir.path())?;
    assert_eq!(report.spout.target, HalfSide::Top);

    // Bored through the 10 mm lid above the cavity
    let spout_in_lid = facet_area(10.0 / 3.0, 32) * 10.0;
    assert_relative_eq!(report.top_volume, 109000.0 - spout_in_lid, max_relative = 1e-6);
    Ok(())
}

#[test]
fn test_missing_input_is_reported() -> Result<()> {
    let dir = TempDir::new()?;
    let err = polymold::make_mold(&dir.path().join("absent.stl"), dir.path(), MoldConfig::default())
        .unwrap_err();
    assert!(matches!(err, MoldError::InputNotFound { .. }));
    Ok(())
}

#[test]
fn test_report_serializes_to_json() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_cube(dir.path(), "part.stl")?;
    let report = polymold::make_mold(&input, dir.path(), MoldConfig::default())?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["spout"]["target"], "bottom");
    assert_eq!(json["keys"]["centers"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["repaired"], false);
    assert_eq!(json["keys_in_cavity"], 4);
    Ok(())
}
