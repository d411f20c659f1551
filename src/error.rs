// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for mold generation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a mold run. None of them is recovered from: a mold that
/// is known to be defective is never exported.
#[derive(Debug, Error)]
pub enum MoldError {
    /// The input path does not exist.
    #[error("input file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be decoded as STL.
    #[error("failed to parse STL {}: {source}", .path.display())]
    Stl {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mesh without any usable triangles.
    #[error("mesh {what} has no triangles")]
    EmptyMesh { what: String },

    /// The input solid has holes and repair was not requested.
    #[error("input mesh is not watertight ({boundary_edges} open edges); rerun with repair enabled or fix the model")]
    NotWatertight { boundary_edges: usize },

    /// Hole filling ran but the mesh is still open.
    #[error("hole filling left {boundary_edges} open edges; the mesh cannot be repaired automatically")]
    RepairFailed { boundary_edges: usize },

    /// The bounding box has zero extent along at least one axis.
    #[error("degenerate bounding box: size {x} x {y} x {z}")]
    DegenerateBoundingBox { x: f64, y: f64, z: f64 },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A boolean step produced no enclosed volume.
    #[error("{step} produced an empty solid")]
    EmptyResult { step: &'static str },

    /// A boolean step left holes in its result.
    #[error("{step} produced a mesh with {open_edges} open edges")]
    OpenResult { step: &'static str, open_edges: usize },

    /// The pour spout does not reach the cavity.
    #[error("pour spout does not intersect the cavity (spout at ({x:.3}, {y:.3}, {z:.3})); reposition or resize it")]
    SpoutMissesCavity { x: f64, y: f64, z: f64 },
}

impl MoldError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for mold generation.
pub type MoldResult<T> = Result<T, MoldError>;
