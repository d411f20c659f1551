// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Writing the finished halves

use crate::error::MoldResult;
use crate::kernel::GeometryKernel;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Destination files for the two halves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub top: PathBuf,
    pub bottom: PathBuf,
}

impl OutputPaths {
    /// `<stem>_mold_top.stl` and `<stem>_mold_bottom.stl` inside `output_dir`
    pub fn for_input(input: &Path, output_dir: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "model".to_string());

        Self {
            top: output_dir.join(format!("{}_mold_top.stl", stem)),
            bottom: output_dir.join(format!("{}_mold_bottom.stl", stem)),
        }
    }
}

/// Write both halves. If the second write fails the first file is removed,
/// so a run never leaves a lone half behind.
pub fn write_halves<K: GeometryKernel>(
    kernel: &K,
    top: &K::Solid,
    bottom: &K::Solid,
    paths: &OutputPaths,
) -> MoldResult<()> {
    kernel.export(top, &paths.top)?;
    if let Err(err) = kernel.export(bottom, &paths.bottom) {
        if let Err(cleanup) = std::fs::remove_file(&paths.top) {
            tracing::warn!(
                path = %paths.top.display(),
                error = %cleanup,
                "could not remove top half after the bottom half failed to write"
            );
        }
        return Err(err);
    }
    tracing::info!(
        top = %paths.top.display(),
        bottom = %paths.bottom.display(),
        "wrote mold halves"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::CsgKernel;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_names_follow_input_stem() {
        let paths = OutputPaths::for_input(Path::new("models/bunny.stl"), Path::new("out"));
        assert_eq!(paths.top, PathBuf::from("out/bunny_mold_top.stl"));
        assert_eq!(paths.bottom, PathBuf::from("out/bunny_mold_bottom.stl"));
    }

    #[test]
    fn test_only_last_extension_is_dropped() {
        let paths = OutputPaths::for_input(Path::new("part.v2.stl"), Path::new(""));
        assert_eq!(paths.top, PathBuf::from("part.v2_mold_top.stl"));
    }

    #[test]
    fn test_failed_bottom_write_leaves_no_top_file() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = CsgKernel::default();
        let solid = kernel.cuboid(Vector3::repeat(10.0), Point3::origin());
        let paths = OutputPaths {
            top: dir.path().join("part_mold_top.stl"),
            bottom: dir.path().join("missing").join("part_mold_bottom.stl"),
        };

        let err = write_halves(&kernel, &solid, &solid, &paths).unwrap_err();
        assert!(matches!(err, crate::error::MoldError::Io { .. }));
        assert!(!paths.top.exists());
    }
}
