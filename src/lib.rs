// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polymold
//!
//! Turns a watertight solid into a two-part casting mold: an enclosure block
//! with the object carved out, split into top and bottom halves, with
//! registration keys and a pour spout. STL in, two STL halves out.

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod kernel;
pub mod mold;

pub use config::{MoldConfig, SpoutVariant, WatertightPolicy};
pub use error::{MoldError, MoldResult};
pub use geometry::{BoundingBox, Mesh};
pub use io::StlFormat;
pub use kernel::{CsgKernel, GeometryKernel};
pub use mold::{HalfSide, MoldHalves, MoldPipeline, MoldReport};

use std::path::Path;

/// Mold an STL file with the mesh kernel, writing the halves next to `output_dir`
pub fn make_mold(input: &Path, output_dir: &Path, config: MoldConfig) -> MoldResult<MoldReport> {
    let kernel = CsgKernel::new(config.segments);
    MoldPipeline::new(kernel, config)?.run_file(input, output_dir)
}
