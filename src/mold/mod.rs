// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Two-part mold generation.
//!
//! [`MoldPipeline`] runs a fixed sequence of boolean steps against a
//! [`GeometryKernel`]:
//!
//! 1. load the object and make sure it is watertight (optionally repairing it)
//! 2. build a block one wall thickness larger than the object on every face
//! 3. subtract the object to leave a cavity
//! 4. cut the shell at the midpoint in z into a top and bottom half
//! 5. add four registration keys to the bottom half and cut them from the top
//! 6. cut a pour spout into one half, after checking it reaches the cavity
//! 7. write both halves as STL
//!
//! Every step checks its result for volume and closedness. Files are only
//! written once both halves exist, so a failed run leaves nothing on disk.

pub mod bisect;
pub mod cavity;
pub mod enclosure;
pub mod export;
pub mod keys;
pub mod spout;

pub use bisect::SplitBoxes;
pub use enclosure::Enclosure;
pub use export::OutputPaths;
pub use keys::{KeyPlacement, KeyedHalves};
pub use spout::SpoutPlacement;

use crate::config::{MoldConfig, WatertightPolicy};
use crate::error::{MoldError, MoldResult};
use crate::geometry::BoundingBox;
use crate::kernel::GeometryKernel;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Volumes at or below this are treated as empty
pub const EMPTY_VOLUME_EPSILON: f64 = 1e-9;

/// One of the two mold halves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HalfSide {
    Top,
    Bottom,
}

/// Output of a successful run, before anything is written
#[derive(Debug, Clone)]
pub struct MoldHalves<S> {
    pub top: S,
    pub bottom: S,
    pub enclosure: Enclosure,
    pub keys: KeyPlacement,
    /// Keys that stand in the cavity instead of the mold wall
    pub keys_in_cavity: usize,
    pub spout: SpoutPlacement,
    /// Whether hole filling was applied to the input
    pub repaired: bool,
}

/// Summary of a run that wrote both halves
#[derive(Debug, Clone, Serialize)]
pub struct MoldReport {
    pub input: PathBuf,
    pub outputs: OutputPaths,
    pub object_bounds: BoundingBox,
    pub block_bounds: BoundingBox,
    pub split_z: f64,
    pub keys: KeyPlacement,
    pub keys_in_cavity: usize,
    pub spout: SpoutPlacement,
    pub top_volume: f64,
    pub bottom_volume: f64,
    pub repaired: bool,
    pub elapsed_ms: u64,
}

/// Fail with `EmptyResult` when a boolean step left nothing behind, and
/// with `OpenResult` when it left a mesh that is not closed
pub(crate) fn ensure_solid<K: GeometryKernel>(
    kernel: &K,
    solid: K::Solid,
    step: &'static str,
) -> MoldResult<K::Solid> {
    let volume = kernel.volume(&solid);
    debug!(step, volume, "boolean step");
    if volume <= EMPTY_VOLUME_EPSILON {
        return Err(MoldError::EmptyResult { step });
    }
    if !kernel.is_watertight(&solid) {
        return Err(MoldError::OpenResult {
            step,
            open_edges: kernel.open_edges(&solid),
        });
    }
    Ok(solid)
}

/// Sequences the mold steps against a kernel
pub struct MoldPipeline<K: GeometryKernel> {
    kernel: K,
    config: MoldConfig,
}

impl<K: GeometryKernel> MoldPipeline<K> {
    pub fn new(kernel: K, config: MoldConfig) -> MoldResult<Self> {
        config.validate()?;
        Ok(Self { kernel, config })
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn config(&self) -> &MoldConfig {
        &self.config
    }

    /// Check watertightness, repairing once when the policy allows it.
    /// Returns the solid to mold and whether it was repaired.
    pub fn prepare_input(&self, solid: K::Solid) -> MoldResult<(K::Solid, bool)> {
        if self.kernel.is_watertight(&solid) {
            return Ok((solid, false));
        }

        let boundary_edges = self.kernel.open_edges(&solid);
        match self.config.watertight_policy {
            WatertightPolicy::Reject => Err(MoldError::NotWatertight { boundary_edges }),
            WatertightPolicy::Repair => {
                warn!(boundary_edges, "input is not watertight, filling holes");
                let repaired = self.kernel.repair(&solid)?;
                if !self.kernel.is_watertight(&repaired) {
                    return Err(MoldError::RepairFailed {
                        boundary_edges: self.kernel.open_edges(&repaired),
                    });
                }
                Ok((repaired, true))
            }
        }
    }

    pub fn build_enclosure(&self, solid: &K::Solid) -> MoldResult<(Enclosure, K::Solid)> {
        let bounds = self.kernel.bounding_box(solid);
        let enclosure = Enclosure::around(&bounds, self.config.wall_thickness)?;
        let block = enclosure::build_block(&self.kernel, &enclosure);
        Ok((enclosure, block))
    }

    pub fn carve_cavity(&self, block: &K::Solid, solid: &K::Solid) -> MoldResult<K::Solid> {
        cavity::carve(&self.kernel, block, solid)
    }

    /// Returns `(top, bottom)`
    pub fn bisect(&self, shelled: &K::Solid, enclosure: &Enclosure) -> MoldResult<(K::Solid, K::Solid)> {
        bisect::split(&self.kernel, shelled, enclosure)
    }

    pub fn insert_keys(
        &self,
        top: K::Solid,
        bottom: K::Solid,
        enclosure: &Enclosure,
    ) -> MoldResult<(KeyedHalves<K::Solid>, KeyPlacement)> {
        let placement = KeyPlacement::plan(enclosure, &self.config);
        let keyed = keys::insert(&self.kernel, top, bottom, &placement)?;
        Ok((keyed, placement))
    }

    /// Cut the pour spout. `cavity` is the molded object, which the spout
    /// has to reach.
    pub fn carve_spout(
        &self,
        top: K::Solid,
        bottom: K::Solid,
        cavity: &K::Solid,
        enclosure: &Enclosure,
    ) -> MoldResult<(K::Solid, K::Solid, SpoutPlacement)> {
        let placement = SpoutPlacement::plan(enclosure, &self.config);
        let (top, bottom) = spout::carve(&self.kernel, top, bottom, cavity, enclosure, &placement)?;
        Ok((top, bottom, placement))
    }

    pub fn export(&self, halves: &MoldHalves<K::Solid>, paths: &OutputPaths) -> MoldResult<()> {
        export::write_halves(&self.kernel, &halves.top, &halves.bottom, paths)
    }

    /// Produce both halves from a solid without writing anything
    pub fn run(&self, solid: K::Solid) -> MoldResult<MoldHalves<K::Solid>> {
        let (solid, repaired) = self.prepare_input(solid)?;

        let (enclosure, block) = self.build_enclosure(&solid)?;
        info!(
            size_x = enclosure.extents().x,
            size_y = enclosure.extents().y,
            size_z = enclosure.extents().z,
            split_z = enclosure.split_z(),
            "built enclosure"
        );

        let shelled = self.carve_cavity(&block, &solid)?;
        info!("carved cavity");

        let (top, bottom) = self.bisect(&shelled, &enclosure)?;
        info!("split into halves");

        let (keyed, keys) = self.insert_keys(top, bottom, &enclosure)?;
        info!(
            radius = keys.radius,
            height = keys.height,
            in_cavity = keyed.keys_in_cavity,
            "inserted keys"
        );
        let KeyedHalves {
            top,
            bottom,
            keys_in_cavity,
        } = keyed;

        let (top, bottom, spout) = self.carve_spout(top, bottom, &solid, &enclosure)?;
        info!(half = ?spout.target, variant = ?self.config.spout_variant, "carved spout");

        Ok(MoldHalves {
            top,
            bottom,
            enclosure,
            keys,
            keys_in_cavity,
            spout,
            repaired,
        })
    }

    /// Load `input`, build the mold and write both halves into `output_dir`
    pub fn run_file(&self, input: &Path, output_dir: &Path) -> MoldResult<MoldReport> {
        if !input.exists() {
            return Err(MoldError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let start = Instant::now();
        info!(input = %input.display(), "generating mold");

        let solid = self.kernel.load(input)?;
        let halves = self.run(solid)?;

        let outputs = OutputPaths::for_input(input, output_dir);
        self.export(&halves, &outputs)?;

        Ok(MoldReport {
            input: input.to_path_buf(),
            object_bounds: halves.enclosure.object_bounds,
            block_bounds: halves.enclosure.block_bounds,
            split_z: halves.enclosure.split_z(),
            top_volume: self.kernel.volume(&halves.top),
            bottom_volume: self.kernel.volume(&halves.bottom),
            repaired: halves.repaired,
            keys: halves.keys,
            keys_in_cavity: halves.keys_in_cavity,
            spout: halves.spout,
            outputs,
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}
