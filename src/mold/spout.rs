// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pour spout placement and carving

use super::{ensure_solid, Enclosure, HalfSide};
use crate::config::{MoldConfig, SpoutVariant};
use crate::error::{MoldError, MoldResult};
use crate::geometry::{Axis, BoundingBox};
use crate::kernel::GeometryKernel;
use nalgebra::{Point3, Vector3};
use serde::Serialize;
use tracing::{debug, warn};

/// Fraction of the spout's own volume that must overlap the cavity
const MIN_CAVITY_OVERLAP: f64 = 1e-6;

/// Where the pour channel is cut and which half receives it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpoutPlacement {
    pub center: Point3<f64>,
    pub axis: Axis,
    pub radius: f64,
    pub length: f64,
    pub target: HalfSide,
}

impl SpoutPlacement {
    pub fn plan(enclosure: &Enclosure, config: &MoldConfig) -> Self {
        let block = enclosure.block_bounds;
        let wall = enclosure.wall_thickness;
        let split = enclosure.split_z();
        let offset = Vector3::from(config.spout_offset);

        match config.spout_variant {
            // Horizontal channel through the -x face, one wall below the split
            SpoutVariant::Validated => Self {
                center: Point3::new(block.min.x + wall, block.center().y, split - wall) + offset,
                axis: Axis::X,
                radius: config.spout_radius(),
                length: config.spout_length_ratio * block.size().x,
                target: HalfSide::Bottom,
            },
            // Vertical channel from the split plane out through the top face
            SpoutVariant::Simple => {
                let length = (block.max.z - split) + wall;
                let center = block.center();
                Self {
                    center: Point3::new(center.x, center.y, split + length / 2.0) + offset,
                    axis: Axis::Z,
                    radius: config.spout_radius(),
                    length,
                    target: HalfSide::Top,
                }
            }
        }
    }

    /// Bounds of the spout cylinder
    pub fn bounds(&self) -> BoundingBox {
        let extents = match self.axis {
            Axis::X => Vector3::new(self.length, 2.0 * self.radius, 2.0 * self.radius),
            Axis::Y => Vector3::new(2.0 * self.radius, self.length, 2.0 * self.radius),
            Axis::Z => Vector3::new(2.0 * self.radius, 2.0 * self.radius, self.length),
        };
        BoundingBox::from_center_extents(self.center, extents)
    }

    pub fn build<K: GeometryKernel>(&self, kernel: &K) -> K::Solid {
        kernel.cylinder(self.radius, self.length, self.axis, self.center)
    }
}

/// Fail unless the spout overlaps the cavity with some volume
pub fn check_reaches_cavity<K: GeometryKernel>(
    kernel: &K,
    spout: &K::Solid,
    placement: &SpoutPlacement,
    cavity: &K::Solid,
) -> MoldResult<()> {
    let overlap = kernel.intersection(spout, cavity)?;
    let overlap_volume = kernel.volume(&overlap);
    let threshold = MIN_CAVITY_OVERLAP * kernel.volume(spout).abs();
    debug!(overlap_volume, threshold, "spout overlap with cavity");

    if overlap_volume <= threshold {
        return Err(MoldError::SpoutMissesCavity {
            x: placement.center.x,
            y: placement.center.y,
            z: placement.center.z,
        });
    }
    Ok(())
}

/// Validate the spout against the cavity and subtract it from its target
/// half. The other half is returned untouched.
pub fn carve<K: GeometryKernel>(
    kernel: &K,
    top: K::Solid,
    bottom: K::Solid,
    cavity: &K::Solid,
    enclosure: &Enclosure,
    placement: &SpoutPlacement,
) -> MoldResult<(K::Solid, K::Solid)> {
    let spout = placement.build(kernel);
    check_reaches_cavity(kernel, &spout, placement, cavity)?;

    if !placement.bounds().overlaps(&enclosure.block_bounds)
        || enclosure.block_bounds.contains_with_margin(&placement.bounds(), 0.0)
    {
        warn!(
            x = placement.center.x,
            y = placement.center.y,
            z = placement.center.z,
            "spout does not break through the outside of the mold"
        );
    }

    match placement.target {
        HalfSide::Top => {
            let top = kernel.difference(&top, &spout)?;
            Ok((ensure_solid(kernel, top, "spout carving")?, bottom))
        }
        HalfSide::Bottom => {
            let bottom = kernel.difference(&bottom, &spout)?;
            Ok((top, ensure_solid(kernel, bottom, "spout carving")?))
        }
    }
}
