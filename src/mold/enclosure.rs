// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Enclosure block around the object

use crate::error::{MoldError, MoldResult};
use crate::geometry::BoundingBox;
use crate::kernel::GeometryKernel;
use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Placement of the solid block the cavity is carved from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Enclosure {
    /// Bounds of the object being molded
    pub object_bounds: BoundingBox,
    /// Bounds of the block, the object bounds grown by the wall on every face
    pub block_bounds: BoundingBox,
    pub wall_thickness: f64,
}

impl Enclosure {
    /// Size the block around `object_bounds`.
    ///
    /// A flat or empty object has no cavity to carve, so zero extent along any
    /// axis is an error rather than a thin block.
    pub fn around(object_bounds: &BoundingBox, wall_thickness: f64) -> MoldResult<Self> {
        if !object_bounds.has_volume() {
            let size = if object_bounds.is_empty() {
                Vector3::zeros()
            } else {
                object_bounds.size()
            };
            return Err(MoldError::DegenerateBoundingBox {
                x: size.x,
                y: size.y,
                z: size.z,
            });
        }

        Ok(Self {
            object_bounds: *object_bounds,
            block_bounds: object_bounds.inflate(wall_thickness),
            wall_thickness,
        })
    }

    pub fn center(&self) -> Point3<f64> {
        self.block_bounds.center()
    }

    pub fn extents(&self) -> Vector3<f64> {
        self.block_bounds.size()
    }

    /// Height of the parting plane, midway up the block
    pub fn split_z(&self) -> f64 {
        self.center().z
    }
}

/// Build the enclosure block as a solid
pub fn build_block<K: GeometryKernel>(kernel: &K, enclosure: &Enclosure) -> K::Solid {
    kernel.cuboid(enclosure.extents(), enclosure.center())
}
