// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Splitting the shelled block into two halves

use super::{ensure_solid, Enclosure};
use crate::error::MoldResult;
use crate::geometry::BoundingBox;
use crate::kernel::GeometryKernel;
use nalgebra::Point3;

/// Cutting boxes for the two halves.
///
/// Both share the parting plane exactly. Every other face is pushed out past
/// the block so the cutters never share a face with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitBoxes {
    pub top: BoundingBox,
    pub bottom: BoundingBox,
}

impl SplitBoxes {
    pub fn for_enclosure(enclosure: &Enclosure) -> Self {
        let block = enclosure.block_bounds;
        let split = enclosure.split_z();
        let pad = enclosure.wall_thickness.max(1.0);

        let top = BoundingBox::new(
            Point3::new(block.min.x - pad, block.min.y - pad, split),
            Point3::new(block.max.x + pad, block.max.y + pad, block.max.z + pad),
        );
        let bottom = BoundingBox::new(
            Point3::new(block.min.x - pad, block.min.y - pad, block.min.z - pad),
            Point3::new(block.max.x + pad, block.max.y + pad, split),
        );
        Self { top, bottom }
    }
}

/// Intersect the shell with each cutting box, returning `(top, bottom)`
pub fn split<K: GeometryKernel>(
    kernel: &K,
    shelled: &K::Solid,
    enclosure: &Enclosure,
) -> MoldResult<(K::Solid, K::Solid)> {
    let boxes = SplitBoxes::for_enclosure(enclosure);

    let top_cutter = kernel.cuboid(boxes.top.size(), boxes.top.center());
    let top = kernel.intersection(shelled, &top_cutter)?;
    let top = ensure_solid(kernel, top, "top half split")?;

    let bottom_cutter = kernel.cuboid(boxes.bottom.size(), boxes.bottom.center());
    let bottom = kernel.intersection(shelled, &bottom_cutter)?;
    let bottom = ensure_solid(kernel, bottom, "bottom half split")?;

    Ok((top, bottom))
}
