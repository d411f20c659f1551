// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Registration keys between the two halves

use super::{ensure_solid, Enclosure};
use crate::config::MoldConfig;
use crate::error::MoldResult;
use crate::geometry::Axis;
use crate::kernel::GeometryKernel;
use nalgebra::Point3;
use serde::Serialize;

/// Four vertical pins straddling the parting plane.
///
/// Each pin is added to the bottom half and cut from the top half, so the
/// halves only seat one way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPlacement {
    pub centers: [Point3<f64>; 4],
    pub radius: f64,
    pub height: f64,
}

impl KeyPlacement {
    /// Put a key one wall thickness in from each XY corner of the object's
    /// bounds, centered vertically on the parting plane.
    ///
    /// Spacing is not checked: a wall that is thick relative to the object
    /// makes keys overlap or swap sides.
    pub fn plan(enclosure: &Enclosure, config: &MoldConfig) -> Self {
        let bounds = enclosure.object_bounds;
        let inset = enclosure.wall_thickness;
        let z = enclosure.split_z();

        let (x0, x1) = (bounds.min.x + inset, bounds.max.x - inset);
        let (y0, y1) = (bounds.min.y + inset, bounds.max.y - inset);

        Self {
            centers: [
                Point3::new(x0, y0, z),
                Point3::new(x1, y0, z),
                Point3::new(x0, y1, z),
                Point3::new(x1, y1, z),
            ],
            radius: config.key_radius(),
            height: config.key_height(),
        }
    }
}

/// Share of a key's volume the top half has to lose for the key to count as
/// seated. A key centered on the parting plane normally takes half.
const MIN_RECESS_FRACTION: f64 = 0.25;

/// Both halves after key insertion
#[derive(Debug, Clone)]
pub struct KeyedHalves<S> {
    pub top: S,
    pub bottom: S,
    /// Keys whose recess took no material from the top half. They stand in
    /// the cavity and do nothing to align the halves.
    pub keys_in_cavity: usize,
}

/// Add every key to the bottom half and subtract it from the top half.
///
/// Keys go in one at a time, each applied to both halves before the next.
pub fn insert<K: GeometryKernel>(
    kernel: &K,
    top: K::Solid,
    bottom: K::Solid,
    placement: &KeyPlacement,
) -> MoldResult<KeyedHalves<K::Solid>> {
    let mut top = top;
    let mut bottom = bottom;
    let mut keys_in_cavity = 0;

    for (index, center) in placement.centers.iter().enumerate() {
        let key = kernel.cylinder(placement.radius, placement.height, Axis::Z, *center);
        bottom = kernel.union(&bottom, &key)?;

        let before = kernel.volume(&top);
        top = kernel.difference(&top, &key)?;
        let recess = before - kernel.volume(&top);
        if recess < kernel.volume(&key) * MIN_RECESS_FRACTION {
            keys_in_cavity += 1;
            tracing::warn!(
                index,
                x = center.x,
                y = center.y,
                recess,
                "key lies in the cavity and will not align the halves"
            );
        } else {
            tracing::debug!(index, x = center.x, y = center.y, "inserted key");
        }
    }

    let top = ensure_solid(kernel, top, "key insertion (top half)")?;
    let bottom = ensure_solid(kernel, bottom, "key insertion (bottom half)")?;
    Ok(KeyedHalves {
        top,
        bottom,
        keys_in_cavity,
    })
}
