// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cavity carving

use super::ensure_solid;
use crate::error::MoldResult;
use crate::kernel::GeometryKernel;

/// Subtract the object from the enclosure block, leaving a hollow shell
pub fn carve<K: GeometryKernel>(kernel: &K, block: &K::Solid, object: &K::Solid) -> MoldResult<K::Solid> {
    let shelled = kernel.difference(block, object)?;
    ensure_solid(kernel, shelled, "cavity carving")
}
