// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and operations

pub mod analytics;
mod bbox;
pub mod csg;
mod mesh;
pub mod mesh_utils;
mod primitives;

pub use analytics::{analyze, GeometryStats};
pub use bbox::BoundingBox;
pub use mesh::{Mesh, Triangle, Vertex};
pub use primitives::{Axis, Primitive};
