// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The five-stage intersection pipeline: broad phase, pairwise
//! classification, per-pair features, global graph fusion, per-mesh
//! topology, and curve regularization.

mod bbox;
mod bvh;
mod classify;
mod features;
mod graph;
mod pair_geometry;
mod regularize;
mod robust_predicates;
mod topology;
mod triangle_index;

pub use bbox::BoundingBox;
pub use bvh::BroadPhaseIndex;
pub use classify::{classify_pair, classify_pairs, classify_pairs_parallel, PairIntersection, PairSet};
pub use features::{build_pair_features, PairFeature, PairSegment, PairVertex};
pub use graph::{quantize, GlobalEdge, GlobalVertex, IntersectionGraph};
pub use regularize::{regularize, ComponentClass, ComponentStats, IntersectionCurve, RegularizationResult};
pub use topology::{build_mesh_topology, MeshTopology};
pub use triangle_index::{build_triangle_index, TriangleIntersectionIndex, TriangleIntersectionVertex};
