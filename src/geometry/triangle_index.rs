// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-triangle lookup from the global graph: which global vertices lie
//! on a given triangle, and at what barycentric.

use super::graph::{quantize, IntersectionGraph};
use crate::types::{Barycentric, IntersectionVertexId, Triangle};
use ahash::AHashMap;

/// The projection of one global vertex onto one specific triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleIntersectionVertex {
    pub global_id: IntersectionVertexId,
    pub bary: Barycentric,
}

/// Per-triangle vertex lists for both input meshes.
#[derive(Debug, Clone)]
pub struct TriangleIntersectionIndex {
    pub triangles_a: Vec<Vec<TriangleIntersectionVertex>>,
    pub triangles_b: Vec<Vec<TriangleIntersectionVertex>>,
}

fn push_unique(
    list: &mut Vec<TriangleIntersectionVertex>,
    global_id: IntersectionVertexId,
    bary: Barycentric,
) {
    if !list.iter().any(|v| v.global_id == global_id) {
        list.push(TriangleIntersectionVertex { global_id, bary });
    }
}

/// Build the index from a fused graph and the two input triangle
/// sequences it was built from.
pub fn build_triangle_index(
    graph: &IntersectionGraph,
    triangles_a: &[Triangle],
    triangles_b: &[Triangle],
    predicate_eps: f64,
) -> TriangleIntersectionIndex {
    let mut position_to_id: AHashMap<(i64, i64, i64), IntersectionVertexId> = AHashMap::new();
    for v in &graph.vertices {
        position_to_id.insert(quantize(v.position, predicate_eps), v.id);
    }

    let mut triangles_a_idx: Vec<Vec<TriangleIntersectionVertex>> =
        vec![Vec::new(); triangles_a.len()];
    let mut triangles_b_idx: Vec<Vec<TriangleIntersectionVertex>> =
        vec![Vec::new(); triangles_b.len()];

    for feature in &graph.pair_features {
        let tri_a = &triangles_a[feature.i_a];
        let tri_b = &triangles_b[feature.i_b];
        for v in &feature.vertices {
            let world_a = v.bary_on_a.evaluate(tri_a);
            if let Some(&id) = position_to_id.get(&quantize(world_a, predicate_eps)) {
                push_unique(&mut triangles_a_idx[feature.i_a], id, v.bary_on_a);
            }
            let world_b = v.bary_on_b.evaluate(tri_b);
            if let Some(&id) = position_to_id.get(&quantize(world_b, predicate_eps)) {
                push_unique(&mut triangles_b_idx[feature.i_b], id, v.bary_on_b);
            }
        }
    }

    TriangleIntersectionIndex {
        triangles_a: triangles_a_idx,
        triangles_b: triangles_b_idx,
    }
}
