// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Global, deduplicated intersection graph assembled from every pair's
//! local feature geometry.

use super::features::PairFeature;
use crate::types::{IntersectionEdgeId, IntersectionVertexId, RealPoint, Triangle};
use ahash::AHashMap;

/// One node in the graph: a deduplicated world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalVertex {
    pub id: IntersectionVertexId,
    pub position: RealPoint,
}

/// One undirected edge, always stored with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalEdge {
    pub id: IntersectionEdgeId,
    pub start: IntersectionVertexId,
    pub end: IntersectionVertexId,
}

/// The fused global graph plus the pair features it was built from, kept
/// around for per-triangle indexing downstream.
#[derive(Debug, Clone)]
pub struct IntersectionGraph {
    pub vertices: Vec<GlobalVertex>,
    pub edges: Vec<GlobalEdge>,
    pub pair_features: Vec<PairFeature>,
}

/// Integer quantization key: each coordinate divided by `predicate_eps`
/// and rounded to the nearest integer. Two world points fuse into the
/// same vertex iff they share this key.
pub fn quantize(p: RealPoint, predicate_eps: f64) -> (i64, i64, i64) {
    let q = |x: f64| (x / predicate_eps).round() as i64;
    (q(p.x), q(p.y), q(p.z))
}

impl IntersectionGraph {
    /// Build the graph directly from vertex positions and raw `(start,
    /// end)` index pairs, bypassing pair-feature fusion. Lets tests
    /// construct synthetic graphs — e.g. the four-cycle and pendant-edge
    /// scenarios exercised against the regularizer — without running the
    /// upstream pipeline.
    pub fn from_raw(positions: Vec<RealPoint>, raw_edges: Vec<(usize, usize)>) -> Self {
        let vertices: Vec<GlobalVertex> = positions
            .into_iter()
            .enumerate()
            .map(|(i, position)| GlobalVertex {
                id: IntersectionVertexId(i as u32),
                position,
            })
            .collect();

        let edges: Vec<GlobalEdge> = raw_edges
            .into_iter()
            .enumerate()
            .map(|(i, (a, b))| {
                let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                GlobalEdge {
                    id: IntersectionEdgeId(i as i64),
                    start: IntersectionVertexId(lo as u32),
                    end: IntersectionVertexId(hi as u32),
                }
            })
            .collect();

        Self {
            vertices,
            edges,
            pair_features: Vec::new(),
        }
    }

    /// Fuse every pair's local vertices and segments into one global
    /// graph. `triangles_a` provides the canonical reconstruction side:
    /// every `PairVertex`'s world position is taken by evaluating its
    /// barycentric on its A-triangle, never on B.
    pub fn build(
        pair_features: Vec<PairFeature>,
        triangles_a: &[Triangle],
        predicate_eps: f64,
    ) -> Self {
        let mut vertex_keys: AHashMap<(i64, i64, i64), IntersectionVertexId> = AHashMap::new();
        let mut vertices: Vec<GlobalVertex> = Vec::new();
        let mut edge_keys: AHashMap<(u32, u32), IntersectionEdgeId> = AHashMap::new();
        let mut edges: Vec<GlobalEdge> = Vec::new();

        // local_ids[k] holds, for pair_features[k], the global id each
        // pair-local vertex id fused to.
        let mut local_ids: Vec<AHashMap<u32, IntersectionVertexId>> =
            Vec::with_capacity(pair_features.len());

        for feature in &pair_features {
            let tri_a = &triangles_a[feature.i_a];
            let mut ids = AHashMap::new();
            for v in &feature.vertices {
                let world = v.bary_on_a.evaluate(tri_a);
                let key = quantize(world, predicate_eps);
                let id = *vertex_keys.entry(key).or_insert_with(|| {
                    let id = IntersectionVertexId(vertices.len() as u32);
                    vertices.push(GlobalVertex { id, position: world });
                    id
                });
                ids.insert(v.pair_local_id, id);
            }
            local_ids.push(ids);
        }

        for (feature, ids) in pair_features.iter().zip(local_ids.iter()) {
            for seg in &feature.segments {
                let (Some(&start), Some(&end)) = (ids.get(&seg.start), ids.get(&seg.end)) else {
                    continue;
                };
                if start == end {
                    continue;
                }
                let (lo, hi) = if start.0 < end.0 { (start, end) } else { (end, start) };
                edge_keys.entry((lo.0, hi.0)).or_insert_with(|| {
                    let id = IntersectionEdgeId(edges.len() as i64);
                    edges.push(GlobalEdge { id, start: lo, end: hi });
                    id
                });
            }
        }

        Self {
            vertices,
            edges,
            pair_features,
        }
    }
}
