// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 1D intersection geometry between two triangle meshes.
//!
//! Given two ordered sequences of triangles, computes closed, regularized
//! intersection curves lying on each mesh's own triangles where the two
//! surfaces cross. The pipeline runs in five stages, each a pure function
//! of its inputs: broad-phase pair candidates, pairwise classification,
//! per-pair local features, global graph fusion, per-mesh topology, and
//! curve regularization.

pub mod error;
pub mod geometry;
pub mod types;

pub use error::{Diagnostics, IntersectionError};
pub use geometry::{
    build_mesh_topology, build_pair_features, build_triangle_index, classify_pairs,
    classify_pairs_parallel, regularize, BoundingBox, BroadPhaseIndex, ComponentClass,
    ComponentStats, GlobalEdge, GlobalVertex, IntersectionCurve, IntersectionGraph, MeshTopology,
    PairFeature, PairIntersection, PairSegment, PairSet, PairVertex, RegularizationResult,
    TriangleIntersectionIndex, TriangleIntersectionVertex,
};
pub use types::{
    Barycentric, GridPoint, IntersectionEdgeId, IntersectionKind, IntersectionVertexId, MeshSide,
    RealPoint, Tolerances, Triangle,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_single_segment_regularizes_to_tiny_noise() {
        let tri = |p: [[i64; 3]; 3]| {
            Triangle::from_vertices([
                GridPoint::new(p[0][0], p[0][1], p[0][2]),
                GridPoint::new(p[1][0], p[1][1], p[1][2]),
                GridPoint::new(p[2][0], p[2][1], p[2][2]),
            ])
        };
        let triangles_a = vec![tri([[0, -1, 0], [0, 1, 0], [1, 0, 0]])];
        let triangles_b = vec![tri([[0, 0, -1], [0, 0, 1], [0, 2, 0]])];
        let tol = Tolerances::default();
        tol.validate().unwrap();

        let pair_set = classify_pairs(&triangles_a, &triangles_b, &tol);
        assert_eq!(pair_set.pairs.len(), 1);

        let (pair_features, _) = build_pair_features(&pair_set, &triangles_a, &triangles_b, &tol);
        let graph = IntersectionGraph::build(pair_features, &triangles_a, tol.predicate_eps);
        assert_eq!(graph.vertices.len(), 2);
        assert_eq!(graph.edges.len(), 1);

        let index = build_triangle_index(&graph, &triangles_a, &triangles_b, tol.predicate_eps);
        let topology_a = build_mesh_topology(&graph, &index, MeshSide::A);
        let topology_b = build_mesh_topology(&graph, &index, MeshSide::B);
        assert_eq!(topology_a.components.len(), 1);
        assert_eq!(topology_b.components.len(), 1);

        let (result_a, _) = regularize(&graph, &topology_a, &tol);
        assert_eq!(result_a.stats.len(), 1);
        assert_eq!(result_a.stats[0].classification, ComponentClass::TinyNoise);
        assert!(result_a.curves.is_empty());
    }
}
