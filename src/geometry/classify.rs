// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pairwise triangle intersection classification with broad-phase
//! acceleration.

use super::bvh::BroadPhaseIndex;
use super::pair_geometry::{
    coplanar_candidates_2d, dedupe_points, dedupe_points_2d, has_noncollinear_triple, is_coplanar,
    max_pairwise_distance, max_pairwise_distance_2d, non_coplanar_candidates, separated,
};
use super::BoundingBox;
use crate::error::Diagnostics;
use crate::types::{IntersectionKind, Tolerances, Triangle};
use rayon::prelude::*;

/// One triangle pair that passed broad phase and was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairIntersection {
    pub i_a: usize,
    pub i_b: usize,
    pub kind: IntersectionKind,
}

/// The ordered, deterministic result of classifying all candidate pairs
/// between `triangles_a` and `triangles_b`.
#[derive(Debug, Clone, Default)]
pub struct PairSet {
    pub pairs: Vec<PairIntersection>,
    pub diagnostics: Diagnostics,
}

/// Classify a single triangle pair by kind only, ignoring which specific
/// points make it up. Returns `IntersectionKind::None` if either triangle
/// is degenerate or the pair does not intersect.
pub fn classify_pair(tri_a: &Triangle, tri_b: &Triangle, tol: &Tolerances) -> IntersectionKind {
    let eps = tol.predicate_eps;

    if tri_a.is_degenerate(eps) || tri_b.is_degenerate(eps) {
        return IntersectionKind::None;
    }

    if separated(tri_a, tri_b, eps) {
        return IntersectionKind::None;
    }

    if is_coplanar(tri_a, tri_b, eps) {
        let axis = super::robust_predicates::dominant_axis(&tri_a.normal);
        let raw = coplanar_candidates_2d(tri_a, tri_b, axis, eps);
        let points = dedupe_points_2d(raw, tol.world_dedup_eps_sq);
        if points.is_empty() {
            return IntersectionKind::None;
        }
        if has_noncollinear_triple(&points, eps) {
            return IntersectionKind::Area;
        }
        if points.len() >= 2 && max_pairwise_distance_2d(&points) > eps {
            return IntersectionKind::Segment;
        }
        return IntersectionKind::Point;
    }

    let raw = non_coplanar_candidates(tri_a, tri_b, eps);
    let points = dedupe_points(raw, tol.world_dedup_eps_sq);
    match points.len() {
        0 => IntersectionKind::None,
        1 => IntersectionKind::Point,
        _ => {
            if max_pairwise_distance(&points) > eps {
                IntersectionKind::Segment
            } else {
                IntersectionKind::Point
            }
        }
    }
}

fn classify_against(
    tri_a: &Triangle,
    i_a: usize,
    triangles_b: &[Triangle],
    candidates: &[usize],
    tol: &Tolerances,
    diagnostics: &mut Diagnostics,
) -> Vec<PairIntersection> {
    let mut pairs = Vec::new();
    if tri_a.is_degenerate(tol.predicate_eps) {
        diagnostics.degenerate_triangles += 1;
        return pairs;
    }
    for &i_b in candidates {
        let tri_b = &triangles_b[i_b];
        if tri_b.is_degenerate(tol.predicate_eps) {
            continue;
        }
        let kind = classify_pair(tri_a, tri_b, tol);
        if kind != IntersectionKind::None {
            pairs.push(PairIntersection { i_a, i_b, kind });
        }
    }
    pairs
}

/// Classify all intersecting pairs between `triangles_a` and
/// `triangles_b`, in deterministic order: A traversed in index order, and
/// for each A the matching B-candidates sorted by index.
pub fn classify_pairs(
    triangles_a: &[Triangle],
    triangles_b: &[Triangle],
    tol: &Tolerances,
) -> PairSet {
    let index_b = BroadPhaseIndex::build(triangles_b);
    let mut diagnostics = Diagnostics::default();

    let b_degenerate = triangles_b
        .iter()
        .filter(|t| t.is_degenerate(tol.predicate_eps))
        .count() as u64;
    diagnostics.degenerate_triangles += b_degenerate;

    let mut pairs = Vec::new();
    for (i_a, tri_a) in triangles_a.iter().enumerate() {
        let query_box = BoundingBox::from_triangle(tri_a);
        let candidates = index_b.query(&query_box);
        pairs.extend(classify_against(
            tri_a,
            i_a,
            triangles_b,
            &candidates,
            tol,
            &mut diagnostics,
        ));
    }

    PairSet { pairs, diagnostics }
}

/// Same result as [`classify_pairs`], computed with the broad-phase query
/// loop over A parallelized. Per-A results are re-sorted by `(i_a, i_b)`
/// before being returned so the output is identical to the sequential
/// path.
pub fn classify_pairs_parallel(
    triangles_a: &[Triangle],
    triangles_b: &[Triangle],
    tol: &Tolerances,
) -> PairSet {
    let index_b = BroadPhaseIndex::build(triangles_b);

    let b_degenerate = triangles_b
        .iter()
        .filter(|t| t.is_degenerate(tol.predicate_eps))
        .count() as u64;

    let per_a: Vec<(Vec<PairIntersection>, Diagnostics)> = triangles_a
        .par_iter()
        .enumerate()
        .map(|(i_a, tri_a)| {
            let mut diagnostics = Diagnostics::default();
            let query_box = BoundingBox::from_triangle(tri_a);
            let candidates = index_b.query(&query_box);
            let pairs = classify_against(
                tri_a,
                i_a,
                triangles_b,
                &candidates,
                tol,
                &mut diagnostics,
            );
            (pairs, diagnostics)
        })
        .collect();

    let mut pairs = Vec::new();
    let mut diagnostics = Diagnostics {
        degenerate_triangles: b_degenerate,
        ..Default::default()
    };
    for (p, d) in per_a {
        pairs.extend(p);
        diagnostics.merge(&d);
    }
    pairs.sort_by_key(|p| (p.i_a, p.i_b));

    PairSet { pairs, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridPoint;

    fn tri(points: [[i64; 3]; 3]) -> Triangle {
        Triangle::from_vertices([
            GridPoint::new(points[0][0], points[0][1], points[0][2]),
            GridPoint::new(points[1][0], points[1][1], points[1][2]),
            GridPoint::new(points[2][0], points[2][1], points[2][2]),
        ])
    }

    #[test]
    fn single_segment_non_coplanar_scenario() {
        let a = vec![tri([[0, -1, 0], [0, 1, 0], [1, 0, 0]])];
        let b = vec![tri([[0, 0, -1], [0, 0, 1], [0, 2, 0]])];
        let tol = Tolerances::default();
        let result = classify_pairs(&a, &b, &tol);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].kind, IntersectionKind::Segment);
    }

    #[test]
    fn touching_at_vertex_is_point() {
        let a = vec![tri([[0, 0, 0], [2, 0, 0], [0, 2, 0]])];
        let b = vec![tri([[0, 0, 0], [-2, 0, 0], [0, -2, 0]])];
        let tol = Tolerances::default();
        let result = classify_pairs(&a, &b, &tol);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].kind, IntersectionKind::Point);
    }

    #[test]
    fn disjoint_triangles_produce_no_pairs() {
        let a = vec![tri([[0, 0, 0], [1, 0, 0], [0, 1, 0]])];
        let b = vec![tri([[100, 0, 0], [101, 0, 0], [100, 1, 0]])];
        let tol = Tolerances::default();
        let result = classify_pairs(&a, &b, &tol);
        assert!(result.pairs.is_empty());
    }

    #[test]
    fn coplanar_quadrilateral_overlap_is_area() {
        let a = tri([[0, 0, 0], [10, 0, 0], [0, 10, 0]]);
        let b = tri([[2, 2, 0], [12, 2, 0], [2, 12, 0]]);
        let tol = Tolerances::default();
        let result = classify_pairs(&[a], &[b], &tol);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].kind, IntersectionKind::Area);
    }

    #[test]
    fn parallel_classification_matches_sequential() {
        let a: Vec<Triangle> = (0..30)
            .map(|i| tri([[i, -1, 0], [i, 1, 0], [i + 1, 0, 0]]))
            .collect();
        let b: Vec<Triangle> = (0..30)
            .map(|i| tri([[i, 0, -1], [i, 0, 1], [i, 2, 0]]))
            .collect();
        let tol = Tolerances::default();
        let seq = classify_pairs(&a, &b, &tol);
        let par = classify_pairs_parallel(&a, &b, &tol);
        assert_eq!(seq.pairs, par.pairs);
    }
}
