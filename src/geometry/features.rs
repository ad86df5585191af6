// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-pair local intersection geometry: vertices and segments, each
//! located in barycentric coordinates on both triangles of a pair.

use super::classify::PairSet;
use super::pair_geometry::{
    barycentric_on_triangle, coplanar_candidates_2d, dedupe_points, dedupe_points_2d,
    has_noncollinear_triple, is_coplanar, non_coplanar_candidates, plane_of_triangle, unproject_2d,
};
use crate::error::Diagnostics;
use crate::types::{Barycentric, IntersectionKind, RealPoint, Tolerances, Triangle};

/// A single intersection sample for one pair, in both triangles'
/// coordinates. `pair_local_id` is unique within the pair only.
#[derive(Debug, Clone, Copy)]
pub struct PairVertex {
    pub pair_local_id: u32,
    pub bary_on_a: Barycentric,
    pub bary_on_b: Barycentric,
    pub world: RealPoint,
}

/// An undirected pair-local edge between two [`PairVertex`] ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairSegment {
    pub start: u32,
    pub end: u32,
}

/// The local feature geometry produced for one classified pair. `kind` is
/// the possibly-degraded kind actually realized once the samples were
/// deduplicated — it may differ from the `PairIntersection`'s kind.
#[derive(Debug, Clone)]
pub struct PairFeature {
    pub i_a: usize,
    pub i_b: usize,
    pub kind: IntersectionKind,
    pub vertices: Vec<PairVertex>,
    pub segments: Vec<PairSegment>,
}

fn make_vertex(id: u32, world: RealPoint, tri_a: &Triangle, tri_b: &Triangle, eps: f64) -> Option<PairVertex> {
    let bary_on_a = barycentric_on_triangle(world, tri_a, eps)?;
    let bary_on_b = barycentric_on_triangle(world, tri_b, eps)?;
    Some(PairVertex {
        pair_local_id: id,
        bary_on_a,
        bary_on_b,
        world,
    })
}

/// Select the farthest pair among `points` (by index into the already
/// emitted vertex list) for the single connecting segment a Segment-kind
/// pair emits.
fn farthest_pair(points: &[RealPoint]) -> (usize, usize) {
    let mut best = (0usize, 1usize.min(points.len().saturating_sub(1)));
    let mut best_dist = -1.0;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d = (points[i] - points[j]).norm_squared();
            if d > best_dist {
                best_dist = d;
                best = (i, j);
            }
        }
    }
    best
}

fn build_point_or_segment(
    i_a: usize,
    i_b: usize,
    points: Vec<RealPoint>,
    tri_a: &Triangle,
    tri_b: &Triangle,
    requested: IntersectionKind,
    eps: f64,
    diagnostics: &mut Diagnostics,
) -> PairFeature {
    let mut vertices = Vec::new();
    for (idx, &p) in points.iter().enumerate() {
        match make_vertex(idx as u32, p, tri_a, tri_b, eps) {
            Some(v) => vertices.push(v),
            None => diagnostics.degenerate_barycentric += 1,
        }
    }

    let actual_kind = match vertices.len() {
        0 => IntersectionKind::None,
        1 => IntersectionKind::Point,
        _ => IntersectionKind::Segment,
    };
    if actual_kind != requested {
        diagnostics.degraded_pairs += 1;
    }

    let mut segments = Vec::new();
    if actual_kind == IntersectionKind::Segment {
        let world: Vec<RealPoint> = vertices.iter().map(|v| v.world).collect();
        let (i, j) = farthest_pair(&world);
        segments.push(PairSegment {
            start: vertices[i].pair_local_id,
            end: vertices[j].pair_local_id,
        });
    }

    PairFeature {
        i_a,
        i_b,
        kind: actual_kind,
        vertices,
        segments,
    }
}

fn polar_order(points: &[(f64, f64)]) -> Vec<usize> {
    let cx = points.iter().map(|p| p.0).sum::<f64>() / points.len() as f64;
    let cy = points.iter().map(|p| p.1).sum::<f64>() / points.len() as f64;
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        let angle_a = (points[a].1 - cy).atan2(points[a].0 - cx);
        let angle_b = (points[b].1 - cy).atan2(points[b].0 - cx);
        angle_a.partial_cmp(&angle_b).unwrap()
    });
    order
}

fn build_non_coplanar_feature(
    pair: &super::classify::PairIntersection,
    tri_a: &Triangle,
    tri_b: &Triangle,
    tol: &Tolerances,
    diagnostics: &mut Diagnostics,
) -> PairFeature {
    let raw = non_coplanar_candidates(tri_a, tri_b, tol.predicate_eps);
    let points = dedupe_points(raw, tol.world_dedup_eps_sq);
    build_point_or_segment(
        pair.i_a,
        pair.i_b,
        points,
        tri_a,
        tri_b,
        pair.kind,
        tol.predicate_eps,
        diagnostics,
    )
}

fn build_coplanar_feature(
    pair: &super::classify::PairIntersection,
    tri_a: &Triangle,
    tri_b: &Triangle,
    tol: &Tolerances,
    diagnostics: &mut Diagnostics,
) -> PairFeature {
    let eps = tol.predicate_eps;
    let axis = super::robust_predicates::dominant_axis(&tri_a.normal);
    let raw = coplanar_candidates_2d(tri_a, tri_b, axis, eps);
    let points_2d = dedupe_points_2d(raw, tol.world_dedup_eps_sq);

    if points_2d.is_empty() {
        return PairFeature {
            i_a: pair.i_a,
            i_b: pair.i_b,
            kind: IntersectionKind::None,
            vertices: Vec::new(),
            segments: Vec::new(),
        };
    }

    let (normal, d) = plane_of_triangle(tri_a);
    let is_area =
        pair.kind == IntersectionKind::Area && has_noncollinear_triple(&points_2d, eps);

    if !is_area {
        let points: Vec<RealPoint> = points_2d
            .iter()
            .map(|&p| unproject_2d(p, axis, &normal, d))
            .collect();
        return build_point_or_segment(
            pair.i_a, pair.i_b, points, tri_a, tri_b, pair.kind, eps, diagnostics,
        );
    }

    // Area: order candidates by polar angle around their centroid (convex
    // because a two-triangle overlap is convex) and connect consecutive
    // points, including last -> first, into a closed polygon loop.
    let order = polar_order(&points_2d);
    let mut vertices = Vec::new();
    let mut local_id = 0u32;
    for &idx in &order {
        let world = unproject_2d(points_2d[idx], axis, &normal, d);
        match make_vertex(local_id, world, tri_a, tri_b, eps) {
            Some(v) => {
                vertices.push(v);
                local_id += 1;
            }
            None => diagnostics.degenerate_barycentric += 1,
        }
    }

    if vertices.len() < 3 {
        // Degrade: fewer surviving vertices than an Area needs.
        diagnostics.degraded_pairs += 1;
        let world: Vec<RealPoint> = vertices.iter().map(|v| v.world).collect();
        let kind = match world.len() {
            0 => IntersectionKind::None,
            1 => IntersectionKind::Point,
            _ => IntersectionKind::Segment,
        };
        let mut segments = Vec::new();
        if kind == IntersectionKind::Segment {
            segments.push(PairSegment {
                start: vertices[0].pair_local_id,
                end: vertices[1].pair_local_id,
            });
        }
        return PairFeature {
            i_a: pair.i_a,
            i_b: pair.i_b,
            kind,
            vertices,
            segments,
        };
    }

    let n = vertices.len();
    let segments: Vec<PairSegment> = (0..n)
        .map(|i| PairSegment {
            start: vertices[i].pair_local_id,
            end: vertices[(i + 1) % n].pair_local_id,
        })
        .collect();

    PairFeature {
        i_a: pair.i_a,
        i_b: pair.i_b,
        kind: IntersectionKind::Area,
        vertices,
        segments,
    }
}

/// Build per-pair local feature geometry for every classified pair in
/// `pair_set`. `i_a`/`i_b` index `triangles_a`/`triangles_b`.
pub fn build_pair_features(
    pair_set: &PairSet,
    triangles_a: &[Triangle],
    triangles_b: &[Triangle],
    tol: &Tolerances,
) -> (Vec<PairFeature>, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let mut features = Vec::with_capacity(pair_set.pairs.len());

    for pair in &pair_set.pairs {
        let tri_a = &triangles_a[pair.i_a];
        let tri_b = &triangles_b[pair.i_b];
        let coplanar = is_coplanar(tri_a, tri_b, tol.predicate_eps);
        let feature = if coplanar {
            build_coplanar_feature(pair, tri_a, tri_b, tol, &mut diagnostics)
        } else {
            build_non_coplanar_feature(pair, tri_a, tri_b, tol, &mut diagnostics)
        };
        features.push(feature);
    }

    diagnostics.merge(&pair_set.diagnostics);
    (features, diagnostics)
}
