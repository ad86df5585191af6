// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared candidate-point geometry for a single triangle pair: the
//! coplanarity test and the raw (undeduplicated) intersection candidates
//! for both the non-coplanar and coplanar paths. Both the classifier and
//! the feature extractor build on these so the two stages can never
//! disagree about what points a pair produces.

use super::robust_predicates::{
    barycentric_2d, classify_point_plane, cross_2d, dominant_axis, project_2d,
    segment_plane_intersection, segment_segment_2d, PlaneClassification,
};
use crate::types::{RealPoint, Triangle};

fn plane_of(tri: &Triangle) -> (nalgebra::Vector3<f64>, f64) {
    let a = tri.world_vertices()[0];
    (tri.normal, tri.normal.dot(&a.coords))
}

/// All three vertices of `tri_b` lie within `eps` of `tri_a`'s plane.
pub fn is_coplanar(tri_a: &Triangle, tri_b: &Triangle, eps: f64) -> bool {
    let (normal, d) = plane_of(tri_a);
    tri_b
        .world_vertices()
        .iter()
        .all(|&v| classify_point_plane(v, &normal, d, eps) == PlaneClassification::OnPlane)
}

/// True if both triangles lie strictly on one side of the other's plane —
/// the cheap reject test run before any candidate-point work.
pub fn separated(tri_a: &Triangle, tri_b: &Triangle, eps: f64) -> bool {
    let (na, da) = plane_of(tri_a);
    let b_side = tri_b
        .world_vertices()
        .map(|v| classify_point_plane(v, &na, da, eps));
    let b_separated = b_side.iter().all(|c| *c == PlaneClassification::Front)
        || b_side.iter().all(|c| *c == PlaneClassification::Back);
    if b_separated {
        return true;
    }

    let (nb, db) = plane_of(tri_b);
    let a_side = tri_a
        .world_vertices()
        .map(|v| classify_point_plane(v, &nb, db, eps));
    a_side.iter().all(|c| *c == PlaneClassification::Front)
        || a_side.iter().all(|c| *c == PlaneClassification::Back)
}

fn edges(v: [RealPoint; 3]) -> [(RealPoint, RealPoint); 3] {
    [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])]
}

/// Barycentric coordinates of a world point on `tri`, projecting both the
/// point and the triangle to `tri`'s own dominant axis. `None` on a
/// denominator underflow, counted by the caller as a degenerate sample.
pub fn barycentric_on_triangle(
    point: RealPoint,
    tri: &Triangle,
    eps: f64,
) -> Option<crate::types::Barycentric> {
    let axis = dominant_axis(&tri.normal);
    let verts = tri.world_vertices();
    let p2 = project_2d(point, axis);
    let v0 = project_2d(verts[0], axis);
    let v1 = project_2d(verts[1], axis);
    let v2 = project_2d(verts[2], axis);
    barycentric_2d(p2, v0, v1, v2, eps)
        .map(|(u, v, w)| crate::types::Barycentric::new(u, v, w))
}

/// Reconstruct the dropped coordinate of a point known to lie on
/// `(normal, d)`, given its 2D projection along `axis`.
pub fn unproject_2d(p2: (f64, f64), axis: usize, normal: &nalgebra::Vector3<f64>, d: f64) -> RealPoint {
    match axis {
        0 => {
            let x = (d - normal.y * p2.0 - normal.z * p2.1) / normal.x;
            RealPoint::new(x, p2.0, p2.1)
        }
        1 => {
            let y = (d - normal.x * p2.0 - normal.z * p2.1) / normal.y;
            RealPoint::new(p2.0, y, p2.1)
        }
        _ => {
            let z = (d - normal.x * p2.0 - normal.y * p2.1) / normal.z;
            RealPoint::new(p2.0, p2.1, z)
        }
    }
}

/// The `(normal, d)` plane pair of a triangle, exposed for callers that
/// need to unproject 2D coplanar candidates back to world space.
pub fn plane_of_triangle(tri: &Triangle) -> (nalgebra::Vector3<f64>, f64) {
    plane_of(tri)
}

/// Barycentric-inclusive-inside test of a world point against a triangle,
/// projecting to the triangle's own dominant axis.
fn inside_triangle(point: RealPoint, tri: &Triangle, eps: f64) -> bool {
    let axis = dominant_axis(&tri.normal);
    let verts = tri.world_vertices();
    let p2 = project_2d(point, axis);
    let v0 = project_2d(verts[0], axis);
    let v1 = project_2d(verts[1], axis);
    let v2 = project_2d(verts[2], axis);
    match barycentric_2d(p2, v0, v1, v2, eps) {
        Some((u, v, w)) => u >= -eps && v >= -eps && w >= -eps,
        None => false,
    }
}

/// Raw (undeduplicated) world-space candidate points for the non-coplanar
/// path: plane-incident vertices that land inside the other triangle, plus
/// edge/plane crossings that land inside the other triangle.
pub fn non_coplanar_candidates(tri_a: &Triangle, tri_b: &Triangle, eps: f64) -> Vec<RealPoint> {
    let mut points = Vec::new();
    let (na, da) = plane_of(tri_a);
    let (nb, db) = plane_of(tri_b);

    for &v in &tri_a.world_vertices() {
        if classify_point_plane(v, &nb, db, eps) == PlaneClassification::OnPlane
            && inside_triangle(v, tri_b, eps)
        {
            points.push(v);
        }
    }
    for &v in &tri_b.world_vertices() {
        if classify_point_plane(v, &na, da, eps) == PlaneClassification::OnPlane
            && inside_triangle(v, tri_a, eps)
        {
            points.push(v);
        }
    }

    for (p0, p1) in edges(tri_a.world_vertices()) {
        let d0 = classify_point_plane(p0, &nb, db, eps);
        let d1 = classify_point_plane(p1, &nb, db, eps);
        let strictly_opposing = (d0 == PlaneClassification::Front
            && d1 == PlaneClassification::Back)
            || (d0 == PlaneClassification::Back && d1 == PlaneClassification::Front);
        if !strictly_opposing {
            continue;
        }
        if let Some((_, point)) = segment_plane_intersection(p0, p1, &nb, db, eps) {
            if inside_triangle(point, tri_b, eps) {
                points.push(point);
            }
        }
    }
    for (p0, p1) in edges(tri_b.world_vertices()) {
        let d0 = classify_point_plane(p0, &na, da, eps);
        let d1 = classify_point_plane(p1, &na, da, eps);
        let strictly_opposing = (d0 == PlaneClassification::Front
            && d1 == PlaneClassification::Back)
            || (d0 == PlaneClassification::Back && d1 == PlaneClassification::Front);
        if !strictly_opposing {
            continue;
        }
        if let Some((_, point)) = segment_plane_intersection(p0, p1, &na, da, eps) {
            if inside_triangle(point, tri_a, eps) {
                points.push(point);
            }
        }
    }

    points
}

/// Raw (undeduplicated) 2D candidate points for the coplanar path,
/// projected with `axis` (the dominant axis of `tri_a`'s normal): vertices
/// of each triangle that fall inside the other, plus all edge-edge
/// crossings.
pub fn coplanar_candidates_2d(
    tri_a: &Triangle,
    tri_b: &Triangle,
    axis: usize,
    eps: f64,
) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let va = tri_a.world_vertices().map(|p| project_2d(p, axis));
    let vb = tri_b.world_vertices().map(|p| project_2d(p, axis));

    for &p in &va {
        if let Some((u, v, w)) = barycentric_2d(p, vb[0], vb[1], vb[2], eps) {
            if u >= -eps && v >= -eps && w >= -eps {
                points.push(p);
            }
        }
    }
    for &p in &vb {
        if let Some((u, v, w)) = barycentric_2d(p, va[0], va[1], va[2], eps) {
            if u >= -eps && v >= -eps && w >= -eps {
                points.push(p);
            }
        }
    }

    let edges_a = [(va[0], va[1]), (va[1], va[2]), (va[2], va[0])];
    let edges_b = [(vb[0], vb[1]), (vb[1], vb[2]), (vb[2], vb[0])];
    for &(a0, a1) in &edges_a {
        for &(b0, b1) in &edges_b {
            if let Some(p) = segment_segment_2d(a0, a1, b0, b1, eps) {
                points.push(p);
            }
        }
    }

    points
}

/// Deduplicate world points by squared distance.
pub fn dedupe_points(points: Vec<RealPoint>, dedup_eps_sq: f64) -> Vec<RealPoint> {
    let mut result: Vec<RealPoint> = Vec::new();
    for p in points {
        if !result
            .iter()
            .any(|&q| (p - q).norm_squared() <= dedup_eps_sq)
        {
            result.push(p);
        }
    }
    result
}

/// Deduplicate 2D points by squared distance.
pub fn dedupe_points_2d(points: Vec<(f64, f64)>, dedup_eps_sq: f64) -> Vec<(f64, f64)> {
    let mut result: Vec<(f64, f64)> = Vec::new();
    for p in points {
        if !result.iter().any(|&q| {
            let dx = p.0 - q.0;
            let dy = p.1 - q.1;
            dx * dx + dy * dy <= dedup_eps_sq
        }) {
            result.push(p);
        }
    }
    result
}

/// True if any three of `points` are non-collinear (|cross| > eps) —
/// distinguishes a genuine 2D area overlap from a degenerate Segment/Point.
pub fn has_noncollinear_triple(points: &[(f64, f64)], eps: f64) -> bool {
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            for k in (j + 1)..points.len() {
                if cross_2d(points[i], points[j], points[k]).abs() > eps {
                    return true;
                }
            }
        }
    }
    false
}

pub fn max_pairwise_distance(points: &[RealPoint]) -> f64 {
    let mut max = 0.0f64;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            max = max.max((points[i] - points[j]).norm());
        }
    }
    max
}

pub fn max_pairwise_distance_2d(points: &[(f64, f64)]) -> f64 {
    let mut max = 0.0f64;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let dx = points[i].0 - points[j].0;
            let dy = points[i].1 - points[j].1;
            max = max.max((dx * dx + dy * dy).sqrt());
        }
    }
    max
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
    fn coplanar_triangles_detected() {
        let a = tri([[0, 0, 0], [1, 0, 0], [0, 1, 0]]);
        let b = tri([[0, 0, 0], [2, 0, 0], [0, 2, 0]]);
        assert!(is_coplanar(&a, &b, 1e-9));
    }

    #[test]
    fn non_coplanar_triangles_not_detected() {
        let a = tri([[0, 0, 0], [1, 0, 0], [0, 1, 0]]);
        let b = tri([[0, 0, -1], [0, 0, 1], [0, 2, 0]]);
        assert!(!is_coplanar(&a, &b, 1e-9));
    }

    #[test]
    fn separated_triangles_are_separated() {
        let a = tri([[0, 0, 0], [1, 0, 0], [0, 1, 0]]);
        let b = tri([[10, 0, 0], [11, 0, 0], [10, 1, 0]]);
        assert!(separated(&a, &b, 1e-9));
    }

    #[test]
    fn non_coplanar_segment_yields_two_points() {
        let a = tri([[0, -1, 0], [0, 1, 0], [1, 0, 0]]);
        let b = tri([[0, 0, -1], [0, 0, 1], [0, 2, 0]]);
        let raw = non_coplanar_candidates(&a, &b, 1e-9);
        let deduped = dedupe_points(raw, 1e-18);
        assert_eq!(deduped.len(), 2);
    }
}
