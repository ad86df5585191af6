// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Robust geometric predicates shared by the classifier and feature
//! extractor: plane-side tests, point-in-triangle, and parametric
//! edge/segment intersection, all gated by a single predicate epsilon.
//! Kept in `f64` throughout and, for near-zero results, falls back to
//! error-free (Shewchuk-style) summation rather than trusting the single
//! rounded subtraction.

use crate::types::RealPoint;
use nalgebra::Vector3;

/// Classification of a point relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneClassification {
    Front,
    Back,
    OnPlane,
}

/// Error-free transformation: `(a*b) - (c*d)`, used to steady the cross
/// product computation when its naive value is near zero.
fn two_product(a: f64, b: f64, c: f64, d: f64) -> f64 {
    #[cfg(target_feature = "fma")]
    {
        a.mul_add(b, -c.mul_add(d, 0.0))
    }
    #[cfg(not(target_feature = "fma"))]
    {
        a * b - c * d
    }
}

/// Dot product of `v` against a raw 3-array, summed largest-magnitude
/// term first with Kahan compensation.
fn compensated_dot(v: &Vector3<f64>, w: [f64; 3]) -> f64 {
    let mut terms = [v.x * w[0], v.y * w[1], v.z * w[2]];
    terms.sort_by(|a, b| b.abs().partial_cmp(&a.abs()).unwrap());

    let mut sum = 0.0;
    let mut c = 0.0;
    for term in terms {
        let y = term - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Signed distance from `point` to the plane `(normal, d)` where `d` is
/// `normal.dot(point_on_plane)`. Falls back to a compensated dot product
/// when the naive distance is within `eps` of zero.
pub fn point_plane_distance(point: RealPoint, normal: &Vector3<f64>, d: f64, eps: f64) -> f64 {
    let naive = normal.dot(&point.coords) - d;
    if naive.abs() < eps {
        compensated_dot(normal, [point.x, point.y, point.z]) - d
    } else {
        naive
    }
}

pub fn classify_point_plane(
    point: RealPoint,
    normal: &Vector3<f64>,
    d: f64,
    eps: f64,
) -> PlaneClassification {
    let dist = point_plane_distance(point, normal, d, eps);
    if dist > eps {
        PlaneClassification::Front
    } else if dist < -eps {
        PlaneClassification::Back
    } else {
        PlaneClassification::OnPlane
    }
}

/// Index (0=x, 1=y, 2=z) of the axis with the largest magnitude in
/// `normal` — the axis to drop when projecting to 2D.
pub fn dominant_axis(normal: &Vector3<f64>) -> usize {
    let abs = normal.map(|x| x.abs());
    if abs.x >= abs.y && abs.x >= abs.z {
        0
    } else if abs.y >= abs.z {
        1
    } else {
        2
    }
}

/// Project `point` to 2D by dropping `axis`.
pub fn project_2d(point: RealPoint, axis: usize) -> (f64, f64) {
    match axis {
        0 => (point.y, point.z),
        1 => (point.x, point.z),
        _ => (point.x, point.y),
    }
}

/// Barycentric coordinates of `p` with respect to 2D triangle `(v0,v1,v2)`.
/// Returns `None` when the 2D projection is degenerate (denominator below
/// `eps`) — the caller counts this as a degenerate barycentric sample.
pub fn barycentric_2d(
    p: (f64, f64),
    v0: (f64, f64),
    v1: (f64, f64),
    v2: (f64, f64),
    eps: f64,
) -> Option<(f64, f64, f64)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);
    if denom.abs() < eps {
        return None;
    }
    let a = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let b = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let c = 1.0 - a - b;
    Some((a, b, c))
}

/// Parametric intersection of segment `(p0,p1)` with the plane `(normal,
/// d)`, clamped to `t ∈ [0,1]` within `eps`. Returns `None` when the
/// segment does not cross the plane (same-side endpoints) or runs
/// parallel to it.
pub fn segment_plane_intersection(
    p0: RealPoint,
    p1: RealPoint,
    normal: &Vector3<f64>,
    d: f64,
    eps: f64,
) -> Option<(f64, RealPoint)> {
    let d0 = point_plane_distance(p0, normal, d, eps);
    let d1 = point_plane_distance(p1, normal, d, eps);

    if d0 * d1 > 0.0 {
        return None;
    }
    let denom = d0 - d1;
    if denom.abs() < eps {
        return None;
    }
    let t = (d0 / denom).clamp(-eps, 1.0 + eps).clamp(0.0, 1.0);
    let point = p0 + (p1 - p0) * t;
    Some((t, point))
}

/// 2D segment-segment intersection with clamped parameters, returning the
/// intersection point if the segments (not the infinite lines) cross.
pub fn segment_segment_2d(
    a0: (f64, f64),
    a1: (f64, f64),
    b0: (f64, f64),
    b1: (f64, f64),
    eps: f64,
) -> Option<(f64, f64)> {
    let r = (a1.0 - a0.0, a1.1 - a0.1);
    let s = (b1.0 - b0.0, b1.1 - b0.1);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < eps {
        return None; // parallel or collinear
    }
    let diff = (b0.0 - a0.0, b0.1 - a0.1);
    let t = (diff.0 * s.1 - diff.1 * s.0) / denom;
    let u = (diff.0 * r.1 - diff.1 * r.0) / denom;

    let lo = -eps;
    let hi = 1.0 + eps;
    if t < lo || t > hi || u < lo || u > hi {
        return None;
    }
    Some((a0.0 + r.0 * t, a0.1 + r.1 * t))
}

/// Squared area-scaled cross product of `(b-a) x (c-a)` in 2D. Used to
/// test collinearity (|cross| ≤ eps) of three 2D points.
pub fn cross_2d(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    const EPS: f64 = 1e-9;

    #[test]
    fn classify_point_plane_sides() {
        let normal = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(
            classify_point_plane(Point3::new(0.0, 0.0, 1.0), &normal, 0.0, EPS),
            PlaneClassification::Front
        );
        assert_eq!(
            classify_point_plane(Point3::new(0.0, 0.0, -1.0), &normal, 0.0, EPS),
            PlaneClassification::Back
        );
        assert_eq!(
            classify_point_plane(Point3::new(0.0, 0.0, 0.0), &normal, 0.0, EPS),
            PlaneClassification::OnPlane
        );
    }

    #[test]
    fn segment_plane_intersection_midpoint() {
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let result = segment_plane_intersection(
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 1.0),
            &normal,
            0.0,
            EPS,
        );
        let (t, p) = result.expect("segment crosses plane");
        assert!((t - 0.5).abs() < 1e-9);
        assert!((p.z).abs() < 1e-9);
    }

    #[test]
    fn segment_plane_no_crossing_same_side() {
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let result = segment_plane_intersection(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 2.0),
            &normal,
            0.0,
            EPS,
        );
        assert!(result.is_none());
    }

    #[test]
    fn barycentric_2d_of_vertex_is_unit() {
        let v0 = (0.0, 0.0);
        let v1 = (1.0, 0.0);
        let v2 = (0.0, 1.0);
        let (a, b, c) = barycentric_2d(v0, v0, v1, v2, EPS).unwrap();
        assert!((a - 1.0).abs() < 1e-9 && b.abs() < 1e-9 && c.abs() < 1e-9);
    }

    #[test]
    fn segment_segment_2d_cross() {
        let p = segment_segment_2d((0.0, 0.5), (1.0, 0.5), (0.5, 0.0), (0.5, 1.0), EPS).unwrap();
        assert!((p.0 - 0.5).abs() < 1e-9 && (p.1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn segment_segment_2d_parallel_is_none() {
        let p = segment_segment_2d((0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0), EPS);
        assert!(p.is_none());
    }
}
