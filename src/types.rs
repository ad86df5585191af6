// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared scalar and point types, tolerances, and small ID wrappers used
//! throughout the intersection pipeline.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A point on the integer input lattice. Input mesh vertices live here;
/// coordinates are expected to stay within roughly `±2^62` so that
/// conversion to `f64` never loses the bits that matter for the
/// predicates above.
pub type GridPoint = Point3<i64>;

/// A double-precision point used for intersection samples, barycentric
/// reconstructions, and lengths.
pub type RealPoint = Point3<f64>;

/// Convert a lattice point to its `f64` world-space representation.
pub fn grid_to_real(p: GridPoint) -> RealPoint {
    Point3::new(p.x as f64, p.y as f64, p.z as f64)
}

/// Three doubles with the invariant `u + v + w ≈ 1` and each `≥ -ε`.
/// Carries no triangle identity on its own — it is only meaningful paired
/// with the triangle it was computed against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

impl Barycentric {
    pub fn new(u: f64, v: f64, w: f64) -> Self {
        Self { u, v, w }
    }

    /// Reconstruct a world point by evaluating `triangle` at these
    /// coordinates: `u*a + v*b + w*c`.
    pub fn evaluate(&self, triangle: &Triangle) -> RealPoint {
        let a = grid_to_real(triangle.vertices[0]);
        let b = grid_to_real(triangle.vertices[1]);
        let c = grid_to_real(triangle.vertices[2]);
        Point3::new(
            self.u * a.x + self.v * b.x + self.w * c.x,
            self.u * a.y + self.v * b.y + self.w * c.y,
            self.u * a.z + self.v * b.z + self.w * c.z,
        )
    }

    /// Whether this barycentric lies inside the triangle, edges inclusive,
    /// under `eps`.
    pub fn is_inside(&self, eps: f64) -> bool {
        self.u >= -eps && self.v >= -eps && self.w >= -eps
    }
}

/// Three `GridPoint`s plus a precomputed outward unit normal, consistent
/// with the triangle's winding. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [GridPoint; 3],
    pub normal: Vector3<f64>,
}

impl Triangle {
    pub fn new(vertices: [GridPoint; 3], normal: Vector3<f64>) -> Self {
        Self { vertices, normal }
    }

    /// Build a triangle from three lattice points, deriving the normal
    /// from winding order (right-hand rule over `v1-v0, v2-v0`).
    pub fn from_vertices(vertices: [GridPoint; 3]) -> Self {
        let a = grid_to_real(vertices[0]);
        let b = grid_to_real(vertices[1]);
        let c = grid_to_real(vertices[2]);
        let normal = (b - a).cross(&(c - a));
        let norm = normal.norm();
        let normal = if norm > 0.0 {
            normal / norm
        } else {
            Vector3::new(0.0, 0.0, 0.0)
        };
        Self { vertices, normal }
    }

    pub fn world_vertices(&self) -> [RealPoint; 3] {
        [
            grid_to_real(self.vertices[0]),
            grid_to_real(self.vertices[1]),
            grid_to_real(self.vertices[2]),
        ]
    }

    /// Twice the (unsigned) triangle area; zero for a degenerate triangle.
    pub fn double_area(&self) -> f64 {
        let [a, b, c] = self.world_vertices();
        (b - a).cross(&(c - a)).norm()
    }

    pub fn is_degenerate(&self, eps: f64) -> bool {
        self.double_area() < eps
    }

    /// Signed distance of `d` above this triangle's plane.
    pub fn plane_distance(&self, d: RealPoint) -> f64 {
        let a = grid_to_real(self.vertices[0]);
        self.normal.dot(&(d - a))
    }

    /// Longest edge length, used to scale absolute tolerances to a
    /// triangle's own size (`k * eps * diameter(T)`).
    pub fn diameter(&self) -> f64 {
        let [a, b, c] = self.world_vertices();
        let ab = (b - a).norm();
        let bc = (c - b).norm();
        let ca = (a - c).norm();
        ab.max(bc).max(ca)
    }
}

/// Kind of intersection a classified triangle pair has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionKind {
    None,
    Point,
    Segment,
    Area,
}

macro_rules! id_wrapper {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

id_wrapper!(IntersectionVertexId, u32);

/// Opaque wrapper over a small integer. Negative values are reserved for
/// synthetic closure edges produced by the curve regularizer; real edges
/// always carry a non-negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IntersectionEdgeId(pub i64);

impl IntersectionEdgeId {
    pub fn is_synthetic(self) -> bool {
        self.0 < 0
    }
}

/// Governs every epsilon used by the pipeline, end to end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tolerances {
    /// Governs plane-side, point-in-triangle, parametric clamping, and
    /// quantization granularity for vertex fusion.
    pub predicate_eps: f64,
    /// Squared threshold for merging world-space samples.
    pub world_dedup_eps_sq: f64,
    /// Inclusive bound for barycentric validity tests.
    pub barycentric_eps: f64,
    /// Multiplier on median edge length for the regularizer's closure
    /// threshold.
    pub closure_factor_median: f64,
    /// Multiplier on total component length for the regularizer's closure
    /// threshold.
    pub closure_factor_total: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        let predicate_eps = 1e-12;
        Self {
            predicate_eps,
            world_dedup_eps_sq: predicate_eps * predicate_eps,
            barycentric_eps: predicate_eps,
            closure_factor_median: 3.0,
            closure_factor_total: 0.25,
        }
    }
}

impl Tolerances {
    /// Rejects the one class of fatal-at-construction input this crate
    /// treats as a hard error: a nonsensical (non-positive) tolerance.
    pub fn validate(&self) -> Result<(), crate::error::IntersectionError> {
        for (name, value) in [
            ("predicate_eps", self.predicate_eps),
            ("world_dedup_eps_sq", self.world_dedup_eps_sq),
            ("barycentric_eps", self.barycentric_eps),
            ("closure_factor_median", self.closure_factor_median),
            ("closure_factor_total", self.closure_factor_total),
        ] {
            if !(value > 0.0) {
                return Err(crate::error::IntersectionError::InvalidTolerance {
                    field: name,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Identifies which of the two input meshes a `MeshTopology` was built
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshSide {
    A,
    B,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barycentric_evaluate_reconstructs_vertex() {
        let tri = Triangle::from_vertices([
            GridPoint::new(0, 0, 0),
            GridPoint::new(10, 0, 0),
            GridPoint::new(0, 10, 0),
        ]);
        let bary = Barycentric::new(1.0, 0.0, 0.0);
        let p = bary.evaluate(&tri);
        assert_eq!(p, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn degenerate_triangle_has_zero_area() {
        let tri = Triangle::from_vertices([
            GridPoint::new(0, 0, 0),
            GridPoint::new(1, 0, 0),
            GridPoint::new(2, 0, 0),
        ]);
        assert!(tri.is_degenerate(1e-9));
    }

    #[test]
    fn tolerances_default_validates() {
        assert!(Tolerances::default().validate().is_ok());
    }

    #[test]
    fn tolerances_reject_nonpositive() {
        let mut tol = Tolerances::default();
        tol.predicate_eps = 0.0;
        assert!(tol.validate().is_err());
    }
}
