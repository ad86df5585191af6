// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Broad-phase acceleration structure: a bounding-volume hierarchy over one
//! triangle sequence, queried by axis-aligned box.

use super::BoundingBox;
use crate::types::Triangle;

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone)]
struct BvhNode {
    bbox: BoundingBox,
    left: Option<Box<BvhNode>>,
    right: Option<Box<BvhNode>>,
    triangle_indices: Vec<usize>,
}

impl BvhNode {
    fn leaf(bbox: BoundingBox, triangle_indices: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            triangle_indices,
        }
    }

    fn internal(bbox: BoundingBox, left: Box<BvhNode>, right: Box<BvhNode>) -> Self {
        Self {
            bbox,
            left: Some(left),
            right: Some(right),
            triangle_indices: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// A binary bounding-volume hierarchy over one immutable triangle
/// sequence. Built once; safe to query concurrently afterward — there is
/// no mutation API.
pub struct BroadPhaseIndex {
    root: BvhNode,
}

impl BroadPhaseIndex {
    /// Build the index from a triangle slice. Degenerate (zero-area)
    /// triangles are still indexed by their (degenerate, but still valid)
    /// bounding box — classification skips them later, not broad phase.
    pub fn build(triangles: &[Triangle]) -> Self {
        if triangles.is_empty() {
            return Self {
                root: BvhNode::leaf(BoundingBox::empty(), Vec::new()),
            };
        }

        let entries: Vec<(usize, BoundingBox)> = triangles
            .iter()
            .enumerate()
            .map(|(idx, tri)| (idx, BoundingBox::from_triangle(tri)))
            .collect();

        Self {
            root: Self::build_recursive(entries, 0),
        }
    }

    fn build_recursive(mut entries: Vec<(usize, BoundingBox)>, depth: usize) -> BvhNode {
        if entries.len() <= LEAF_CAPACITY || depth >= MAX_DEPTH {
            let bbox = Self::union_all(&entries);
            let indices: Vec<usize> = entries.iter().map(|(idx, _)| *idx).collect();
            return BvhNode::leaf(bbox, indices);
        }

        let split_axis = Self::longest_axis(&entries);

        entries.sort_by(|(_, a), (_, b)| {
            let ca = a.center();
            let cb = b.center();
            let (va, vb) = match split_axis {
                0 => (ca.x, cb.x),
                1 => (ca.y, cb.y),
                _ => (ca.z, cb.z),
            };
            va.partial_cmp(&vb).unwrap()
        });

        let mid = entries.len() / 2;
        let right_entries = entries.split_off(mid);
        let left_entries = entries;

        let left = Box::new(Self::build_recursive(left_entries, depth + 1));
        let right = Box::new(Self::build_recursive(right_entries, depth + 1));
        let bbox = left.bbox.union(&right.bbox);

        BvhNode::internal(bbox, left, right)
    }

    fn longest_axis(entries: &[(usize, BoundingBox)]) -> usize {
        let size = Self::union_all(entries).size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    fn union_all(entries: &[(usize, BoundingBox)]) -> BoundingBox {
        entries
            .iter()
            .fold(BoundingBox::empty(), |acc, (_, bbox)| acc.union(bbox))
    }

    /// Every triangle index whose bounding box intersects `query_box`
    /// (touching counts as intersecting), in ascending order.
    pub fn query(&self, query_box: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        Self::query_recursive(&self.root, query_box, &mut result);
        result.sort_unstable();
        result.dedup();
        result
    }

    fn query_recursive(node: &BvhNode, query_box: &BoundingBox, result: &mut Vec<usize>) {
        if !node.bbox.intersects(query_box) {
            return;
        }

        if node.is_leaf() {
            result.extend_from_slice(&node.triangle_indices);
        } else {
            if let Some(ref left) = node.left {
                Self::query_recursive(left, query_box, result);
            }
            if let Some(ref right) = node.right {
                Self::query_recursive(right, query_box, result);
            }
        }
    }

    #[cfg(test)]
    fn is_leaf_root(&self) -> bool {
        self.root.is_leaf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridPoint;

    fn grid_triangles(n: i64) -> Vec<Triangle> {
        (0..n)
            .map(|i| {
                Triangle::from_vertices([
                    GridPoint::new(i * 10, 0, 0),
                    GridPoint::new(i * 10 + 1, 0, 0),
                    GridPoint::new(i * 10, 1, 0),
                ])
            })
            .collect()
    }

    #[test]
    fn build_splits_when_over_leaf_capacity() {
        let triangles = grid_triangles(20);
        let index = BroadPhaseIndex::build(&triangles);
        assert!(!index.is_leaf_root());
    }

    #[test]
    fn build_stays_leaf_when_small() {
        let triangles = grid_triangles(3);
        let index = BroadPhaseIndex::build(&triangles);
        assert!(index.is_leaf_root());
    }

    #[test]
    fn query_finds_all_triangles_with_full_bbox() {
        let triangles = grid_triangles(50);
        let index = BroadPhaseIndex::build(&triangles);
        let full = triangles
            .iter()
            .fold(BoundingBox::empty(), |acc, t| acc.union(&BoundingBox::from_triangle(t)));
        let results = index.query(&full);
        assert_eq!(results.len(), 50);
        assert_eq!(results, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn query_excludes_far_away_triangle() {
        let triangles = grid_triangles(5);
        let index = BroadPhaseIndex::build(&triangles);
        let near_zero = BoundingBox::new(
            nalgebra::Point3::new(-0.5, -0.5, -0.5),
            nalgebra::Point3::new(0.5, 0.5, 0.5),
        );
        let results = index.query(&near_zero);
        assert_eq!(results, vec![0]);
    }

    #[test]
    fn empty_input_produces_empty_query() {
        let index = BroadPhaseIndex::build(&[]);
        assert!(index.query(&BoundingBox::empty()).is_empty());
    }
}
