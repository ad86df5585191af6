// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Restriction of the global graph to one mesh's triangles: per-triangle
//! edges, vertex-to-edge adjacency, and connected components.

use super::graph::{GlobalEdge, IntersectionGraph};
use super::triangle_index::TriangleIntersectionIndex;
use crate::types::{IntersectionEdgeId, IntersectionVertexId, MeshSide};
use ahash::{AHashMap, AHashSet};

/// One mesh's restricted view of the global graph.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    pub side: MeshSide,
    pub triangle_vertex_sets: Vec<AHashSet<IntersectionVertexId>>,
    pub triangle_edges: Vec<Vec<IntersectionEdgeId>>,
    pub edges: Vec<GlobalEdge>,
    pub vertex_edges: AHashMap<IntersectionVertexId, Vec<IntersectionEdgeId>>,
    pub components: Vec<Vec<IntersectionVertexId>>,
}

/// Build the topology for `side` from `graph` and the triangle lookups in
/// `index`.
pub fn build_mesh_topology(
    graph: &IntersectionGraph,
    index: &TriangleIntersectionIndex,
    side: MeshSide,
) -> MeshTopology {
    let per_triangle = match side {
        MeshSide::A => &index.triangles_a,
        MeshSide::B => &index.triangles_b,
    };

    let triangle_vertex_sets: Vec<AHashSet<IntersectionVertexId>> = per_triangle
        .iter()
        .map(|list| list.iter().map(|v| v.global_id).collect())
        .collect();

    let edges_by_id: AHashMap<IntersectionEdgeId, GlobalEdge> =
        graph.edges.iter().map(|e| (e.id, *e)).collect();

    let triangle_edges: Vec<Vec<IntersectionEdgeId>> = triangle_vertex_sets
        .iter()
        .map(|set| {
            graph
                .edges
                .iter()
                .filter(|e| set.contains(&e.start) && set.contains(&e.end))
                .map(|e| e.id)
                .collect()
        })
        .collect();

    let mut present: AHashSet<IntersectionEdgeId> = AHashSet::new();
    for list in &triangle_edges {
        present.extend(list.iter().copied());
    }
    let mut edges: Vec<GlobalEdge> = present.iter().filter_map(|id| edges_by_id.get(id).copied()).collect();
    edges.sort_by_key(|e| e.id.0);

    let mut vertex_edges: AHashMap<IntersectionVertexId, Vec<IntersectionEdgeId>> = AHashMap::new();
    for e in &edges {
        vertex_edges.entry(e.start).or_default().push(e.id);
        vertex_edges.entry(e.end).or_default().push(e.id);
    }

    let components = connected_components(&edges, &vertex_edges);

    MeshTopology {
        side,
        triangle_vertex_sets,
        triangle_edges,
        edges,
        vertex_edges,
        components,
    }
}

/// Connected components over the vertices touched by `edges`. Each
/// component is an ordered walk from an arbitrary start vertex — a
/// diagnostic trace, not necessarily a simple path.
fn connected_components(
    edges: &[GlobalEdge],
    vertex_edges: &AHashMap<IntersectionVertexId, Vec<IntersectionEdgeId>>,
) -> Vec<Vec<IntersectionVertexId>> {
    let edge_by_id: AHashMap<IntersectionEdgeId, GlobalEdge> =
        edges.iter().map(|e| (e.id, *e)).collect();

    let mut visited: AHashSet<IntersectionVertexId> = AHashSet::new();
    let mut vertices: Vec<IntersectionVertexId> = vertex_edges.keys().copied().collect();
    vertices.sort_by_key(|v| v.0);

    let mut components = Vec::new();
    for &start in &vertices {
        if visited.contains(&start) {
            continue;
        }
        let mut walk = Vec::new();
        let mut stack = vec![start];
        visited.insert(start);
        while let Some(v) = stack.pop() {
            walk.push(v);
            if let Some(incident) = vertex_edges.get(&v) {
                let mut neighbors: Vec<IntersectionVertexId> = incident
                    .iter()
                    .filter_map(|eid| edge_by_id.get(eid))
                    .map(|e| if e.start == v { e.end } else { e.start })
                    .collect();
                neighbors.sort_by_key(|v| v.0);
                for n in neighbors {
                    if visited.insert(n) {
                        stack.push(n);
                    }
                }
            }
        }
        components.push(walk);
    }
    components
}
