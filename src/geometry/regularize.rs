// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Turns each connected component of a `MeshTopology` into a classification
//! tag and, for the components that qualify, a closed 2-regular curve.

use super::graph::IntersectionGraph;
use super::topology::MeshTopology;
use crate::error::Diagnostics;
use crate::types::{IntersectionEdgeId, IntersectionVertexId, Tolerances};
use ahash::{AHashMap, AHashSet};

/// The classification a component's degree/length profile settles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentClass {
    TinyNoise,
    StrongLoopCandidate,
    Ambiguous,
}

/// Per-component degree and length summary.
#[derive(Debug, Clone, Copy)]
pub struct ComponentStats {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub deg_1: usize,
    pub deg_2: usize,
    pub deg_ge_3: usize,
    pub total_length: f64,
    pub median_length: f64,
    pub classification: ComponentClass,
}

/// A closed, 2-regular ring: `vertices[0] == vertices[last]`, and
/// `edges.len() == vertices.len() - 1`.
#[derive(Debug, Clone)]
pub struct IntersectionCurve {
    pub vertices: Vec<IntersectionVertexId>,
    pub edges: Vec<IntersectionEdgeId>,
    pub is_synthetic: Vec<bool>,
    pub total_length: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RegularizationResult {
    pub curves: Vec<IntersectionCurve>,
    pub stats: Vec<ComponentStats>,
}

fn median(mut lengths: Vec<f64>) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    lengths.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = lengths.len();
    if n % 2 == 1 {
        lengths[n / 2]
    } else {
        (lengths[n / 2 - 1] + lengths[n / 2]) / 2.0
    }
}

fn classify(edge_count: usize, deg_1: usize, deg_ge_3: usize, total_length: f64, median_length: f64) -> ComponentClass {
    if edge_count <= 3 && median_length > 0.0 && total_length <= 2.0 * median_length {
        return ComponentClass::TinyNoise;
    }
    if deg_ge_3 == 0 && deg_1 <= 2 && edge_count >= 4 && median_length > 0.0 && total_length >= 4.0 * median_length {
        return ComponentClass::StrongLoopCandidate;
    }
    ComponentClass::Ambiguous
}

type Adjacency = AHashMap<IntersectionVertexId, Vec<(IntersectionVertexId, IntersectionEdgeId)>>;

/// Forced walk through a 2-regular (sub)graph starting at `start`,
/// consuming every edge in `adjacency` exactly once. `None` if the walk
/// cannot consume all edges and return to `start` — the caller treats
/// this as an unregularizable component.
fn eulerian_cycle(
    start: IntersectionVertexId,
    adjacency: &Adjacency,
    edge_count: usize,
) -> Option<(Vec<IntersectionVertexId>, Vec<IntersectionEdgeId>)> {
    let mut used: AHashSet<IntersectionEdgeId> = AHashSet::new();
    let mut vertices = vec![start];
    let mut edges = Vec::new();
    let mut current = start;

    loop {
        let incident = adjacency.get(&current)?;
        let mut candidates: Vec<(IntersectionVertexId, IntersectionEdgeId)> = incident
            .iter()
            .copied()
            .filter(|(_, eid)| !used.contains(eid))
            .collect();
        candidates.sort_by_key(|(_, eid)| eid.0);
        let (next, eid) = *candidates.first()?;
        used.insert(eid);
        edges.push(eid);
        vertices.push(next);
        current = next;
        if current == start {
            break;
        }
        if edges.len() > edge_count {
            return None;
        }
    }

    if edges.len() == edge_count {
        Some((vertices, edges))
    } else {
        None
    }
}

fn build_adjacency(edges: &[(IntersectionVertexId, IntersectionVertexId, IntersectionEdgeId)]) -> Adjacency {
    let mut adjacency: Adjacency = AHashMap::new();
    for &(start, end, id) in edges {
        adjacency.entry(start).or_default().push((end, id));
        adjacency.entry(end).or_default().push((start, id));
    }
    adjacency
}

/// Classify every component of `topology` and extract a closed curve for
/// each one that qualifies. `synthetic_counter` starts at 0 and decreases
/// by one for every synthetic closure edge allocated across the whole
/// call, so their IDs stay unique within this regularization run.
pub fn regularize(
    graph: &IntersectionGraph,
    topology: &MeshTopology,
    tol: &Tolerances,
) -> (RegularizationResult, Diagnostics) {
    let positions: AHashMap<IntersectionVertexId, crate::types::RealPoint> =
        graph.vertices.iter().map(|v| (v.id, v.position)).collect();

    let mut diagnostics = Diagnostics::default();
    let mut result = RegularizationResult::default();
    let mut synthetic_counter: i64 = -1;

    for walk in &topology.components {
        let vertex_set: AHashSet<IntersectionVertexId> = walk.iter().copied().collect();
        let comp_edges: Vec<(IntersectionVertexId, IntersectionVertexId, IntersectionEdgeId)> = topology
            .edges
            .iter()
            .filter(|e| vertex_set.contains(&e.start) && vertex_set.contains(&e.end))
            .map(|e| (e.start, e.end, e.id))
            .collect();

        let mut degree: AHashMap<IntersectionVertexId, usize> = AHashMap::new();
        for &(start, end, _) in &comp_edges {
            *degree.entry(start).or_insert(0) += 1;
            *degree.entry(end).or_insert(0) += 1;
        }
        for &v in &vertex_set {
            degree.entry(v).or_insert(0);
        }

        let deg_1 = degree.values().filter(|&&d| d == 1).count();
        let deg_2 = degree.values().filter(|&&d| d == 2).count();
        let deg_ge_3 = degree.values().filter(|&&d| d >= 3).count();

        let lengths: Vec<f64> = comp_edges
            .iter()
            .map(|&(s, e, _)| (positions[&s] - positions[&e]).norm())
            .collect();
        let total_length: f64 = lengths.iter().sum();
        let median_length = median(lengths);

        let mut classification = classify(comp_edges.len(), deg_1, deg_ge_3, total_length, median_length);

        let mut curve = None;
        if classification == ComponentClass::StrongLoopCandidate {
            if deg_1 == 0 {
                let adjacency = build_adjacency(&comp_edges);
                let start = *vertex_set.iter().min_by_key(|v| v.0).unwrap();
                match eulerian_cycle(start, &adjacency, comp_edges.len()) {
                    Some((vertices, edges)) => {
                        let is_synthetic = vec![false; edges.len()];
                        curve = Some(IntersectionCurve {
                            vertices,
                            edges,
                            is_synthetic,
                            total_length,
                        });
                    }
                    None => {
                        diagnostics.unregularizable_components += 1;
                        classification = ComponentClass::Ambiguous;
                    }
                }
            } else if deg_1 == 2 {
                let endpoints: Vec<IntersectionVertexId> = degree
                    .iter()
                    .filter(|&(_, &d)| d == 1)
                    .map(|(&v, _)| v)
                    .collect();
                let (v0, v1) = (endpoints[0], endpoints[1]);
                let d = (positions[&v0] - positions[&v1]).norm();
                let threshold = (tol.closure_factor_median * median_length)
                    .max(tol.closure_factor_total * total_length);

                if d <= threshold {
                    let synthetic_id = IntersectionEdgeId(synthetic_counter);
                    synthetic_counter -= 1;
                    let mut augmented = comp_edges.clone();
                    augmented.push((v0, v1, synthetic_id));
                    let adjacency = build_adjacency(&augmented);
                    let start = v0;
                    match eulerian_cycle(start, &adjacency, augmented.len()) {
                        Some((vertices, edges)) => {
                            let is_synthetic: Vec<bool> =
                                edges.iter().map(|&e| e == synthetic_id).collect();
                            curve = Some(IntersectionCurve {
                                vertices,
                                edges,
                                is_synthetic,
                                total_length: total_length + d,
                            });
                        }
                        None => {
                            diagnostics.unregularizable_components += 1;
                            classification = ComponentClass::Ambiguous;
                        }
                    }
                } else {
                    classification = ComponentClass::Ambiguous;
                }
            } else {
                // deg_1 == 1: odd, by construction never closes.
                classification = ComponentClass::Ambiguous;
            }
        }

        result.stats.push(ComponentStats {
            vertex_count: vertex_set.len(),
            edge_count: comp_edges.len(),
            deg_1,
            deg_2,
            deg_ge_3,
            total_length,
            median_length,
            classification,
        });
        if let Some(c) = curve {
            result.curves.push(c);
        }
    }

    (result, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::geometry::graph::IntersectionGraph;
    use crate::geometry::triangle_index::{TriangleIntersectionIndex, TriangleIntersectionVertex};
    use crate::geometry::topology::build_mesh_topology;
    use crate::types::{Barycentric, MeshSide, RealPoint};

    fn whole_graph_index(graph: &IntersectionGraph) -> TriangleIntersectionIndex {
        let all: Vec<_> = graph
            .vertices
            .iter()
            .map(|v| TriangleIntersectionVertex {
                global_id: v.id,
                bary: Barycentric::new(1.0, 0.0, 0.0),
            })
            .collect();
        TriangleIntersectionIndex {
            triangles_a: vec![all],
            triangles_b: vec![Vec::new()],
        }
    }

    #[test]
    fn four_cycle_square_produces_one_closed_curve() {
        let positions = vec![
            RealPoint::new(0.0, 0.0, 0.0),
            RealPoint::new(1.0, 0.0, 0.0),
            RealPoint::new(1.0, 1.0, 0.0),
            RealPoint::new(0.0, 1.0, 0.0),
        ];
        let raw_edges = vec![(0, 1), (1, 2), (2, 3), (3, 0)];
        let graph = IntersectionGraph::from_raw(positions, raw_edges);
        let index = whole_graph_index(&graph);
        let topology = build_mesh_topology(&graph, &index, MeshSide::A);
        let tol = Tolerances::default();
        let (result, diagnostics) = regularize(&graph, &topology, &tol);

        assert_eq!(result.stats.len(), 1);
        assert_eq!(result.stats[0].classification, ComponentClass::StrongLoopCandidate);
        assert_eq!(result.curves.len(), 1);
        let curve = &result.curves[0];
        assert_eq!(curve.vertices.first(), curve.vertices.last());
        assert_eq!(curve.edges.len(), curve.vertices.len() - 1);
        assert!(curve.is_synthetic.iter().all(|&s| !s));
        assert_eq!(diagnostics.unregularizable_components, 0);
        assert_relative_eq!(curve.total_length, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn single_short_edge_is_tiny_noise() {
        let positions = vec![RealPoint::new(0.0, 0.0, 0.0), RealPoint::new(0.0, 1.0, 0.0)];
        let graph = IntersectionGraph::from_raw(positions, vec![(0, 1)]);
        let index = whole_graph_index(&graph);
        let topology = build_mesh_topology(&graph, &index, MeshSide::A);
        let tol = Tolerances::default();
        let (result, _) = regularize(&graph, &topology, &tol);

        assert_eq!(result.stats[0].classification, ComponentClass::TinyNoise);
        assert!(result.curves.is_empty());
    }

    #[test]
    fn small_gap_chain_bridges_with_synthetic_edge() {
        let positions = vec![
            RealPoint::new(0.0, 0.0, 0.0),
            RealPoint::new(1.0, 0.0, 0.0),
            RealPoint::new(1.0, 1.0, 0.0),
            RealPoint::new(0.0, 1.0, 0.0),
            RealPoint::new(0.05, 0.0, 0.0),
        ];
        let raw_edges = vec![(0, 1), (1, 2), (2, 3), (3, 4)];
        let graph = IntersectionGraph::from_raw(positions, raw_edges);
        let index = whole_graph_index(&graph);
        let topology = build_mesh_topology(&graph, &index, MeshSide::A);
        let tol = Tolerances::default();
        let (result, diagnostics) = regularize(&graph, &topology, &tol);

        assert_eq!(result.stats[0].classification, ComponentClass::StrongLoopCandidate);
        assert_eq!(result.curves.len(), 1);
        let curve = &result.curves[0];
        assert_eq!(curve.edges.len(), 5);
        assert_eq!(curve.is_synthetic.iter().filter(|&&s| s).count(), 1);
        assert_eq!(diagnostics.unregularizable_components, 0);
        assert_relative_eq!(curve.total_length, 4.051_249_22, epsilon = 1e-6);
    }

    #[test]
    fn loop_with_hanging_chain_is_ambiguous() {
        let positions = vec![
            RealPoint::new(0.0, 0.0, 0.0),
            RealPoint::new(1.0, 0.0, 0.0),
            RealPoint::new(1.0, 1.0, 0.0),
            RealPoint::new(0.0, 1.0, 0.0),
            RealPoint::new(-1.0, 0.0, 0.0),
        ];
        let raw_edges = vec![(0, 1), (1, 2), (2, 3), (3, 0), (0, 4)];
        let graph = IntersectionGraph::from_raw(positions, raw_edges);
        let index = whole_graph_index(&graph);
        let topology = build_mesh_topology(&graph, &index, MeshSide::A);
        let tol = Tolerances::default();
        let (result, _) = regularize(&graph, &topology, &tol);

        assert_eq!(result.stats.len(), 1);
        assert_eq!(result.stats[0].deg_ge_3, 1);
        assert_eq!(result.stats[0].classification, ComponentClass::Ambiguous);
        assert!(result.curves.is_empty());
    }

    #[test]
    fn close_gap_bridges_with_synthetic_edge() {
        // A 3-edge open chain whose endpoints are close enough to bridge.
        let positions = vec![
            RealPoint::new(0.0, 0.0, 0.0),
            RealPoint::new(1.0, 0.0, 0.0),
            RealPoint::new(1.0, 1.0, 0.0),
            RealPoint::new(0.0, 1.0, 0.0),
        ];
        let raw_edges = vec![(0, 1), (1, 2), (2, 3)];
        let graph = IntersectionGraph::from_raw(positions, raw_edges);
        let index = whole_graph_index(&graph);
        let topology = build_mesh_topology(&graph, &index, MeshSide::A);
        let tol = Tolerances::default();
        let (result, _) = regularize(&graph, &topology, &tol);

        // edge_count=3 <= 3 and total=3 > 2*median=2, so this is Ambiguous,
        // not TinyNoise nor StrongLoopCandidate (edge_count < 4).
        assert_eq!(result.stats[0].classification, ComponentClass::Ambiguous);
        assert!(result.curves.is_empty());
    }
}
