use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::tree::SyntaxTree;

use super::nodes::{DataFlowGraph, FlowNodeId};
use super::spec::{FlowNodeRef, FlowSpec};

/// Cap on enumerated witness paths per source; reachability itself is
/// computed exactly, the cap only bounds how many concrete traces are
/// materialized for reporting.
pub const DEFAULT_MAX_PATHS_PER_SOURCE: usize = 128;

/// All sink-reaching flows discovered from one source vertex.
#[derive(Debug, Clone)]
pub struct SourceFlows {
    /// The source vertex every path starts at.
    pub source: FlowNodeId,
    /// Witness paths; each starts at `source` and ends at a sink. A path of
    /// length one means the source itself satisfied the sink predicate.
    pub paths: Vec<Vec<FlowNodeId>>,
    /// Whether path enumeration stopped at the per-source cap.
    pub truncated: bool,
}

impl SourceFlows {
    /// The sink vertex of every reported path.
    #[must_use]
    pub fn sinks(&self) -> Vec<FlowNodeId> {
        self.paths.iter().filter_map(|p| p.last().copied()).collect()
    }

    /// Whether no path survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Result of one [`find_flows`] query.
#[derive(Debug, Clone, Default)]
pub struct FlowReport {
    /// Per-source flows, in vertex order; sources with no surviving path
    /// are omitted.
    pub flows: Vec<SourceFlows>,
}

impl FlowReport {
    /// Whether no source reached a sink.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Every vertex participating in some reported path, for rendering
    /// diagnostic traces.
    #[must_use]
    pub fn participants(&self) -> FxHashSet<FlowNodeId> {
        self.flows
            .iter()
            .flat_map(|f| f.paths.iter())
            .flatten()
            .copied()
            .collect()
    }
}

/// Per-query visitation state. Owned by exactly one search invocation and
/// discarded with it; concurrent searches each allocate their own.
struct VisitedSet {
    /// A sink is reachable downstream without crossing a sanitizer/barrier.
    reaches_sink: Vec<bool>,
    /// Satisfies the sink predicate and is not suppressed by a sanitizer
    /// or barrier on the same node.
    admissible_sink: Vec<bool>,
    /// On the current enumeration path (cycle guard).
    on_path: Vec<bool>,
}

impl VisitedSet {
    fn new(len: usize) -> Self {
        Self {
            reaches_sink: vec![false; len],
            admissible_sink: vec![false; len],
            on_path: vec![false; len],
        }
    }
}

/// Runs the full source→sink query: for every vertex satisfying
/// `is_source`, reports the witness paths along which a sink is reachable.
///
/// A path is pruned at any node satisfying `is_sanitizer` or `is_barrier`;
/// a node matching both sink and sanitizer is blocked (sanitization is
/// observed before the sink). Cycles terminate because the reachability
/// marking visits each edge at most once and enumeration refuses to revisit
/// a node already on the current path.
///
/// Deterministic: vertices and edges are iterated in creation order, so
/// repeated invocations return identical reports.
#[must_use]
pub fn find_flows<S: FlowSpec + ?Sized>(
    tree: &SyntaxTree,
    graph: &DataFlowGraph,
    spec: &S,
) -> FlowReport {
    let mut visited = mark_reaching(tree, graph, spec);

    let mut flows = Vec::new();
    for id in graph.ids() {
        if !visited.reaches_sink[id.index()] {
            continue;
        }
        if !spec.is_source(FlowNodeRef::new(tree, graph, id)) {
            continue;
        }
        let source_flows = enumerate_paths(graph, &mut visited, id);
        if !source_flows.is_empty() {
            flows.push(source_flows);
        }
    }
    FlowReport { flows }
}

/// Per-source variant: the flows starting at `source`, or `None` when the
/// vertex is not a source or no path survives.
#[must_use]
pub fn find_flows_from<S: FlowSpec + ?Sized>(
    tree: &SyntaxTree,
    graph: &DataFlowGraph,
    source: FlowNodeId,
    spec: &S,
) -> Option<SourceFlows> {
    if !spec.is_source(FlowNodeRef::new(tree, graph, source)) {
        return None;
    }
    let mut visited = mark_reaching(tree, graph, spec);
    if !visited.reaches_sink[source.index()] {
        return None;
    }
    let flows = enumerate_paths(graph, &mut visited, source);
    if flows.is_empty() {
        None
    } else {
        Some(flows)
    }
}

/// Whether any source reaches any sink under `spec`.
#[must_use]
pub fn any_match<S: FlowSpec + ?Sized>(
    tree: &SyntaxTree,
    graph: &DataFlowGraph,
    spec: &S,
) -> bool {
    !find_flows(tree, graph, spec).is_empty()
}

/// Whether no source reaches any sink under `spec`.
#[must_use]
pub fn none_match<S: FlowSpec + ?Sized>(
    tree: &SyntaxTree,
    graph: &DataFlowGraph,
    spec: &S,
) -> bool {
    !any_match(tree, graph, spec)
}

/// Reverse breadth-first marking from every admissible sink. Never expands
/// through a sanitizer or barrier vertex, so `reaches_sink` holds exactly
/// for vertices with an unblocked downstream sink. Linear in nodes + edges.
fn mark_reaching<S: FlowSpec + ?Sized>(
    tree: &SyntaxTree,
    graph: &DataFlowGraph,
    spec: &S,
) -> VisitedSet {
    let mut visited = VisitedSet::new(graph.len());
    let mut queue = VecDeque::new();

    for id in graph.ids() {
        let node = FlowNodeRef::new(tree, graph, id);
        if spec.is_sink(node) && !spec.is_sanitizer(node) && !spec.is_barrier(node) {
            visited.admissible_sink[id.index()] = true;
            visited.reaches_sink[id.index()] = true;
            queue.push_back(id);
        }
    }

    while let Some(id) = queue.pop_front() {
        for &pred in graph.predecessors(id) {
            if visited.reaches_sink[pred.index()] {
                continue;
            }
            let node = FlowNodeRef::new(tree, graph, pred);
            if spec.is_sanitizer(node) || spec.is_barrier(node) {
                continue;
            }
            visited.reaches_sink[pred.index()] = true;
            queue.push_back(pred);
        }
    }

    visited
}

/// Depth-first witness enumeration restricted to marked vertices.
fn enumerate_paths(
    graph: &DataFlowGraph,
    visited: &mut VisitedSet,
    source: FlowNodeId,
) -> SourceFlows {
    let mut flows = SourceFlows {
        source,
        paths: Vec::new(),
        truncated: false,
    };
    let mut path = vec![source];
    visited.on_path[source.index()] = true;
    walk(graph, visited, &mut path, &mut flows);
    visited.on_path[source.index()] = false;
    flows
}

fn walk(
    graph: &DataFlowGraph,
    visited: &mut VisitedSet,
    path: &mut Vec<FlowNodeId>,
    flows: &mut SourceFlows,
) {
    let Some(&current) = path.last() else {
        return;
    };
    if visited.admissible_sink[current.index()] {
        if flows.paths.len() >= DEFAULT_MAX_PATHS_PER_SOURCE {
            flows.truncated = true;
            return;
        }
        flows.paths.push(path.clone());
    }
    for &next in graph.successors(current) {
        if !visited.reaches_sink[next.index()] || visited.on_path[next.index()] {
            continue;
        }
        path.push(next);
        visited.on_path[next.index()] = true;
        walk(graph, visited, path, flows);
        visited.on_path[next.index()] = false;
        path.pop();
    }
}
