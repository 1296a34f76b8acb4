use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::cfg::{BlockId, ControlFlowGraph};
use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// Handle to a vertex in a [`DataFlowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowNodeId(pub u32);

impl FlowNodeId {
    /// Position of this vertex in the graph's node list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One expression (or parameter) wrapped as an addressable graph vertex.
#[derive(Debug, Clone)]
pub struct FlowNode {
    /// The wrapped syntax node.
    pub syntax: NodeId,
    /// Basic block the expression evaluates in.
    pub block: BlockId,
    /// Incoming flow edges.
    pub predecessors: SmallVec<[FlowNodeId; 2]>,
    /// Outgoing flow edges.
    pub successors: SmallVec<[FlowNodeId; 2]>,
}

/// Expression-granularity flow graph for one analyzed body.
///
/// Vertices appear in evaluation order (sub-expressions before their
/// enclosing expression); edges follow intra-block order, block-level
/// control edges at block boundaries, and explicit value transfers for
/// assignments and call arguments. Loop back edges make the graph cyclic;
/// vertices are flat-arena ids, so cycles cost nothing.
#[derive(Debug, Default, Clone)]
pub struct DataFlowGraph {
    nodes: Vec<FlowNode>,
    by_syntax: FxHashMap<NodeId, FlowNodeId>,
}

impl DataFlowGraph {
    /// Derives the flow graph from a CFG and its backing arena.
    #[must_use]
    pub fn from_cfg(tree: &SyntaxTree, cfg: &ControlFlowGraph) -> Self {
        let mut builder = FlowGraphBuilder {
            tree,
            graph: DataFlowGraph::default(),
            prev: None,
        };

        let mut firsts: Vec<Option<FlowNodeId>> = vec![None; cfg.blocks.len()];
        let mut lasts: Vec<Option<FlowNodeId>> = vec![None; cfg.blocks.len()];

        for block in &cfg.blocks {
            builder.prev = None;
            let start = builder.graph.nodes.len();
            for &stmt in &block.statements {
                builder.emit_stmt(stmt, block.id);
            }
            let end = builder.graph.nodes.len();
            if end > start {
                firsts[block.id.index()] = Some(FlowNodeId(u32::try_from(start).unwrap_or(0)));
                lasts[block.id.index()] = Some(FlowNodeId(u32::try_from(end - 1).unwrap_or(0)));
            }
        }

        // Stitch blocks together; blocks without expressions (join points)
        // are bridged transparently.
        for edge in &cfg.edges {
            let Some(from_last) = lasts[edge.from.index()] else {
                continue;
            };
            let mut seen = vec![false; cfg.blocks.len()];
            let mut targets = Vec::new();
            collect_entry_nodes(cfg, &firsts, edge.to, &mut seen, &mut targets);
            for target in targets {
                builder.graph.add_edge(from_last, target);
            }
        }

        builder.graph
    }

    /// The vertex behind `id`.
    #[must_use]
    pub fn node(&self, id: FlowNodeId) -> &FlowNode {
        &self.nodes[id.index()]
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all vertex ids in evaluation order.
    pub fn ids(&self) -> impl Iterator<Item = FlowNodeId> + '_ {
        (0..self.nodes.len()).map(|i| FlowNodeId(u32::try_from(i).unwrap_or(0)))
    }

    /// The vertex wrapping `syntax`, if that node flows.
    #[must_use]
    pub fn flow_node_of(&self, syntax: NodeId) -> Option<FlowNodeId> {
        self.by_syntax.get(&syntax).copied()
    }

    /// Outgoing edges of `id`, in creation order.
    #[must_use]
    pub fn successors(&self, id: FlowNodeId) -> &[FlowNodeId] {
        &self.nodes[id.index()].successors
    }

    /// Incoming edges of `id`, in creation order.
    #[must_use]
    pub fn predecessors(&self, id: FlowNodeId) -> &[FlowNodeId] {
        &self.nodes[id.index()].predecessors
    }

    fn add_edge(&mut self, from: FlowNodeId, to: FlowNodeId) {
        if from == to || self.nodes[from.index()].successors.contains(&to) {
            return;
        }
        self.nodes[from.index()].successors.push(to);
        self.nodes[to.index()].predecessors.push(from);
    }
}

fn collect_entry_nodes(
    cfg: &ControlFlowGraph,
    firsts: &[Option<FlowNodeId>],
    block: BlockId,
    seen: &mut [bool],
    out: &mut Vec<FlowNodeId>,
) {
    if seen[block.index()] {
        return;
    }
    seen[block.index()] = true;
    if let Some(first) = firsts[block.index()] {
        out.push(first);
        return;
    }
    for edge in cfg.successors(block) {
        collect_entry_nodes(cfg, firsts, edge.to, seen, out);
    }
}

struct FlowGraphBuilder<'t> {
    tree: &'t SyntaxTree,
    graph: DataFlowGraph,
    prev: Option<FlowNodeId>,
}

impl FlowGraphBuilder<'_> {
    fn push_node(&mut self, syntax: NodeId, block: BlockId) -> FlowNodeId {
        let id = FlowNodeId(u32::try_from(self.graph.nodes.len()).unwrap_or(0));
        self.graph.nodes.push(FlowNode {
            syntax,
            block,
            predecessors: SmallVec::new(),
            successors: SmallVec::new(),
        });
        self.graph.by_syntax.insert(syntax, id);
        if let Some(prev) = self.prev {
            self.graph.add_edge(prev, id);
        }
        self.prev = Some(id);
        id
    }

    /// Emits flow nodes for one block entry, which is either a statement,
    /// a parameter, or a bare expression placed by condition desugaring.
    fn emit_stmt(&mut self, stmt: NodeId, block: BlockId) {
        let tree = self.tree;
        let kind = tree.kind(stmt);
        if kind.is_expression() {
            self.emit_expr(stmt, block);
            return;
        }
        match kind {
            NodeKind::Parameter => {
                self.push_node(stmt, block);
            }
            NodeKind::Assign | NodeKind::AugAssign => {
                let children = tree.children(stmt);
                let Some((&value, targets)) = children.split_first() else {
                    return;
                };
                let value_id = self.emit_expr(value, block);
                for &target in targets {
                    let target_id = self.emit_expr(target, block);
                    // Value transfer independent of control order.
                    self.graph.add_edge(value_id, target_id);
                }
            }
            NodeKind::For => {
                // Children are [target, iter, blocks...]: the iterator is
                // evaluated before each binding of the target.
                let children = tree.children(stmt);
                let iter_id = self.emit_expr(children[1], block);
                let target_id = self.emit_expr(children[0], block);
                self.graph.add_edge(iter_id, target_id);
            }
            _ => {
                // Return, Throw, ExprStmt, With, Handler, ... walk their
                // expression children in order; nested blocks belong to
                // other basic blocks and are skipped here.
                let children: Vec<NodeId> = tree
                    .children(stmt)
                    .iter()
                    .copied()
                    .filter(|&c| tree.kind(c).is_expression())
                    .collect();
                for child in children {
                    self.emit_expr(child, block);
                }
            }
        }
    }

    /// Post-order emission: operands first, then the enclosing expression.
    fn emit_expr(&mut self, expr: NodeId, block: BlockId) -> FlowNodeId {
        let tree = self.tree;
        let children: Vec<NodeId> = tree
            .children(expr)
            .iter()
            .copied()
            .filter(|&c| tree.kind(c).is_expression())
            .collect();

        let mut child_ids = Vec::with_capacity(children.len());
        for child in children {
            child_ids.push(self.emit_expr(child, block));
        }

        let id = self.push_node(expr, block);

        // Callee and arguments transfer their values into the call site.
        if tree.kind(expr) == NodeKind::Call {
            for child_id in child_ids {
                self.graph.add_edge(child_id, id);
            }
        }
        id
    }
}
