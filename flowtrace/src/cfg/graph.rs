use crate::error::FlowError;
use crate::tree::{NodeId, NodeKind, SyntaxTree};

use super::builder::CfgBuilder;
use super::types::{BlockId, ControlFlowGraph, Edge, EdgeKind};

impl ControlFlowGraph {
    /// Constructs a CFG from a lowered body root (a `Function` node, a
    /// `Block`, or a single statement).
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::UnsupportedConstruct`] when the body contains a
    /// node the builder cannot classify into block/edge structure. Callers
    /// are expected to skip such bodies.
    pub fn build(tree: &SyntaxTree, body: NodeId) -> Result<Self, FlowError> {
        let mut builder = CfgBuilder::new(tree);
        match tree.kind(body) {
            NodeKind::Function => {
                for &child in tree.children(body) {
                    match tree.kind(child) {
                        NodeKind::Parameter => builder.append(child)?,
                        NodeKind::Block => builder.visit_block(child)?,
                        _ => return Err(builder.unsupported(child)),
                    }
                }
            }
            NodeKind::Block => builder.visit_block(body)?,
            _ => builder.visit_stmt(body)?,
        }
        Ok(builder.finish())
    }

    /// Outgoing edges of `block`, in creation order.
    pub fn successors(&self, block: BlockId) -> impl Iterator<Item = &Edge> + '_ {
        self.blocks[block.index()]
            .successors
            .iter()
            .map(move |&eid| &self.edges[eid.index()])
    }

    /// Incoming edges of `block`, in creation order.
    pub fn predecessors(&self, block: BlockId) -> impl Iterator<Item = &Edge> + '_ {
        self.blocks[block.index()]
            .predecessors
            .iter()
            .map(move |&eid| &self.edges[eid.index()])
    }

    /// Marks every block reachable from the entry, following all edge kinds.
    #[must_use]
    pub fn reachable_blocks(&self) -> Vec<bool> {
        let mut reachable = vec![false; self.blocks.len()];
        let mut stack = vec![self.entry];

        while let Some(block) = stack.pop() {
            if reachable[block.index()] {
                continue;
            }
            reachable[block.index()] = true;
            for edge in self.successors(block) {
                stack.push(edge.to);
            }
        }

        reachable
    }

    /// Identifies all basic blocks that are not reachable from the entry:
    /// dead code after unconditional jumps.
    #[must_use]
    pub fn unreachable_blocks(&self) -> Vec<BlockId> {
        let reachable = self.reachable_blocks();
        self.blocks
            .iter()
            .filter(|block| !reachable[block.id.index()])
            .map(|block| block.id)
            .collect()
    }

    /// Checks the structural invariants of a built graph.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::MalformedGraph`] when an invariant does not
    /// hold. Any such error indicates a builder bug, not a property of the
    /// analyzed source; tests fail fast on it.
    pub fn validate(&self) -> Result<(), FlowError> {
        for (index, block) in self.blocks.iter().enumerate() {
            if block.id.index() != index {
                return Err(FlowError::MalformedGraph(format!(
                    "block {index} carries id {:?}",
                    block.id
                )));
            }
        }

        for (index, edge) in self.edges.iter().enumerate() {
            if edge.from.index() >= self.blocks.len() || edge.to.index() >= self.blocks.len() {
                return Err(FlowError::MalformedGraph(format!(
                    "edge {index} references a block outside the graph"
                )));
            }
        }

        for (index, block) in self.blocks.iter().enumerate() {
            for &eid in &block.successors {
                let Some(edge) = self.edges.get(eid.index()) else {
                    return Err(FlowError::MalformedGraph(format!(
                        "block {index} lists a dangling successor edge"
                    )));
                };
                if edge.from.index() != index {
                    return Err(FlowError::MalformedGraph(format!(
                        "block {index} lists an edge it does not originate"
                    )));
                }
            }
            for &eid in &block.predecessors {
                let Some(edge) = self.edges.get(eid.index()) else {
                    return Err(FlowError::MalformedGraph(format!(
                        "block {index} lists a dangling predecessor edge"
                    )));
                };
                if edge.to.index() != index {
                    return Err(FlowError::MalformedGraph(format!(
                        "block {index} lists an edge that does not target it"
                    )));
                }
            }
        }

        if !self.blocks[self.entry.index()].predecessors.is_empty() {
            return Err(FlowError::MalformedGraph(
                "entry block has incoming edges".to_owned(),
            ));
        }

        for &exit in &self.exits {
            let escaping = self
                .successors(exit)
                .any(|edge| edge.kind != EdgeKind::Exceptional);
            if escaping {
                return Err(FlowError::MalformedGraph(format!(
                    "exit block {:?} has outgoing normal edges",
                    exit
                )));
            }
        }

        Ok(())
    }
}
