use smallvec::SmallVec;

use crate::error::FlowError;
use crate::tree::{NodeId, NodeKind};

use super::super::types::{BlockId, EdgeKind};
use super::CfgBuilder;

impl CfgBuilder<'_> {
    pub(in crate::cfg) fn visit_block(&mut self, block: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        for &stmt in tree.children(block) {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    pub(in crate::cfg) fn visit_stmt(&mut self, stmt: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        match tree.kind(stmt) {
            NodeKind::Unsupported => Err(self.unsupported(stmt)),
            NodeKind::Block => self.visit_block(stmt),
            NodeKind::If => self.visit_if(stmt),
            NodeKind::While => self.visit_while(stmt),
            NodeKind::For => self.visit_for(stmt),
            NodeKind::Try => self.visit_try(stmt),
            NodeKind::Switch => self.visit_switch(stmt),
            NodeKind::With => self.visit_with(stmt),
            NodeKind::ExprStmt => self.visit_expr_stmt(stmt),
            NodeKind::Return | NodeKind::Throw => {
                self.append(stmt)?;
                self.terminate();
                Ok(())
            }
            NodeKind::Break => {
                self.append(stmt)?;
                if let Some(exit) = self.loop_exit() {
                    let current = self.current_block();
                    self.add_edge(current, exit, EdgeKind::Normal);
                }
                self.terminate();
                Ok(())
            }
            NodeKind::Continue => {
                self.append(stmt)?;
                if let Some(header) = self.loop_header() {
                    let current = self.current_block();
                    self.add_edge(current, header, EdgeKind::LoopBack);
                }
                self.terminate();
                Ok(())
            }
            // Assignments, pass, opaque statements, and bare expressions
            // re-dispatched by condition desugaring all stay in-block.
            _ => self.append(stmt),
        }
    }

    /// Expression statements desugar top-level short-circuit operators and
    /// conditional expressions into real branch structure; everything else
    /// stays in the current block.
    fn visit_expr_stmt(&mut self, stmt: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        let value = match tree.children(stmt).first() {
            Some(&value) => value,
            None => return self.append(stmt),
        };
        match tree.kind(value) {
            NodeKind::BoolAnd | NodeKind::BoolOr | NodeKind::Not => {
                let join = self.new_block();
                self.lower_condition(value, join, join)?;
                self.set_current(join);
                Ok(())
            }
            NodeKind::Conditional => {
                let children = tree.children(value);
                let (test, then_expr, else_expr) = (children[0], children[1], children[2]);
                let then_block = self.new_block();
                let else_block = self.new_block();
                let join = self.new_block();
                self.lower_condition(test, then_block, else_block)?;

                self.set_current(then_block);
                self.append(then_expr)?;
                self.add_edge(then_block, join, EdgeKind::Normal);

                self.set_current(else_block);
                self.append(else_expr)?;
                self.add_edge(else_block, join, EdgeKind::Normal);

                self.set_current(join);
                Ok(())
            }
            _ => self.append(stmt),
        }
    }

    fn visit_if(&mut self, stmt: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        let children = tree.children(stmt);
        let test = children[0];
        let then_node = children[1];
        let else_node = children.get(2).copied();

        let then_block = self.new_block();
        let else_block = else_node.map(|_| self.new_block());
        let join = self.new_block();

        self.lower_condition(test, then_block, else_block.unwrap_or(join))?;

        self.set_current(then_block);
        self.visit_block(then_node)?;
        if let Some(tail) = self.cursor() {
            self.add_edge(tail, join, EdgeKind::Normal);
        }

        if let (Some(else_block), Some(else_node)) = (else_block, else_node) {
            self.set_current(else_block);
            self.visit_block(else_node)?;
            if let Some(tail) = self.cursor() {
                self.add_edge(tail, join, EdgeKind::Normal);
            }
        }

        self.set_current(join);
        Ok(())
    }

    fn visit_while(&mut self, stmt: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        let children = tree.children(stmt);
        let test = children[0];
        let body_node = children[1];
        let orelse_node = children.get(2).copied();

        let before = self.current_block();
        let header = self.new_block();
        self.add_edge(before, header, EdgeKind::Normal);
        self.set_current(header);

        let body_block = self.new_block();
        let exit_block = self.new_block();
        let orelse_block = orelse_node.map(|_| self.new_block());

        self.lower_condition(test, body_block, orelse_block.unwrap_or(exit_block))?;

        self.push_loop(header, exit_block);
        self.set_current(body_block);
        self.visit_block(body_node)?;
        if let Some(tail) = self.cursor() {
            self.add_edge(tail, header, EdgeKind::LoopBack);
        }
        self.pop_loop();

        if let (Some(orelse_block), Some(orelse_node)) = (orelse_block, orelse_node) {
            self.set_current(orelse_block);
            let inner = tree.children(orelse_node)[0];
            self.visit_block(inner)?;
            if let Some(tail) = self.cursor() {
                self.add_edge(tail, exit_block, EdgeKind::Normal);
            }
        }

        self.set_current(exit_block);
        Ok(())
    }

    fn visit_for(&mut self, stmt: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        let children = tree.children(stmt);
        let body_node = children[2];
        let orelse_node = children.get(3).copied();

        let before = self.current_block();
        let header = self.new_block();
        self.add_edge(before, header, EdgeKind::Normal);
        self.set_current(header);
        // The For node itself sits in the header: target and iterator are
        // (re-)evaluated each time control returns to it.
        self.append(stmt)?;

        let body_block = self.new_block();
        let exit_block = self.new_block();
        let orelse_block = orelse_node.map(|_| self.new_block());

        self.add_edge(header, body_block, EdgeKind::TrueBranch);
        self.add_edge(
            header,
            orelse_block.unwrap_or(exit_block),
            EdgeKind::FalseBranch,
        );

        self.push_loop(header, exit_block);
        self.set_current(body_block);
        self.visit_block(body_node)?;
        if let Some(tail) = self.cursor() {
            self.add_edge(tail, header, EdgeKind::LoopBack);
        }
        self.pop_loop();

        if let (Some(orelse_block), Some(orelse_node)) = (orelse_block, orelse_node) {
            self.set_current(orelse_block);
            let inner = tree.children(orelse_node)[0];
            self.visit_block(inner)?;
            if let Some(tail) = self.cursor() {
                self.add_edge(tail, exit_block, EdgeKind::Normal);
            }
        }

        self.set_current(exit_block);
        Ok(())
    }

    fn visit_with(&mut self, stmt: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        // Context expressions evaluate in the current block; the managed
        // body continues straight-line.
        self.append(stmt)?;
        let body = *tree
            .children(stmt)
            .iter()
            .rev()
            .find(|&&child| tree.kind(child) == NodeKind::Block)
            .unwrap_or(&stmt);
        if body == stmt {
            return Ok(());
        }
        self.visit_block(body)
    }

    fn visit_try(&mut self, stmt: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        let children = tree.children(stmt);
        let body_node = children[0];
        let handler_nodes: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|&c| tree.kind(c) == NodeKind::Handler)
            .collect();
        let orelse_node = children
            .iter()
            .copied()
            .find(|&c| tree.kind(c) == NodeKind::OrElse);
        let finally_node = children
            .iter()
            .copied()
            .find(|&c| tree.kind(c) == NodeKind::Finally);

        let before = self.current_block();
        let body_entry = self.new_block();
        self.add_edge(before, body_entry, EdgeKind::Normal);

        let handler_entries: SmallVec<[BlockId; 2]> =
            handler_nodes.iter().map(|_| self.new_block()).collect();
        let finally_entry = finally_node.map(|_| self.new_block());

        self.push_try(handler_entries.clone(), finally_entry);
        self.set_current(body_entry);
        self.visit_block(body_node)?;
        self.pop_try();

        // else clause runs only after the body completes without raising
        if let Some(orelse_node) = orelse_node {
            if self.cursor().is_some() {
                let inner = tree.children(orelse_node)[0];
                self.visit_block(inner)?;
            }
        }

        let mut normal_tails: Vec<BlockId> = Vec::new();
        if let Some(tail) = self.cursor() {
            normal_tails.push(tail);
        }

        for (&handler_node, &entry) in handler_nodes.iter().zip(handler_entries.iter()) {
            self.set_current(entry);
            // The handler node carries the exception-type expression.
            self.append(handler_node)?;
            let handler_body = *tree
                .children(handler_node)
                .last()
                .unwrap_or(&handler_node);
            if handler_body != handler_node {
                self.visit_block(handler_body)?;
            }
            if let Some(tail) = self.cursor() {
                normal_tails.push(tail);
            }
        }

        if let (Some(finally_entry), Some(finally_node)) = (finally_entry, finally_node) {
            for tail in normal_tails {
                self.add_edge(tail, finally_entry, EdgeKind::Normal);
            }
            self.set_current(finally_entry);
            let inner = tree.children(finally_node)[0];
            self.visit_block(inner)?;
        } else {
            let join = self.new_block();
            for tail in normal_tails {
                self.add_edge(tail, join, EdgeKind::Normal);
            }
            self.set_current(join);
        }
        Ok(())
    }

    fn visit_switch(&mut self, stmt: NodeId) -> Result<(), FlowError> {
        let tree = self.tree();
        let children = tree.children(stmt);
        let subject = children[0];
        let cases: Vec<NodeId> = children[1..].to_vec();

        self.append(subject)?;
        let mut dispatch = self.current_block();
        let join = self.new_block();

        for (index, &case) in cases.iter().enumerate() {
            let case_children = tree.children(case);
            let body_node = *case_children.last().unwrap_or(&case);
            let guard = if case_children.len() > 1 {
                Some(case_children[0])
            } else {
                None
            };

            if let Some(guard) = guard {
                self.set_current(dispatch);
                self.append(guard)?;
            }

            let body_block = self.new_block();
            self.add_edge(dispatch, body_block, EdgeKind::TrueBranch);
            let next = if index + 1 < cases.len() {
                self.new_block()
            } else {
                join
            };
            self.add_edge(dispatch, next, EdgeKind::FalseBranch);

            self.set_current(body_block);
            self.visit_block(body_node)?;
            if let Some(tail) = self.cursor() {
                self.add_edge(tail, join, EdgeKind::Normal);
            }

            dispatch = next;
        }

        self.set_current(join);
        Ok(())
    }

    /// Recursively lowers a condition expression, splitting short-circuit
    /// operators into blocks so that a right operand is only reachable
    /// along the edge where the left operand's truth value permits its
    /// evaluation.
    fn lower_condition(
        &mut self,
        cond: NodeId,
        true_target: BlockId,
        false_target: BlockId,
    ) -> Result<(), FlowError> {
        let tree = self.tree();
        match tree.kind(cond) {
            NodeKind::BoolAnd => {
                let operands = tree.children(cond).to_vec();
                for (index, operand) in operands.iter().enumerate() {
                    if index + 1 < operands.len() {
                        let next = self.new_block();
                        self.lower_condition(*operand, next, false_target)?;
                        self.set_current(next);
                    } else {
                        self.lower_condition(*operand, true_target, false_target)?;
                    }
                }
                Ok(())
            }
            NodeKind::BoolOr => {
                let operands = tree.children(cond).to_vec();
                for (index, operand) in operands.iter().enumerate() {
                    if index + 1 < operands.len() {
                        let next = self.new_block();
                        self.lower_condition(*operand, true_target, next)?;
                        self.set_current(next);
                    } else {
                        self.lower_condition(*operand, true_target, false_target)?;
                    }
                }
                Ok(())
            }
            NodeKind::Not => {
                let operand = tree.children(cond)[0];
                self.lower_condition(operand, false_target, true_target)
            }
            _ => {
                self.append(cond)?;
                let block = self.current_block();
                self.add_edge(block, true_target, EdgeKind::TrueBranch);
                self.add_edge(block, false_target, EdgeKind::FalseBranch);
                Ok(())
            }
        }
    }
}
