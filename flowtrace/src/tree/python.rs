//! Lowering from the ruff Python AST into the syntax-node arena.
//!
//! One [`LoweredBody`] is produced per analyzed body: every function or
//! method definition found in a module (at any nesting depth), plus a
//! `<module>` pseudo-body holding the top-level statements. Nested
//! definitions appear in their enclosing body as opaque leaves; their own
//! bodies are lowered separately, which keeps every analysis strictly
//! intraprocedural.

use compact_str::CompactString;
use ruff_python_ast::{self as ast, Expr, Stmt};
use ruff_text_size::Ranged;

use super::{NodeId, NodeKind, SyntaxTree, TreeBuilder};

/// One analyzed body: its private arena and the root node.
#[derive(Debug)]
pub struct LoweredBody {
    /// Arena holding every node of this body.
    pub tree: SyntaxTree,
    /// Root node (`Function` for defs, `Block` for the module body).
    pub root: NodeId,
    /// Name used in diagnostics (`<module>` for the module body).
    pub name: CompactString,
}

/// Lowers a whole module: the `<module>` pseudo-body followed by every
/// function definition found in it, recursively.
#[must_use]
pub fn lower_module(stmts: &[Stmt]) -> Vec<LoweredBody> {
    let mut bodies = vec![lower_statements("<module>", stmts)];
    collect_functions(stmts, &mut bodies);
    bodies
}

/// Lowers a single function definition into its own arena.
#[must_use]
pub fn lower_function(func: &ast::StmtFunctionDef) -> LoweredBody {
    let mut lowerer = Lowerer::new();
    let mut children = Vec::new();

    for arg in &func.parameters.posonlyargs {
        children.push(lowerer.parameter(&arg.parameter));
    }
    for arg in &func.parameters.args {
        children.push(lowerer.parameter(&arg.parameter));
    }
    if let Some(arg) = &func.parameters.vararg {
        children.push(lowerer.parameter(arg));
    }
    for arg in &func.parameters.kwonlyargs {
        children.push(lowerer.parameter(&arg.parameter));
    }
    if let Some(arg) = &func.parameters.kwarg {
        children.push(lowerer.parameter(arg));
    }

    let body = lowerer.lower_block(&func.body);
    children.push(body);

    let root = lowerer
        .builder
        .text_node(NodeKind::Function, func.name.as_str(), &children);
    lowerer.builder.set_span(root, func.range());

    LoweredBody {
        tree: lowerer.builder.finish(),
        root,
        name: CompactString::from(func.name.as_str()),
    }
}

/// Lowers a flat statement sequence (the module top level) into a `Block`
/// root with no parameters.
#[must_use]
pub fn lower_statements(name: &str, stmts: &[Stmt]) -> LoweredBody {
    let mut lowerer = Lowerer::new();
    let root = lowerer.lower_block(stmts);
    LoweredBody {
        tree: lowerer.builder.finish(),
        root,
        name: CompactString::from(name),
    }
}

fn collect_functions(stmts: &[Stmt], bodies: &mut Vec<LoweredBody>) {
    for stmt in stmts {
        match stmt {
            Stmt::FunctionDef(func) => {
                bodies.push(lower_function(func));
                collect_functions(&func.body, bodies);
            }
            Stmt::ClassDef(class) => collect_functions(&class.body, bodies),
            Stmt::If(if_stmt) => {
                collect_functions(&if_stmt.body, bodies);
                for clause in &if_stmt.elif_else_clauses {
                    collect_functions(&clause.body, bodies);
                }
            }
            Stmt::For(for_stmt) => {
                collect_functions(&for_stmt.body, bodies);
                collect_functions(&for_stmt.orelse, bodies);
            }
            Stmt::While(while_stmt) => {
                collect_functions(&while_stmt.body, bodies);
                collect_functions(&while_stmt.orelse, bodies);
            }
            Stmt::With(with_stmt) => collect_functions(&with_stmt.body, bodies),
            Stmt::Try(try_stmt) => {
                collect_functions(&try_stmt.body, bodies);
                for handler in &try_stmt.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    collect_functions(&h.body, bodies);
                }
                collect_functions(&try_stmt.orelse, bodies);
                collect_functions(&try_stmt.finalbody, bodies);
            }
            _ => {}
        }
    }
}

struct Lowerer {
    builder: TreeBuilder,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            builder: TreeBuilder::new(),
        }
    }

    fn parameter(&mut self, param: &ast::Parameter) -> NodeId {
        let id = self
            .builder
            .text_leaf(NodeKind::Parameter, param.name.as_str());
        self.builder.set_span(id, param.range());
        id
    }

    fn lower_block(&mut self, stmts: &[Stmt]) -> NodeId {
        let children: Vec<NodeId> = stmts.iter().map(|s| self.lower_stmt(s)).collect();
        self.builder.node(NodeKind::Block, &children)
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> NodeId {
        let id = match stmt {
            Stmt::Expr(expr_stmt) => {
                let value = self.lower_expr(&expr_stmt.value);
                self.builder.node(NodeKind::ExprStmt, &[value])
            }
            Stmt::Assign(assign) => {
                let mut children = vec![self.lower_expr(&assign.value)];
                for target in &assign.targets {
                    children.push(self.lower_expr(target));
                }
                self.builder.node(NodeKind::Assign, &children)
            }
            Stmt::AnnAssign(assign) => match &assign.value {
                Some(value) => {
                    let value = self.lower_expr(value);
                    let target = self.lower_expr(&assign.target);
                    self.builder.node(NodeKind::Assign, &[value, target])
                }
                None => self.builder.leaf(NodeKind::Pass),
            },
            Stmt::AugAssign(assign) => {
                let value = self.lower_expr(&assign.value);
                let target = self.lower_expr(&assign.target);
                self.builder.node(NodeKind::AugAssign, &[value, target])
            }
            Stmt::Return(ret) => {
                let children: Vec<NodeId> =
                    ret.value.iter().map(|v| self.lower_expr(v)).collect();
                self.builder.node(NodeKind::Return, &children)
            }
            Stmt::Raise(raise) => {
                let mut children = Vec::new();
                if let Some(exc) = &raise.exc {
                    children.push(self.lower_expr(exc));
                }
                if let Some(cause) = &raise.cause {
                    children.push(self.lower_expr(cause));
                }
                self.builder.node(NodeKind::Throw, &children)
            }
            Stmt::Break(_) => self.builder.leaf(NodeKind::Break),
            Stmt::Continue(_) => self.builder.leaf(NodeKind::Continue),
            Stmt::Pass(_) => self.builder.leaf(NodeKind::Pass),
            Stmt::If(if_stmt) => self.lower_if(if_stmt),
            Stmt::While(while_stmt) => {
                let test = self.lower_expr(&while_stmt.test);
                let body = self.lower_block(&while_stmt.body);
                let mut children = vec![test, body];
                if !while_stmt.orelse.is_empty() {
                    let orelse = self.lower_block(&while_stmt.orelse);
                    children.push(self.builder.node(NodeKind::OrElse, &[orelse]));
                }
                self.builder.node(NodeKind::While, &children)
            }
            Stmt::For(for_stmt) => {
                let target = self.lower_expr(&for_stmt.target);
                let iter = self.lower_expr(&for_stmt.iter);
                let body = self.lower_block(&for_stmt.body);
                let mut children = vec![target, iter, body];
                if !for_stmt.orelse.is_empty() {
                    let orelse = self.lower_block(&for_stmt.orelse);
                    children.push(self.builder.node(NodeKind::OrElse, &[orelse]));
                }
                self.builder.node(NodeKind::For, &children)
            }
            Stmt::With(with_stmt) => {
                let mut children = Vec::new();
                for item in &with_stmt.items {
                    children.push(self.lower_expr(&item.context_expr));
                    if let Some(optional_vars) = &item.optional_vars {
                        children.push(self.lower_expr(optional_vars));
                    }
                }
                children.push(self.lower_block(&with_stmt.body));
                self.builder.node(NodeKind::With, &children)
            }
            Stmt::Try(try_stmt) => self.lower_try(try_stmt),
            Stmt::Match(match_stmt) => self.lower_match(match_stmt),
            Stmt::Assert(assert_stmt) => {
                let mut children = vec![self.lower_expr(&assert_stmt.test)];
                if let Some(msg) = &assert_stmt.msg {
                    children.push(self.lower_expr(msg));
                }
                self.builder.node(NodeKind::ExprStmt, &children)
            }
            Stmt::Delete(delete) => {
                let children: Vec<NodeId> =
                    delete.targets.iter().map(|t| self.lower_expr(t)).collect();
                self.builder.node(NodeKind::ExprStmt, &children)
            }
            Stmt::FunctionDef(func) => self
                .builder
                .text_leaf(NodeKind::Opaque, func.name.as_str()),
            Stmt::ClassDef(class) => self
                .builder
                .text_leaf(NodeKind::Opaque, class.name.as_str()),
            Stmt::IpyEscapeCommand(_) => self
                .builder
                .text_leaf(NodeKind::Unsupported, "ipython escape command"),
            // Imports, scope declarations, and type aliases carry no value flow.
            _ => self.builder.leaf(NodeKind::Pass),
        };
        self.builder.set_span(id, stmt.range());
        id
    }

    fn lower_if(&mut self, if_stmt: &ast::StmtIf) -> NodeId {
        let test = self.lower_expr(&if_stmt.test);
        let then_block = self.lower_block(&if_stmt.body);
        let mut children = vec![test, then_block];
        if let Some(else_block) = self.lower_elif_chain(&if_stmt.elif_else_clauses) {
            children.push(else_block);
        }
        self.builder.node(NodeKind::If, &children)
    }

    /// Folds ruff's flattened `elif`/`else` clause list back into nested
    /// if/else blocks, which is the only shape the CFG builder handles.
    fn lower_elif_chain(&mut self, clauses: &[ast::ElifElseClause]) -> Option<NodeId> {
        let (first, rest) = clauses.split_first()?;
        match &first.test {
            Some(test) => {
                let test = self.lower_expr(test);
                let then_block = self.lower_block(&first.body);
                let mut children = vec![test, then_block];
                if let Some(else_block) = self.lower_elif_chain(rest) {
                    children.push(else_block);
                }
                let nested = self.builder.node(NodeKind::If, &children);
                Some(self.builder.node(NodeKind::Block, &[nested]))
            }
            None => Some(self.lower_block(&first.body)),
        }
    }

    fn lower_try(&mut self, try_stmt: &ast::StmtTry) -> NodeId {
        let mut children = vec![self.lower_block(&try_stmt.body)];
        for handler in &try_stmt.handlers {
            let ast::ExceptHandler::ExceptHandler(h) = handler;
            let mut handler_children = Vec::new();
            if let Some(type_expr) = &h.type_ {
                handler_children.push(self.lower_expr(type_expr));
            }
            handler_children.push(self.lower_block(&h.body));
            let handler_id = match &h.name {
                Some(name) => {
                    self.builder
                        .text_node(NodeKind::Handler, name.as_str(), &handler_children)
                }
                None => self.builder.node(NodeKind::Handler, &handler_children),
            };
            self.builder.set_span(handler_id, h.range());
            children.push(handler_id);
        }
        if !try_stmt.orelse.is_empty() {
            let orelse = self.lower_block(&try_stmt.orelse);
            children.push(self.builder.node(NodeKind::OrElse, &[orelse]));
        }
        if !try_stmt.finalbody.is_empty() {
            let finalbody = self.lower_block(&try_stmt.finalbody);
            children.push(self.builder.node(NodeKind::Finally, &[finalbody]));
        }
        self.builder.node(NodeKind::Try, &children)
    }

    fn lower_match(&mut self, match_stmt: &ast::StmtMatch) -> NodeId {
        let mut children = vec![self.lower_expr(&match_stmt.subject)];
        for case in &match_stmt.cases {
            let mut case_children = Vec::new();
            if let Some(guard) = &case.guard {
                case_children.push(self.lower_expr(guard));
            }
            case_children.push(self.lower_block(&case.body));
            let case_id = self.builder.node(NodeKind::Case, &case_children);
            self.builder.set_span(case_id, case.range());
            children.push(case_id);
        }
        self.builder.node(NodeKind::Switch, &children)
    }

    #[allow(clippy::match_same_arms)]
    fn lower_expr(&mut self, expr: &Expr) -> NodeId {
        let id = match expr {
            Expr::Name(name) => self.builder.text_leaf(NodeKind::Name, name.id.as_str()),
            Expr::Attribute(attr) => {
                let value = self.lower_expr(&attr.value);
                self.builder
                    .text_node(NodeKind::Attribute, attr.attr.as_str(), &[value])
            }
            Expr::Subscript(sub) => {
                let value = self.lower_expr(&sub.value);
                let slice = self.lower_expr(&sub.slice);
                self.builder.node(NodeKind::Subscript, &[value, slice])
            }
            Expr::Call(call) => {
                let mut children = vec![self.lower_expr(&call.func)];
                for arg in &call.arguments.args {
                    children.push(self.lower_expr(arg));
                }
                for keyword in &call.arguments.keywords {
                    let value = self.lower_expr(&keyword.value);
                    let wrapped = match &keyword.arg {
                        Some(name) => {
                            self.builder
                                .text_node(NodeKind::Keyword, name.as_str(), &[value])
                        }
                        // `**kwargs` splat; no keyword name to record.
                        None => self.builder.node(NodeKind::Keyword, &[value]),
                    };
                    children.push(wrapped);
                }
                self.builder.node(NodeKind::Call, &children)
            }
            Expr::BoolOp(bool_op) => {
                let children: Vec<NodeId> =
                    bool_op.values.iter().map(|v| self.lower_expr(v)).collect();
                let kind = match bool_op.op {
                    ast::BoolOp::And => NodeKind::BoolAnd,
                    ast::BoolOp::Or => NodeKind::BoolOr,
                };
                self.builder.node(kind, &children)
            }
            Expr::UnaryOp(unary) => {
                let operand = self.lower_expr(&unary.operand);
                let kind = if unary.op == ast::UnaryOp::Not {
                    NodeKind::Not
                } else {
                    NodeKind::Opaque
                };
                self.builder.node(kind, &[operand])
            }
            Expr::BinOp(binop) => {
                let left = self.lower_expr(&binop.left);
                let right = self.lower_expr(&binop.right);
                self.builder.node(NodeKind::Binary, &[left, right])
            }
            Expr::Compare(compare) => {
                let mut children = vec![self.lower_expr(&compare.left)];
                for comparator in &compare.comparators {
                    children.push(self.lower_expr(comparator));
                }
                self.builder.node(NodeKind::Compare, &children)
            }
            Expr::If(if_exp) => {
                let test = self.lower_expr(&if_exp.test);
                let body = self.lower_expr(&if_exp.body);
                let orelse = self.lower_expr(&if_exp.orelse);
                self.builder
                    .node(NodeKind::Conditional, &[test, body, orelse])
            }
            Expr::Tuple(tuple) => self.collection(&tuple.elts),
            Expr::List(list) => self.collection(&list.elts),
            Expr::Set(set) => self.collection(&set.elts),
            Expr::Dict(dict) => {
                let mut children = Vec::new();
                for item in &dict.items {
                    if let Some(key) = &item.key {
                        children.push(self.lower_expr(key));
                    }
                    children.push(self.lower_expr(&item.value));
                }
                self.builder.node(NodeKind::Collection, &children)
            }
            Expr::FString(fstring) => {
                let mut children = Vec::new();
                for element in fstring.value.elements() {
                    if let ast::InterpolatedStringElement::Interpolation(interp) = element {
                        children.push(self.lower_expr(&interp.expression));
                    }
                }
                self.builder.node(NodeKind::Collection, &children)
            }
            Expr::ListComp(comp) => {
                let mut children: Vec<NodeId> = comp
                    .generators
                    .iter()
                    .map(|g| self.lower_expr(&g.iter))
                    .collect();
                children.push(self.lower_expr(&comp.elt));
                self.builder.node(NodeKind::Collection, &children)
            }
            Expr::SetComp(comp) => {
                let mut children: Vec<NodeId> = comp
                    .generators
                    .iter()
                    .map(|g| self.lower_expr(&g.iter))
                    .collect();
                children.push(self.lower_expr(&comp.elt));
                self.builder.node(NodeKind::Collection, &children)
            }
            Expr::DictComp(comp) => {
                let mut children: Vec<NodeId> = comp
                    .generators
                    .iter()
                    .map(|g| self.lower_expr(&g.iter))
                    .collect();
                if let Some(key) = &comp.key {
                    children.push(self.lower_expr(key));
                }
                children.push(self.lower_expr(&comp.value));
                self.builder.node(NodeKind::Collection, &children)
            }
            Expr::Generator(comp) => {
                let mut children: Vec<NodeId> = comp
                    .generators
                    .iter()
                    .map(|g| self.lower_expr(&g.iter))
                    .collect();
                children.push(self.lower_expr(&comp.elt));
                self.builder.node(NodeKind::Collection, &children)
            }
            Expr::Named(named) => {
                let value = self.lower_expr(&named.value);
                let target = self.lower_expr(&named.target);
                self.builder.node(NodeKind::Opaque, &[value, target])
            }
            Expr::Await(await_expr) => {
                let value = self.lower_expr(&await_expr.value);
                self.builder.node(NodeKind::Opaque, &[value])
            }
            Expr::Starred(starred) => {
                let value = self.lower_expr(&starred.value);
                self.builder.node(NodeKind::Opaque, &[value])
            }
            Expr::Yield(yield_expr) => {
                let children: Vec<NodeId> = yield_expr
                    .value
                    .iter()
                    .map(|v| self.lower_expr(v))
                    .collect();
                self.builder.node(NodeKind::Opaque, &children)
            }
            Expr::YieldFrom(yield_from) => {
                let value = self.lower_expr(&yield_from.value);
                self.builder.node(NodeKind::Opaque, &[value])
            }
            Expr::Slice(slice) => {
                let mut children = Vec::new();
                for bound in [&slice.lower, &slice.upper, &slice.step] {
                    if let Some(bound) = bound {
                        children.push(self.lower_expr(bound));
                    }
                }
                self.builder.node(NodeKind::Opaque, &children)
            }
            Expr::BooleanLiteral(lit) => {
                let text = if lit.value { "True" } else { "False" };
                self.builder.text_leaf(NodeKind::Literal, text)
            }
            Expr::StringLiteral(_)
            | Expr::BytesLiteral(_)
            | Expr::NumberLiteral(_)
            | Expr::NoneLiteral(_)
            | Expr::EllipsisLiteral(_) => self.builder.leaf(NodeKind::Literal),
            Expr::IpyEscapeCommand(_) => self
                .builder
                .text_leaf(NodeKind::Unsupported, "ipython escape command"),
            // Lambdas stay opaque; their bodies are separate scopes this
            // intraprocedural analysis does not enter.
            _ => self.builder.leaf(NodeKind::Opaque),
        };
        self.builder.set_span(id, expr.range());
        id
    }

    fn collection(&mut self, elts: &[Expr]) -> NodeId {
        let children: Vec<NodeId> = elts.iter().map(|e| self.lower_expr(e)).collect();
        self.builder.node(NodeKind::Collection, &children)
    }
}
