//! The taint recipe: runs the flow engine over every body of a module with
//! a specification assembled from the plugin registry, and renders the
//! surviving paths as findings.

use std::path::Path;
use std::sync::Arc;

use crate::cfg::ControlFlowGraph;
use crate::flow::{find_flows, DataFlowGraph, FlowNodeRef, FlowSpec};
use crate::tree::python::{lower_module, LoweredBody};
use crate::tree::{NodeId, NodeKind, SyntaxTree};
use crate::utils::{get_ignored_lines, LineIndex};

use super::config::TaintConfig;
use super::plugins::{
    BuiltinSanitizerPlugin, BuiltinSinkPlugin, BuiltinSourcePlugin, DynamicPatternPlugin,
    PluginRegistry, SanitizerPlugin, TaintSinkPlugin, TaintSourcePlugin,
};
use super::sinks::SinkInfo;
use super::types::{TaintFinding, TaintSource};

/// Configurable taint analyzer with a plugin registry.
pub struct TaintRecipe {
    /// Plugin registry.
    pub plugins: PluginRegistry,
    /// Configuration.
    pub config: TaintConfig,
}

impl TaintRecipe {
    /// Creates a recipe with the builtin plugins plus any custom patterns
    /// from the configuration.
    #[must_use]
    pub fn new(config: TaintConfig) -> Self {
        let mut plugins = PluginRegistry::new();
        plugins.register_source(BuiltinSourcePlugin);
        plugins.register_sink(BuiltinSinkPlugin);
        plugins.register_sanitizer(BuiltinSanitizerPlugin);

        let custom_sources: Vec<String> = config
            .custom_sources
            .iter()
            .map(|source| source.pattern.clone())
            .collect();
        let custom_sinks: Vec<String> = config
            .custom_sinks
            .iter()
            .map(|sink| sink.pattern.clone())
            .collect();

        if !custom_sources.is_empty() || !custom_sinks.is_empty() {
            let dynamic = Arc::new(DynamicPatternPlugin {
                sources: custom_sources,
                sinks: custom_sinks,
            });
            plugins
                .sources
                .push(Arc::clone(&dynamic) as Arc<dyn TaintSourcePlugin>);
            plugins.sinks.push(dynamic as Arc<dyn TaintSinkPlugin>);
        }

        Self { plugins, config }
    }

    /// Creates a recipe with no builtin plugins (for custom setups).
    #[must_use]
    pub fn empty(config: TaintConfig) -> Self {
        Self {
            plugins: PluginRegistry::new(),
            config,
        }
    }

    /// Registers a custom source plugin.
    pub fn add_source<T: TaintSourcePlugin + 'static>(&mut self, plugin: T) {
        self.plugins.register_source(plugin);
    }

    /// Registers a custom sink plugin.
    pub fn add_sink<T: TaintSinkPlugin + 'static>(&mut self, plugin: T) {
        self.plugins.register_sink(plugin);
    }

    /// Registers a custom sanitizer plugin.
    pub fn add_sanitizer<T: SanitizerPlugin + 'static>(&mut self, plugin: T) {
        self.plugins.register_sanitizer(plugin);
    }

    /// Analyzes one file's source text. Parse failures and bodies with
    /// unsupported constructs are skipped, not reported.
    #[must_use]
    pub fn analyze_source(&self, source: &str, file_path: &Path) -> Vec<TaintFinding> {
        let Ok(parsed) = ruff_python_parser::parse_module(source) else {
            return Vec::new();
        };
        let line_index = LineIndex::new(source);
        let ignored = get_ignored_lines(source);
        let bodies = lower_module(&parsed.into_syntax().body);

        let mut findings = Vec::new();
        for body in &bodies {
            self.analyze_body(body, &line_index, file_path, &mut findings);
        }

        findings.retain(|finding| !ignored.contains(&finding.sink_line));
        findings.sort_by(|a, b| {
            a.sink_line
                .cmp(&b.sink_line)
                .then(a.source_line.cmp(&b.source_line))
        });
        findings.dedup_by(|a, b| {
            a.source_line == b.source_line && a.sink_line == b.sink_line && a.rule_id == b.rule_id
        });
        findings
    }

    fn analyze_body(
        &self,
        body: &LoweredBody,
        line_index: &LineIndex,
        file_path: &Path,
        findings: &mut Vec<TaintFinding>,
    ) {
        // A body the builder cannot classify is skipped; the rest of the
        // module still gets analyzed.
        let Ok(cfg) = ControlFlowGraph::build(&body.tree, body.root) else {
            return;
        };
        let graph = DataFlowGraph::from_cfg(&body.tree, &cfg);
        let spec = RecipeSpec {
            registry: &self.plugins,
            taint_parameters: self.config.taint_parameters,
        };
        let report = find_flows(&body.tree, &graph, &spec);

        for flows in &report.flows {
            let source_syntax = graph.node(flows.source).syntax;
            let Some(source) = self.describe_source(&body.tree, source_syntax) else {
                continue;
            };
            let source_line = line_index.line_index(body.tree.span(source_syntax).start());

            for path in &flows.paths {
                let Some(&sink_id) = path.last() else {
                    continue;
                };
                let sink_syntax = graph.node(sink_id).syntax;
                let Some((call, info)) = self.sink_for(&body.tree, sink_syntax) else {
                    continue;
                };
                let sink_line = line_index.line_index(body.tree.span(call).start());
                let mut flow_path: Vec<usize> = path
                    .iter()
                    .map(|&id| line_index.line_index(body.tree.span(graph.node(id).syntax).start()))
                    .collect();
                flow_path.dedup();

                findings.push(TaintFinding {
                    source: source.to_string(),
                    source_line,
                    sink: info.name.clone(),
                    rule_id: info.rule_id.clone(),
                    sink_line,
                    vuln_type: info.vuln_type.clone(),
                    severity: info.severity,
                    file: file_path.to_path_buf(),
                    remediation: info.remediation.clone(),
                    flow_path,
                });
            }
        }
    }

    fn describe_source(&self, tree: &SyntaxTree, syntax: NodeId) -> Option<TaintSource> {
        if tree.kind(syntax) == NodeKind::Parameter {
            return Some(TaintSource::FunctionParam(tree.text(syntax)?.to_owned()));
        }
        self.plugins.check_sources(tree, syntax)
    }

    /// Resolves the enclosing sink call of a reported sink vertex.
    fn sink_for(&self, tree: &SyntaxTree, sink_syntax: NodeId) -> Option<(NodeId, SinkInfo)> {
        let call = match tree.parent(sink_syntax) {
            Some(parent) if tree.kind(parent) == NodeKind::Call => parent,
            _ if tree.kind(sink_syntax) == NodeKind::Call => sink_syntax,
            _ => return None,
        };
        let info = self.plugins.check_sinks(tree, call)?;
        Some((call, info))
    }
}

impl Default for TaintRecipe {
    fn default() -> Self {
        Self::new(TaintConfig::default())
    }
}

/// Flow specification assembled from the plugin registry.
struct RecipeSpec<'a> {
    registry: &'a PluginRegistry,
    taint_parameters: bool,
}

impl FlowSpec for RecipeSpec<'_> {
    fn is_source(&self, node: FlowNodeRef<'_>) -> bool {
        if node.kind() == NodeKind::Parameter {
            return self.taint_parameters;
        }
        self.registry
            .check_sources(node.tree(), node.syntax())
            .is_some()
    }

    fn is_sink(&self, node: FlowNodeRef<'_>) -> bool {
        let tree = node.tree();
        let syntax = node.syntax();
        let Some(parent) = node.parent() else {
            return false;
        };
        if tree.kind(parent) != NodeKind::Call {
            return false;
        }
        let children = tree.children(parent);
        if children.first() == Some(&syntax) {
            // The callee itself is not where the value arrives.
            return false;
        }
        let Some(info) = self.registry.check_sinks(tree, parent) else {
            return false;
        };

        if tree.kind(syntax) == NodeKind::Keyword {
            return node
                .text()
                .is_some_and(|keyword| info.dangerous_keywords.iter().any(|k| k == keyword));
        }
        let position = children[1..]
            .iter()
            .filter(|&&child| tree.kind(child) != NodeKind::Keyword)
            .position(|&child| child == syntax);
        match position {
            Some(position) => {
                info.dangerous_args.is_empty() || info.dangerous_args.contains(&position)
            }
            None => false,
        }
    }

    fn is_sanitizer(&self, node: FlowNodeRef<'_>) -> bool {
        node.kind() == NodeKind::Call && self.registry.is_sanitizer(node.tree(), node.syntax())
    }

    fn is_barrier(&self, node: FlowNodeRef<'_>) -> bool {
        let tree = node.tree();
        if node.kind() != NodeKind::Name {
            return false;
        }
        let Some(parent) = node.parent() else {
            return false;
        };
        if tree.kind(parent) != NodeKind::Assign {
            return false;
        }
        let children = tree.children(parent);
        let Some((&value, targets)) = children.split_first() else {
            return false;
        };
        targets.contains(&node.syntax()) && is_literal_only(tree, value)
    }
}

/// Whether an expression builds exclusively from literals, i.e. an
/// overwrite from it severs any tracked value reaching the target.
fn is_literal_only(tree: &SyntaxTree, node: NodeId) -> bool {
    match tree.kind(node) {
        NodeKind::Literal => true,
        NodeKind::Collection | NodeKind::Binary | NodeKind::Compare => tree
            .children(node)
            .iter()
            .all(|&child| is_literal_only(tree, child)),
        _ => false,
    }
}
