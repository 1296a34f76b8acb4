//! Plugin traits and registry for taint sources, sinks, and sanitizers.

use std::sync::Arc;

use crate::tree::{NodeId, NodeKind, SyntaxTree};

use super::sanitizers::is_sanitizer_name;
use super::sinks::{check_sink as check_builtin_sink, SinkInfo, SINK_PATTERNS};
use super::sources::{check_source as check_builtin_source, SOURCE_PATTERNS};
use super::types::{Severity, TaintSource, VulnType};

/// Trait for custom taint source plugins.
pub trait TaintSourcePlugin: Send + Sync {
    /// Returns the name of this source plugin.
    fn name(&self) -> &str;

    /// Checks if a syntax node is a taint source.
    fn check_source(&self, tree: &SyntaxTree, node: NodeId) -> Option<TaintSource>;

    /// Returns the source patterns this plugin handles (for documentation).
    fn patterns(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Trait for custom taint sink plugins.
pub trait TaintSinkPlugin: Send + Sync {
    /// Returns the name of this sink plugin.
    fn name(&self) -> &str;

    /// Checks if a call node is a dangerous sink.
    fn check_sink(&self, tree: &SyntaxTree, call: NodeId) -> Option<SinkInfo>;

    /// Returns the sink patterns this plugin handles.
    fn patterns(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Trait for custom sanitizer plugins.
pub trait SanitizerPlugin: Send + Sync {
    /// Returns the name of this sanitizer plugin.
    fn name(&self) -> &str;

    /// Checks if a call neutralizes tracked values.
    fn is_sanitizer(&self, tree: &SyntaxTree, call: NodeId) -> bool;
}

/// Registry for taint analysis plugins.
#[derive(Default)]
pub struct PluginRegistry {
    /// Registered source plugins.
    pub sources: Vec<Arc<dyn TaintSourcePlugin>>,
    /// Registered sink plugins.
    pub sinks: Vec<Arc<dyn TaintSinkPlugin>>,
    /// Registered sanitizer plugins.
    pub sanitizers: Vec<Arc<dyn SanitizerPlugin>>,
}

impl PluginRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source plugin.
    pub fn register_source<T: TaintSourcePlugin + 'static>(&mut self, plugin: T) {
        self.sources.push(Arc::new(plugin));
    }

    /// Registers a sink plugin.
    pub fn register_sink<T: TaintSinkPlugin + 'static>(&mut self, plugin: T) {
        self.sinks.push(Arc::new(plugin));
    }

    /// Registers a sanitizer plugin.
    pub fn register_sanitizer<T: SanitizerPlugin + 'static>(&mut self, plugin: T) {
        self.sanitizers.push(Arc::new(plugin));
    }

    /// Checks all source plugins for a match.
    #[must_use]
    pub fn check_sources(&self, tree: &SyntaxTree, node: NodeId) -> Option<TaintSource> {
        for plugin in &self.sources {
            if let Some(source) = plugin.check_source(tree, node) {
                return Some(source);
            }
        }
        None
    }

    /// Checks all sink plugins for a match.
    #[must_use]
    pub fn check_sinks(&self, tree: &SyntaxTree, call: NodeId) -> Option<SinkInfo> {
        for plugin in &self.sinks {
            if let Some(sink) = plugin.check_sink(tree, call) {
                return Some(sink);
            }
        }
        None
    }

    /// Checks if any sanitizer plugin matches.
    #[must_use]
    pub fn is_sanitizer(&self, tree: &SyntaxTree, call: NodeId) -> bool {
        self.sanitizers
            .iter()
            .any(|plugin| plugin.is_sanitizer(tree, call))
    }
}

/// Built-in source plugin (stdin, environment, argv, web frameworks).
pub struct BuiltinSourcePlugin;

impl TaintSourcePlugin for BuiltinSourcePlugin {
    fn name(&self) -> &'static str {
        "Builtin"
    }

    fn check_source(&self, tree: &SyntaxTree, node: NodeId) -> Option<TaintSource> {
        check_builtin_source(tree, node)
    }

    fn patterns(&self) -> Vec<String> {
        SOURCE_PATTERNS
            .iter()
            .map(|pattern| (*pattern).to_owned())
            .collect()
    }
}

/// Built-in sink plugin.
pub struct BuiltinSinkPlugin;

impl TaintSinkPlugin for BuiltinSinkPlugin {
    fn name(&self) -> &'static str {
        "Builtin"
    }

    fn check_sink(&self, tree: &SyntaxTree, call: NodeId) -> Option<SinkInfo> {
        check_builtin_sink(tree, call)
    }

    fn patterns(&self) -> Vec<String> {
        SINK_PATTERNS
            .iter()
            .map(|pattern| (*pattern).to_owned())
            .collect()
    }
}

/// Built-in sanitizer plugin.
pub struct BuiltinSanitizerPlugin;

impl SanitizerPlugin for BuiltinSanitizerPlugin {
    fn name(&self) -> &'static str {
        "Builtin"
    }

    fn is_sanitizer(&self, tree: &SyntaxTree, call: NodeId) -> bool {
        tree.call_name(call)
            .is_some_and(|name| is_sanitizer_name(name.as_str()))
    }
}

/// Plugin for dynamic patterns from configuration.
pub struct DynamicPatternPlugin {
    /// List of custom source patterns to match.
    pub sources: Vec<String>,
    /// List of custom sink patterns to match.
    pub sinks: Vec<String>,
}

impl TaintSourcePlugin for DynamicPatternPlugin {
    fn name(&self) -> &'static str {
        "DynamicConfig"
    }

    fn check_source(&self, tree: &SyntaxTree, node: NodeId) -> Option<TaintSource> {
        let name = match tree.kind(node) {
            NodeKind::Call => tree.call_name(node)?,
            _ => tree.dotted_name(node)?,
        };
        self.sources
            .iter()
            .find(|pattern| name == pattern.as_str())
            .map(|pattern| TaintSource::Custom(pattern.clone()))
    }

    fn patterns(&self) -> Vec<String> {
        self.sources.clone()
    }
}

impl TaintSinkPlugin for DynamicPatternPlugin {
    fn name(&self) -> &'static str {
        "DynamicConfig"
    }

    fn check_sink(&self, tree: &SyntaxTree, call: NodeId) -> Option<SinkInfo> {
        let name = tree.call_name(call)?;
        self.sinks
            .iter()
            .find(|pattern| name == pattern.as_str())
            .map(|pattern| SinkInfo {
                name: pattern.clone(),
                rule_id: "FT-CUSTOM-SINK".to_owned(),
                vuln_type: VulnType::CodeInjection,
                severity: Severity::High,
                dangerous_args: Vec::new(),
                dangerous_keywords: Vec::new(),
                remediation: "Review data flow to this custom sink.".to_owned(),
            })
    }

    fn patterns(&self) -> Vec<String> {
        self.sinks.clone()
    }
}
