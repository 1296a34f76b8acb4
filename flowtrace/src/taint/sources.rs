//! Builtin taint source tables, keyed by dotted names over the arena.

use crate::tree::{NodeId, NodeKind, SyntaxTree};

use super::types::TaintSource;

/// Source patterns handled by the builtin tables (for documentation and
/// `--list-patterns` style output).
pub const SOURCE_PATTERNS: &[&str] = &[
    "input",
    "os.getenv",
    "os.environ",
    "sys.argv",
    "sys.stdin.read",
    "request.args",
    "request.form",
    "request.data",
    "request.json",
    "request.cookies",
    "request.files",
    "request.GET",
    "request.POST",
    "request.body",
    "request.COOKIES",
];

/// Classifies a call by dotted callee name.
#[must_use]
pub fn classify_call_source(name: &str) -> Option<TaintSource> {
    match name {
        "input" => Some(TaintSource::Input),
        "os.getenv" => Some(TaintSource::Environment),
        "sys.stdin.read" | "sys.stdin.readline" => Some(TaintSource::Input),
        _ => None,
    }
}

/// Classifies an attribute chain (possibly under a subscript) by dotted name.
#[must_use]
pub fn classify_attribute_source(name: &str) -> Option<TaintSource> {
    if let Some(attr) = name.strip_prefix("request.") {
        return match attr {
            "args" | "form" | "data" | "json" | "cookies" | "files" | "values" | "headers" => {
                Some(TaintSource::FlaskRequest(attr.to_owned()))
            }
            "GET" | "POST" | "body" | "COOKIES" | "META" => {
                Some(TaintSource::DjangoRequest(attr.to_owned()))
            }
            _ => None,
        };
    }
    match name {
        "os.environ" => Some(TaintSource::Environment),
        "sys.argv" => Some(TaintSource::CommandLine),
        _ => None,
    }
}

/// Classifies any syntax node as a builtin source.
#[must_use]
pub fn check_source(tree: &SyntaxTree, node: NodeId) -> Option<TaintSource> {
    match tree.kind(node) {
        NodeKind::Call => classify_call_source(tree.call_name(node)?.as_str()),
        NodeKind::Attribute => classify_attribute_source(tree.dotted_name(node)?.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flask_and_django_attributes_are_distinguished() {
        assert!(matches!(
            classify_attribute_source("request.args"),
            Some(TaintSource::FlaskRequest(_))
        ));
        assert!(matches!(
            classify_attribute_source("request.GET"),
            Some(TaintSource::DjangoRequest(_))
        ));
        assert_eq!(classify_attribute_source("request.unknown"), None);
    }

    #[test]
    fn builtin_call_sources_match() {
        assert_eq!(classify_call_source("input"), Some(TaintSource::Input));
        assert_eq!(
            classify_call_source("os.getenv"),
            Some(TaintSource::Environment)
        );
        assert_eq!(classify_call_source("print"), None);
    }
}
