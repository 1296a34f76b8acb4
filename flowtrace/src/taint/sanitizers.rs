//! Builtin sanitizer tables.

/// Calls that neutralize a tracked value for the sink classes the builtin
/// tables report.
pub const SANITIZER_PATTERNS: &[&str] = &[
    "html.escape",
    "markupsafe.escape",
    "bleach.clean",
    "shlex.quote",
    "urllib.parse.quote",
    "urllib.parse.quote_plus",
    "re.escape",
    "int",
    "float",
];

/// Whether a dotted callee name is a known sanitizer.
#[must_use]
pub fn is_sanitizer_name(name: &str) -> bool {
    SANITIZER_PATTERNS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_and_casting_are_sanitizers() {
        assert!(is_sanitizer_name("shlex.quote"));
        assert!(is_sanitizer_name("int"));
        assert!(!is_sanitizer_name("str.format"));
    }
}
