//! Pattern matching seam
//!
//! The engine does not implement a pattern syntax. Route patterns are
//! compiled by an external [`PatternCompiler`] supplied at router
//! construction; the engine only consumes the resulting matcher and
//! its ordered capture keys. The single exception is the wildcard
//! pattern `"*"`, which never reaches the compiler and matches every
//! path with one capture holding the whole of it.

use crate::Result;

/// Named capture descriptor produced by pattern compilation, in the
/// order the pattern's capture groups appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureKey {
    pub name: String,
}

impl CaptureKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A compiled pattern invocable against a decoded path.
pub trait PatternMatcher: Send + Sync {
    /// Ordered capture values when the path matches, `None` otherwise.
    /// A `None` element marks a capture group that did not participate
    /// in the match.
    fn captures(&self, path: &str) -> Option<Vec<Option<String>>>;
}

/// Compiles a pattern string into a matcher plus its capture keys.
pub trait PatternCompiler: Send + Sync {
    fn compile(&self, pattern: &str) -> Result<CompiledPattern>;
}

pub struct CompiledPattern {
    pub matcher: Box<dyn PatternMatcher>,
    pub keys: Vec<CaptureKey>,
}

/// Pattern value that matches every path.
pub const WILDCARD: &str = "*";

struct WildcardMatcher;

impl PatternMatcher for WildcardMatcher {
    fn captures(&self, path: &str) -> Option<Vec<Option<String>>> {
        Some(vec![Some(path.to_string())])
    }
}

pub(crate) fn wildcard_pattern() -> CompiledPattern {
    CompiledPattern {
        matcher: Box::new(WildcardMatcher),
        keys: vec![CaptureKey::new("0")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_captures_whole_path() {
        let compiled = wildcard_pattern();
        assert_eq!(compiled.keys, vec![CaptureKey::new("0")]);
        assert_eq!(
            compiled.matcher.captures("/anything/at/all"),
            Some(vec![Some("/anything/at/all".to_string())])
        );
    }
}
