//! Test support: a minimal segment-based pattern compiler.
//!
//! Production embedders bring their own [`PatternCompiler`]; tests
//! only need literal segments and `:name` captures.

use crate::error::RouterError;
use crate::matcher::{CaptureKey, CompiledPattern, PatternCompiler, PatternMatcher};
use crate::Result;

enum Segment {
    Literal(String),
    Capture(String),
}

pub(crate) struct SegmentCompiler;

impl PatternCompiler for SegmentCompiler {
    fn compile(&self, pattern: &str) -> Result<CompiledPattern> {
        if !pattern.starts_with('/') {
            return Err(RouterError::InvalidRoute(format!(
                "pattern must start with '/': {pattern}"
            )));
        }

        let segments: Vec<Segment> = pattern
            .split('/')
            .skip(1)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Capture(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        let keys = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Capture(name) => Some(CaptureKey::new(name.clone())),
                Segment::Literal(_) => None,
            })
            .collect();

        Ok(CompiledPattern {
            matcher: Box::new(SegmentMatcher { segments }),
            keys,
        })
    }
}

struct SegmentMatcher {
    segments: Vec<Segment>,
}

impl PatternMatcher for SegmentMatcher {
    fn captures(&self, path: &str) -> Option<Vec<Option<String>>> {
        let parts: Vec<&str> = path.split('/').skip(1).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captures = Vec::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Capture(_) => captures.push(Some(part.to_string())),
            }
        }
        Some(captures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_and_capture_segments() {
        let compiled = SegmentCompiler.compile("/users/:id").unwrap();
        assert_eq!(compiled.keys, vec![CaptureKey::new("id")]);
        assert_eq!(
            compiled.matcher.captures("/users/42"),
            Some(vec![Some("42".to_string())])
        );
        assert_eq!(compiled.matcher.captures("/posts/42"), None);
        assert_eq!(compiled.matcher.captures("/users"), None);
    }

    #[test]
    fn test_rejects_relative_pattern() {
        assert!(SegmentCompiler.compile("users/:id").is_err());
    }
}
