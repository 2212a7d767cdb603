//! Glob matching for boundary path rules (`spec.md` §4.5).
//!
//! `*` stops at a path separator, `**` spans any number of segments, and
//! a leading dot in the matched string is not treated specially — so a
//! pattern like `.env*` matches dotfiles without extra ceremony. A
//! pattern with no `/` at all matches any single path segment's file
//! name, at any depth — `.env*` must catch `config/.env.local`, not just
//! a bare `.env.local` at the project root, or a forbidden-path rule
//! is trivially bypassed by nesting the file one directory down.

use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Check a single glob pattern against a candidate path. An invalid
/// pattern never matches — fail-closed, not fail-open.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    let p = match Pattern::new(pattern) {
        Ok(p) => p,
        Err(_) => return false,
    };
    if p.matches_with(candidate, MATCH_OPTIONS) {
        return true;
    }
    if !pattern.contains('/') {
        if let Some(basename) = std::path::Path::new(candidate).file_name().and_then(|n| n.to_str()) {
            return p.matches_with(basename, MATCH_OPTIONS);
        }
    }
    false
}

/// The first pattern in `patterns` that matches `candidate`, if any.
pub fn first_match<'a>(patterns: &'a [String], candidate: &str) -> Option<&'a str> {
    patterns
        .iter()
        .find(|pattern| matches(pattern, candidate))
        .map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_does_not_cross_separators_in_a_slashed_pattern() {
        assert!(!matches("src/*.rs", "src/sub/main.rs"));
        assert!(matches("src/*.rs", "src/main.rs"));
    }

    #[test]
    fn slash_less_pattern_matches_the_basename_at_any_depth() {
        assert!(matches("*.rs", "src/main.rs"));
        assert!(matches("*.rs", "main.rs"));
    }

    #[test]
    fn double_star_spans_segments() {
        assert!(matches("**/auth/**", "crates/svc/auth/handlers.rs"));
    }

    #[test]
    fn leading_dot_matches_without_literal_requirement() {
        assert!(matches(".env*", ".env.local"));
    }

    #[test]
    fn slash_less_dotfile_pattern_matches_when_nested() {
        assert!(matches(".env*", "config/.env.local"));
    }

    #[test]
    fn invalid_pattern_never_matches() {
        assert!(!matches("[", "anything"));
    }
}
