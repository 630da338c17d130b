//! A from-scratch backtracking-free regex engine.
//!
//! Patterns support literals, escapes, `.`, character classes, grouping,
//! alternation, bounded and unbounded repetition, and positive/negative
//! lookahead. Matching reports both *full* matches and *partial* matches: a
//! partial is a prefix that could still match if more input arrived, which
//! is what lets the scanner take maximal-munch decisions over a stream.

pub mod ast;
pub mod pattern;

use crate::error::Error;
use ast::{Ast, PosSet};
use std::fmt::Formatter;

/// A compiled pattern. Construction parses the pattern text; matching walks
/// the node tree with a breadth-first set of live positions instead of
/// recursing per alternative.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Regex {
    root: Ast,
}

/// The outcome of running a pattern over an input.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Match {
    /// The pattern consumed the entire input.
    pub full: bool,
    /// Not a full match, but appending more input could produce one.
    pub partial: bool,
    /// Every offset at which the root's forward match came to rest. An
    /// offset equal to the input length denotes the terminating sentinel.
    pub positions: PosSet,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        Ok(Regex {
            root: pattern::parse(pattern)?,
        })
    }

    pub fn match_str(&self, text: &str) -> Result<Match, Error> {
        self.match_bytes(text.as_bytes())
    }

    pub fn match_bytes(&self, input: &[u8]) -> Result<Match, Error> {
        if input.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut partial = false;
        let positions = self.root.run(input, &PosSet::single(0), &mut partial);
        let full = !positions.is_empty();
        Ok(Match {
            full,
            // a full match supersedes any partial sighting
            partial: partial && !full,
            positions,
        })
    }

    /// Multi-line tree dump of the compiled pattern, one node per line.
    pub fn annotate(&self) -> String {
        let mut out = String::new();
        for line in self.root.annotate() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

impl std::fmt::Display for Regex {
    /// Renders pattern text that reparses to an equivalent pattern. The
    /// implicit end-of-input anchor is not rendered.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.root {
            Ast::Concat(user, anchor) if **anchor == Ast::EndOfString => write!(f, "{}", user),
            root => write!(f, "{}", root),
        }
    }
}
