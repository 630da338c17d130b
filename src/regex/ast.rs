//! Pattern nodes and the position-set matcher.

use shrinkwraprs::Shrinkwrap;
use std::fmt::Formatter;
use tinyvec::TinyVec;

/// The set of input offsets that are live at some point of a match.
///
/// Kept sorted and deduplicated so that two sets compare equal exactly when
/// they describe the same offsets; the repetition loop relies on that to
/// detect zero-width stalls.
#[derive(Shrinkwrap, Debug, Default, Clone, Eq, PartialEq)]
#[shrinkwrap(mutable)]
pub struct PosSet(pub TinyVec<[usize; 8]>);

impl PosSet {
    pub fn single(pos: usize) -> PosSet {
        let mut out = PosSet::default();
        out.0.push(pos);
        out
    }

    /// Insert keeping sort order; duplicates are dropped.
    pub fn insert(&mut self, pos: usize) {
        if let Err(at) = self.0.binary_search(&pos) {
            self.0.insert(at, pos);
        }
    }

    pub fn merge(&mut self, other: &PosSet) {
        for &pos in other.0.iter() {
            self.insert(pos);
        }
    }
}

/// A single pattern node. Every node exclusively owns its children and the
/// tree is immutable once the pattern parser has produced it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Ast {
    /// Matches exactly one given byte.
    Literal(u8),
    /// Matches any byte that is not the terminating sentinel.
    Dot,
    /// A set of bytes, optionally inverted. Ranges and escape shortcuts are
    /// expanded at construction.
    CharClass { set: Vec<u8>, invert: bool },
    Concat(Box<Ast>, Box<Ast>),
    Alter(Box<Ast>, Box<Ast>),
    /// `max == None` means unbounded. Covers `*` (0, None), `+` (1, None),
    /// `?` (0, 1), `{m}`, `{m,}` and `{m,n}`.
    Repetition {
        inner: Box<Ast>,
        min: u32,
        max: Option<u32>,
    },
    /// Plain parentheses. Transparent to matching.
    Group(Box<Ast>),
    /// Zero-width assertion. Never advances a position.
    LookAhead { inner: Box<Ast>, negative: bool },
    /// Anchors to the terminating sentinel of the input buffer.
    EndOfString,
}

impl Ast {
    /// Thread a set of live positions through this node. Offsets equal to
    /// `input.len()` denote the sentinel; a consuming leaf that lands on it
    /// raises `partial` and drops the position.
    pub(crate) fn run(&self, input: &[u8], live: &PosSet, partial: &mut bool) -> PosSet {
        match self {
            Ast::Literal(sym) => advance(input, live, partial, |b| b == *sym),
            Ast::Dot => advance(input, live, partial, |_| true),
            Ast::CharClass { set, invert } => {
                advance(input, live, partial, |b| set.contains(&b) != *invert)
            }
            Ast::Concat(first, second) => {
                let mid = first.run(input, live, partial);
                if mid.is_empty() {
                    mid
                } else {
                    second.run(input, &mid, partial)
                }
            }
            Ast::Alter(first, second) => {
                let mut out = first.run(input, live, partial);
                out.merge(&second.run(input, live, partial));
                out
            }
            Ast::Repetition { inner, min, max } => {
                let mut out = PosSet::default();
                let mut current = live.clone();
                if *min == 0 {
                    out.merge(&current);
                }
                let mut count = 0u32;
                while max.map_or(true, |m| count < m) {
                    let next = inner.run(input, &current, partial);
                    if next.is_empty() {
                        break;
                    }
                    count += 1;
                    if count >= *min {
                        out.merge(&next);
                    }
                    if next == current {
                        // The whole set matched zero-width: further
                        // repetitions cannot move anything, but they can
                        // still pad the count up to min.
                        if count < *min && max.map_or(true, |m| *min <= m) {
                            out.merge(&next);
                        }
                        break;
                    }
                    current = next;
                }
                out
            }
            Ast::Group(inner) => inner.run(input, live, partial),
            Ast::LookAhead { inner, negative } => {
                let mut out = PosSet::default();
                for &pos in live.iter() {
                    // Scratch flag: a lookahead running off the end of the
                    // input must not leak into the real partial flag.
                    let mut scratch = false;
                    let hit = !inner.run(input, &PosSet::single(pos), &mut scratch).is_empty();
                    if hit != *negative {
                        out.insert(pos);
                    }
                }
                out
            }
            Ast::EndOfString => {
                let mut out = PosSet::default();
                for &pos in live.iter() {
                    if pos == input.len() {
                        out.insert(pos);
                    }
                }
                out
            }
        }
    }

    /// One line per node, children prefixed with `| `. Handy in test
    /// failure output.
    pub(crate) fn annotate(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self {
            Ast::Literal(sym) => lines.push(format!("Literal '{}'", *sym as char)),
            Ast::Dot => lines.push("Dot".to_string()),
            Ast::CharClass { set, invert } => {
                let chars: String = set.iter().map(|&b| b as char).collect();
                lines.push(format!(
                    "CharClass {}[{}]",
                    if *invert { "^" } else { "" },
                    chars
                ));
            }
            Ast::Concat(first, second) => {
                lines.push("Concat".to_string());
                add_lines(&mut lines, first.annotate());
                add_lines(&mut lines, second.annotate());
            }
            Ast::Alter(first, second) => {
                lines.push("Alternation".to_string());
                add_lines(&mut lines, first.annotate());
                add_lines(&mut lines, second.annotate());
            }
            Ast::Repetition { inner, min, max } => {
                match max {
                    Some(m) => lines.push(format!("Repetition {{{}, {}}}", min, m)),
                    None => lines.push(format!("Repetition {{{},}}", min)),
                }
                add_lines(&mut lines, inner.annotate());
            }
            Ast::Group(inner) => {
                lines.push("Group".to_string());
                add_lines(&mut lines, inner.annotate());
            }
            Ast::LookAhead { inner, negative } => {
                lines.push(format!(
                    "LookAhead {}",
                    if *negative { "Negative" } else { "Positive" }
                ));
                add_lines(&mut lines, inner.annotate());
            }
            Ast::EndOfString => lines.push("EndOfString".to_string()),
        }
        lines
    }
}

fn advance(
    input: &[u8],
    live: &PosSet,
    partial: &mut bool,
    accepts: impl Fn(u8) -> bool,
) -> PosSet {
    let mut out = PosSet::default();
    for &pos in live.iter() {
        if pos == input.len() {
            *partial = true;
        } else if accepts(input[pos]) {
            out.insert(pos + 1);
        }
    }
    out
}

fn add_lines(dest: &mut Vec<String>, src: Vec<String>) {
    for line in src {
        dest.push(format!("| {}", line));
    }
}

// Rendering. The output must reparse to an equivalent pattern, so literals
// that would read as metacharacters get escaped even where the pattern
// parser would tolerate them bare.

impl std::fmt::Display for Ast {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Ast::Literal(sym) => write_literal(f, *sym),
            Ast::Dot => write!(f, "."),
            Ast::CharClass { set, invert } => {
                write!(f, "[")?;
                if *invert {
                    write!(f, "^")?;
                }
                for &sym in set {
                    write_class_member(f, sym)?;
                }
                write!(f, "]")
            }
            Ast::Concat(first, second) => write!(f, "{}{}", first, second),
            Ast::Alter(first, second) => write!(f, "{}|{}", first, second),
            Ast::Repetition { inner, min, max } => {
                write!(f, "{}", inner)?;
                match (min, max) {
                    (0, Some(1)) => write!(f, "?"),
                    (0, None) => write!(f, "*"),
                    (1, None) => write!(f, "+"),
                    (m, None) => write!(f, "{{{},}}", m),
                    (m, Some(x)) if m == x => write!(f, "{{{}}}", m),
                    (m, Some(x)) => write!(f, "{{{},{}}}", m, x),
                }
            }
            Ast::Group(inner) => write!(f, "({})", inner),
            Ast::LookAhead { inner, negative } => {
                write!(f, "(?{}{})", if *negative { "!" } else { "=" }, inner)
            }
            Ast::EndOfString => write!(f, "$"),
        }
    }
}

fn write_literal(f: &mut Formatter<'_>, sym: u8) -> std::fmt::Result {
    match sym {
        b'\n' => write!(f, "\\n"),
        b'\t' => write!(f, "\\t"),
        b'.' | b'^' | b'$' | b'*' | b'?' | b'+' | b'|' | b'(' | b')' | b'[' | b']' | b'{'
        | b'}' | b'\\' => {
            write!(f, "\\{}", sym as char)
        }
        _ => write!(f, "{}", sym as char),
    }
}

fn write_class_member(f: &mut Formatter<'_>, sym: u8) -> std::fmt::Result {
    match sym {
        b'\n' => write!(f, "\\n"),
        b'\t' => write!(f, "\\t"),
        b'[' | b']' | b'\\' | b'-' | b'^' => write!(f, "\\{}", sym as char),
        _ => write!(f, "{}", sym as char),
    }
}
