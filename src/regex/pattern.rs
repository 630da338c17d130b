//! Recursive-descent parser from pattern text to [`Ast`].
//!
//! One function per precedence level, lowest first: alternation,
//! concatenation, repetition suffixes, atoms.

use crate::error::Error;
use crate::regex::ast::Ast;

/// Bytes that cannot appear bare as a literal atom.
fn is_ordinary(c: u8) -> bool {
    !matches!(
        c,
        b'.' | b'^' | b'$' | b'*' | b'?' | b'+' | b'|' | b'(' | b')' | b'[' | b'{'
    )
}

/// Parse a whole pattern. The produced tree is anchored: the root is a
/// concatenation of the user's pattern and [`Ast::EndOfString`], so a full
/// match means the entire input was consumed.
pub(crate) fn parse(pattern: &str) -> Result<Ast, Error> {
    let mut parser = PatternParser {
        pat: pattern.as_bytes(),
        pattern,
        pos: 0,
    };
    if parser.pat.is_empty() {
        return Err(parser.err("empty pattern is not a valid regex"));
    }
    let root = parser.alternation()?;
    if parser.pos < parser.pat.len() {
        return Err(parser.err("did not consume the entire pattern"));
    }
    Ok(Ast::Concat(Box::new(root), Box::new(Ast::EndOfString)))
}

struct PatternParser<'a> {
    pat: &'a [u8],
    pattern: &'a str,
    pos: usize,
}

impl PatternParser<'_> {
    fn err(&self, msg: impl Into<String>) -> Error {
        Error::Pattern {
            pattern: self.pattern.to_string(),
            pos: self.pos.min(self.pat.len()),
            msg: msg.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.pat.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<u8> {
        let out = self.peek();
        if out.is_some() {
            self.pos += 1;
        }
        out
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn alternation(&mut self) -> Result<Ast, Error> {
        let mut node = self.concat()?;
        while self.peek() == Some(b'|') {
            self.pos += 1;
            if self.peek().is_none() {
                return Err(self.err("expected pattern after '|', found end of pattern"));
            }
            let rhs = self.concat()?;
            node = Ast::Alter(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    // Concats nest to the right, matching the original construction order.
    fn concat(&mut self) -> Result<Ast, Error> {
        let first = self.repetition()?;
        match self.peek() {
            Some(b'|') | Some(b')') | None => Ok(first),
            _ => {
                let rest = self.concat()?;
                Ok(Ast::Concat(Box::new(first), Box::new(rest)))
            }
        }
    }

    // Zero or more repetition marks may follow an atom: `a{2}?` is a valid
    // chain and parses outside-in.
    fn repetition(&mut self) -> Result<Ast, Error> {
        let mut node = self.atom()?;
        loop {
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    node = repeat(node, 0, None);
                }
                Some(b'+') => {
                    self.pos += 1;
                    node = repeat(node, 1, None);
                }
                Some(b'?') => {
                    self.pos += 1;
                    node = repeat(node, 0, Some(1));
                }
                Some(b'{') => {
                    self.pos += 1;
                    node = self.bracket_repetition(node)?;
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn atom(&mut self) -> Result<Ast, Error> {
        let c = match self.next() {
            Some(c) => c,
            None => return Err(self.err("expected an atom, found end of pattern")),
        };
        match c {
            b'\\' => self.escape(),
            b'(' => self.group(),
            b'[' => self.class(),
            b'.' => Ok(Ast::Dot),
            _ if is_ordinary(c) => Ok(Ast::Literal(c)),
            _ => Err(self.err(format!("expected an atom, found '{}'", c as char))),
        }
    }

    // Called with the backslash already consumed. Returns either a literal
    // or a char class; anything not a known shortcut is the literal byte,
    // which is how metacharacters are embedded.
    fn escape(&mut self) -> Result<Ast, Error> {
        let c = match self.next() {
            Some(c) => c,
            None => return Err(self.err("dangling escape at end of pattern")),
        };
        Ok(match c {
            b'n' => Ast::Literal(b'\n'),
            b't' => Ast::Literal(b'\t'),
            b'd' => class_range(b'0', b'9'),
            b'l' => class_range(b'a', b'z'),
            b'u' => class_range(b'A', b'Z'),
            b's' => Ast::CharClass {
                set: vec![b' ', b'\t', b'\n'],
                invert: false,
            },
            _ => Ast::Literal(c),
        })
    }

    fn group(&mut self) -> Result<Ast, Error> {
        let mut lookahead = false;
        let mut negative = false;
        if self.peek() == Some(b'?') {
            self.pos += 1;
            lookahead = true;
            match self.next() {
                Some(b'=') => {}
                Some(b'!') => negative = true,
                Some(c) => {
                    return Err(self.err(format!(
                        "invalid look-ahead specifier, expected '=' or '!', found '{}'",
                        c as char
                    )))
                }
                None => {
                    return Err(self.err(
                        "invalid look-ahead specifier, expected '=' or '!', found end of pattern",
                    ))
                }
            }
        }
        match self.peek() {
            Some(b')') => return Err(self.err("empty group is not allowed")),
            None => return Err(self.err("expected closing ')', found end of pattern")),
            _ => {}
        }
        let inner = self.alternation()?;
        if self.next() != Some(b')') {
            return Err(self.err("expected closing ')', found end of pattern"));
        }
        Ok(if lookahead {
            Ast::LookAhead {
                inner: Box::new(inner),
                negative,
            }
        } else {
            Ast::Group(Box::new(inner))
        })
    }

    // Called with the opening bracket already consumed.
    fn class(&mut self) -> Result<Ast, Error> {
        let mut set: Vec<u8> = Vec::new();
        let mut invert = false;
        if self.peek() == Some(b'^') {
            invert = true;
            self.pos += 1;
        }
        loop {
            let c = match self.peek() {
                None => return Err(self.err("expected closing ']', found end of pattern")),
                Some(b']') => break,
                Some(c) => c,
            };
            if c == b'\\' {
                self.pos += 1;
                match self.escape()? {
                    Ast::Literal(sym) => set.push(sym),
                    Ast::CharClass { set: inner, .. } => set.extend(inner),
                    // escape only produces those two
                    _ => return Err(self.err("invalid escape in character class")),
                }
                continue;
            }
            if c == b'-' && !set.is_empty() {
                // A dash is a range when both endpoints sit in the same
                // alphabetic case or are both digits; otherwise a literal.
                let prev = set[set.len() - 1];
                match self.pat.get(self.pos + 1).copied() {
                    Some(end) if same_span(prev, end) => {
                        self.pos += 2;
                        // prev is already in the set
                        push_range(&mut set, prev + 1, end);
                    }
                    _ => {
                        set.push(b'-');
                        self.pos += 1;
                    }
                }
                continue;
            }
            set.push(c);
            self.pos += 1;
        }
        self.pos += 1;
        if set.is_empty() {
            return Err(self.err("empty character class is invalid"));
        }
        Ok(Ast::CharClass { set, invert })
    }

    // Called with the opening brace already consumed. Spaces are tolerated
    // around the numbers and the comma.
    fn bracket_repetition(&mut self, inner: Ast) -> Result<Ast, Error> {
        self.skip_spaces();
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {}
            Some(c) => {
                return Err(self.err(format!(
                    "invalid bracket repetition, expected number, found '{}'",
                    c as char
                )))
            }
            None => {
                return Err(
                    self.err("invalid bracket repetition, expected number, found end of pattern")
                )
            }
        }
        let min = self.read_num()?;
        self.skip_spaces();
        let max = match self.peek() {
            Some(b'}') => Some(min),
            Some(b',') => {
                self.pos += 1;
                self.skip_spaces();
                match self.peek() {
                    Some(b'}') => None,
                    Some(c) if c.is_ascii_digit() => {
                        let max = self.read_num()?;
                        self.skip_spaces();
                        Some(max)
                    }
                    Some(c) => {
                        return Err(self.err(format!(
                            "invalid bracket repetition, expected number, found '{}'",
                            c as char
                        )))
                    }
                    None => {
                        return Err(self.err(
                            "invalid bracket repetition, expected number, found end of pattern",
                        ))
                    }
                }
            }
            Some(c) => {
                return Err(self.err(format!(
                    "invalid bracket repetition, expected ',' or '}}', found '{}'",
                    c as char
                )))
            }
            None => {
                return Err(self.err(
                    "invalid bracket repetition, expected ',' or '}}', found end of pattern",
                ))
            }
        };
        match self.peek() {
            Some(b'}') => {
                self.pos += 1;
            }
            Some(c) => {
                return Err(self.err(format!(
                    "invalid bracket repetition, expected closing '}}', found '{}'",
                    c as char
                )))
            }
            None => {
                return Err(self.err(
                    "invalid bracket repetition, expected closing '}}', found end of pattern",
                ))
            }
        }
        Ok(Ast::Repetition {
            inner: Box::new(inner),
            min,
            max,
        })
    }

    fn read_num(&mut self) -> Result<u32, Error> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => self.err(format!("expected number, found '{}'", c as char)),
                None => self.err("expected number, found end of pattern"),
            });
        }
        let mut out = 0u32;
        for &digit in &self.pat[start..self.pos] {
            out = out * 10 + u32::from(digit - b'0');
        }
        Ok(out)
    }
}

fn repeat(inner: Ast, min: u32, max: Option<u32>) -> Ast {
    Ast::Repetition {
        inner: Box::new(inner),
        min,
        max,
    }
}

fn class_range(start: u8, end: u8) -> Ast {
    let mut set = Vec::new();
    push_range(&mut set, start, end);
    Ast::CharClass { set, invert: false }
}

fn push_range(set: &mut Vec<u8>, start: u8, end: u8) {
    for sym in start..=end {
        set.push(sym);
    }
}

fn same_span(a: u8, b: u8) -> bool {
    (a.is_ascii_lowercase() && b.is_ascii_lowercase())
        || (a.is_ascii_uppercase() && b.is_ascii_uppercase())
        || (a.is_ascii_digit() && b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(pattern: &str) -> (Vec<u8>, bool) {
        match parse(pattern) {
            Ok(Ast::Concat(user, _)) => match *user {
                Ast::CharClass { set, invert } => (set, invert),
                other => panic!("expected a char class from {:?}, got {:?}", pattern, other),
            },
            other => panic!("expected a parse from {:?}, got {:?}", pattern, other),
        }
    }

    #[test]
    fn ranges_expand() {
        let (set, invert) = class("[a-e]");
        assert_eq!(set, b"abcde".to_vec());
        assert!(!invert);
    }

    #[test]
    fn leading_caret_inverts() {
        let (set, invert) = class("[^ab]");
        assert_eq!(set, b"ab".to_vec());
        assert!(invert);
    }

    #[test]
    fn dash_is_literal_when_not_a_range() {
        let (set, _) = class("[-a]");
        assert_eq!(set, b"-a".to_vec());
        let (set, _) = class("[a-]");
        assert_eq!(set, b"a-".to_vec());
        // 'z' and 'A' sit in different cases, so no range forms
        let (set, _) = class("[z-A]");
        assert_eq!(set, b"z-A".to_vec());
    }

    #[test]
    fn escapes_splice_into_classes() {
        let (set, _) = class("[\\d-]");
        assert_eq!(set, b"0123456789-".to_vec());
        let (set, _) = class("[[\\]]");
        assert_eq!(set, b"[]".to_vec());
    }

    #[test]
    fn bracket_repetition_tolerates_spaces() {
        let parsed = parse("a{ 2 , 4 }").unwrap();
        let user = match parsed {
            Ast::Concat(user, _) => *user,
            other => panic!("unexpected root {:?}", other),
        };
        assert_eq!(
            user,
            Ast::Repetition {
                inner: Box::new(Ast::Literal(b'a')),
                min: 2,
                max: Some(4),
            }
        );
    }

    #[test]
    fn repetition_marks_chain() {
        let parsed = parse("a{2}?").unwrap();
        let user = match parsed {
            Ast::Concat(user, _) => *user,
            other => panic!("unexpected root {:?}", other),
        };
        assert_eq!(
            user,
            Ast::Repetition {
                inner: Box::new(Ast::Repetition {
                    inner: Box::new(Ast::Literal(b'a')),
                    min: 2,
                    max: Some(2),
                }),
                min: 0,
                max: Some(1),
            }
        );
    }
}
