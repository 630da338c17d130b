//! Maximal-munch scanning over a byte stream.
//!
//! The scanner owns the only mutable view of the input: a byte iterator
//! wrapped with a one-byte pushback buffer. Line endings are normalized
//! (`\r` and `\r\n` both read as `\n`) before line/column accounting, so
//! locations are stable across platforms.

use crate::error::Error;
use crate::regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Formatter;

/// A half-open text span in 1-based, human-readable coordinates.
/// `char_end` is the column of the last byte of the span.
#[derive(Debug, Default, Eq, PartialEq, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line_start: u32,
    pub char_start: u32,
    pub line_end: u32,
    pub char_end: u32,
}

impl Location {
    /// The span covering everything from the start of `first` to the end of
    /// `last`.
    pub fn span(first: &Location, last: &Location) -> Location {
        Location {
            line_start: first.line_start,
            char_start: first.char_start,
            line_end: last.line_end,
            char_end: last.char_end,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line_start, self.char_start)
    }
}

/// One located token as handed to the LR driver.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ParseToken {
    pub symbol: u32,
    pub text: String,
    pub loc: Location,
}

/// A lexical category: a symbol id plus its compiled pattern. The order of
/// terminals in the scanner's list is their priority order.
#[derive(Debug, Clone)]
pub struct Terminal {
    pub id: u32,
    pub re: Regex,
}

impl Terminal {
    pub fn new(id: u32, pattern: &str) -> Result<Terminal, Error> {
        Ok(Terminal {
            id,
            re: Regex::new(pattern)?,
        })
    }
}

/// A byte iterator with pushback. `unget` is needed exactly once between
/// reads, when the munch loop overshoots by one byte.
struct Pushback<I: Iterator<Item = u8>> {
    iter: I,
    buffer: VecDeque<u8>,
}

impl<I: Iterator<Item = u8>> Pushback<I> {
    fn new(iter: I) -> Self {
        Self {
            iter,
            buffer: VecDeque::new(),
        }
    }

    fn next(&mut self) -> Option<u8> {
        self.buffer.pop_front().or_else(|| self.iter.next())
    }

    fn unget(&mut self, byte: u8) {
        self.buffer.push_front(byte);
    }
}

pub struct Scanner<'t, I: Iterator<Item = u8>> {
    source: Pushback<I>,
    line_num: u32,
    char_num: u32,
    last_line_length: u32,
    terminals: &'t [Terminal],
    symbol_eof: u32,
    symbol_ignore: u32,
}

impl<'t, I: Iterator<Item = u8>> Scanner<'t, I> {
    pub fn new(
        source: I,
        terminals: &'t [Terminal],
        symbol_eof: u32,
        symbol_ignore: u32,
    ) -> Scanner<'t, I> {
        Scanner {
            source: Pushback::new(source),
            line_num: 1,
            char_num: 1,
            last_line_length: 0,
            terminals,
            symbol_eof,
            symbol_ignore,
        }
    }

    /// The next non-IGNORE token. Tokens come out in strictly forward input
    /// order; at end of stream this keeps returning EOF tokens.
    pub fn next_token(&mut self) -> Result<ParseToken, Error> {
        let mut out = self.next_raw()?;
        while out.symbol == self.symbol_ignore {
            out = self.next_raw()?;
        }
        Ok(out)
    }

    fn get(&mut self) -> Option<u8> {
        let mut out = self.source.next()?;
        if out == b'\r' {
            // Normalize \r and \r\n to \n
            match self.source.next() {
                Some(b'\n') | None => {}
                Some(other) => self.source.unget(other),
            }
            out = b'\n';
        }

        if out == b'\n' {
            self.line_num += 1;
            self.last_line_length = self.char_num;
            self.char_num = 1;
        } else {
            self.char_num += 1;
        }
        Some(out)
    }

    fn unget(&mut self, byte: u8) {
        self.source.unget(byte);
        if byte == b'\n' {
            self.line_num -= 1;
            self.char_num = self.last_line_length;
        } else {
            self.char_num -= 1;
        }
    }

    fn next_raw(&mut self) -> Result<ParseToken, Error> {
        let mut out = ParseToken {
            symbol: self.symbol_eof,
            text: String::new(),
            loc: Location {
                line_start: self.line_num,
                char_start: self.char_num,
                line_end: self.line_num,
                char_end: self.char_num,
            },
        };

        // Whether any terminal has fully matched some prefix of the buffer
        let mut found_match = false;
        // End location of the buffer minus its last byte, for the unget path
        let mut prev_end = (self.line_num, self.char_num);

        loop {
            let at = (self.line_num, self.char_num);
            let next = match self.get() {
                Some(byte) => byte,
                None => break,
            };

            if out.text.is_empty() && matches!(next, b' ' | b'\t' | b'\n') {
                // Skip leading whitespace only. Inter-token whitespace is
                // leading for the next token; whitespace inside a token
                // (strings, comments) reaches the buffer untouched.
                out.loc.line_start = self.line_num;
                out.loc.char_start = self.char_num;
                out.loc.line_end = self.line_num;
                out.loc.char_end = self.char_num;
                continue;
            }

            out.text.push(next as char);
            prev_end = (out.loc.line_end, out.loc.char_end);
            out.loc.line_end = at.0;
            out.loc.char_end = at.1;

            let mut found_new_match = false;
            let mut found_partial = false;
            for term in self.terminals {
                let m = term.re.match_str(&out.text)?;
                if m.full {
                    found_new_match = true;
                } else if m.partial {
                    found_partial = true;
                }
            }

            if !found_match && found_new_match {
                found_match = true;
            } else if !found_match && !found_new_match && !found_partial {
                // Nothing matches and nothing can grow into a match
                return Err(Error::Lexical {
                    loc: out.loc,
                    text: out.text,
                });
            } else if found_match && !found_new_match && !found_partial {
                // Maximal munch found: the buffer matched up to the
                // previous byte and nothing can grow any further.
                self.unget(next);
                out.text.pop();
                out.loc.line_end = prev_end.0;
                out.loc.char_end = prev_end.1;
                return self.emit(out);
            }
        }

        // End of stream
        if out.text.is_empty() {
            out.symbol = self.symbol_eof;
            return Ok(out);
        }
        if found_match {
            return self.emit(out);
        }
        Err(Error::Lexical {
            loc: out.loc,
            text: out.text,
        })
    }

    /// The first terminal (in priority order) that fully matches the buffer
    /// wins.
    fn emit(&self, mut out: ParseToken) -> Result<ParseToken, Error> {
        for term in self.terminals {
            if term.re.match_str(&out.text)?.full {
                out.symbol = term.id;
                return Ok(out);
            }
        }
        Err(Error::Lexical {
            loc: out.loc,
            text: out.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminals(patterns: &[(u32, &str)]) -> Vec<Terminal> {
        patterns
            .iter()
            .map(|&(id, pat)| Terminal::new(id, pat).unwrap())
            .collect()
    }

    const EOF: u32 = 100;
    const IGNORE: u32 = 101;

    fn scan(terms: &[Terminal], input: &str) -> Result<Vec<ParseToken>, Error> {
        let mut scanner = Scanner::new(input.bytes(), terms, EOF, IGNORE);
        let mut out = Vec::new();
        loop {
            let token = scanner.next_token()?;
            let done = token.symbol == EOF;
            out.push(token);
            if done {
                return Ok(out);
            }
        }
    }

    #[test]
    fn longest_match_wins() {
        let terms = terminals(&[(1, "="), (2, "==")]);
        let tokens = scan(&terms, "===").unwrap();
        let symbols: Vec<u32> = tokens.iter().map(|t| t.symbol).collect();
        assert_eq!(symbols, vec![2, 1, EOF]);
        assert_eq!(tokens[0].text, "==");
        assert_eq!(tokens[1].text, "=");
    }

    #[test]
    fn order_breaks_length_ties() {
        let terms = terminals(&[(1, "if"), (2, "\\l+")]);
        let tokens = scan(&terms, "if iff").unwrap();
        let symbols: Vec<u32> = tokens.iter().map(|t| t.symbol).collect();
        assert_eq!(symbols, vec![1, 2, EOF]);
        assert_eq!(tokens[1].text, "iff");
    }

    #[test]
    fn overshoot_by_one_ungets() {
        let terms = terminals(&[(1, "\\d+"), (2, "\\.")]);
        let tokens = scan(&terms, "12.5").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["12", ".", "5", ""]);
    }

    #[test]
    fn ignore_tokens_are_swallowed() {
        let terms = terminals(&[(1, "\\d+"), (IGNORE, "#[^\\n]*")]);
        let tokens = scan(&terms, "1 # comment\n2").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2", ""]);
    }

    #[test]
    fn locations_are_one_based_spans() {
        let terms = terminals(&[(1, "\\l+")]);
        let tokens = scan(&terms, "ab\n cde").unwrap();
        assert_eq!(
            tokens[0].loc,
            Location {
                line_start: 1,
                char_start: 1,
                line_end: 1,
                char_end: 2,
            }
        );
        assert_eq!(
            tokens[1].loc,
            Location {
                line_start: 2,
                char_start: 2,
                line_end: 2,
                char_end: 4,
            }
        );
    }

    #[test]
    fn carriage_returns_normalize() {
        let terms = terminals(&[(1, "\\l+")]);
        let tokens = scan(&terms, "a\r\nb\rc").unwrap();
        let starts: Vec<(u32, u32)> = tokens
            .iter()
            .map(|t| (t.loc.line_start, t.loc.char_start))
            .collect();
        assert_eq!(starts, vec![(1, 1), (2, 1), (3, 1), (3, 2)]);
    }

    #[test]
    fn eof_mid_token_emits_when_matched() {
        let terms = terminals(&[(1, "ab(c)?")]);
        let tokens = scan(&terms, "ab").unwrap();
        assert_eq!(tokens[0].symbol, 1);
        assert_eq!(tokens[0].text, "ab");
    }

    #[test]
    fn eof_mid_token_errors_when_unmatched() {
        let terms = terminals(&[(1, "abc")]);
        let err = scan(&terms, "ab").unwrap_err();
        assert_eq!(
            err,
            Error::Lexical {
                loc: Location {
                    line_start: 1,
                    char_start: 1,
                    line_end: 1,
                    char_end: 2,
                },
                text: "ab".to_string(),
            }
        );
    }

    #[test]
    fn stuck_input_is_a_lexical_error() {
        let terms = terminals(&[(1, "\\d+")]);
        let err = scan(&terms, "12@4").unwrap_err();
        match err {
            Error::Lexical { loc, text } => {
                assert_eq!(text, "@");
                assert_eq!((loc.line_start, loc.char_start), (1, 3));
            }
            other => panic!("expected a lexical error, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_is_eof() {
        let terms = terminals(&[(1, "\\d+")]);
        let tokens = scan(&terms, "").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].symbol, EOF);
    }
}
