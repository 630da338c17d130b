//! # tabula
//!
//! A runtime for table-driven LR parsing in pure safe Rust.
//!
//! A parser generator (run offline, out of scope here) hands this crate a
//! parse table, a set of reduction callbacks, and an ordered list of
//! terminal patterns; the runtime turns a byte stream into the semantic
//! value of the grammar's start rule. Three pieces do the work:
//!
//! - a from-scratch regex engine ([`regex`]) that reports *full* and
//!   *partial* matches, so the scanner can take maximal-munch decisions
//!   over a stream it cannot rewind,
//! - a maximal-munch scanner ([`scanner`]) producing located tokens,
//! - a shift-reduce driver ([`parser`]) with error recovery through a
//!   distinguished ERROR symbol.
//!
//! ## Example
//!
//! Compiling and matching a pattern:
//!
//! ```
//! use tabula::regex::Regex;
//!
//! let re = Regex::new("a[ab]*").unwrap();
//! assert!(re.match_str("abba").unwrap().full);
//! assert!(!re.match_str("abc").unwrap().full);
//!
//! // a partial match could still become full with more input
//! let m = Regex::new("a(ab)+").unwrap().match_str("aa").unwrap();
//! assert!(!m.full && m.partial);
//! ```
//!
//! Driving a parse requires a table bundle; see [`parser::ParseTable`] for
//! the layout contract and the integration tests for a worked calculator.

pub mod error;
pub mod parser;
pub mod prelude;
pub mod regex;
pub mod scanner;
