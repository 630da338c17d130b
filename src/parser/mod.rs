//! The table-driven shift-reduce driver.
//!
//! The tables are produced by an external generator and supplied as one
//! bundle; the driver interprets them over the scanner's token stream and
//! calls the user's reduction callbacks bottom-up. Syntax errors are
//! recoverable through a distinguished ERROR symbol: grammars opt in by
//! writing rules that mention it, and the driver reports whether any
//! recovery happened alongside the final value.

use crate::error::Error;
use crate::scanner::{Location, ParseToken, Scanner, Terminal};
use serde::{Deserialize, Serialize};

/// What a parse-table cell tells the driver to do.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    #[default]
    Error,
    Shift,
    Reduce,
    Goto,
}

/// One parse-table cell: the action plus its operand (target state for
/// Shift/Goto, rule id for Reduce).
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParseAction {
    pub action: Action,
    pub state: u16,
}

impl ParseAction {
    pub const fn new(action: Action, state: u16) -> ParseAction {
        ParseAction { action, state }
    }
}

/// Per-rule reduction metadata: how many stack items the rule pops and
/// which nonterminal it produces.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
    pub pops: u16,
    pub nonterm: u32,
}

/// A reduction callback. Items arrive in top-first stack order, i.e. the
/// rule's right-hand side reversed. Failing aborts the parse.
pub type ReduceResult<R> = Result<R, Box<dyn std::error::Error>>;
pub type ReductionFunc<R> = fn(Vec<StackItem<R>>) -> ReduceResult<R>;

/// One parse-stack entry: either a shifted token or a reduced nonterminal,
/// plus the LR state entered and the source span covered.
#[derive(Debug)]
pub struct StackItem<R> {
    pub state: u16,
    pub symbol: u32,
    pub loc: Location,
    kind: ItemKind<R>,
}

#[derive(Debug)]
enum ItemKind<R> {
    Token(String),
    NonTerm(R),
}

impl<R> StackItem<R> {
    fn start() -> StackItem<R> {
        StackItem {
            state: 0,
            symbol: 0,
            loc: Location::default(),
            kind: ItemKind::Token(String::new()),
        }
    }

    fn token(state: u16, token: ParseToken) -> StackItem<R> {
        StackItem {
            state,
            symbol: token.symbol,
            loc: token.loc,
            kind: ItemKind::Token(token.text),
        }
    }

    fn nonterm(state: u16, symbol: u32, loc: Location, value: R) -> StackItem<R> {
        StackItem {
            state,
            symbol,
            loc,
            kind: ItemKind::NonTerm(value),
        }
    }

    /// The terminal's matched text.
    pub fn text(&self) -> ReduceResult<&str> {
        match &self.kind {
            ItemKind::Token(text) => Ok(text),
            ItemKind::NonTerm(_) => Err("stack item is not a terminal".into()),
        }
    }

    /// The nonterminal's semantic value.
    pub fn into_value(self) -> ReduceResult<R> {
        match self.kind {
            ItemKind::NonTerm(value) => Ok(value),
            ItemKind::Token(_) => Err("stack item is not a nonterminal".into()),
        }
    }
}

/// The result of a successful parse. `errored` is true iff the ERROR-symbol
/// protocol kicked in at least once on the way.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseOutcome<R> {
    pub value: R,
    pub errored: bool,
}

/// The full table bundle. Immutable once built; one instance can serve any
/// number of parse invocations, each of which allocates its own scanner and
/// stack.
pub struct ParseTable<R> {
    table: Vec<ParseAction>,
    pub num_cols: u32,
    pub num_rows: u32,
    reductions: Vec<Reduction>,
    reduction_funcs: Vec<ReductionFunc<R>>,
    symbol_names: Vec<String>,
    terminals: Vec<Terminal>,
    num_symbols: u32,
}

impl<R> ParseTable<R> {
    /// `table` is dense and row-major with `num_cols` columns per state;
    /// column `i` holds the actions for symbol id `i + 1` (symbol 0 is the
    /// augmented start symbol and has no column). The top three symbol ids
    /// are reserved: ERROR, then EOF, then IGNORE.
    pub fn new(
        table: Vec<ParseAction>,
        num_cols: u32,
        num_rows: u32,
        reductions: Vec<Reduction>,
        reduction_funcs: Vec<ReductionFunc<R>>,
        symbol_names: Vec<String>,
        terminals: Vec<Terminal>,
    ) -> ParseTable<R> {
        let num_symbols = symbol_names.len() as u32;
        ParseTable {
            table,
            num_cols,
            num_rows,
            reductions,
            reduction_funcs,
            symbol_names,
            terminals,
            num_symbols,
        }
    }

    pub fn symbol_error(&self) -> u32 {
        self.num_symbols - 3
    }

    pub fn symbol_eof(&self) -> u32 {
        self.num_symbols - 2
    }

    pub fn symbol_ignore(&self) -> u32 {
        self.num_symbols - 1
    }

    pub fn lookup_symbol(&self, symbol: u32) -> &str {
        &self.symbol_names[symbol as usize]
    }

    fn action(&self, state: u16, symbol: u32) -> ParseAction {
        self.table[state as usize * self.num_cols as usize + (symbol as usize - 1)]
    }

    fn reduction(&self, rule: usize) -> Reduction {
        self.reductions[rule]
    }

    /// Fatal-parse-error diagnostics: every terminal the failing state
    /// could have shifted.
    fn fatal(&self, state: u16, token: &ParseToken) -> Error {
        let mut expected = Vec::new();
        for col in 0..self.num_cols {
            let symbol = col + 1;
            if self.action(state, symbol).action == Action::Shift {
                expected.push(self.lookup_symbol(symbol).to_string());
            }
        }
        Error::Parse {
            loc: token.loc,
            text: token.text.clone(),
            expected,
        }
    }

    /// Run the driver over a byte source until rule 0 reduces (accept) or a
    /// fatal error surfaces.
    pub fn parse<I: Iterator<Item = u8>>(&self, source: I) -> Result<ParseOutcome<R>, Error> {
        let mut scanner = Scanner::new(
            source,
            &self.terminals,
            self.symbol_eof(),
            self.symbol_ignore(),
        );

        let mut stack: Vec<StackItem<R>> = vec![StackItem::start()];
        let mut token = scanner.next_token()?;
        let mut errored = false;
        let mut recovering = false;

        loop {
            let top_state = match stack.last() {
                Some(top) => top.state,
                None => return Err(self.fatal(0, &token)),
            };
            let next = self.action(top_state, token.symbol);

            match next.action {
                Action::Shift => {
                    stack.push(StackItem::token(next.state, token));
                    token = scanner.next_token()?;
                }
                Action::Reduce => {
                    let rule = next.state as usize;
                    let red = self.reduction(rule);

                    let split = stack.len().saturating_sub(red.pops as usize);
                    let items: Vec<StackItem<R>> = stack.drain(split..).rev().collect();

                    if recovering && items.iter().any(|item| item.symbol == self.symbol_error()) {
                        // The ERROR marker has been consumed by a rule;
                        // normal parsing resumes.
                        recovering = false;
                    }

                    let loc = match (items.first(), items.last()) {
                        (Some(top), Some(bottom)) => Location::span(&bottom.loc, &top.loc),
                        _ => stack.last().map(|item| item.loc).unwrap_or_default(),
                    };

                    let value = match self.reduction_funcs[rule](items) {
                        Ok(value) => value,
                        Err(cause) => {
                            return Err(Error::Reduce {
                                loc: token.loc,
                                text: token.text,
                                cause: cause.to_string(),
                            })
                        }
                    };

                    if rule == 0 {
                        return Ok(ParseOutcome { value, errored });
                    }

                    let goto_state = match stack.last() {
                        Some(top) => self.action(top.state, red.nonterm).state,
                        None => return Err(self.fatal(0, &token)),
                    };
                    stack.push(StackItem::nonterm(goto_state, red.nonterm, loc, value));
                }
                Action::Error | Action::Goto => {
                    if recovering {
                        // Discard tokens until something parses again
                        if token.symbol == self.symbol_eof() {
                            return Err(self.fatal(top_state, &token));
                        }
                        token = scanner.next_token()?;
                        continue;
                    }

                    errored = true;
                    recovering = true;

                    // Unwind to a state that can shift the ERROR marker
                    loop {
                        match stack.last() {
                            Some(top)
                                if self.action(top.state, self.symbol_error()).action
                                    == Action::Shift =>
                            {
                                break
                            }
                            Some(_) => {
                                stack.pop();
                            }
                            None => return Err(self.fatal(top_state, &token)),
                        }
                    }

                    // Re-enter the loop with the offending token relabeled
                    // as ERROR; its text and location stay intact.
                    token.symbol = self.symbol_error();
                }
            }
        }
    }
}
