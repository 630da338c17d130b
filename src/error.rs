use crate::scanner::Location;
use std::fmt::Formatter;

/// Everything that can go wrong between receiving a pattern string and
/// returning the final reduction value.
///
/// Recoverable parse errors (the ERROR-symbol protocol) are handled inside
/// the driver and only set the `errored` flag on the outcome; every variant
/// here terminates its operation.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Error {
    /// A terminal pattern failed to compile. `pos` is the byte offset into
    /// the pattern at which parsing gave up.
    Pattern {
        pattern: String,
        pos: usize,
        msg: String,
    },
    /// `Regex` matching was asked to match an empty input.
    EmptyInput,
    /// The scanner could not complete a token. `text` is everything it had
    /// accumulated when it got stuck.
    Lexical { loc: Location, text: String },
    /// The table reported Error and recovery exhausted the stack.
    Parse {
        loc: Location,
        text: String,
        expected: Vec<String>,
    },
    /// A reduction callback failed. Never recovered.
    Reduce {
        loc: Location,
        text: String,
        cause: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;

        match self {
            Error::Pattern { pattern, pos, msg } => {
                let start = pos.saturating_sub(10);
                let end = std::cmp::min(pattern.len(), pos + 10);
                let lead = if start != 0 { "..." } else { "" };
                let trail = if end != pattern.len() { "..." } else { "" };
                let caret = lead.len() + (pos - start);

                write!(
                    f,
                    "Pattern Error: {}\nPattern: {}{}{}\n{}{}",
                    msg.red(),
                    lead,
                    &pattern[start..end],
                    trail,
                    " ".repeat(9 + caret),
                    "^".red(),
                )
            }
            Error::EmptyInput => {
                write!(f, "Match Error: {}", "cannot match an empty input".red())
            }
            Error::Lexical { loc, text } => {
                write!(
                    f,
                    "Lexical Error at {}: no terminal matches {}",
                    loc.to_string().bright_blue(),
                    format!("'{}'", text).red(),
                )
            }
            Error::Parse {
                loc,
                text,
                expected,
            } => {
                write!(
                    f,
                    "Parse Error at {}: unexpected {}\nExpected one of: {}",
                    loc.to_string().bright_blue(),
                    format!("'{}'", text).red(),
                    expected.join(" "),
                )
            }
            Error::Reduce { loc, text, cause } => {
                write!(
                    f,
                    "Reduce Error near {} token '{}'\nThis token may or may not be the issue\nError:\n{}",
                    loc.to_string().bright_blue(),
                    text,
                    cause.red(),
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
