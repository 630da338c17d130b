//! All the usual imports that a table-bundle author will need.
//!
//! Generated table modules are expected to `use tabula::prelude::*;` and
//! nothing else from this crate.

pub use crate::error::Error;
pub use crate::parser::{
    Action, ParseAction, ParseOutcome, ParseTable, ReduceResult, Reduction, ReductionFunc,
    StackItem,
};
pub use crate::regex::{Match, Regex};
pub use crate::scanner::{Location, ParseToken, Scanner, Terminal};
