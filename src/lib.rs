//! Streaming PEG parser combinators with checkpointed backtracking.
//!
//! `pegstream` parses text as it arrives: rules read single bytes from a
//! [`TextStream`] backed by a growable ring buffer, and backtracking is
//! expressed through checkpoints that pin the buffered window. Grammars are
//! built from plain values: literal tokens, classifier tokens, choices,
//! sequences, repetitions and lookaheads. Recursive grammars tie the
//! knot with [`Recursive`] cells.
//!
//! The crate also ships the static checks a backtracking parser needs:
//! left-recursion detection with full cycle paths
//! ([`grammar_analysis`]) and keyword/identifier collision checking
//! ([`collision`]).
//!
//! # Example
//!
//! ```
//! use pegstream::prelude::*;
//!
//! // match one-or-more digits followed by a bang
//! let rule = seq(3, (digits(1), lit(2, "!")));
//!
//! let mut input = TextStream::push_mode();
//! input.write_tail(b" 42 !")?;
//!
//! let result = rule.parse(&mut input)?;
//! assert_eq!(result.ast.items.0.text, "42");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "logging")]
macro_rules! log_error {
    ($($arg:tt)*) => { log::error!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_error {
    ($($arg:tt)*) => {{}};
}

pub mod ast;
pub mod buffer;
pub mod collision;
pub mod combinator;
pub mod grammar_analysis;
pub mod json;
pub mod prelude;
pub mod rule;
pub mod source_location;
pub mod stream;
pub mod token;

// Positions and results
pub use ast::{ParseFailure, ParseResult, Parsed, RuleId};
pub use source_location::{Position, StreamPosition};

// Streams
pub use stream::{Checkpoint, Cursor, StreamConfig, StreamError, TextStream};

// Rules and combinators
pub use combinator::{choice, seq, Complete, Lookahead, Opt, Repeat};
pub use rule::{GrammarNode, Recursive, Rule, RuleExt, RuleOutput};
pub use token::{digits, identifier, lit, printable_char, token_fn, ClassifierResult};

// Static analysis
pub use grammar_analysis::{verify_grammar, RecursionCycle};

// Tree export
pub use json::DumpJson;
