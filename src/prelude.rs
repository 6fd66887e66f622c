//! One-stop imports for building and running grammars.
//!
//! ```
//! use pegstream::prelude::*;
//! ```

pub use crate::ast::{
    Alternative2, Alternative3, Alternative4, Alternative5, Alternative6, ChoiceNode, Leaf,
    OptNode, ParseFailure, ParseResult, Parsed, RepeatNode, RuleId, SeqNode, Token,
};
pub use crate::combinator::{choice, seq, Choice, Complete, Lookahead, Opt, Repeat, Seq};
pub use crate::grammar_analysis::{verify_grammar, RecursionCycle};
pub use crate::json::DumpJson;
pub use crate::rule::{GrammarNode, Map, Recursive, Rule, RuleExt, RuleOutput};
pub use crate::source_location::{Position, StreamPosition};
pub use crate::stream::{Checkpoint, Cursor, StreamConfig, StreamError, TextStream};
pub use crate::token::{
    digits, identifier, lit, printable_char, token_fn, Classifier, ClassifierResult, Lit, TokenFn,
};
