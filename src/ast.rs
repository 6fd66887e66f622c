//! Parse results and the node shapes rules produce.
//!
//! Every node carries the id of the rule that produced it and the positions
//! of the first and last matched character. Failure is a value, not a panic:
//! [`ParseResult`] is an ordinary `Result` whose error holds the positions
//! the failure was observed at.

use crate::source_location::Position;
use std::fmt;

/// Stable identity tag of a grammar rule.
///
/// Rule ids name AST nodes, identify rules during cycle analysis and guard
/// token registration, so grammars that run the analyzer should keep them
/// distinct per rule.
pub type RuleId = u32;

/// A successful match: the span it covered and the node it built.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    /// Position of the first matched character.
    pub start: Position,
    /// Position of the last matched character.
    pub end: Position,
    /// The node built for the match.
    pub ast: T,
}

/// A recoverable parse failure and where it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseFailure {
    /// Where matching gave up.
    pub start: Position,
    /// End of the failed span; equals `start` for point failures.
    pub end: Position,
}

impl ParseFailure {
    /// A point failure at `pos`.
    pub fn at(pos: Position) -> Self {
        ParseFailure {
            start: pos,
            end: pos,
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse failed at {}", self.start)
    }
}

impl std::error::Error for ParseFailure {}

/// Outcome of running a rule.
pub type ParseResult<T> = Result<Parsed<T>, ParseFailure>;

/// Node for a matched literal token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Producing rule.
    pub rule_id: RuleId,
    /// First character of the literal.
    pub start: Position,
    /// Last character of the literal.
    pub end: Position,
    /// The literal text itself.
    pub text: &'static str,
}

/// Node for a matched classifier token, carrying the gathered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Producing rule.
    pub rule_id: RuleId,
    /// First gathered character.
    pub start: Position,
    /// Last gathered character.
    pub end: Position,
    /// The text the classifier accepted.
    pub text: String,
}

/// Node for an ordered choice: exactly one child, tagged with the
/// alternative index through one of the `Alternative*` enums.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceNode<E> {
    /// Producing rule.
    pub rule_id: RuleId,
    /// Start of the winning alternative.
    pub start: Position,
    /// End of the winning alternative.
    pub end: Position,
    /// The winning alternative's node.
    pub value: E,
}

/// Node for a sequence: a fixed-arity tuple of children in match order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqNode<T> {
    /// Producing rule.
    pub rule_id: RuleId,
    /// Start of the first element.
    pub start: Position,
    /// End of the last element.
    pub end: Position,
    /// The element nodes.
    pub items: T,
}

/// Node for an optional rule. An absent child leaves a zero-width span at
/// the attempt position.
#[derive(Debug, Clone, PartialEq)]
pub struct OptNode<T> {
    /// Producing rule.
    pub rule_id: RuleId,
    /// Span start (attempt position when absent).
    pub start: Position,
    /// Span end (equals `start` when absent).
    pub end: Position,
    /// The child, if it matched.
    pub value: Option<T>,
}

/// Node for a repetition: children in match order.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatNode<T> {
    /// Producing rule.
    pub rule_id: RuleId,
    /// Span start (attempt position when no child matched).
    pub start: Position,
    /// End of the last child (equals `start` when none matched).
    pub end: Position,
    /// The matched children.
    pub items: Vec<T>,
}

macro_rules! alternatives {
    ($(#[$doc:meta] $name:ident => $(($idx:expr, $var:ident, $ty:ident)),+ ;)+) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, PartialEq)]
            pub enum $name<$($ty),+> {
                $(
                    #[doc = "The alternative at this position matched."]
                    $var($ty),
                )+
            }

            impl<$($ty),+> $name<$($ty),+> {
                /// Zero-based index of the alternative that matched.
                pub fn index(&self) -> usize {
                    match self {
                        $( $name::$var(_) => $idx, )+
                    }
                }
            }
        )+
    };
}

alternatives! {
    /// Winner of a two-way choice.
    Alternative2 => (0, First, A), (1, Second, B);
    /// Winner of a three-way choice.
    Alternative3 => (0, First, A), (1, Second, B), (2, Third, C);
    /// Winner of a four-way choice.
    Alternative4 => (0, First, A), (1, Second, B), (2, Third, C), (3, Fourth, D);
    /// Winner of a five-way choice.
    Alternative5 => (0, First, A), (1, Second, B), (2, Third, C), (3, Fourth, D), (4, Fifth, E);
    /// Winner of a six-way choice.
    Alternative6 => (0, First, A), (1, Second, B), (2, Third, C), (3, Fourth, D), (4, Fifth, E), (5, Sixth, F);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternative_index() {
        let two: Alternative2<u8, &str> = Alternative2::Second("x");
        assert_eq!(two.index(), 1);
        let three: Alternative3<u8, u8, u8> = Alternative3::Third(0);
        assert_eq!(three.index(), 2);
    }

    #[test]
    fn test_failure_display() {
        let failure = ParseFailure::at(Position::new(2, 7));
        assert_eq!(failure.to_string(), "parse failed at line 2, column 7");
    }

    #[test]
    fn test_point_failure() {
        let failure = ParseFailure::at(Position::new(1, 3));
        assert_eq!(failure.start, failure.end);
    }
}
