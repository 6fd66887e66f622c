//! Token-level matchers: literals and classifier-driven tokens.
//!
//! Both matcher kinds skip leading ASCII whitespace, hold a checkpoint for
//! the whole attempt and restore the cursor on every failure path. Spans
//! cover the token text only, never the skipped whitespace; `end` is the
//! position of the last matched character.

use crate::ast::{Leaf, ParseFailure, ParseResult, Parsed, RuleId, Token};
use crate::collision::TokenRegistry;
use crate::grammar_analysis::CycleWalker;
use crate::rule::{skip_whitespace, GrammarNode, Rule, RuleOutput};
use crate::stream::Cursor;

/// Verdict of a [`Classifier`] for one input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierResult {
    /// Append the byte to the token and continue with the next one.
    Proceed,
    /// The token cannot match; fail at the current position.
    Error,
    /// Append the byte and finalize the token.
    AcceptNow,
    /// Finalize the token without consuming the byte (pushback).
    AcceptUnget,
}

/// Character classifier driving a [`TokenFn`].
///
/// Called with the byte under the cursor (0 when `at_eof` is true), the
/// end-of-input flag, and the raw bytes gathered so far. Gathering is
/// byte-for-byte, so collision checks compare the exact input bytes against
/// registered literals; bytes outside ASCII reach the classifier unchanged.
/// When `at_eof` is set the classifier must finalize or fail; answering
/// [`ClassifierResult::Proceed`] at end of input is a contract violation,
/// reported and treated as a parse failure.
pub type Classifier = fn(byte: u8, at_eof: bool, matched: &[u8]) -> ClassifierResult;

/// A literal token: matches exactly `text` after optional whitespace.
#[derive(Debug, Clone, Copy)]
pub struct Lit {
    rule_id: RuleId,
    text: &'static str,
}

impl Lit {
    /// Creates a literal token rule.
    ///
    /// # Panics
    ///
    /// Panics on an empty literal; an empty token would match everywhere
    /// and register a meaningless collision entry.
    pub fn new(rule_id: RuleId, text: &'static str) -> Self {
        assert!(!text.is_empty(), "literal tokens must not be empty");
        Lit { rule_id, text }
    }

    /// The literal text this rule matches.
    pub fn text(&self) -> &'static str {
        self.text
    }
}

/// Shorthand for [`Lit::new`].
pub fn lit(rule_id: RuleId, text: &'static str) -> Lit {
    Lit::new(rule_id, text)
}

impl GrammarNode for Lit {
    fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    fn rule_name(&self) -> &'static str {
        "literal"
    }

    fn check_cycles(&self, _walker: &mut CycleWalker) -> bool {
        true
    }

    fn can_accept_empty(&self) -> bool {
        false
    }

    fn register_tokens(&self, registry: &mut TokenRegistry) {
        registry.insert(self.text.as_bytes());
    }
}

impl RuleOutput for Lit {
    type Ast = Leaf;
}

impl<C: Cursor> Rule<C> for Lit {
    fn parse(&self, cursor: &mut C) -> ParseResult<Leaf> {
        let cp = cursor.checkpoint();
        skip_whitespace(cursor);
        let token_start = cursor.position();
        let mut last = token_start;

        let mut matched = true;
        for expected in self.text.bytes() {
            let at = cursor.position();
            match cursor.next_char() {
                Some(ch) if ch == expected => last = at,
                _ => {
                    matched = false;
                    break;
                }
            }
        }
        if !matched {
            cursor.backtrack(cp);
            return Err(ParseFailure::at(token_start));
        }

        cursor.commit(cp);
        log_debug!("literal {:?} matched at {}", self.text, token_start);
        Ok(Parsed {
            start: token_start,
            end: last,
            ast: Leaf {
                rule_id: self.rule_id,
                start: token_start,
                end: last,
                text: self.text,
            },
        })
    }
}

/// A classifier-driven token: gathers bytes while its [`Classifier`] says
/// [`Proceed`](ClassifierResult::Proceed).
#[derive(Debug, Clone, Copy)]
pub struct TokenFn {
    rule_id: RuleId,
    classifier: Classifier,
    accepts_empty: bool,
    check_collisions: bool,
}

impl TokenFn {
    /// Creates a classifier token rule.
    pub fn new(rule_id: RuleId, classifier: Classifier) -> Self {
        TokenFn {
            rule_id,
            classifier,
            accepts_empty: false,
            check_collisions: false,
        }
    }

    /// Declares that the classifier may finalize an empty token. This only
    /// informs grammar analysis; the classifier itself decides at runtime.
    pub fn with_accepts_empty(mut self) -> Self {
        self.accepts_empty = true;
        self
    }

    /// Rejects matches whose text equals a registered literal token.
    pub fn with_collision_check(mut self) -> Self {
        self.check_collisions = true;
        self
    }
}

/// Shorthand for [`TokenFn::new`].
pub fn token_fn(rule_id: RuleId, classifier: Classifier) -> TokenFn {
    TokenFn::new(rule_id, classifier)
}

impl GrammarNode for TokenFn {
    fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    fn rule_name(&self) -> &'static str {
        "token"
    }

    fn check_cycles(&self, _walker: &mut CycleWalker) -> bool {
        true
    }

    fn can_accept_empty(&self) -> bool {
        self.accepts_empty
    }

    fn register_tokens(&self, _registry: &mut TokenRegistry) {}
}

impl RuleOutput for TokenFn {
    type Ast = Token;
}

impl<C: Cursor> Rule<C> for TokenFn {
    fn parse(&self, cursor: &mut C) -> ParseResult<Token> {
        let cp = cursor.checkpoint();
        skip_whitespace(cursor);
        let token_start = cursor.position();
        let mut text: Vec<u8> = Vec::new();
        // position of the last byte appended to `text`
        let mut last = token_start;

        let end = loop {
            match cursor.current_char() {
                Some(ch) => {
                    let at = cursor.position();
                    match (self.classifier)(ch, false, &text) {
                        ClassifierResult::Proceed => {
                            text.push(ch);
                            let _ = cursor.next_char();
                            last = at;
                        }
                        ClassifierResult::Error => {
                            let pos = cursor.position();
                            cursor.backtrack(cp);
                            return Err(ParseFailure::at(pos));
                        }
                        ClassifierResult::AcceptNow => {
                            text.push(ch);
                            let _ = cursor.next_char();
                            break at;
                        }
                        ClassifierResult::AcceptUnget => {
                            break if text.is_empty() { token_start } else { last };
                        }
                    }
                }
                None => match (self.classifier)(0, true, &text) {
                    // nothing can be consumed at end of input; both accept
                    // verdicts finalize what was gathered
                    ClassifierResult::AcceptNow | ClassifierResult::AcceptUnget => {
                        break if text.is_empty() { token_start } else { last };
                    }
                    ClassifierResult::Error => {
                        let pos = cursor.position();
                        cursor.backtrack(cp);
                        return Err(ParseFailure::at(pos));
                    }
                    ClassifierResult::Proceed => {
                        log_error!(
                            "classifier for rule {} answered Proceed at end of input",
                            self.rule_id
                        );
                        let pos = cursor.position();
                        cursor.backtrack(cp);
                        return Err(ParseFailure::at(pos));
                    }
                },
            }
        };

        if self.check_collisions {
            let collided = cursor
                .token_registry()
                .map_or(false, |registry| registry.has_token(&text));
            if collided {
                log_debug!("token {:?} collides with a registered literal", text);
                cursor.backtrack(cp);
                return Err(ParseFailure::at(token_start));
            }
        }

        cursor.commit(cp);
        let text = String::from_utf8_lossy(&text).into_owned();
        log_debug!("token rule {} gathered {:?}", self.rule_id, text);
        Ok(Parsed {
            start: token_start,
            end,
            ast: Token {
                rule_id: self.rule_id,
                start: token_start,
                end,
                text,
            },
        })
    }
}

fn digit_run(byte: u8, at_eof: bool, matched: &[u8]) -> ClassifierResult {
    if !at_eof && byte.is_ascii_digit() {
        return ClassifierResult::Proceed;
    }
    if matched.is_empty() {
        ClassifierResult::Error
    } else {
        ClassifierResult::AcceptUnget
    }
}

fn single_printable(byte: u8, at_eof: bool, matched: &[u8]) -> ClassifierResult {
    if !at_eof && matched.is_empty() && byte.is_ascii_graphic() {
        ClassifierResult::AcceptNow
    } else {
        ClassifierResult::Error
    }
}

fn identifier_chars(byte: u8, at_eof: bool, matched: &[u8]) -> ClassifierResult {
    if !at_eof {
        let ok = if matched.is_empty() {
            byte.is_ascii_alphabetic() || byte == b'_'
        } else {
            byte.is_ascii_alphanumeric() || byte == b'_'
        };
        if ok {
            return ClassifierResult::Proceed;
        }
    }
    if matched.is_empty() {
        ClassifierResult::Error
    } else {
        ClassifierResult::AcceptUnget
    }
}

/// One-or-more ASCII digits.
pub fn digits(rule_id: RuleId) -> TokenFn {
    TokenFn::new(rule_id, digit_run)
}

/// A single printable (non-whitespace) character. Collision checked, so a
/// registered one-byte literal cannot be shadowed.
pub fn printable_char(rule_id: RuleId) -> TokenFn {
    TokenFn::new(rule_id, single_printable).with_collision_check()
}

/// A C-style identifier: `[A-Za-z_][A-Za-z0-9_]*`. Collision checked, so
/// registered keywords are rejected.
pub fn identifier(rule_id: RuleId) -> TokenFn {
    TokenFn::new(rule_id, identifier_chars).with_collision_check()
}
