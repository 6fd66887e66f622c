//! Structural combinators: choice, sequence, optional, repetition,
//! lookahead and the end-of-input wrapper.
//!
//! Backtracking discipline: a combinator that can consume input before
//! failing holds a checkpoint for the whole attempt and restores the cursor
//! on failure, so callers always observe all-or-nothing behavior. Choice
//! and optional rely on that and take no checkpoint of their own.

use crate::ast::{
    Alternative2, Alternative3, Alternative4, Alternative5, Alternative6, ChoiceNode, OptNode,
    ParseFailure, ParseResult, Parsed, RepeatNode, RuleId, SeqNode,
};
use crate::collision::TokenRegistry;
use crate::grammar_analysis::CycleWalker;
use crate::rule::{skip_whitespace, GrammarNode, Rule, RuleOutput};
use crate::stream::Cursor;

/// Ordered choice over a tuple of alternatives (arity 2 to 6).
///
/// Alternatives are tried in order; the first success wins and is tagged
/// with its index. When every alternative fails, the reported failure is
/// the one observed deepest in the input (ties keep the earliest
/// alternative's report).
#[derive(Debug, Clone)]
pub struct Choice<T> {
    rule_id: RuleId,
    alts: T,
}

/// Builds an ordered choice from a tuple of rules.
pub fn choice<T>(rule_id: RuleId, alts: T) -> Choice<T> {
    Choice { rule_id, alts }
}

/// All-or-nothing sequence over a tuple of rules (arity 2 to 6).
#[derive(Debug, Clone)]
pub struct Seq<T> {
    rule_id: RuleId,
    items: T,
}

/// Builds a sequence from a tuple of rules.
pub fn seq<T>(rule_id: RuleId, items: T) -> Seq<T> {
    Seq { rule_id, items }
}

macro_rules! choice_impls {
    ($( $alt:ident : $( $idx:tt $var:ident $ty:ident ),+ ; )+) => { $(
        impl<$($ty: GrammarNode),+> GrammarNode for Choice<($($ty,)+)> {
            fn rule_id(&self) -> RuleId {
                self.rule_id
            }

            fn rule_name(&self) -> &'static str {
                "choice"
            }

            fn check_cycles(&self, walker: &mut CycleWalker) -> bool {
                let mut ok = true;
                $(
                    {
                        let child = &self.alts.$idx;
                        if walker.enter(child.rule_id(), child.rule_name(), Some($idx)) {
                            ok &= child.check_cycles(walker);
                        } else {
                            ok = false;
                        }
                        walker.leave();
                    }
                )+
                ok
            }

            fn can_accept_empty(&self) -> bool {
                $( self.alts.$idx.can_accept_empty() )||+
            }

            fn register_tokens(&self, registry: &mut TokenRegistry) {
                if !registry.begin_rule(self.rule_id) {
                    return;
                }
                $( self.alts.$idx.register_tokens(registry); )+
                registry.end_rule(self.rule_id);
            }
        }

        impl<$($ty: RuleOutput),+> RuleOutput for Choice<($($ty,)+)> {
            type Ast = ChoiceNode<$alt<$($ty::Ast),+>>;
        }

        impl<Cur: Cursor, $($ty: Rule<Cur>),+> Rule<Cur> for Choice<($($ty,)+)> {
            fn parse(&self, cursor: &mut Cur) -> ParseResult<Self::Ast> {
                let mut deepest: Option<ParseFailure> = None;
                $(
                    match self.alts.$idx.parse(cursor) {
                        Ok(parsed) => {
                            return Ok(Parsed {
                                start: parsed.start,
                                end: parsed.end,
                                ast: ChoiceNode {
                                    rule_id: self.rule_id,
                                    start: parsed.start,
                                    end: parsed.end,
                                    value: $alt::$var(parsed.ast),
                                },
                            });
                        }
                        Err(failure) => {
                            let deeper = deepest
                                .map_or(true, |current| failure.start > current.start);
                            if deeper {
                                deepest = Some(failure);
                            }
                        }
                    }
                )+
                log_debug!("choice {} exhausted its alternatives", self.rule_id);
                Err(deepest.unwrap_or_else(|| ParseFailure::at(cursor.position())))
            }
        }
    )+ }
}

choice_impls! {
    Alternative2: 0 First A, 1 Second B;
    Alternative3: 0 First A, 1 Second B, 2 Third C;
    Alternative4: 0 First A, 1 Second B, 2 Third C, 3 Fourth D;
    Alternative5: 0 First A, 1 Second B, 2 Third C, 3 Fourth D, 4 Fifth E;
    Alternative6: 0 First A, 1 Second B, 2 Third C, 3 Fourth D, 4 Fifth E, 5 Sixth F;
}

macro_rules! seq_impls {
    ($( $( $idx:tt $var:ident $ty:ident ),+ ; )+) => { $(
        impl<$($ty: GrammarNode),+> GrammarNode for Seq<($($ty,)+)> {
            fn rule_id(&self) -> RuleId {
                self.rule_id
            }

            fn rule_name(&self) -> &'static str {
                "sequence"
            }

            fn check_cycles(&self, walker: &mut CycleWalker) -> bool {
                let mut ok = true;
                let mut reachable = true;
                $(
                    if reachable {
                        let child = &self.items.$idx;
                        let clean = walker.enter(child.rule_id(), child.rule_name(), Some($idx))
                            && child.check_cycles(walker);
                        walker.leave();
                        if !clean {
                            // asking a cycling subtree about emptiness would
                            // recurse forever, so stop the walk here
                            ok = false;
                            reachable = false;
                        } else if !child.can_accept_empty() {
                            // terms behind a mandatory match cannot start a
                            // left-recursive re-entry
                            reachable = false;
                        }
                    }
                )+
                let _ = reachable;
                ok
            }

            fn can_accept_empty(&self) -> bool {
                $( self.items.$idx.can_accept_empty() )&&+
            }

            fn register_tokens(&self, registry: &mut TokenRegistry) {
                if !registry.begin_rule(self.rule_id) {
                    return;
                }
                $( self.items.$idx.register_tokens(registry); )+
                registry.end_rule(self.rule_id);
            }
        }

        impl<$($ty: RuleOutput),+> RuleOutput for Seq<($($ty,)+)> {
            type Ast = SeqNode<($($ty::Ast,)+)>;
        }

        impl<Cur: Cursor, $($ty: Rule<Cur>),+> Rule<Cur> for Seq<($($ty,)+)> {
            fn parse(&self, cursor: &mut Cur) -> ParseResult<Self::Ast> {
                let cp = cursor.checkpoint();
                let attempt = cursor.position();
                let mut span = None;
                $(
                    let $var = match self.items.$idx.parse(cursor) {
                        Ok(parsed) => parsed,
                        Err(failure) => {
                            cursor.backtrack(cp);
                            return Err(failure);
                        }
                    };
                    span = Some(match span {
                        Some((start, _)) => (start, $var.end),
                        None => ($var.start, $var.end),
                    });
                )+
                cursor.commit(cp);
                let (start, end) = span.unwrap_or((attempt, attempt));
                Ok(Parsed {
                    start,
                    end,
                    ast: SeqNode {
                        rule_id: self.rule_id,
                        start,
                        end,
                        items: ($($var.ast,)+),
                    },
                })
            }
        }
    )+ }
}

seq_impls! {
    0 a A, 1 b B;
    0 a A, 1 b B, 2 c C;
    0 a A, 1 b B, 2 c C, 3 d D;
    0 a A, 1 b B, 2 c C, 3 d D, 4 e E;
    0 a A, 1 b B, 2 c C, 3 d D, 4 e E, 5 f F;
}

/// Optional rule: succeeds whether or not the inner rule matches.
#[derive(Debug, Clone)]
pub struct Opt<R> {
    rule_id: RuleId,
    inner: R,
}

impl<R> Opt<R> {
    /// Wraps `inner` as optional.
    pub fn new(rule_id: RuleId, inner: R) -> Self {
        Opt { rule_id, inner }
    }
}

impl<R: GrammarNode> GrammarNode for Opt<R> {
    fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    fn rule_name(&self) -> &'static str {
        "optional"
    }

    fn check_cycles(&self, walker: &mut CycleWalker) -> bool {
        let mut ok = walker.enter(self.inner.rule_id(), self.inner.rule_name(), None);
        if ok {
            ok = self.inner.check_cycles(walker);
        }
        walker.leave();
        ok
    }

    fn can_accept_empty(&self) -> bool {
        true
    }

    fn register_tokens(&self, registry: &mut TokenRegistry) {
        if !registry.begin_rule(self.rule_id) {
            return;
        }
        self.inner.register_tokens(registry);
        registry.end_rule(self.rule_id);
    }
}

impl<R: RuleOutput> RuleOutput for Opt<R> {
    type Ast = OptNode<R::Ast>;
}

impl<C: Cursor, R: Rule<C>> Rule<C> for Opt<R> {
    fn parse(&self, cursor: &mut C) -> ParseResult<Self::Ast> {
        let attempt = cursor.position();
        match self.inner.parse(cursor) {
            Ok(parsed) => Ok(Parsed {
                start: parsed.start,
                end: parsed.end,
                ast: OptNode {
                    rule_id: self.rule_id,
                    start: parsed.start,
                    end: parsed.end,
                    value: Some(parsed.ast),
                },
            }),
            // the inner rule restored the cursor; report a zero-width match
            Err(_) => Ok(Parsed {
                start: attempt,
                end: attempt,
                ast: OptNode {
                    rule_id: self.rule_id,
                    start: attempt,
                    end: attempt,
                    value: None,
                },
            }),
        }
    }
}

/// Greedy bounded repetition.
#[derive(Debug, Clone)]
pub struct Repeat<R> {
    rule_id: RuleId,
    inner: R,
    min: u32,
    max: Option<u32>,
}

impl<R> Repeat<R> {
    /// At least `min` and at most `max` matches; `None` means unbounded.
    ///
    /// # Panics
    ///
    /// Panics when `max` is below `min`.
    pub fn new(rule_id: RuleId, inner: R, min: u32, max: Option<u32>) -> Self {
        if let Some(max) = max {
            assert!(max >= min, "repetition upper bound below its minimum");
        }
        Repeat {
            rule_id,
            inner,
            min,
            max,
        }
    }

    /// Zero or more matches.
    pub fn star(rule_id: RuleId, inner: R) -> Self {
        Repeat::new(rule_id, inner, 0, None)
    }

    /// One or more matches.
    pub fn plus(rule_id: RuleId, inner: R) -> Self {
        Repeat::new(rule_id, inner, 1, None)
    }
}

impl<R: GrammarNode> GrammarNode for Repeat<R> {
    fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    fn rule_name(&self) -> &'static str {
        "repeat"
    }

    fn check_cycles(&self, walker: &mut CycleWalker) -> bool {
        let mut ok = walker.enter(self.inner.rule_id(), self.inner.rule_name(), None);
        if ok {
            ok = self.inner.check_cycles(walker);
        }
        walker.leave();
        ok
    }

    fn can_accept_empty(&self) -> bool {
        self.min == 0 || self.inner.can_accept_empty()
    }

    fn register_tokens(&self, registry: &mut TokenRegistry) {
        if !registry.begin_rule(self.rule_id) {
            return;
        }
        self.inner.register_tokens(registry);
        registry.end_rule(self.rule_id);
    }
}

impl<R: RuleOutput> RuleOutput for Repeat<R> {
    type Ast = RepeatNode<R::Ast>;
}

impl<C: Cursor, R: Rule<C>> Rule<C> for Repeat<R> {
    fn parse(&self, cursor: &mut C) -> ParseResult<Self::Ast> {
        let cp = cursor.checkpoint();
        let start = cursor.position();
        let mut items = Vec::new();
        let mut end = start;

        let mut failed = None;
        for _ in 0..self.min {
            match self.inner.parse(cursor) {
                Ok(parsed) => {
                    end = parsed.end;
                    items.push(parsed.ast);
                }
                Err(failure) => {
                    failed = Some(failure);
                    break;
                }
            }
        }
        if let Some(failure) = failed {
            cursor.backtrack(cp);
            return Err(failure);
        }
        cursor.commit(cp);

        loop {
            if let Some(max) = self.max {
                if items.len() as u32 >= max {
                    break;
                }
            }
            let before = cursor.stream_position().offset;
            match self.inner.parse(cursor) {
                Ok(parsed) => {
                    // a zero-width success would repeat forever
                    if cursor.stream_position().offset == before {
                        break;
                    }
                    end = parsed.end;
                    items.push(parsed.ast);
                }
                Err(_) => break,
            }
        }

        log_debug!("repeat {} matched {} item(s)", self.rule_id, items.len());
        Ok(Parsed {
            start,
            end,
            ast: RepeatNode {
                rule_id: self.rule_id,
                start,
                end,
                items,
            },
        })
    }
}

/// A rule guarded by a lookahead.
///
/// The primary rule's match is kept only when the lookahead rule's outcome
/// matches the polarity; the lookahead itself never consumes input. The
/// node and rule id are the primary's, so the guard is transparent in the
/// tree.
#[derive(Debug, Clone)]
pub struct Lookahead<R, L> {
    inner: R,
    look: L,
    positive: bool,
}

impl<R, L> Lookahead<R, L> {
    /// Keeps the match only when `look` matches right after it.
    pub fn positive(inner: R, look: L) -> Self {
        Lookahead {
            inner,
            look,
            positive: true,
        }
    }

    /// Keeps the match only when `look` does not match right after it.
    pub fn negative(inner: R, look: L) -> Self {
        Lookahead {
            inner,
            look,
            positive: false,
        }
    }
}

impl<R: GrammarNode, L: GrammarNode> GrammarNode for Lookahead<R, L> {
    fn rule_id(&self) -> RuleId {
        self.inner.rule_id()
    }

    fn rule_name(&self) -> &'static str {
        "lookahead"
    }

    fn check_cycles(&self, walker: &mut CycleWalker) -> bool {
        // transparent for the primary: this node shares its id
        let mut ok = self.inner.check_cycles(walker);
        if walker.enter(self.look.rule_id(), self.look.rule_name(), None) {
            ok &= self.look.check_cycles(walker);
        } else {
            ok = false;
        }
        walker.leave();
        ok
    }

    fn can_accept_empty(&self) -> bool {
        self.inner.can_accept_empty()
    }

    fn register_tokens(&self, registry: &mut TokenRegistry) {
        self.inner.register_tokens(registry);
        self.look.register_tokens(registry);
    }
}

impl<R: RuleOutput, L> RuleOutput for Lookahead<R, L> {
    type Ast = R::Ast;
}

impl<C, R, L> Rule<C> for Lookahead<R, L>
where
    C: Cursor,
    R: Rule<C>,
    L: Rule<C>,
{
    fn parse(&self, cursor: &mut C) -> ParseResult<R::Ast> {
        let cp = cursor.checkpoint();
        let primary = match self.inner.parse(cursor) {
            Ok(parsed) => parsed,
            Err(failure) => {
                // the primary restored the cursor itself
                cursor.commit(cp);
                return Err(failure);
            }
        };

        let look_cp = cursor.checkpoint();
        let look_result = self.look.parse(cursor);
        let satisfied = look_result.is_ok() == self.positive;
        if satisfied {
            // drop whatever the lookahead consumed, keep the primary
            cursor.backtrack(look_cp);
            cursor.commit(cp);
            Ok(primary)
        } else {
            let failure = match look_result {
                Ok(parsed) => ParseFailure {
                    start: parsed.start,
                    end: parsed.end,
                },
                Err(failure) => failure,
            };
            cursor.backtrack(look_cp);
            cursor.backtrack(cp);
            Err(failure)
        }
    }
}

/// Top-level wrapper: the inner rule must consume the whole input.
///
/// Before parsing it builds the token collision registry from the
/// grammar's literals and installs it on the cursor; after a successful
/// inner match it skips trailing whitespace and fails at the cursor if
/// input remains. On that trailing-input failure the cursor is restored
/// to where the attempt began, same as any other failing rule.
#[derive(Debug, Clone)]
pub struct Complete<R> {
    inner: R,
}

impl<R> Complete<R> {
    /// Wraps a grammar's root rule.
    pub fn new(inner: R) -> Self {
        Complete { inner }
    }
}

impl<R: GrammarNode> GrammarNode for Complete<R> {
    fn rule_id(&self) -> RuleId {
        self.inner.rule_id()
    }

    fn rule_name(&self) -> &'static str {
        "complete"
    }

    fn check_cycles(&self, walker: &mut CycleWalker) -> bool {
        self.inner.check_cycles(walker)
    }

    fn can_accept_empty(&self) -> bool {
        false
    }

    fn register_tokens(&self, registry: &mut TokenRegistry) {
        self.inner.register_tokens(registry);
    }
}

impl<R: RuleOutput> RuleOutput for Complete<R> {
    type Ast = R::Ast;
}

impl<C: Cursor, R: Rule<C>> Rule<C> for Complete<R> {
    fn parse(&self, cursor: &mut C) -> ParseResult<R::Ast> {
        let mut registry = TokenRegistry::new();
        self.inner.register_tokens(&mut registry);
        cursor.install_token_registry(registry);

        let cp = cursor.checkpoint();
        let result = self.inner.parse(cursor);
        cursor.remove_token_registry();
        let parsed = match result {
            Ok(parsed) => parsed,
            Err(failure) => {
                // the inner rule already restored the cursor
                cursor.commit(cp);
                return Err(failure);
            }
        };

        skip_whitespace(cursor);
        if cursor.current_char().is_some() {
            let failure = ParseFailure::at(cursor.position());
            cursor.backtrack(cp);
            return Err(failure);
        }
        cursor.commit(cp);
        Ok(parsed)
    }
}
