//! The rule traits every combinator implements.
//!
//! [`Rule`] is the parsing surface: feed it a [`Cursor`] and get a
//! [`ParseResult`]. [`GrammarNode`] is the object-safe analysis surface the
//! static checks walk (cycle detection, empty acceptance, token
//! registration); it is deliberately independent of the cursor type so the
//! analyzer needs no stream to run.
//!
//! [`Recursive`] is the indirection cell that ties mutually recursive
//! grammars together: declare it, reference it from other rules, then
//! define its body once the body can be built.

use crate::ast::{ParseResult, Parsed, RuleId};
use crate::collision::TokenRegistry;
use crate::combinator::{Complete, Lookahead, Opt, Repeat};
use crate::grammar_analysis::CycleWalker;
use crate::stream::Cursor;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

/// The analysis surface of a rule, independent of any cursor type.
pub trait GrammarNode {
    /// Stable identity tag of this rule.
    fn rule_id(&self) -> RuleId;

    /// Kind name used in diagnostics ("choice", "sequence", ...).
    fn rule_name(&self) -> &'static str;

    /// Walks sub-rules looking for left recursion. Implementations pair
    /// every [`CycleWalker::enter`] with a [`CycleWalker::leave`] and stop
    /// descending on a branch once `enter` reports a repeat. Returns
    /// whether the subtree is cycle free.
    fn check_cycles(&self, walker: &mut CycleWalker) -> bool;

    /// Whether this rule can succeed without consuming input.
    fn can_accept_empty(&self) -> bool;

    /// Registers literal token texts for collision checking. Container
    /// rules guard the descent with
    /// [`TokenRegistry::begin_rule`]/[`TokenRegistry::end_rule`] so
    /// recursive grammars terminate.
    fn register_tokens(&self, registry: &mut TokenRegistry);
}

/// Associates a rule with the node type it produces.
///
/// Kept separate from [`Rule`] so adapters like [`RuleExt::map`] resolve
/// without naming a cursor type.
pub trait RuleOutput {
    /// The node a successful match produces.
    type Ast;
}

/// A parsing rule over cursors of type `C`.
pub trait Rule<C: Cursor>: GrammarNode + RuleOutput {
    /// Attempts to match at the cursor. On failure the cursor is restored
    /// to where the attempt began.
    fn parse(&self, cursor: &mut C) -> ParseResult<Self::Ast>;
}

/// Consumes ASCII whitespace at the cursor. Token rules call this before
/// matching; [`Complete`] calls it before asserting end of input.
pub fn skip_whitespace<C: Cursor>(cursor: &mut C) {
    while let Some(ch) = cursor.current_char() {
        if !ch.is_ascii_whitespace() {
            break;
        }
        let _ = cursor.next_char();
    }
}

/// A deferred-binding rule for recursive grammars.
///
/// Cloning shares the binding: every clone parses with the body given to
/// [`define`](Self::define), no matter when it was cloned. Parsing through
/// a cell that was never defined is a host bug and panics.
pub struct Recursive<C: Cursor + 'static, A: 'static> {
    rule_id: RuleId,
    cell: Rc<RefCell<Option<Rc<dyn Rule<C, Ast = A>>>>>,
}

impl<C: Cursor + 'static, A: 'static> Clone for Recursive<C, A> {
    fn clone(&self) -> Self {
        Recursive {
            rule_id: self.rule_id,
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<C: Cursor + 'static, A: 'static> Recursive<C, A> {
    /// Declares a rule whose body will be supplied later.
    pub fn declare(rule_id: RuleId) -> Self {
        Recursive {
            rule_id,
            cell: Rc::new(RefCell::new(None)),
        }
    }

    /// Binds the body. Later definitions replace earlier ones.
    pub fn define<R>(&self, rule: R)
    where
        R: Rule<C, Ast = A> + 'static,
    {
        *self.cell.borrow_mut() = Some(Rc::new(rule));
    }
}

impl<C: Cursor + 'static, A: 'static> GrammarNode for Recursive<C, A> {
    fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    fn rule_name(&self) -> &'static str {
        "recursive"
    }

    fn check_cycles(&self, walker: &mut CycleWalker) -> bool {
        // transparent: the cell shares its identity with its body, whose
        // own frame the parent already entered
        match self.cell.borrow().as_ref() {
            Some(rule) => rule.check_cycles(walker),
            // nothing to walk; parsing an unbound cell fails loudly anyway
            None => true,
        }
    }

    fn can_accept_empty(&self) -> bool {
        match self.cell.borrow().as_ref() {
            Some(rule) => rule.can_accept_empty(),
            None => false,
        }
    }

    fn register_tokens(&self, registry: &mut TokenRegistry) {
        // container bodies guard their own descent, which is what makes
        // recursive registration terminate
        if let Some(rule) = self.cell.borrow().as_ref() {
            rule.register_tokens(registry);
        }
    }
}

impl<C: Cursor + 'static, A: 'static> RuleOutput for Recursive<C, A> {
    type Ast = A;
}

impl<C: Cursor + 'static, A: 'static> Rule<C> for Recursive<C, A> {
    fn parse(&self, cursor: &mut C) -> ParseResult<A> {
        match self.cell.borrow().as_ref() {
            Some(rule) => rule.parse(cursor),
            None => panic!(
                "recursive rule {} parsed before define(); the grammar is incomplete",
                self.rule_id
            ),
        }
    }
}

/// Applies a function to the node of an inner rule. Built with
/// [`RuleExt::map`]; transparent to analysis.
#[derive(Clone)]
pub struct Map<R, F, B> {
    inner: R,
    f: F,
    _out: PhantomData<fn() -> B>,
}

impl<R: GrammarNode, F, B> GrammarNode for Map<R, F, B> {
    fn rule_id(&self) -> RuleId {
        self.inner.rule_id()
    }

    fn rule_name(&self) -> &'static str {
        self.inner.rule_name()
    }

    fn check_cycles(&self, walker: &mut CycleWalker) -> bool {
        self.inner.check_cycles(walker)
    }

    fn can_accept_empty(&self) -> bool {
        self.inner.can_accept_empty()
    }

    fn register_tokens(&self, registry: &mut TokenRegistry) {
        self.inner.register_tokens(registry);
    }
}

impl<R: RuleOutput, F, B> RuleOutput for Map<R, F, B> {
    type Ast = B;
}

impl<C, R, F, B> Rule<C> for Map<R, F, B>
where
    C: Cursor,
    R: Rule<C>,
    F: Fn(R::Ast) -> B,
{
    fn parse(&self, cursor: &mut C) -> ParseResult<B> {
        let matched = self.inner.parse(cursor)?;
        Ok(Parsed {
            start: matched.start,
            end: matched.end,
            ast: (self.f)(matched.ast),
        })
    }
}

/// Builder-style adapters available on every rule.
pub trait RuleExt: RuleOutput + Sized {
    /// Transforms the produced node, leaving the match itself untouched.
    fn map<B, F>(self, f: F) -> Map<Self, F, B>
    where
        F: Fn(Self::Ast) -> B,
    {
        Map {
            inner: self,
            f,
            _out: PhantomData,
        }
    }

    /// Makes this rule optional; the optional never fails.
    fn opt(self, rule_id: RuleId) -> Opt<Self> {
        Opt::new(rule_id, self)
    }

    /// Zero-or-more repetitions.
    fn star(self, rule_id: RuleId) -> Repeat<Self> {
        Repeat::star(rule_id, self)
    }

    /// One-or-more repetitions.
    fn plus(self, rule_id: RuleId) -> Repeat<Self> {
        Repeat::plus(rule_id, self)
    }

    /// Bounded repetition: at least `min`, at most `max` (None for
    /// unbounded).
    fn repeat(self, rule_id: RuleId, min: u32, max: Option<u32>) -> Repeat<Self> {
        Repeat::new(rule_id, self, min, max)
    }

    /// Keeps this rule's match only if `look` also matches right after it;
    /// `look` consumes nothing.
    fn and_ahead<L>(self, look: L) -> Lookahead<Self, L> {
        Lookahead::positive(self, look)
    }

    /// Keeps this rule's match only if `look` does not match right after
    /// it.
    fn not_ahead<L>(self, look: L) -> Lookahead<Self, L> {
        Lookahead::negative(self, look)
    }

    /// Requires this rule to consume the whole input (modulo trailing
    /// whitespace) and arms token collision checking.
    fn complete(self) -> Complete<Self> {
        Complete::new(self)
    }
}

impl<R: RuleOutput> RuleExt for R {}
