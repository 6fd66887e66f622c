//! Static grammar analysis: left-recursion detection.
//!
//! A PEG rule that can re-enter itself without consuming input loops
//! forever at parse time. [`verify_grammar`] walks the rule graph
//! depth-first before parsing and reports every such cycle, including the
//! complete path that closes it.
//!
//! The walk keeps a stack of [`Frame`]s. Entering a rule whose id is
//! already on the stack records a [`RecursionCycle`] and halts that branch.
//! Sequence-shaped rules only continue the walk past a sub-term when that
//! sub-term can accept empty input; anything behind a mandatory token
//! cannot be reached at position zero and is not a left-recursion hazard.
//!
//! Rule identity is the rule id tag, so grammars being analyzed must give
//! every rule a distinct id.

use crate::ast::RuleId;
use crate::rule::GrammarNode;
use std::fmt;

/// One step of the analysis walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Id of the rule entered at this step.
    pub rule_id: RuleId,
    /// Kind name of the rule ("choice", "sequence", ...).
    pub rule_name: &'static str,
    /// Index of the sub-term that led here, when the parent is positional.
    pub subterm: Option<usize>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (rule {})", self.rule_name, self.rule_id)?;
        if let Some(subterm) = self.subterm {
            write!(f, " [term {}]", subterm)?;
        }
        Ok(())
    }
}

/// A left-recursion cycle: the frames from the first occurrence of the
/// repeated rule down to its re-entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursionCycle {
    /// The closing path; first and last frame share a rule id.
    pub path: Vec<Frame>,
}

impl fmt::Display for RecursionCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left recursion cycle: ")?;
        for (i, frame) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", frame)?;
        }
        Ok(())
    }
}

/// Depth-first walk state shared by every rule's
/// [`check_cycles`](GrammarNode::check_cycles).
#[derive(Debug, Default)]
pub struct CycleWalker {
    stack: Vec<Frame>,
    cycles: Vec<RecursionCycle>,
}

impl CycleWalker {
    /// An empty walker.
    pub fn new() -> Self {
        CycleWalker::default()
    }

    /// Pushes a frame for the rule being entered. Returns false when the
    /// rule id is already on the stack; the cycle is recorded and the
    /// caller must not descend further on this branch. Every `enter` must
    /// be paired with a [`leave`](Self::leave).
    pub fn enter(
        &mut self,
        rule_id: RuleId,
        rule_name: &'static str,
        subterm: Option<usize>,
    ) -> bool {
        let repeat = self.stack.iter().position(|frame| frame.rule_id == rule_id);
        self.stack.push(Frame {
            rule_id,
            rule_name,
            subterm,
        });
        if let Some(first) = repeat {
            self.cycles.push(RecursionCycle {
                path: self.stack[first..].to_vec(),
            });
            return false;
        }
        true
    }

    /// Pops the frame pushed by the matching [`enter`](Self::enter).
    pub fn leave(&mut self) {
        debug_assert!(!self.stack.is_empty(), "leave without a matching enter");
        self.stack.pop();
    }

    /// Cycles recorded so far.
    pub fn cycles(&self) -> &[RecursionCycle] {
        &self.cycles
    }

    /// Consumes the walker, yielding the recorded cycles.
    pub fn into_cycles(self) -> Vec<RecursionCycle> {
        self.cycles
    }
}

/// Checks a grammar for left recursion starting at `root`.
///
/// Returns every cycle found; an empty `Ok` means the grammar is safe to
/// parse. Requires distinct rule ids across the grammar, since ids are what
/// identify rules during the walk.
pub fn verify_grammar<N: GrammarNode + ?Sized>(root: &N) -> Result<(), Vec<RecursionCycle>> {
    let mut walker = CycleWalker::new();
    let ok = if walker.enter(root.rule_id(), root.rule_name(), None) {
        root.check_cycles(&mut walker)
    } else {
        false
    };
    walker.leave();
    let cycles = walker.into_cycles();
    if ok && cycles.is_empty() {
        Ok(())
    } else {
        Err(cycles)
    }
}
