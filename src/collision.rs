//! Token collision registry.
//!
//! Grammars mixing literal keywords with classifier tokens (identifiers in
//! particular) need the classifier side to reject text that is really a
//! keyword. Before a top-level parse starts, every literal in the grammar is
//! registered here; a collision-checked classifier token then fails whenever
//! its matched text equals a registered literal.
//!
//! Lookup hashes with djb2 and keeps a multimap from hash to token texts.
//! Hash equality is never trusted on its own; entries sharing a hash are
//! compared byte for byte.

use crate::ast::RuleId;
use ahash::RandomState;
use hashbrown::{HashMap, HashSet};

/// Hash values used by the registry.
pub type TokenHash = u64;

/// djb2 seed.
pub const TOKEN_HASH_SEED: TokenHash = 5381;

/// djb2: `hash * 33 + byte` over every byte, starting from
/// [`TOKEN_HASH_SEED`].
pub fn hash_token(text: &[u8]) -> TokenHash {
    let mut hash = TOKEN_HASH_SEED;
    for &byte in text {
        hash = ((hash << 5).wrapping_add(hash)).wrapping_add(byte as TokenHash);
    }
    hash
}

/// Registered literal tokens, with a re-entry guard for grammar walks.
///
/// The guard set makes registration of diamond-shaped or recursive grammars
/// terminate: a rule id already being registered is skipped.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: HashMap<TokenHash, Vec<Box<[u8]>>, RandomState>,
    registering: HashSet<RuleId, RandomState>,
}

impl TokenRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        TokenRegistry::default()
    }

    /// Registers a literal token. Registering the same text twice is a
    /// no-op.
    pub fn insert(&mut self, text: &[u8]) {
        let hash = hash_token(text);
        let entries = self.tokens.entry(hash).or_default();
        if entries.iter().any(|entry| entry.as_ref() == text) {
            return;
        }
        entries.push(text.into());
    }

    /// True when `text` equals a registered literal.
    pub fn has_token(&self, text: &[u8]) -> bool {
        match self.tokens.get(&hash_token(text)) {
            Some(entries) => entries.iter().any(|entry| entry.as_ref() == text),
            None => false,
        }
    }

    /// Number of distinct registered literals.
    pub fn len(&self) -> usize {
        self.tokens.values().map(Vec::len).sum()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Marks `rule_id` as being registered. Returns false when the rule is
    /// already in progress, in which case the caller must not descend into
    /// it again.
    pub fn begin_rule(&mut self, rule_id: RuleId) -> bool {
        self.registering.insert(rule_id)
    }

    /// Clears the in-progress mark for `rule_id`.
    pub fn end_rule(&mut self, rule_id: RuleId) {
        self.registering.remove(&rule_id);
    }
}
