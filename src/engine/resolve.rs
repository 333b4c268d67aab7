//! Token example resolution.
//!
//! Turns one token (already classified, see `classify.rs`) into one word.
//!
//! ```text
//! Strategy ──┬─ SentenceStart   -> ""
//!            ├─ Literal         -> the literal
//!            ├─ Punctuation     -> the first character of the set
//!            ├─ Disjunction     -> one alternative, chosen by the session rng
//!            ├─ BackReference   -> earlier example (case-converted); searched
//!            │                     for a different word when negated
//!            ├─ Conjunction     -> search: every member matches the word
//!            └─ General         -> search: the token matches the word
//! ```
//!
//! A search compiles all matchers and the merged exception list (own
//! exceptions plus those inherited from the next token) before the scan
//! starts. `None` means no word was found within the pass limit, or the
//! referenced token itself has no example.

use super::classify::Strategy;
use super::compile::CompiledConstraint;
use super::exceptions::CompiledExceptions;
use super::search::{DictionaryCursor, SearchPolicy, SearchStats, find_word};
use crate::dictionary::MorphDictionary;
use crate::{ConstraintFlags, Reference, TokenConstraint};
use rand::Rng;
use rand::seq::SliceRandom;
use std::borrow::Cow;

/// Borrowed view of a synthesis session, scoped to a single token.
pub(crate) struct TokenResolver<'s, D: ?Sized, R: ?Sized> {
    dict: &'s D,
    cursor: &'s mut DictionaryCursor,
    rng: &'s mut R,
    policy: SearchPolicy,
    pub(crate) stats: SearchStats,
}

impl<'s, D, R> TokenResolver<'s, D, R>
where
    D: MorphDictionary + ?Sized,
    R: Rng + ?Sized,
{
    pub(crate) fn new(dict: &'s D, cursor: &'s mut DictionaryCursor, rng: &'s mut R, policy: SearchPolicy) -> Self {
        TokenResolver { dict, cursor, rng, policy, stats: SearchStats::default() }
    }

    pub(crate) fn resolve(
        &mut self,
        token: &TokenConstraint,
        strategy: &Strategy<'_>,
        inherited: &[TokenConstraint],
        prior_tokens: &[TokenConstraint],
        prior_examples: &[Option<String>],
    ) -> Option<String> {
        match strategy {
            Strategy::SentenceStart => Some(String::new()),
            Strategy::Literal(text) => Some(text.to_string()),
            Strategy::Punctuation(c) => Some(c.to_string()),
            Strategy::Disjunction(alternatives) => alternatives.choose(&mut *self.rng).map(|a| a.to_string()),
            Strategy::BackReference(reference) => {
                let effective = dereference(token, *reference, prior_tokens, prior_examples)?;
                if effective.is_negated() {
                    self.search(&[&effective], inherited)
                } else {
                    Some(effective.text)
                }
            }
            Strategy::Conjunction(members) => {
                let mut resolved: Vec<Cow<'_, TokenConstraint>> = Vec::with_capacity(members.len());
                for member in members {
                    match member.reference {
                        Some(reference) => {
                            resolved.push(Cow::Owned(dereference(member, reference, prior_tokens, prior_examples)?))
                        }
                        None => resolved.push(Cow::Borrowed(*member)),
                    }
                }
                let refs: Vec<&TokenConstraint> = resolved.iter().map(|c| c.as_ref()).collect();
                self.search(&refs, inherited)
            }
            Strategy::General => self.search(&[token], inherited),
        }
    }

    /// Scan the dictionary for a word every member accepts and no exception
    /// (own or inherited) rejects.
    fn search(&mut self, members: &[&TokenConstraint], inherited: &[TokenConstraint]) -> Option<String> {
        let dict = self.dict;

        let matchers = match members.iter().map(|m| CompiledConstraint::compile(m, dict)).collect::<Result<Vec<_>, _>>()
        {
            Ok(matchers) => matchers,
            Err(err) => {
                tracing::warn!(error = %err, "token pattern does not compile; no example");
                return None;
            }
        };
        let own = members.iter().flat_map(|m| m.exceptions.iter());
        let exceptions = match CompiledExceptions::compile(own.chain(inherited.iter()), dict) {
            Ok(exceptions) => exceptions,
            Err(err) => {
                tracing::warn!(error = %err, "exception pattern does not compile; no example");
                return None;
            }
        };
        tracing::trace!(members = matchers.len(), exceptions = exceptions.len(), "searching dictionary");

        find_word(dict, &mut *self.cursor, self.policy, &mut self.stats, |word| {
            matchers.iter().all(|m| m.matches(word, dict)) && !exceptions.is_excepted(word, dict)
        })
    }
}

/// Replace a back-reference by the text produced for the referenced token.
///
/// The result is a non-regex literal carrying the referencing token's own
/// negation, tag and exceptions, and the referenced token's case sensitivity.
fn dereference(
    token: &TokenConstraint,
    reference: Reference,
    prior_tokens: &[TokenConstraint],
    prior_examples: &[Option<String>],
) -> Option<TokenConstraint> {
    let Some(produced) = prior_examples.get(reference.index).and_then(|e| e.as_deref()) else {
        tracing::debug!(target_index = reference.index, "referenced token has no example");
        return None;
    };
    let referenced = prior_tokens.get(reference.index)?;

    let kept = ConstraintFlags::NEGATE | ConstraintFlags::NEGATE_POS | ConstraintFlags::POS_REGEX;
    let mut flags = token.flags & kept;
    if referenced.is_case_sensitive() {
        flags |= ConstraintFlags::CASE_SENSITIVE;
    }

    Some(TokenConstraint {
        text: reference.conversion.apply(produced),
        pos_tag: token.pos_tag.clone(),
        flags,
        and_group: Vec::new(),
        exceptions: token.exceptions.clone(),
        previous_exceptions: Vec::new(),
        reference: None,
    })
}
