//! Strategy selection.
//!
//! Each token is classified once into the cheapest way of producing a word for
//! it. The checks run in priority order; the first that applies wins:
//!
//! ```text
//! 1. SENT_START flag                        -> SentenceStart (no text)
//! 2. and-group    ─ a conjunct is a literal  -> Literal
//!                 ─ a conjunct is a [set]    -> Punctuation
//!                 ─ otherwise                -> Conjunction (search)
//! 3. reference                              -> BackReference
//! 4. plain literal                          -> Literal
//! 5. bracketed character set                -> Punctuation (first char)
//! 6. a|b|c without regex syntax             -> Disjunction (random pick)
//! 7. anything else                          -> General (search)
//! ```
//!
//! Within an and-group the group members are looked at before the token
//! that owns them.

use crate::{Reference, TokenConstraint};

/// Public label of a [`Strategy`], used in traces and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    SentenceStart,
    Conjunction,
    BackReference,
    Literal,
    Punctuation,
    Disjunction,
    General,
}

impl StrategyKind {
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::SentenceStart => "sentence-start",
            StrategyKind::Conjunction => "conjunction",
            StrategyKind::BackReference => "back-reference",
            StrategyKind::Literal => "literal",
            StrategyKind::Punctuation => "punctuation",
            StrategyKind::Disjunction => "disjunction",
            StrategyKind::General => "general",
        }
    }
}

/// How a token's example is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Strategy<'c> {
    SentenceStart,
    /// Every member must match the same dictionary word. Includes the token
    /// itself as the first member.
    Conjunction(Vec<&'c TokenConstraint>),
    BackReference(Reference),
    Literal(&'c str),
    Punctuation(char),
    Disjunction(Vec<&'c str>),
    General,
}

impl Strategy<'_> {
    pub(crate) fn kind(&self) -> StrategyKind {
        match self {
            Strategy::SentenceStart => StrategyKind::SentenceStart,
            Strategy::Conjunction(_) => StrategyKind::Conjunction,
            Strategy::BackReference(_) => StrategyKind::BackReference,
            Strategy::Literal(_) => StrategyKind::Literal,
            Strategy::Punctuation(_) => StrategyKind::Punctuation,
            Strategy::Disjunction(_) => StrategyKind::Disjunction,
            Strategy::General => StrategyKind::General,
        }
    }
}

pub(crate) fn classify(token: &TokenConstraint) -> Strategy<'_> {
    if token.is_sentence_start() {
        return Strategy::SentenceStart;
    }

    if token.has_and_group() {
        let members: Vec<&TokenConstraint> = token.and_group.iter().chain(std::iter::once(token)).collect();
        for &member in &members {
            if is_plain_literal(member) {
                return Strategy::Literal(&member.text);
            }
            if let Some(c) = punctuation(member) {
                return Strategy::Punctuation(c);
            }
        }
        return Strategy::Conjunction(members);
    }

    if let Some(reference) = token.reference {
        return Strategy::BackReference(reference);
    }
    if is_plain_literal(token) {
        return Strategy::Literal(&token.text);
    }
    if let Some(c) = punctuation(token) {
        return Strategy::Punctuation(c);
    }
    if let Some(alternatives) = disjunction(token) {
        return Strategy::Disjunction(alternatives);
    }
    Strategy::General
}

/// Non-empty, non-regex, non-negated text without exceptions.
fn is_plain_literal(token: &TokenConstraint) -> bool {
    !token.text.is_empty()
        && !token.is_regex()
        && !token.is_negated()
        && token.exceptions.is_empty()
        && token.reference.is_none()
}

/// First character of a bracketed set such as `['"]` or `[.,;:?!]`.
///
/// Ranges (`-`) and negated sets (`[^...]`) are not considered sets of
/// punctuation. A leading backslash escape yields the escaped character.
fn punctuation(token: &TokenConstraint) -> Option<char> {
    if token.pos_tag.is_some() || token.is_negated() {
        return None;
    }
    let caps = regex!(r"^\[([^\-\]\^][^\-]*)\]$").captures(&token.text)?;
    let mut chars = caps.get(1)?.as_str().chars();
    match chars.next()? {
        '\\' => Some(chars.next().unwrap_or('\\')),
        c => Some(c),
    }
}

fn disjunction(token: &TokenConstraint) -> Option<Vec<&str>> {
    let simple = token.is_regex()
        && token.pos_tag.is_none()
        && !token.is_negated()
        && !token.has_and_group()
        && token.exceptions.is_empty()
        && token.reference.is_none()
        && !token.is_sentence_start();
    if !simple {
        return None;
    }
    plain_alternatives(&token.text)
}

/// Split `text` on `|` when every alternative is a plain word.
pub(crate) fn plain_alternatives(text: &str) -> Option<Vec<&str>> {
    if text.is_empty() {
        return None;
    }
    let alternatives: Vec<&str> = text.split('|').collect();
    alternatives.iter().all(|a| !a.is_empty() && is_regex_free(a)).then_some(alternatives)
}

/// True when `text` contains no regular-expression syntax.
fn is_regex_free(text: &str) -> bool {
    !regex!(r"[.^$*+?()\[\]{}\\|]").is_match(text)
}
