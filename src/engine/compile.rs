//! Constraint compilation.
//!
//! A [`TokenConstraint`] is compiled into a [`CompiledConstraint`]: a text
//! matcher plus an optional part-of-speech matcher. Compilation happens once
//! per resolve call, before the dictionary scan, and the result is reused for
//! every candidate word. Recompiling inside the scan would mean one regex
//! build per dictionary entry.
//!
//! ## Matching semantics
//!
//! ```text
//! text empty && no POS      -> matches everything
//! text test  (XOR NEGATE)   -> literal equality | anchored regex | lemma regex
//! POS test   (per reading)  -> some reading whose tag match != NEGATE_POS
//!                              (a word without readings never passes)
//! ```
//!
//! Text and regex tests are exact: `dog` does not match `Dog`. The
//! CASE_SENSITIVE flag only matters when comparing back-references.
//!
//! The text test runs first; readings are only looked up when the text test
//! passes or the matcher works on lemmas.

use crate::dictionary::{MorphDictionary, MorphEntry, lemmas_of};
use crate::error::CompileError;
use crate::TokenConstraint;
use regex::Regex;

/// Tag used by rules to mark the last token of a sentence.
pub(crate) const SENT_END_TAG: &str = "SENT_END";

#[derive(Debug, Clone)]
enum TextMatcher {
    Any,
    Literal(String),
    Pattern(Regex),
    /// Matched against the candidate's lemmas instead of its surface form.
    Lemma(Regex),
}

#[derive(Debug, Clone)]
enum PosMatcher {
    Exact(String),
    Pattern(Regex),
}

impl PosMatcher {
    fn is_match(&self, tag: &str) -> bool {
        match self {
            PosMatcher::Exact(expected) => expected == tag,
            PosMatcher::Pattern(re) => re.is_match(tag),
        }
    }
}

/// Reusable matcher for one constraint.
#[derive(Debug, Clone)]
pub(crate) struct CompiledConstraint {
    text: TextMatcher,
    negate: bool,
    pos: Option<PosMatcher>,
    negate_pos: bool,
    sent_end: bool,
}

impl CompiledConstraint {
    /// Compile `constraint`. The dictionary is consulted only for inflected
    /// constraints, whose lemma set is derived from the constraint's text.
    pub(crate) fn compile<D>(constraint: &TokenConstraint, dict: &D) -> Result<Self, CompileError>
    where
        D: MorphDictionary + ?Sized,
    {
        let text = if constraint.text.is_empty() {
            TextMatcher::Any
        } else if constraint.is_inflected() {
            TextMatcher::Lemma(lemma_pattern(constraint, dict)?)
        } else if constraint.is_regex() {
            TextMatcher::Pattern(anchored(&constraint.text)?)
        } else {
            TextMatcher::Literal(constraint.text.clone())
        };

        let (pos, sent_end) = match constraint.pos_tag.as_deref() {
            None => (None, false),
            Some(SENT_END_TAG) => (None, true),
            Some(tag) if constraint.is_pos_regex() => (Some(PosMatcher::Pattern(anchored(tag)?)), false),
            Some(tag) => (Some(PosMatcher::Exact(tag.to_string())), false),
        };

        Ok(CompiledConstraint {
            text,
            negate: constraint.is_negated(),
            pos,
            negate_pos: constraint.is_pos_negated(),
            sent_end,
        })
    }

    /// True when the constraint only holds for the last token of a sentence.
    pub(crate) fn requires_sentence_end(&self) -> bool {
        self.sent_end
    }

    /// Test `word`, looking its readings up in `dict` when needed.
    pub(crate) fn matches<D>(&self, word: &str, dict: &D) -> bool
    where
        D: MorphDictionary + ?Sized,
    {
        self.matches_with(word, || dict.lookup(word))
    }

    /// Test `word` with a caller-supplied source of readings.
    pub(crate) fn matches_with<'e>(&self, word: &str, readings: impl Fn() -> &'e [MorphEntry]) -> bool {
        if matches!(self.text, TextMatcher::Any) && self.pos.is_none() {
            return true;
        }
        self.text_matches(word, &readings) && self.pos_matches(&readings)
    }

    fn text_matches<'e>(&self, word: &str, readings: &impl Fn() -> &'e [MorphEntry]) -> bool {
        let hit = match &self.text {
            TextMatcher::Any => return true,
            TextMatcher::Literal(text) => word == text,
            TextMatcher::Pattern(re) => re.is_match(word),
            TextMatcher::Lemma(re) => readings().iter().any(|entry| re.is_match(&entry.lemma)),
        };
        hit != self.negate
    }

    fn pos_matches<'e>(&self, readings: &impl Fn() -> &'e [MorphEntry]) -> bool {
        let Some(pos) = &self.pos else {
            return true;
        };
        readings().iter().any(|entry| pos.is_match(&entry.tag) != self.negate_pos)
    }
}

/// Check that every regular expression in `constraint` compiles. Does not
/// descend into and-groups or exceptions.
pub(crate) fn validate(constraint: &TokenConstraint) -> Result<(), CompileError> {
    if constraint.is_regex() && !constraint.text.is_empty() {
        anchored(&constraint.text)?;
    }
    if let Some(tag) = constraint.pos_tag.as_deref() {
        if constraint.is_pos_regex() && tag != SENT_END_TAG {
            anchored(tag)?;
        }
    }
    Ok(())
}

/// Compile `pattern` so that it must match the whole input.
pub(crate) fn anchored(pattern: &str) -> Result<Regex, CompileError> {
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|source| CompileError::InvalidRegex { pattern: pattern.to_string(), source })
}

/// Lemma matcher for an inflected constraint.
///
/// A literal, or a regex made only of plain `|` alternatives, is expanded to
/// the dictionary lemmas of each alternative (the alternative itself when the
/// dictionary does not know it). Any other regex is matched against lemmas
/// as written.
fn lemma_pattern<D>(constraint: &TokenConstraint, dict: &D) -> Result<Regex, CompileError>
where
    D: MorphDictionary + ?Sized,
{
    let alternatives: Vec<&str> = if !constraint.is_regex() {
        vec![constraint.text.as_str()]
    } else if let Some(words) = super::classify::plain_alternatives(&constraint.text) {
        words
    } else {
        return anchored(&constraint.text);
    };

    let mut lemmas: Vec<String> = Vec::new();
    for alternative in alternatives {
        let mut found = lemmas_of(dict, alternative);
        if found.is_empty() {
            found.push(alternative.to_string());
        }
        for lemma in found {
            if !lemmas.contains(&lemma) {
                lemmas.push(lemma);
            }
        }
    }

    let joined = lemmas.iter().map(|l| regex::escape(l)).collect::<Vec<_>>().join("|");
    anchored(&joined)
}
