//! Rule coverage for declarative grammar pattern rules.
//!
//! Given a [`PatternRule`] (an ordered sequence of [`TokenConstraint`]s), the
//! engine synthesizes a concrete sentence that satisfies every constraint,
//! searching a [`MorphDictionary`] where a constraint cannot be answered
//! directly. The sentence is then fed to a [`Checker`] to find out which
//! existing rules already fire on it.
//!
//! ```
//! use rulecov::dictionary::WordList;
//! use rulecov::{Options, PatternRule, Synthesizer, TokenConstraint};
//!
//! let mut dict = WordList::new();
//! dict.insert("big", "big", "JJ");
//! dict.insert("dog", "dog", "NN");
//!
//! let rule = PatternRule::new(
//!     "BIG_DOG",
//!     vec![TokenConstraint::any().with_pos("NN").negated_pos(), TokenConstraint::word("dog")],
//! );
//!
//! let mut synth = Synthesizer::with_options(dict, &Options::default());
//! assert_eq!(synth.synthesize(&rule).sentence, "big dog");
//! ```

#[macro_use]
mod macros;
mod api;
pub mod checker;
pub mod coverage;
pub mod dictionary;
mod engine;
mod error;
pub mod rules;

#[cfg(test)]
mod testing;

pub use api::{
    DEFAULT_MAX_PASSES, Options, SynthesisDetails, SynthesizedExample, TokenSummary, synthesize, synthesize_with,
};
pub use checker::{Checker, PatternChecker, RuleMatch};
pub use coverage::{CoverageReporter, CoverageResult, RuleCoverage, SplitReport};
pub use dictionary::{MorphDictionary, MorphEntry, WordList};
pub use engine::{DictionaryCursor, SearchPolicy, StrategyKind, Synthesizer};
pub use error::{CompileError, CoverageError, DictionaryError, RuleSourceError};
pub use rules::RuleSet;

// --- Token constraints --------------------------------------------------------

bitflags::bitflags! {
    /// Boolean switches of a [`TokenConstraint`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConstraintFlags: u16 {
        /// `text` is a regular expression rather than a literal.
        const REGEX          = 1 << 0;
        /// `pos_tag` is a regular expression rather than a literal tag.
        const POS_REGEX      = 1 << 1;
        /// The text test is inverted.
        const NEGATE         = 1 << 2;
        /// The part-of-speech test is inverted.
        const NEGATE_POS     = 1 << 3;
        /// Match by lemma instead of surface form.
        const INFLECTED      = 1 << 4;
        /// Marks the start of the sentence; produces no text.
        const SENT_START     = 1 << 5;
        /// Words matched by a back-reference to this token must repeat its
        /// case exactly.
        const CASE_SENSITIVE = 1 << 6;
    }
}

/// Case transformation applied to a back-referenced token's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseConversion {
    #[default]
    Preserve,
    StartLower,
    StartUpper,
    AllLower,
    AllUpper,
}

impl CaseConversion {
    pub fn apply(self, text: &str) -> String {
        match self {
            CaseConversion::Preserve => text.to_string(),
            CaseConversion::AllLower => text.to_lowercase(),
            CaseConversion::AllUpper => text.to_uppercase(),
            CaseConversion::StartLower => map_first_char(text, |c| c.to_lowercase().collect()),
            CaseConversion::StartUpper => map_first_char(text, |c| c.to_uppercase().collect()),
        }
    }
}

fn map_first_char(text: &str, f: impl FnOnce(char) -> String) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}

/// Back-reference to the text produced for an earlier token of the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Zero-based index of the referenced token in the rule's pattern.
    pub index: usize,
    pub conversion: CaseConversion,
}

/// One position of a rule's pattern.
///
/// An empty `text` together with no `pos_tag` matches any word. A non-empty
/// `and_group` makes the constraint the conjunction of itself and every member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenConstraint {
    /// Literal or regular expression (see [`ConstraintFlags::REGEX`]).
    pub text: String,
    pub pos_tag: Option<String>,
    pub flags: ConstraintFlags,
    /// Further constraints on the same position.
    pub and_group: Vec<TokenConstraint>,
    /// Constraints a word at this position must not satisfy.
    pub exceptions: Vec<TokenConstraint>,
    /// Exceptions declared here that apply to the previous position.
    pub previous_exceptions: Vec<TokenConstraint>,
    pub reference: Option<Reference>,
}

impl TokenConstraint {
    /// A constraint that matches any word.
    pub fn any() -> Self {
        Self::default()
    }

    /// A literal word.
    pub fn word(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    /// A regular expression over the surface form.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self { text: pattern.into(), flags: ConstraintFlags::REGEX, ..Self::default() }
    }

    /// A sentence start marker.
    pub fn sentence_start() -> Self {
        Self { flags: ConstraintFlags::SENT_START, ..Self::default() }
    }

    /// A back-reference to the token at `index`.
    pub fn referencing(index: usize, conversion: CaseConversion) -> Self {
        Self { reference: Some(Reference { index, conversion }), ..Self::default() }
    }

    pub fn with_pos(mut self, tag: impl Into<String>) -> Self {
        self.pos_tag = Some(tag.into());
        self.flags.remove(ConstraintFlags::POS_REGEX);
        self
    }

    pub fn with_pos_regex(mut self, pattern: impl Into<String>) -> Self {
        self.pos_tag = Some(pattern.into());
        self.flags.insert(ConstraintFlags::POS_REGEX);
        self
    }

    pub fn negated(mut self) -> Self {
        self.flags.insert(ConstraintFlags::NEGATE);
        self
    }

    pub fn negated_pos(mut self) -> Self {
        self.flags.insert(ConstraintFlags::NEGATE_POS);
        self
    }

    pub fn inflected(mut self) -> Self {
        self.flags.insert(ConstraintFlags::INFLECTED);
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.flags.insert(ConstraintFlags::CASE_SENSITIVE);
        self
    }

    pub fn with_exception(mut self, exception: TokenConstraint) -> Self {
        self.exceptions.push(exception);
        self
    }

    pub fn with_previous_exception(mut self, exception: TokenConstraint) -> Self {
        self.previous_exceptions.push(exception);
        self
    }

    /// Add a conjunct that must hold for the same position.
    pub fn and(mut self, other: TokenConstraint) -> Self {
        self.and_group.push(other);
        self
    }

    pub fn is_regex(&self) -> bool {
        self.flags.contains(ConstraintFlags::REGEX)
    }

    pub fn is_pos_regex(&self) -> bool {
        self.flags.contains(ConstraintFlags::POS_REGEX)
    }

    pub fn is_negated(&self) -> bool {
        self.flags.contains(ConstraintFlags::NEGATE)
    }

    pub fn is_pos_negated(&self) -> bool {
        self.flags.contains(ConstraintFlags::NEGATE_POS)
    }

    pub fn is_inflected(&self) -> bool {
        self.flags.contains(ConstraintFlags::INFLECTED)
    }

    pub fn is_sentence_start(&self) -> bool {
        self.flags.contains(ConstraintFlags::SENT_START)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.flags.contains(ConstraintFlags::CASE_SENSITIVE)
    }

    pub fn has_and_group(&self) -> bool {
        !self.and_group.is_empty()
    }

    /// True when the constraint matches every word.
    pub fn is_unconstrained(&self) -> bool {
        self.text.is_empty() && self.pos_tag.is_none() && self.reference.is_none() && self.and_group.is_empty()
    }
}

// --- Rules --------------------------------------------------------------------

/// A rule: an identifier plus an ordered token pattern.
///
/// Rules are immutable once loaded; see [`rules::RuleSet`] for loading and
/// [`PatternRule::to_source`] for re-emitting one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub id: String,
    pub name: Option<String>,
    pub tokens: Vec<TokenConstraint>,
}

impl PatternRule {
    pub fn new(id: impl Into<String>, tokens: Vec<TokenConstraint>) -> Self {
        Self { id: id.into(), name: None, tokens }
    }

    /// Exceptions token `index` inherits from its right neighbour.
    pub fn inherited_exceptions(&self, index: usize) -> &[TokenConstraint] {
        self.tokens.get(index + 1).map(|next| next.previous_exceptions.as_slice()).unwrap_or(&[])
    }
}
