//! Checking engines.
//!
//! Coverage is measured by running synthesized sentences through a checking
//! engine and collecting the identifiers of the rules that fire. [`Checker`]
//! is that seam; [`PatternChecker`] is a small implementation that matches
//! [`PatternRule`]s directly, with the same constraint semantics the
//! synthesizer uses.
//!
//! ```text
//! text ── tokenize (words, punctuation) ── look up readings per word
//!           │
//!           v
//!   for each enabled rule, for each start position:
//!       walk the pattern left to right
//!         SENT_START   -> zero-width, only at position 0
//!         SENT_END tag -> only on the last word
//!         members      -> all must match; references compare with the
//!                         word matched at the referenced position
//!         exceptions   -> own + next token's "previous" scope
//! ```

use crate::dictionary::{MorphDictionary, MorphEntry};
use crate::engine::{CompiledConstraint, CompiledExceptions};
use crate::error::CompileError;
use crate::{ConstraintFlags, PatternRule, Reference, TokenConstraint};
use std::collections::HashSet;
use std::convert::Infallible;

/// One rule firing on a span of the checked text. Offsets are bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleMatch {
    pub rule_id: String,
    pub start: usize,
    pub end: usize,
}

/// A grammar-checking engine.
pub trait Checker {
    type Error: std::error::Error + 'static;

    /// Check `text` and return every match, in text order per rule.
    fn check(&self, text: &str) -> Result<Vec<RuleMatch>, Self::Error>;
}

impl<C: Checker + ?Sized> Checker for &C {
    type Error = C::Error;

    fn check(&self, text: &str) -> Result<Vec<RuleMatch>, Self::Error> {
        (**self).check(text)
    }
}

// --- Compiled rules -----------------------------------------------------------

enum MemberTest {
    Static(CompiledConstraint),
    /// Text is compared with the word matched at `reference.index`; the tag
    /// part of the constraint is compiled separately.
    Reference { reference: Reference, negate: bool, case_sensitive: bool, pos: CompiledConstraint },
}

struct CompiledToken {
    sentence_start: bool,
    sentence_end: bool,
    members: Vec<MemberTest>,
    exceptions: CompiledExceptions,
}

struct CompiledRule {
    id: String,
    tokens: Vec<CompiledToken>,
}

fn compile_rule<D>(rule: &PatternRule, dict: &D) -> Result<CompiledRule, CompileError>
where
    D: MorphDictionary + ?Sized,
{
    let mut tokens = Vec::with_capacity(rule.tokens.len());
    for (index, token) in rule.tokens.iter().enumerate() {
        let members: Vec<&TokenConstraint> = std::iter::once(token).chain(token.and_group.iter()).collect();
        let mut tests = Vec::with_capacity(members.len());
        let mut sentence_end = false;

        for member in &members {
            let test = match member.reference {
                Some(reference) => {
                    let tag_only = TokenConstraint {
                        pos_tag: member.pos_tag.clone(),
                        flags: member.flags & (ConstraintFlags::NEGATE_POS | ConstraintFlags::POS_REGEX),
                        ..TokenConstraint::default()
                    };
                    let case_sensitive = rule.tokens.get(reference.index).is_some_and(|t| t.is_case_sensitive());
                    MemberTest::Reference {
                        reference,
                        negate: member.is_negated(),
                        case_sensitive,
                        pos: CompiledConstraint::compile(&tag_only, dict)?,
                    }
                }
                None => MemberTest::Static(CompiledConstraint::compile(member, dict)?),
            };
            sentence_end |= match &test {
                MemberTest::Static(c) | MemberTest::Reference { pos: c, .. } => c.requires_sentence_end(),
            };
            tests.push(test);
        }

        let own = members.iter().flat_map(|m| m.exceptions.iter());
        let exceptions = CompiledExceptions::compile(own.chain(rule.inherited_exceptions(index)), dict)?;

        tokens.push(CompiledToken {
            sentence_start: token.is_sentence_start(),
            sentence_end,
            members: tests,
            exceptions,
        });
    }
    Ok(CompiledRule { id: rule.id.clone(), tokens })
}

// --- Tokenization -------------------------------------------------------------

struct Word<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

fn tokenize(text: &str) -> Vec<Word<'_>> {
    regex!(r"\w+(?:['’]\w+)*|[^\w\s]")
        .find_iter(text)
        .map(|m| Word { text: m.as_str(), start: m.start(), end: m.end() })
        .collect()
}

/// Readings of `word`, falling back to its lowercase form.
fn readings_of<'d, D>(dict: &'d D, word: &str) -> &'d [MorphEntry]
where
    D: MorphDictionary + ?Sized,
{
    let readings = dict.lookup(word);
    if !readings.is_empty() {
        return readings;
    }
    let lowered = word.to_lowercase();
    if lowered == word { readings } else { dict.lookup(&lowered) }
}

// --- Checker ------------------------------------------------------------------

/// Reference checking engine over a rule list and a dictionary.
pub struct PatternChecker<D> {
    dict: D,
    rules: Vec<CompiledRule>,
    disabled: HashSet<String>,
}

impl<D: MorphDictionary> PatternChecker<D> {
    /// Compile `rules` for checking. Inflected constraints are expanded with
    /// `dict`'s lemmas at this point.
    pub fn new<'r>(rules: impl IntoIterator<Item = &'r PatternRule>, dict: D) -> Result<Self, CompileError> {
        let rules = rules.into_iter().map(|r| compile_rule(r, &dict)).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(rules = rules.len(), "checker compiled");
        Ok(PatternChecker { dict, rules, disabled: HashSet::new() })
    }

    /// Stop reporting matches of rule `id`. Returns false for unknown ids.
    pub fn disable_rule(&mut self, id: &str) -> bool {
        if !self.rules.iter().any(|r| r.id == id) {
            return false;
        }
        self.disabled.insert(id.to_string());
        true
    }

    pub fn enable_rule(&mut self, id: &str) -> bool {
        self.disabled.remove(id)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.rules.iter().any(|r| r.id == id) && !self.disabled.contains(id)
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    fn match_at(
        &self,
        rule: &CompiledRule,
        words: &[Word<'_>],
        readings: &[&[MorphEntry]],
        start: usize,
    ) -> Option<(usize, usize)> {
        let mut pos = start;
        let mut matched: Vec<Option<usize>> = Vec::with_capacity(rule.tokens.len());

        for token in &rule.tokens {
            if token.sentence_start {
                if pos != 0 {
                    return None;
                }
                matched.push(None);
                continue;
            }
            let word = words.get(pos)?;
            if token.sentence_end && pos + 1 != words.len() {
                return None;
            }
            let entries = readings[pos];
            let accepted = token.members.iter().all(|test| match test {
                MemberTest::Static(c) => c.matches_with(word.text, || entries),
                MemberTest::Reference { reference, negate, case_sensitive, pos: tag } => {
                    let Some(Some(earlier)) = matched.get(reference.index) else {
                        return false;
                    };
                    let expected = reference.conversion.apply(words[*earlier].text);
                    let same = if *case_sensitive {
                        expected == word.text
                    } else {
                        expected.to_lowercase() == word.text.to_lowercase()
                    };
                    same != *negate && tag.matches_with(word.text, || entries)
                }
            });
            if !accepted || token.exceptions.is_excepted_with(word.text, || entries) {
                return None;
            }
            matched.push(Some(pos));
            pos += 1;
        }

        let first = matched.iter().flatten().next()?;
        let last = matched.iter().flatten().last()?;
        Some((words[*first].start, words[*last].end))
    }
}

impl<D: MorphDictionary> Checker for PatternChecker<D> {
    type Error = Infallible;

    fn check(&self, text: &str) -> Result<Vec<RuleMatch>, Infallible> {
        let words = tokenize(text);
        let readings: Vec<&[MorphEntry]> = words.iter().map(|w| readings_of(&self.dict, w.text)).collect();
        let mut matches = Vec::new();

        for rule in self.rules.iter().filter(|r| !self.disabled.contains(&r.id)) {
            for start in 0..words.len() {
                if let Some((from, to)) = self.match_at(rule, &words, &readings, start) {
                    matches.push(RuleMatch { rule_id: rule.id.clone(), start: from, end: to });
                }
            }
        }
        tracing::trace!(words = words.len(), matches = matches.len(), "text checked");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_dictionary;
    use crate::{CaseConversion, Options, Synthesizer, WordList};

    fn checker(rules: &[PatternRule]) -> PatternChecker<WordList> {
        PatternChecker::new(rules, sample_dictionary()).unwrap()
    }

    fn fired(checker: &PatternChecker<WordList>, text: &str) -> Vec<(String, usize, usize)> {
        checker.check(text).unwrap().into_iter().map(|m| (m.rule_id, m.start, m.end)).collect()
    }

    #[test]
    fn tokenizer_splits_words_and_punctuation() {
        let words: Vec<(&str, usize, usize)> =
            tokenize("Don't stop, dog!").iter().map(|w| (w.text, w.start, w.end)).collect();
        assert_eq!(words, vec![("Don't", 0, 5), ("stop", 6, 10), (",", 10, 11), ("dog", 12, 15), ("!", 15, 16)]);
    }

    #[test]
    fn literal_and_pos_rules_report_spans() {
        let rules = vec![
            PatternRule::new("BIG_DOG", vec![TokenConstraint::word("big"), TokenConstraint::any().with_pos("NN")]),
            PatternRule::new("ADVERB", vec![TokenConstraint::any().with_pos("RB")]),
        ];
        let checker = checker(&rules);
        assert_eq!(fired(&checker, "the big dog ran quickly"), vec![
            ("BIG_DOG".to_string(), 4, 11),
            ("ADVERB".to_string(), 16, 23),
        ]);
        assert!(fired(&checker, "the big dogs").is_empty());
    }

    #[test]
    fn capitalized_words_use_lowercase_readings() {
        let checker = checker(&[PatternRule::new("DET", vec![TokenConstraint::any().with_pos("DT")])]);
        assert_eq!(fired(&checker, "The"), vec![("DET".to_string(), 0, 3)]);
    }

    #[test]
    fn exceptions_of_both_scopes() {
        let rules = vec![PatternRule::new(
            "NOUN_VERB",
            vec![
                TokenConstraint::any().with_pos("NN").with_exception(TokenConstraint::word("cat")),
                TokenConstraint::any().with_pos("VBD").with_previous_exception(TokenConstraint::word("house")),
            ],
        )];
        let checker = checker(&rules);
        assert_eq!(fired(&checker, "dog ran").len(), 1);
        assert!(fired(&checker, "cat ran").is_empty());
        assert!(fired(&checker, "house went").is_empty());
    }

    #[test]
    fn back_references_compare_with_earlier_word() {
        let repeated = PatternRule::new(
            "REPEATED",
            vec![TokenConstraint::any(), TokenConstraint::referencing(0, CaseConversion::Preserve)],
        );
        let different_noun = PatternRule::new(
            "TWO_NOUNS",
            vec![
                TokenConstraint::any().with_pos("NN"),
                TokenConstraint::referencing(0, CaseConversion::Preserve).negated().with_pos("NN"),
            ],
        );
        let checker = checker(&[repeated, different_noun]);

        assert_eq!(fired(&checker, "the the"), vec![("REPEATED".to_string(), 0, 7)]);
        assert_eq!(fired(&checker, "The the"), vec![("REPEATED".to_string(), 0, 7)]);
        assert_eq!(fired(&checker, "dog cat"), vec![("TWO_NOUNS".to_string(), 0, 7)]);
        assert!(fired(&checker, "dog big").is_empty());
    }

    #[test]
    fn sentence_boundaries() {
        let rules = vec![
            PatternRule::new("STARTS_WITH_A", vec![TokenConstraint::sentence_start(), TokenConstraint::word("a")]),
            PatternRule::new("ENDS_WITH_DOT", vec![TokenConstraint::word(".").with_pos("SENT_END")]),
        ];
        let checker = checker(&rules);
        assert_eq!(fired(&checker, "a dog ."), vec![
            ("STARTS_WITH_A".to_string(), 0, 1),
            ("ENDS_WITH_DOT".to_string(), 6, 7),
        ]);
        assert!(fired(&checker, "the a . dog").is_empty());
    }

    #[test]
    fn inflected_and_conjunction() {
        let rules = vec![PatternRule::new(
            "RUN_FORM",
            vec![TokenConstraint::word("run").inflected().and(TokenConstraint::any().with_pos("VBD"))],
        )];
        let checker = checker(&rules);
        assert_eq!(fired(&checker, "it ran"), vec![("RUN_FORM".to_string(), 3, 6)]);
        assert!(fired(&checker, "it runs").is_empty());
    }

    #[test]
    fn rules_can_be_disabled() {
        let mut checker = checker(&[PatternRule::new("DOG", vec![TokenConstraint::word("dog")])]);
        assert!(checker.disable_rule("DOG"));
        assert!(!checker.disable_rule("UNKNOWN"));
        assert!(!checker.is_enabled("DOG"));
        assert!(fired(&checker, "dog").is_empty());

        assert!(checker.enable_rule("DOG"));
        assert_eq!(fired(&checker, "dog").len(), 1);
        assert_eq!(checker.rule_ids().collect::<Vec<_>>(), vec!["DOG"]);
    }

    #[test]
    fn rules_fire_on_their_own_examples() {
        let rules = vec![
            PatternRule::new(
                "BIG_DOG",
                vec![TokenConstraint::any().with_pos("NN").negated_pos(), TokenConstraint::word("dog")],
            ),
            PatternRule::new(
                "PET",
                vec![
                    TokenConstraint::word("the"),
                    TokenConstraint::regex("cat|dog"),
                    TokenConstraint::any().with_pos("VBD"),
                ],
            ),
            PatternRule::new(
                "DOUBLED",
                vec![TokenConstraint::any().with_pos("NNS"), TokenConstraint::referencing(0, CaseConversion::Preserve)],
            ),
        ];
        let checker = checker(&rules);
        let mut synth = Synthesizer::with_options(sample_dictionary(), &Options { seed: Some(5), ..Options::default() });
        for rule in &rules {
            let example = synth.synthesize(rule);
            let ids: Vec<String> = checker.check(&example.sentence).unwrap().into_iter().map(|m| m.rule_id).collect();
            assert!(ids.contains(&rule.id), "{example} fired {ids:?}");
        }
    }
}
