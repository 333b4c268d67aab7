//! Synthesis sessions.
//!
//! A [`Synthesizer`] owns everything a run mutates: the dictionary cursor and
//! the random source. Rules are borrowed per call. Cursor position carries over
//! between tokens and between rules, so a long batch does not keep returning the
//! dictionary's first few words.

use super::classify::classify;
use super::metrics::{SynthesisMetrics, TokenMetrics};
use super::resolve::TokenResolver;
use super::search::{DictionaryCursor, SearchPolicy};
use crate::api::{Options, SynthesisDetails, SynthesizedExample, TokenSummary};
use crate::dictionary::MorphDictionary;
use crate::{PatternRule, TokenConstraint};
use rand::Rng;
use rand::rngs::StdRng;
use std::time::Instant;

/// Example synthesis session over one dictionary.
pub struct Synthesizer<D, R = StdRng> {
    dict: D,
    cursor: DictionaryCursor,
    rng: R,
    policy: SearchPolicy,
}

impl<D: MorphDictionary> Synthesizer<D, StdRng> {
    /// Session with default options (two passes, entropy-seeded).
    pub fn new(dict: D) -> Self {
        Self::with_options(dict, &Options::default())
    }

    /// Session configured by `options`; a configured seed makes disjunction
    /// choices reproducible.
    pub fn with_options(dict: D, options: &Options) -> Self {
        Self::with_rng(dict, options.rng(), options)
    }
}

impl<D: MorphDictionary, R: Rng> Synthesizer<D, R> {
    /// Session with a caller-supplied random source.
    pub fn with_rng(dict: D, rng: R, options: &Options) -> Self {
        Synthesizer { dict, cursor: DictionaryCursor::new(), rng, policy: options.search_policy() }
    }

    pub fn dictionary(&self) -> &D {
        &self.dict
    }

    pub fn cursor(&self) -> &DictionaryCursor {
        &self.cursor
    }

    /// Rewind the cursor so the next search starts at the first word.
    pub fn reset_cursor(&mut self) {
        self.cursor.reset();
    }

    pub fn policy(&self) -> SearchPolicy {
        self.policy
    }

    /// Produce a word for a single token.
    ///
    /// `inherited` are exceptions the next token applies to this position.
    /// `prior_tokens` and `prior_examples` are the tokens left of this one and
    /// what was produced for them; back-references index into both.
    pub fn resolve(
        &mut self,
        token: &TokenConstraint,
        inherited: &[TokenConstraint],
        prior_tokens: &[TokenConstraint],
        prior_examples: &[Option<String>],
    ) -> Option<String> {
        let strategy = classify(token);
        let mut resolver = TokenResolver::new(&self.dict, &mut self.cursor, &mut self.rng, self.policy);
        resolver.resolve(token, &strategy, inherited, prior_tokens, prior_examples)
    }

    /// Synthesize an example sentence for `rule`.
    ///
    /// Tokens without an example are left out of the sentence; see
    /// [`SynthesizedExample::is_complete`].
    pub fn synthesize(&mut self, rule: &PatternRule) -> SynthesizedExample {
        self.run(rule).0
    }

    /// Like [`synthesize`](Self::synthesize), also returning per-token traces.
    pub fn synthesize_verbose(&mut self, rule: &PatternRule) -> (SynthesizedExample, SynthesisDetails) {
        let (example, metrics) = self.run(rule);
        let tokens = metrics
            .tokens
            .iter()
            .map(|t| TokenSummary {
                index: t.index,
                strategy: t.strategy,
                example: example.tokens.get(t.index).cloned().flatten(),
                duration: t.duration,
                candidates: t.candidates,
                resets: t.resets,
            })
            .collect();
        let details = SynthesisDetails { total: metrics.total, tokens, candidates: metrics.candidates() };
        (example, details)
    }

    fn run(&mut self, rule: &PatternRule) -> (SynthesizedExample, SynthesisMetrics) {
        let start = Instant::now();
        let mut examples: Vec<Option<String>> = Vec::with_capacity(rule.tokens.len());
        let mut metrics = SynthesisMetrics::default();

        for (index, token) in rule.tokens.iter().enumerate() {
            let token_start = Instant::now();
            let strategy = classify(token);
            let inherited = rule.inherited_exceptions(index);

            let mut resolver = TokenResolver::new(&self.dict, &mut self.cursor, &mut self.rng, self.policy);
            let example = resolver.resolve(token, &strategy, inherited, &rule.tokens[..index], &examples);
            let stats = resolver.stats;

            match &example {
                Some(word) => tracing::debug!(
                    rule = %rule.id,
                    index,
                    strategy = strategy.kind().name(),
                    word = %word,
                    candidates = stats.candidates,
                    "token resolved"
                ),
                None => tracing::warn!(
                    rule = %rule.id,
                    index,
                    strategy = strategy.kind().name(),
                    candidates = stats.candidates,
                    "no example found for token"
                ),
            }

            metrics.tokens.push(TokenMetrics {
                index,
                strategy: strategy.kind(),
                duration: token_start.elapsed(),
                candidates: stats.candidates,
                resets: stats.resets,
            });
            examples.push(example);
        }

        let sentence = join_sentence(&examples);
        metrics.total = start.elapsed();
        (SynthesizedExample { rule_id: rule.id.clone(), tokens: examples, sentence }, metrics)
    }
}

/// Join per-token examples with single spaces.
///
/// Missing and empty examples are skipped. A `.` with a space on both sides
/// is dropped (sentence-end markers) and the result is trimmed. A leading `.`
/// has nothing before it and stays.
pub(crate) fn join_sentence(examples: &[Option<String>]) -> String {
    let mut sentence = String::new();
    for word in examples.iter().flatten().filter(|w| !w.is_empty()) {
        sentence.push_str(word);
        sentence.push(' ');
    }
    while sentence.contains(" . ") {
        sentence = sentence.replace(" . ", " ");
    }
    sentence.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingDictionary, sample_dictionary};
    use crate::{CaseConversion, WordList};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn seeded<D: MorphDictionary>(dict: D) -> Synthesizer<D> {
        Synthesizer::with_options(dict, &Options { seed: Some(42), ..Options::default() })
    }

    #[test]
    fn join_drops_isolated_periods_and_gaps() {
        let cases: Vec<(Vec<Option<&str>>, &str)> = vec![
            (vec![Some("the"), Some("cat"), Some(".")], "the cat"),
            (vec![Some(""), Some("Hello"), Some("world")], "Hello world"),
            (vec![Some("a"), Some("."), Some("."), Some("b")], "a b"),
            (vec![Some("a"), None, Some("b")], "a b"),
            (vec![Some("a"), Some("..."), Some("b")], "a ... b"),
            (vec![Some("."), Some("x")], ". x"),
            (vec![Some("."), Some("x"), Some(".")], ". x"),
            (vec![None, None], ""),
        ];
        for (parts, expected) in cases {
            let owned: Vec<Option<String>> = parts.iter().map(|p| p.map(str::to_string)).collect();
            assert_eq!(join_sentence(&owned), expected, "{parts:?}");
        }
    }

    #[test]
    fn big_dog() {
        let dict: WordList = [("big", "big", "JJ"), ("dog", "dog", "NN")].into_iter().collect();
        let rule = PatternRule::new(
            "BIG_DOG",
            vec![TokenConstraint::any().with_pos("NN").negated_pos(), TokenConstraint::word("dog")],
        );
        let example = seeded(dict).synthesize(&rule);
        assert_eq!(example.sentence, "big dog");
        assert!(example.is_complete());
    }

    #[test]
    fn the_cat_or_the_dog() {
        let rule = PatternRule::new(
            "PET",
            vec![TokenConstraint::word("the"), TokenConstraint::regex("cat|dog"), TokenConstraint::word(".")],
        );
        let mut synth = seeded(sample_dictionary());
        for _ in 0..10 {
            let sentence = synth.synthesize(&rule).sentence;
            assert!(sentence == "the cat" || sentence == "the dog", "{sentence}");
        }
    }

    #[test]
    fn leading_period_is_kept() {
        let rule = PatternRule::new("DOT_FIRST", vec![TokenConstraint::word("."), TokenConstraint::word("x")]);
        assert_eq!(seeded(WordList::new()).synthesize(&rule).sentence, ". x");
    }

    #[test]
    fn disjunction_reaches_every_alternative() {
        let rule = PatternRule::new("ANIMAL", vec![TokenConstraint::regex("cat|dog|bird")]);
        let mut synth = Synthesizer::with_rng(WordList::new(), StdRng::seed_from_u64(3), &Options::default());
        let seen: HashSet<String> = (0..200).map(|_| synth.synthesize(&rule).sentence).collect();
        let expected: HashSet<String> = ["cat", "dog", "bird"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn punctuation_is_stable_across_runs() {
        let rule = PatternRule::new("QUOTE", vec![TokenConstraint::regex("[\"'“]")]);
        let mut synth = Synthesizer::new(WordList::new());
        for _ in 0..10 {
            assert_eq!(synth.synthesize(&rule).sentence, "\"");
        }
    }

    #[test]
    fn back_reference_round_trip() {
        let rule = PatternRule::new(
            "DOUBLED",
            vec![TokenConstraint::any().with_pos("NN"), TokenConstraint::referencing(0, CaseConversion::AllUpper)],
        );
        let example = seeded(sample_dictionary()).synthesize(&rule);
        let words: Vec<&str> = example.sentence.split(' ').collect();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1], words[0].to_uppercase());
        assert_eq!(words[0], "dog");
    }

    #[test]
    fn previous_scope_exceptions_apply_to_left_neighbour() {
        let rule = PatternRule::new(
            "NOT_DOG_BEFORE_RAN",
            vec![
                TokenConstraint::any().with_pos("NN"),
                TokenConstraint::word("ran").with_previous_exception(TokenConstraint::word("dog")),
            ],
        );
        let example = seeded(sample_dictionary()).synthesize(&rule);
        assert_eq!(example.sentence, "cat ran");
    }

    #[test]
    fn exceptions_are_never_returned() {
        let rule = PatternRule::new(
            "NOUN",
            vec![TokenConstraint::any().with_pos("NN").with_exception(TokenConstraint::regex("dog|cat"))],
        );
        let mut synth = seeded(sample_dictionary());
        for _ in 0..5 {
            let sentence = synth.synthesize(&rule).sentence;
            assert_eq!(sentence, "house");
        }
    }

    #[test]
    fn unsatisfiable_token_degrades_sentence() {
        let dict = CountingDictionary::new(sample_dictionary());
        let rule = PatternRule::new(
            "BROKEN",
            vec![TokenConstraint::word("the"), TokenConstraint::any().with_pos("XYZ"), TokenConstraint::word("end")],
        );
        let mut synth = seeded(&dict);
        let (example, details) = synth.synthesize_verbose(&rule);

        assert_eq!(example.sentence, "the end");
        assert!(!example.is_complete());
        assert_eq!(example.missing(), vec![1]);
        assert_eq!(dict.visits(), 2 * dict.len());
        assert_eq!(details.tokens[1].candidates, 2 * dict.len());
        assert_eq!(details.tokens[1].resets, 1);
        assert_eq!(details.tokens[1].example, None);
        assert_eq!(details.candidates, 2 * dict.len());
    }

    #[test]
    fn cursor_persists_across_rules() {
        let rule = PatternRule::new("NOUN", vec![TokenConstraint::any().with_pos("NN")]);
        let mut synth = seeded(sample_dictionary());
        assert_eq!(synth.synthesize(&rule).sentence, "dog");
        assert_eq!(synth.synthesize(&rule).sentence, "cat");
        assert_eq!(synth.synthesize(&rule).sentence, "house");
        assert_eq!(synth.synthesize(&rule).sentence, "dog");
        assert_eq!(synth.cursor().resets(), 1);

        synth.reset_cursor();
        assert_eq!(synth.cursor().position(), 0);
    }

    #[test]
    fn verbose_reports_strategies() {
        let rule = PatternRule::new(
            "MIXED",
            vec![
                TokenConstraint::sentence_start(),
                TokenConstraint::word("the"),
                TokenConstraint::any().with_pos("JJ"),
                TokenConstraint::regex("[!?]"),
            ],
        );
        let (example, details) = seeded(sample_dictionary()).synthesize_verbose(&rule);
        assert_eq!(example.sentence, "the big !");
        let kinds: Vec<&str> = details.tokens.iter().map(|t| t.strategy.name()).collect();
        assert_eq!(kinds, vec!["sentence-start", "literal", "general", "punctuation"]);
        assert_eq!(details.tokens[2].example.as_deref(), Some("big"));
    }

    proptest! {
        #[test]
        fn literal_rules_reproduce_their_words(words in prop::collection::vec("[a-z]{1,8}", 1..6)) {
            let tokens = words.iter().map(|w| TokenConstraint::word(w.as_str())).collect();
            let rule = PatternRule::new("LITERALS", tokens);
            let mut synth = Synthesizer::new(WordList::new());
            let first = synth.synthesize(&rule);
            let second = synth.synthesize(&rule);
            prop_assert_eq!(&first.sentence, &words.join(" "));
            prop_assert_eq!(first.sentence, second.sentence);
        }
    }
}
