use crate::engine::{SearchPolicy, StrategyKind, Synthesizer};
use crate::dictionary::MorphDictionary;
use crate::PatternRule;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::time::Duration;

/// Default number of dictionary passes before a token search gives up.
pub const DEFAULT_MAX_PASSES: usize = 2;

const ENV_MAX_PASSES: &str = "RULECOV_MAX_PASSES";
const ENV_SEED: &str = "RULECOV_SEED";

/// Options that affect synthesis behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Full dictionary traversals a single token search may make. Values
    /// below 1 are treated as 1.
    pub max_passes: usize,
    /// Seed for the random source. `None` seeds from OS entropy, so the
    /// alternative picked for `a|b|c` tokens varies between runs.
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_passes: DEFAULT_MAX_PASSES, seed: None }
    }
}

impl Options {
    /// Defaults overridden by `RULECOV_MAX_PASSES` and `RULECOV_SEED`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    /// Unparsable values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Options::default();
        if let Some(raw) = lookup(ENV_MAX_PASSES) {
            match raw.trim().parse::<usize>() {
                Ok(passes) => options.max_passes = passes.max(1),
                Err(_) => tracing::warn!(variable = ENV_MAX_PASSES, value = %raw, "ignoring invalid value"),
            }
        }
        if let Some(raw) = lookup(ENV_SEED) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => options.seed = Some(seed),
                Err(_) => tracing::warn!(variable = ENV_SEED, value = %raw, "ignoring invalid value"),
            }
        }
        options
    }

    pub fn search_policy(&self) -> SearchPolicy {
        SearchPolicy { max_passes: self.max_passes.max(1) }
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Result of synthesizing one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedExample {
    pub rule_id: String,
    /// Word produced per pattern position; `None` where the search gave up.
    /// Sentence-start markers produce an empty string.
    pub tokens: Vec<Option<String>>,
    /// Tokens joined with single spaces, isolated periods removed.
    pub sentence: String,
}

impl SynthesizedExample {
    /// True when every token produced an example.
    pub fn is_complete(&self) -> bool {
        self.tokens.iter().all(Option::is_some)
    }

    /// Positions that produced no example.
    pub fn missing(&self) -> Vec<usize> {
        self.tokens.iter().enumerate().filter(|(_, t)| t.is_none()).map(|(i, _)| i).collect()
    }
}

impl fmt::Display for SynthesizedExample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule_id, self.sentence)?;
        if !self.is_complete() {
            write!(f, " (incomplete)")?;
        }
        Ok(())
    }
}

/// A compact per-token trace used in verbose output.
#[derive(Debug, Clone)]
pub struct TokenSummary {
    pub index: usize,
    pub strategy: StrategyKind,
    pub example: Option<String>,
    pub duration: Duration,
    /// Dictionary words examined.
    pub candidates: usize,
    /// Cursor rewinds during the search.
    pub resets: usize,
}

/// Additional details returned by [`Synthesizer::synthesize_verbose`].
#[derive(Debug, Clone)]
pub struct SynthesisDetails {
    /// Total elapsed time.
    pub total: Duration,
    pub tokens: Vec<TokenSummary>,
    /// Dictionary words examined across all tokens.
    pub candidates: usize,
}

/// Synthesize `rule` over `dict` with default [`Options`].
///
/// Each call uses a fresh session, so the search starts at the first
/// dictionary word. Keep a [`Synthesizer`] around to process many rules.
///
/// # Example
/// ```
/// use rulecov::{PatternRule, TokenConstraint, WordList, synthesize};
///
/// let rule = PatternRule::new("R", vec![TokenConstraint::word("hello"), TokenConstraint::word("world")]);
/// assert_eq!(synthesize(&rule, &WordList::new()).sentence, "hello world");
/// ```
pub fn synthesize<D>(rule: &PatternRule, dict: &D) -> SynthesizedExample
where
    D: MorphDictionary + ?Sized,
{
    synthesize_with(rule, dict, &Options::default())
}

/// Synthesize `rule` over `dict` with the provided `options`.
pub fn synthesize_with<D>(rule: &PatternRule, dict: &D, options: &Options) -> SynthesizedExample
where
    D: MorphDictionary + ?Sized,
{
    Synthesizer::with_options(dict, options).synthesize(rule)
}
