//! Synthesis run metrics.
//!
//! Collected for every run (the counters are cheap) and surfaced through
//! [`Synthesizer::synthesize_verbose`](super::Synthesizer::synthesize_verbose)
//! as [`SynthesisDetails`](crate::SynthesisDetails).
//!
//! ## Design notes
//!
//! - `candidates` counts dictionary words examined, which is the number that
//!   matters when a rule is slow; wall-clock time includes regex compilation.
//! - `resets` is per token. A token without an example whose `resets` equals
//!   `max_passes - 1` hit the pass limit.

use super::classify::StrategyKind;
use std::time::Duration;

/// Measurements for one token.
#[derive(Debug, Clone)]
pub(crate) struct TokenMetrics {
    pub index: usize,
    pub strategy: StrategyKind,
    pub duration: Duration,
    /// Dictionary words examined.
    pub candidates: usize,
    /// Cursor rewinds during this token's search.
    pub resets: usize,
}

/// Measurements for one rule.
#[derive(Debug, Default, Clone)]
pub(crate) struct SynthesisMetrics {
    /// Total elapsed time for the rule.
    pub total: Duration,
    pub tokens: Vec<TokenMetrics>,
}

impl SynthesisMetrics {
    pub(crate) fn candidates(&self) -> usize {
        self.tokens.iter().map(|t| t.candidates).sum()
    }
}
