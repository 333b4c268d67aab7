//! Coverage reporting.
//!
//! A rule is *covered* when the example synthesized for it is already flagged
//! by some existing rule of the checking engine. Covered rules are likely
//! redundant; the others are *novel*.
//!
//! Checking engine failures are passed through unchanged and never retried.
//! A degraded example (a token without a word) is still checked; callers can
//! tell from [`SynthesizedExample::is_complete`].

use crate::api::SynthesizedExample;
use crate::checker::Checker;
use crate::dictionary::MorphDictionary;
use crate::engine::Synthesizer;
use crate::error::CoverageError;
use crate::PatternRule;
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

/// Rule id mapped to the ids of the rules that fired on its example. An empty
/// set means the rule is not covered.
pub type CoverageResult = BTreeMap<String, BTreeSet<String>>;

/// Coverage of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCoverage {
    pub rule_id: String,
    pub example: SynthesizedExample,
    pub covered_by: BTreeSet<String>,
}

impl RuleCoverage {
    pub fn is_covered(&self) -> bool {
        !self.covered_by.is_empty()
    }
}

/// Outcome of [`CoverageReporter::split`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    /// Ids written to the novel sink, in input order.
    pub novel: Vec<String>,
    /// Ids written to the covered sink, in input order.
    pub covered: Vec<String>,
}

impl SplitReport {
    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }

    pub fn novel_count(&self) -> usize {
        self.novel.len()
    }

    pub fn total(&self) -> usize {
        self.novel.len() + self.covered.len()
    }
}

/// Synthesizes examples and checks them against an existing rule set.
pub struct CoverageReporter<C, D, R = StdRng> {
    checker: C,
    synthesizer: Synthesizer<D, R>,
}

impl<C, D, R> CoverageReporter<C, D, R>
where
    C: Checker,
    D: MorphDictionary,
    R: Rng,
{
    pub fn new(checker: C, synthesizer: Synthesizer<D, R>) -> Self {
        CoverageReporter { checker, synthesizer }
    }

    pub fn checker(&self) -> &C {
        &self.checker
    }

    pub fn checker_mut(&mut self) -> &mut C {
        &mut self.checker
    }

    pub fn synthesizer_mut(&mut self) -> &mut Synthesizer<D, R> {
        &mut self.synthesizer
    }

    /// Ids of the rules that fire on `sentence`.
    pub fn covering_rules(&self, sentence: &str) -> Result<BTreeSet<String>, C::Error> {
        let matches = self.checker.check(sentence)?;
        Ok(matches.into_iter().map(|m| m.rule_id).collect())
    }

    /// True when any rule fires on `sentence`.
    pub fn is_covered(&self, sentence: &str) -> Result<bool, C::Error> {
        Ok(!self.checker.check(sentence)?.is_empty())
    }

    /// Synthesize an example for `rule` and check it.
    pub fn rule_coverage(&mut self, rule: &PatternRule) -> Result<RuleCoverage, C::Error> {
        let example = self.synthesizer.synthesize(rule);
        let covered_by = self.covering_rules(&example.sentence)?;
        tracing::debug!(rule = %rule.id, sentence = %example.sentence, covered_by = covered_by.len(), "rule checked");
        Ok(RuleCoverage { rule_id: rule.id.clone(), example, covered_by })
    }

    pub fn coverage<'r>(
        &mut self,
        rules: impl IntoIterator<Item = &'r PatternRule>,
    ) -> Result<CoverageResult, C::Error> {
        let mut result = CoverageResult::new();
        for rule in rules {
            let coverage = self.rule_coverage(rule)?;
            result.insert(coverage.rule_id, coverage.covered_by);
        }
        Ok(result)
    }

    /// Per-rule coverage, logging one line per rule at `info`.
    pub fn evaluate<'r>(
        &mut self,
        rules: impl IntoIterator<Item = &'r PatternRule>,
    ) -> Result<Vec<RuleCoverage>, C::Error> {
        let mut report = Vec::new();
        for rule in rules {
            let coverage = self.rule_coverage(rule)?;
            if coverage.is_covered() {
                tracing::info!(
                    rule = %coverage.rule_id,
                    sentence = %coverage.example.sentence,
                    covered_by = ?coverage.covered_by,
                    "covered"
                );
            } else {
                tracing::info!(rule = %coverage.rule_id, sentence = %coverage.example.sentence, "not covered");
            }
            report.push(coverage);
        }
        Ok(report)
    }

    /// Write every rule to `novel` or `covered` in its serialized form.
    ///
    /// Each rule lands in exactly one sink. Rule blocks are separated by a
    /// blank line, so each sink is itself a valid rule file.
    pub fn split<'r, N, V>(
        &mut self,
        rules: impl IntoIterator<Item = &'r PatternRule>,
        novel: &mut N,
        covered: &mut V,
    ) -> Result<SplitReport, CoverageError<C::Error>>
    where
        N: Write + ?Sized,
        V: Write + ?Sized,
    {
        let mut report = SplitReport::default();
        for rule in rules {
            let coverage = self.rule_coverage(rule).map_err(CoverageError::Check)?;
            let source = rule
                .to_source()
                .map_err(|source| CoverageError::Serialize { rule: rule.id.clone(), source })?;
            if coverage.is_covered() {
                writeln!(covered, "{source}")?;
                report.covered.push(coverage.rule_id);
            } else {
                writeln!(novel, "{source}")?;
                report.novel.push(coverage.rule_id);
            }
        }
        novel.flush()?;
        covered.flush()?;
        tracing::info!(
            total = report.total(),
            covered = report.covered_count(),
            novel = report.novel_count(),
            "split finished"
        );
        Ok(report)
    }
}
