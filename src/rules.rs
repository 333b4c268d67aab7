//! Rule loading.
//!
//! Rules are read from TOML files (see `rules/source.rs` for the format) into
//! a validated [`RuleSet`]. Validation happens once at load time:
//!
//! - every pattern has at least one token,
//! - every regular expression (text or tag, including and-group members and
//!   exceptions) compiles,
//! - back-references point to an earlier token of the same rule.
//!
//! Single patterns can be tried without a full file through
//! [`parse_fragment`] and [`parse_fragment_padded`].

#[path = "rules/source.rs"]
mod source;

use crate::engine;
use crate::error::RuleSourceError;
use crate::{PatternRule, TokenConstraint};
use source::{Fragment, RuleDef, RuleFile};
use std::path::Path;

/// An ordered, validated collection of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<PatternRule>,
}

impl RuleSet {
    /// Validate `rules` and collect them into a set.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, RuleSourceError> {
        for rule in &rules {
            validate_rule(rule)?;
        }
        Ok(Self { rules })
    }

    /// Parse a TOML rule file.
    pub fn parse(text: &str) -> Result<Self, RuleSourceError> {
        let file: RuleFile = toml::from_str(text)?;
        Self::new(file.rules.into_iter().map(RuleDef::into_rule).collect())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleSourceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| RuleSourceError::Io { path: path.to_path_buf(), source })?;
        let set = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), rules = set.len(), "rules loaded");
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatternRule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn into_rules(self) -> Vec<PatternRule> {
        self.rules
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a PatternRule;
    type IntoIter = std::slice::Iter<'a, PatternRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl PatternRule {
    /// Serialize as a self-contained `[[rule]]` block that parses back to an
    /// equal rule.
    pub fn to_source(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(&RuleFile { rules: vec![RuleDef::from_rule(self)] })
    }
}

/// Build a one-rule list from a bare `[[token]]` sequence.
///
/// A fragment that does not parse or validate yields an empty list.
pub fn parse_fragment(id: &str, fragment: &str) -> Vec<PatternRule> {
    match fragment_rule(id, fragment, false) {
        Ok(rule) => vec![rule],
        Err(err) => {
            tracing::warn!(rule = id, error = %err, "ignoring malformed rule fragment");
            Vec::new()
        }
    }
}

/// Like [`parse_fragment`], with an unconstrained token added before and after
/// the pattern. References inside the fragment are shifted to keep pointing
/// at the same tokens.
pub fn parse_fragment_padded(id: &str, fragment: &str) -> Vec<PatternRule> {
    match fragment_rule(id, fragment, true) {
        Ok(rule) => vec![rule],
        Err(err) => {
            tracing::warn!(rule = id, error = %err, "ignoring malformed rule fragment");
            Vec::new()
        }
    }
}

fn fragment_rule(id: &str, fragment: &str, padded: bool) -> Result<PatternRule, RuleSourceError> {
    let parsed: Fragment = toml::from_str(fragment)?;
    let mut tokens: Vec<TokenConstraint> = parsed.tokens.into_iter().map(|t| t.into_constraint()).collect();
    if padded {
        for token in &mut tokens {
            shift_references(token, 1);
        }
        tokens.insert(0, TokenConstraint::any());
        tokens.push(TokenConstraint::any());
    }
    let rule = PatternRule::new(id, tokens);
    validate_rule(&rule)?;
    Ok(rule)
}

fn shift_references(token: &mut TokenConstraint, by: usize) {
    if let Some(reference) = token.reference.as_mut() {
        reference.index += by;
    }
    for member in &mut token.and_group {
        shift_references(member, by);
    }
}

fn validate_rule(rule: &PatternRule) -> Result<(), RuleSourceError> {
    if rule.tokens.is_empty() {
        return Err(RuleSourceError::EmptyPattern { rule: rule.id.clone() });
    }
    for (index, token) in rule.tokens.iter().enumerate() {
        validate_token(token).map_err(|source| RuleSourceError::InvalidPattern {
            rule: rule.id.clone(),
            token: index,
            source,
        })?;
        let members = std::iter::once(token).chain(token.and_group.iter());
        for reference in members.filter_map(|m| m.reference) {
            if reference.index >= index {
                return Err(RuleSourceError::ForwardReference {
                    rule: rule.id.clone(),
                    token: index,
                    target: reference.index,
                });
            }
        }
    }
    Ok(())
}

fn validate_token(token: &TokenConstraint) -> Result<(), crate::CompileError> {
    engine::validate(token)?;
    for nested in token.and_group.iter().chain(&token.exceptions).chain(&token.previous_exceptions) {
        validate_token(nested)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaseConversion;

    const SAMPLE: &str = r#"
[[rule]]
id = "BIG_DOG"
name = "Adjective before dog"

[[rule.token]]
postag = "NN"
negate_pos = true

[[rule.token]]
text = "dog"

[[rule]]
id = "DOUBLED"

[[rule.token]]
text = "[a-z]+"
regex = true
case_sensitive = true

[[rule.token]]
reference = { index = 0, case = "start-upper" }

[[rule.token.exception]]
text = "the"
scope = "previous"

[[rule.token.exception]]
postag = "NN.*"
postag_regex = true

[[rule.token.and]]
text = "x.*"
regex = true
"#;

    #[test]
    fn parse_maps_every_field() {
        let set = RuleSet::parse(SAMPLE).unwrap();
        assert_eq!(set.len(), 2);

        let big_dog = set.get("BIG_DOG").unwrap();
        assert_eq!(big_dog.name.as_deref(), Some("Adjective before dog"));
        assert_eq!(
            big_dog.tokens,
            vec![TokenConstraint::any().with_pos("NN").negated_pos(), TokenConstraint::word("dog")]
        );

        let doubled = set.get("DOUBLED").unwrap();
        assert_eq!(doubled.tokens[0], TokenConstraint::regex("[a-z]+").case_sensitive());
        let second = &doubled.tokens[1];
        assert_eq!(second.reference.map(|r| r.conversion), Some(CaseConversion::StartUpper));
        assert_eq!(second.previous_exceptions, vec![TokenConstraint::word("the")]);
        assert_eq!(second.exceptions, vec![TokenConstraint::any().with_pos_regex("NN.*")]);
        assert_eq!(second.and_group, vec![TokenConstraint::regex("x.*")]);
        assert_eq!(doubled.inherited_exceptions(0), &[TokenConstraint::word("the")]);
    }

    #[test]
    fn to_source_parses_back_to_the_same_rule() {
        let set = RuleSet::parse(SAMPLE).unwrap();
        for rule in &set {
            let emitted = rule.to_source().unwrap();
            assert!(emitted.contains("[[rule]]"), "{emitted}");
            let reparsed = RuleSet::parse(&emitted).unwrap();
            assert_eq!(reparsed.rules(), std::slice::from_ref(rule));
        }
    }

    fn error_kind(err: &RuleSourceError) -> &'static str {
        match err {
            RuleSourceError::Io { .. } => "io",
            RuleSourceError::Parse(_) => "parse",
            RuleSourceError::EmptyPattern { .. } => "empty",
            RuleSourceError::ForwardReference { .. } => "forward",
            RuleSourceError::InvalidPattern { .. } => "invalid",
        }
    }

    #[test]
    fn invalid_sources_are_rejected() {
        let cases = [
            ("[[rule]]\nid = \"E\"\n", "empty"),
            ("[[rule]]\nid = \"E\"\n[[rule.token]]\ntext = \"(\"\nregex = true\n", "invalid"),
            (
                "[[rule]]\nid = \"E\"\n[[rule.token]]\ntext = \"a\"\n[[rule.token.exception]]\npostag = \"[\"\npostag_regex = true\n",
                "invalid",
            ),
            ("[[rule]]\nid = \"E\"\n[[rule.token]]\nreference = { index = 0 }\n", "forward"),
            ("[[rule]]\nid = \"E\"\n[[rule.token]]\ncolour = \"red\"\n", "parse"),
            ("not toml at all [", "parse"),
        ];
        for (source, expected) in cases {
            let err = RuleSet::parse(source).unwrap_err();
            assert_eq!(error_kind(&err), expected, "{source:?} gave {err:?}");
        }

        let err = RuleSet::parse("[[rule]]\nid = \"F\"\n[[rule.token]]\n[[rule.token]]\nreference = { index = 1 }\n")
            .unwrap_err();
        assert!(matches!(err, RuleSourceError::ForwardReference { token: 1, target: 1, .. }));
    }

    #[test]
    fn literal_regex_text_is_not_validated() {
        assert!(RuleSet::new(vec![PatternRule::new("L", vec![TokenConstraint::word("(")])]).is_ok());
    }

    #[test]
    fn fragments_wrap_a_token_sequence() {
        let fragment = "[[token]]\ntext = \"the\"\n[[token]]\npostag = \"NN\"\n";
        let rules = parse_fragment("AD_HOC", fragment);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "AD_HOC");
        assert_eq!(rules[0].tokens, vec![TokenConstraint::word("the"), TokenConstraint::any().with_pos("NN")]);

        assert!(parse_fragment("BAD", "[[token]]\ntext = \"(\"\nregex = true\n").is_empty());
        assert!(parse_fragment("BAD", "[[token]\n").is_empty());
        assert!(parse_fragment("EMPTY", "").is_empty());
    }

    #[test]
    fn padded_fragments_keep_references_aligned() {
        let fragment = "[[token]]\npostag = \"NN\"\n[[token]]\nreference = { index = 0 }\n";
        let rules = parse_fragment_padded("PADDED", fragment);
        let tokens = &rules[0].tokens;
        assert_eq!(tokens.len(), 4);
        assert!(tokens[0].is_unconstrained() && tokens[3].is_unconstrained());
        assert_eq!(tokens[2].reference.map(|r| r.index), Some(1));
    }
}
