//! TOML representation of rule files.
//!
//! ```toml
//! [[rule]]
//! id = "DOUBLE_WORD"
//! name = "Repeated word"
//!
//! [[rule.token]]
//! postag = "NN"
//!
//! [[rule.token]]
//! reference = { index = 0, case = "preserve" }
//!
//! [[rule.token.exception]]
//! text = "that"
//! scope = "previous"
//! ```
//!
//! Every field except `id` is optional. The definitions here are only the
//! wire shape; conversion into [`PatternRule`] happens in `into_rule`.

use crate::{CaseConversion, ConstraintFlags, PatternRule, Reference, TokenConstraint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RuleFile {
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleDef>,
}

/// A bare token sequence, as accepted by `parse_fragment`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Fragment {
    #[serde(default, rename = "token")]
    pub tokens: Vec<TokenDef>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RuleDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "token")]
    pub tokens: Vec<TokenDef>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TokenDef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    regex: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    postag: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    postag_regex: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    negate: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    negate_pos: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    inflected: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    case_sensitive: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    sentence_start: bool,
    /// Only meaningful on exceptions.
    #[serde(default, skip_serializing_if = "Scope::is_current")]
    scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<ReferenceDef>,
    #[serde(default, rename = "and", skip_serializing_if = "Vec::is_empty")]
    and_group: Vec<TokenDef>,
    #[serde(default, rename = "exception", skip_serializing_if = "Vec::is_empty")]
    exceptions: Vec<TokenDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferenceDef {
    index: usize,
    #[serde(default, skip_serializing_if = "CaseDef::is_preserve")]
    case: CaseDef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum CaseDef {
    #[default]
    Preserve,
    StartLower,
    StartUpper,
    AllLower,
    AllUpper,
}

impl CaseDef {
    fn is_preserve(&self) -> bool {
        *self == CaseDef::Preserve
    }
}

impl From<CaseDef> for CaseConversion {
    fn from(case: CaseDef) -> Self {
        match case {
            CaseDef::Preserve => CaseConversion::Preserve,
            CaseDef::StartLower => CaseConversion::StartLower,
            CaseDef::StartUpper => CaseConversion::StartUpper,
            CaseDef::AllLower => CaseConversion::AllLower,
            CaseDef::AllUpper => CaseConversion::AllUpper,
        }
    }
}

impl From<CaseConversion> for CaseDef {
    fn from(conversion: CaseConversion) -> Self {
        match conversion {
            CaseConversion::Preserve => CaseDef::Preserve,
            CaseConversion::StartLower => CaseDef::StartLower,
            CaseConversion::StartUpper => CaseDef::StartUpper,
            CaseConversion::AllLower => CaseDef::AllLower,
            CaseConversion::AllUpper => CaseDef::AllUpper,
        }
    }
}

/// Which position an exception applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Scope {
    #[default]
    Current,
    Previous,
}

impl Scope {
    fn is_current(&self) -> bool {
        *self == Scope::Current
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl RuleDef {
    pub(crate) fn into_rule(self) -> PatternRule {
        PatternRule {
            id: self.id,
            name: self.name,
            tokens: self.tokens.into_iter().map(TokenDef::into_constraint).collect(),
        }
    }

    pub(crate) fn from_rule(rule: &PatternRule) -> Self {
        RuleDef {
            id: rule.id.clone(),
            name: rule.name.clone(),
            tokens: rule.tokens.iter().map(TokenDef::from_constraint).collect(),
        }
    }
}

impl TokenDef {
    pub(crate) fn into_constraint(self) -> TokenConstraint {
        let mut flags = ConstraintFlags::empty();
        flags.set(ConstraintFlags::REGEX, self.regex);
        flags.set(ConstraintFlags::POS_REGEX, self.postag_regex && self.postag.is_some());
        flags.set(ConstraintFlags::NEGATE, self.negate);
        flags.set(ConstraintFlags::NEGATE_POS, self.negate_pos);
        flags.set(ConstraintFlags::INFLECTED, self.inflected);
        flags.set(ConstraintFlags::CASE_SENSITIVE, self.case_sensitive);
        flags.set(ConstraintFlags::SENT_START, self.sentence_start);

        let mut exceptions = Vec::new();
        let mut previous_exceptions = Vec::new();
        for exception in self.exceptions {
            match exception.scope {
                Scope::Current => exceptions.push(exception.into_constraint()),
                Scope::Previous => previous_exceptions.push(exception.into_constraint()),
            }
        }

        TokenConstraint {
            text: self.text,
            pos_tag: self.postag,
            flags,
            and_group: self.and_group.into_iter().map(TokenDef::into_constraint).collect(),
            exceptions,
            previous_exceptions,
            reference: self.reference.map(|r| Reference { index: r.index, conversion: r.case.into() }),
        }
    }

    pub(crate) fn from_constraint(token: &TokenConstraint) -> Self {
        let scoped = |scope: Scope| {
            move |exception: &TokenConstraint| TokenDef { scope, ..TokenDef::from_constraint(exception) }
        };
        let exceptions = token
            .exceptions
            .iter()
            .map(scoped(Scope::Current))
            .chain(token.previous_exceptions.iter().map(scoped(Scope::Previous)))
            .collect();

        TokenDef {
            text: token.text.clone(),
            regex: token.is_regex(),
            postag: token.pos_tag.clone(),
            postag_regex: token.is_pos_regex(),
            negate: token.is_negated(),
            negate_pos: token.is_pos_negated(),
            inflected: token.is_inflected(),
            case_sensitive: token.is_case_sensitive(),
            sentence_start: token.is_sentence_start(),
            scope: Scope::Current,
            reference: token.reference.map(|r| ReferenceDef { index: r.index, case: r.conversion.into() }),
            and_group: token.and_group.iter().map(TokenDef::from_constraint).collect(),
            exceptions,
        }
    }
}
