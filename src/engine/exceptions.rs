//! Exception evaluation.
//!
//! A position's exceptions come from two places: the token's own `exceptions`
//! and the `previous_exceptions` of the token to its right. Callers merge both
//! lists and compile them once into [`CompiledExceptions`]; evaluation itself
//! never compiles anything.

use super::compile::CompiledConstraint;
use crate::dictionary::{MorphDictionary, MorphEntry};
use crate::error::CompileError;
use crate::TokenConstraint;

/// Precompiled exception list. Empty means "never excepted".
#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledExceptions {
    matchers: Vec<CompiledConstraint>,
}

impl CompiledExceptions {
    pub(crate) fn compile<'c, D, I>(exceptions: I, dict: &D) -> Result<Self, CompileError>
    where
        D: MorphDictionary + ?Sized,
        I: IntoIterator<Item = &'c TokenConstraint>,
    {
        let matchers =
            exceptions.into_iter().map(|e| CompiledConstraint::compile(e, dict)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchers })
    }

    pub(crate) fn len(&self) -> usize {
        self.matchers.len()
    }

    /// True when `word` satisfies any exception.
    pub(crate) fn is_excepted<D>(&self, word: &str, dict: &D) -> bool
    where
        D: MorphDictionary + ?Sized,
    {
        self.matchers.iter().any(|m| m.matches(word, dict))
    }

    /// Same as [`is_excepted`](Self::is_excepted) with caller-supplied readings.
    pub(crate) fn is_excepted_with<'e>(&self, word: &str, readings: impl Fn() -> &'e [MorphEntry]) -> bool {
        self.matchers.iter().any(|m| m.matches_with(word, &readings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_dictionary;

    #[test]
    fn empty_list_never_excepts() {
        let dict = sample_dictionary();
        let empty: [TokenConstraint; 0] = [];
        let none = CompiledExceptions::compile(&empty, &dict).unwrap();
        assert_eq!(none.len(), 0);
        assert!(!none.is_excepted("dog", &dict));
    }

    #[test]
    fn any_exception_disqualifies() {
        let dict = sample_dictionary();
        let exceptions = [
            TokenConstraint::word("dog"),
            TokenConstraint::any().with_pos("JJ"),
            TokenConstraint::word("go").inflected(),
        ];
        let compiled = CompiledExceptions::compile(&exceptions, &dict).unwrap();

        assert!(compiled.is_excepted("dog", &dict));
        assert!(compiled.is_excepted("big", &dict));
        assert!(compiled.is_excepted("went", &dict));
        assert!(!compiled.is_excepted("cat", &dict));
        assert!(!compiled.is_excepted("dogs", &dict));
    }

    #[test]
    fn negated_exception_excepts_everything_else() {
        let dict = sample_dictionary();
        let compiled = CompiledExceptions::compile(&[TokenConstraint::regex("ca.*").negated()], &dict).unwrap();
        assert!(!compiled.is_excepted("cat", &dict));
        assert!(compiled.is_excepted("dog", &dict));
    }
}
