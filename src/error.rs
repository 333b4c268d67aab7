use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a morphological dictionary. Always fatal for a session.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("could not read dictionary {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed dictionary line {line}: expected `word<TAB>lemma<TAB>tag`, got {content:?}")]
    Malformed { line: usize, content: String },
    #[error("dictionary {path} contains no entries")]
    Empty { path: PathBuf },
}

/// Failure to load or validate a rule source.
#[derive(Debug, Error)]
pub enum RuleSourceError {
    #[error("could not read rule file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("rule source is not valid TOML")]
    Parse(#[from] toml::de::Error),
    #[error("rule {rule}: pattern is empty")]
    EmptyPattern { rule: String },
    #[error("rule {rule}, token {token}: reference to token {target} does not point backwards")]
    ForwardReference { rule: String, token: usize, target: usize },
    #[error("rule {rule}, token {token}: {source}")]
    InvalidPattern {
        rule: String,
        token: usize,
        #[source]
        source: CompileError,
    },
}

/// A constraint whose text or tag pattern does not compile.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("invalid regular expression {pattern:?}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure while computing or writing coverage. `E` is the checker's error.
#[derive(Debug, Error)]
pub enum CoverageError<E>
where
    E: std::error::Error + 'static,
{
    #[error("checking engine failed")]
    Check(#[source] E),
    #[error("could not write rule to output")]
    Io(#[from] io::Error),
    #[error("could not serialize rule {rule}")]
    Serialize {
        rule: String,
        #[source]
        source: toml::ser::Error,
    },
}
