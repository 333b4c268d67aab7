//! Example synthesis engine.
//!
//! The engine turns a [`PatternRule`](crate::PatternRule) into a concrete
//! sentence. It is split into focused submodules under `src/engine/`.
//!
//! ## How the parts work together
//!
//! ```text
//! PatternRule ── Synthesizer::synthesize          (synthesize.rs)
//!                  for each token i (left to right)
//!                  │  inherited = token[i+1].previous_exceptions
//!                  v
//!                classify(token)                    (classify.rs)
//!                  │  SentenceStart | Conjunction | BackReference
//!                  │  Literal | Punctuation | Disjunction | General
//!                  v
//!                TokenResolver::resolve             (resolve.rs)
//!                  ├─ direct answers (literal, punctuation, random alternative)
//!                  └─ CompiledConstraint::compile   (compile.rs)
//!                     CompiledExceptions::compile   (exceptions.rs)
//!                     find_word (bounded passes)    (search.rs)
//!                  │
//!                  v
//!                Option<String> per token ── join + normalize ── sentence
//! ```
//!
//! ## Responsibilities by module
//!
//! - `compile.rs`: text / part-of-speech matchers, compiled once per resolve
//!   call and reused for every dictionary candidate.
//! - `exceptions.rs`: the "is this word disqualified" test over precompiled
//!   exception matchers.
//! - `search.rs`: the dictionary cursor and the bounded enumeration.
//! - `classify.rs`: decides once which generation strategy a token needs.
//! - `resolve.rs`: produces one word for one token.
//! - `synthesize.rs`: the session that owns dictionary, cursor and random
//!   source, and assembles sentences.
//! - `metrics.rs`: per-token timing and search counters, surfaced by
//!   `synthesize_verbose`.
//!
//! ## Resource model
//!
//! A [`Synthesizer`] owns its dictionary handle, its [`DictionaryCursor`] and
//! its random source. The cursor is mutable session state and is never shared:
//! parallel callers need one session each.

#[path = "engine/classify.rs"]
mod classify;
#[path = "engine/compile.rs"]
mod compile;
#[path = "engine/exceptions.rs"]
mod exceptions;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/search.rs"]
mod search;
#[path = "engine/synthesize.rs"]
mod synthesize;

pub use classify::StrategyKind;
pub(crate) use compile::{CompiledConstraint, validate};
pub(crate) use exceptions::CompiledExceptions;
pub use search::{DictionaryCursor, SearchPolicy};
pub use synthesize::Synthesizer;
