//! Bounded dictionary search.
//!
//! The cursor walks the dictionary's enumeration and is shared by every search
//! in a session, so consecutive tokens pick up where the previous search
//! stopped instead of always returning the dictionary's first words.
//!
//! A constraint is never guaranteed to be satisfiable, so the scan is bounded:
//!
//! ```text
//! advance ── word ── accept? ──yes──> Some(word)
//!    │                 │no
//!    │ <───────────────┘
//!    └── exhausted: n-th time?  n < max_passes -> reset cursor, continue
//!                               n = max_passes -> None ("no example")
//! ```
//!
//! Starting from a fresh cursor this is at most `max_passes` full traversals.
//! Running out is not an error; the resolver turns it into a missing word.

use crate::api::DEFAULT_MAX_PASSES;
use crate::dictionary::MorphDictionary;

/// Termination policy for a dictionary scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Number of times the cursor may run off the end before the search
    /// fails. Values below 1 behave like 1.
    pub max_passes: usize,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        SearchPolicy { max_passes: DEFAULT_MAX_PASSES }
    }
}

/// Position in a dictionary's enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryCursor {
    position: usize,
    resets: usize,
}

impl DictionaryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the next word to be returned.
    pub fn position(&self) -> usize {
        self.position
    }

    /// How many times this cursor has been rewound.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Rewind to the first word.
    pub fn reset(&mut self) {
        self.position = 0;
        self.resets += 1;
    }

    /// Return the word under the cursor and step past it, or `None` once the
    /// enumeration is exhausted.
    pub fn advance<'d, D>(&mut self, dict: &'d D) -> Option<&'d str>
    where
        D: MorphDictionary + ?Sized,
    {
        let word = dict.word(self.position)?;
        self.position += 1;
        Some(word)
    }
}

/// Counters for a single search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SearchStats {
    pub candidates: usize,
    pub resets: usize,
}

/// Return the first word, from the cursor on, that `accept` takes.
pub(crate) fn find_word<D, F>(
    dict: &D,
    cursor: &mut DictionaryCursor,
    policy: SearchPolicy,
    stats: &mut SearchStats,
    mut accept: F,
) -> Option<String>
where
    D: MorphDictionary + ?Sized,
    F: FnMut(&str) -> bool,
{
    let max_passes = policy.max_passes.max(1);
    let mut exhausted = 0;

    loop {
        match cursor.advance(dict) {
            Some(word) => {
                stats.candidates += 1;
                if accept(word) {
                    return Some(word.to_string());
                }
            }
            None => {
                exhausted += 1;
                if exhausted >= max_passes {
                    tracing::trace!(candidates = stats.candidates, exhausted, "dictionary search gave up");
                    return None;
                }
                cursor.reset();
                stats.resets += 1;
                tracing::trace!(candidates = stats.candidates, "dictionary cursor rewound");
            }
        }
    }
}
