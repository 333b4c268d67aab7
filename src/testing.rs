//! Shared fixtures for unit tests.

use crate::dictionary::{MorphDictionary, MorphEntry, WordList};
use std::cell::Cell;

/// Small English dictionary. Enumeration order matters to tests that expect
/// the first matching word.
pub(crate) fn sample_dictionary() -> WordList {
    [
        ("the", "the", "DT"),
        ("big", "big", "JJ"),
        ("dog", "dog", "NN"),
        ("dogs", "dog", "NNS"),
        ("cat", "cat", "NN"),
        ("ran", "run", "VBD"),
        ("run", "run", "VB"),
        ("runs", "run", "VBZ"),
        ("quickly", "quickly", "RB"),
        ("a", "a", "DT"),
        ("went", "go", "VBD"),
        ("house", "house", "NN"),
        ("house", "house", "VB"),
        ("houses", "house", "NNS"),
        ("teeth", "tooth", "NNS"),
    ]
    .into_iter()
    .collect()
}

/// Wraps a dictionary and counts enumeration and lookup calls.
pub(crate) struct CountingDictionary<D> {
    inner: D,
    visits: Cell<usize>,
    lookups: Cell<usize>,
}

impl<D: MorphDictionary> CountingDictionary<D> {
    pub(crate) fn new(inner: D) -> Self {
        Self { inner, visits: Cell::new(0), lookups: Cell::new(0) }
    }

    /// Successful `word(index)` calls.
    pub(crate) fn visits(&self) -> usize {
        self.visits.get()
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl<D: MorphDictionary> MorphDictionary for CountingDictionary<D> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn word(&self, index: usize) -> Option<&str> {
        let word = self.inner.word(index);
        if word.is_some() {
            self.visits.set(self.visits.get() + 1);
        }
        word
    }

    fn lookup(&self, word: &str) -> &[MorphEntry] {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.lookup(word)
    }
}
