//! Morphological dictionaries.
//!
//! The engine only needs two things from a dictionary:
//!
//! - a stable, indexable enumeration of every known surface form (the search
//!   cursor walks it), and
//! - a lookup from surface form to its readings (lemma + part-of-speech tag).
//!
//! [`WordList`] is the in-memory implementation. It can be filled in code or
//! loaded from a tab-separated dump (`word<TAB>lemma<TAB>tag` per line), which
//! is the format morphological dictionary tools export to.

use crate::error::DictionaryError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// One reading of a surface form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MorphEntry {
    pub word: String,
    pub lemma: String,
    pub tag: String,
}

/// Read access to a morphological dictionary.
pub trait MorphDictionary {
    /// Number of distinct surface forms.
    fn len(&self) -> usize;

    /// Surface form at `index` in enumeration order.
    fn word(&self, index: usize) -> Option<&str>;

    /// All readings of `word`; empty if unknown.
    fn lookup(&self, word: &str) -> &[MorphEntry];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D: MorphDictionary + ?Sized> MorphDictionary for &D {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn word(&self, index: usize) -> Option<&str> {
        (**self).word(index)
    }

    fn lookup(&self, word: &str) -> &[MorphEntry] {
        (**self).lookup(word)
    }
}

impl<D: MorphDictionary + ?Sized> MorphDictionary for Arc<D> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn word(&self, index: usize) -> Option<&str> {
        (**self).word(index)
    }

    fn lookup(&self, word: &str) -> &[MorphEntry] {
        (**self).lookup(word)
    }
}

/// In-memory dictionary with insertion-ordered enumeration.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: Vec<String>,
    readings: HashMap<String, Vec<MorphEntry>>,
}

impl WordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reading. A surface form is enumerated once, at the position of
    /// its first reading; repeated identical readings are ignored.
    pub fn insert(&mut self, word: &str, lemma: &str, tag: &str) {
        let entry = MorphEntry { word: word.to_string(), lemma: lemma.to_string(), tag: tag.to_string() };
        match self.readings.get_mut(word) {
            Some(existing) => {
                if !existing.contains(&entry) {
                    existing.push(entry);
                }
            }
            None => {
                self.words.push(word.to_string());
                self.readings.insert(word.to_string(), vec![entry]);
            }
        }
    }

    /// Parse a tab-separated dump. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, DictionaryError> {
        let mut list = WordList::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim_end_matches('\r');
            if trimmed.trim().is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut cols = trimmed.split('\t');
            match (cols.next(), cols.next(), cols.next(), cols.next()) {
                (Some(word), Some(lemma), Some(tag), None) if !word.is_empty() => list.insert(word, lemma, tag),
                _ => return Err(DictionaryError::Malformed { line: idx + 1, content: trimmed.to_string() }),
            }
        }
        Ok(list)
    }

    /// Load a dump from disk. An unreadable or empty dump is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| DictionaryError::Io { path: path.to_path_buf(), source })?;
        let list = Self::parse(&text)?;
        if list.is_empty() {
            return Err(DictionaryError::Empty { path: path.to_path_buf() });
        }
        tracing::debug!(path = %path.display(), words = list.len(), "dictionary loaded");
        Ok(list)
    }
}

impl MorphDictionary for WordList {
    fn len(&self) -> usize {
        self.words.len()
    }

    fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    fn lookup(&self, word: &str) -> &[MorphEntry] {
        self.readings.get(word).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<'a> FromIterator<(&'a str, &'a str, &'a str)> for WordList {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str, &'a str)>>(iter: I) -> Self {
        let mut list = WordList::new();
        for (word, lemma, tag) in iter {
            list.insert(word, lemma, tag);
        }
        list
    }
}

/// Distinct lemmas of `word`, in reading order.
pub(crate) fn lemmas_of<D: MorphDictionary + ?Sized>(dict: &D, word: &str) -> Vec<String> {
    let mut lemmas: Vec<String> = Vec::new();
    for entry in dict.lookup(word) {
        if !lemmas.contains(&entry.lemma) {
            lemmas.push(entry.lemma.clone());
        }
    }
    lemmas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dump_keeps_first_seen_order() {
        let dump = "# sample\nran\trun\tVBD\ndogs\tdog\tNNS\n\nran\trun\tVBN\nran\trun\tVBD\n";
        let list = WordList::parse(dump).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.word(0), Some("ran"));
        assert_eq!(list.word(1), Some("dogs"));
        assert_eq!(list.word(2), None);

        let tags: Vec<&str> = list.lookup("ran").iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["VBD", "VBN"]);
        assert_eq!(lemmas_of(&list, "ran"), vec!["run".to_string()]);
        assert!(list.lookup("cat").is_empty());
    }

    #[test]
    fn parse_rejects_wrong_column_count() {
        let err = WordList::parse("ok\tok\tNN\nbroken\tline\n").unwrap_err();
        match err {
            DictionaryError::Malformed { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "broken\tline");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(WordList::parse("a\tb\tc\td\n").is_err());
    }

    #[test]
    fn load_missing_file_is_fatal() {
        let err = WordList::load("/definitely/not/here.tsv").unwrap_err();
        assert!(matches!(err, DictionaryError::Io { .. }));
    }

    #[test]
    fn shared_handles_delegate() {
        let list: WordList = [("a", "a", "DT"), ("b", "b", "NN")].into_iter().collect();
        let shared = Arc::new(list);
        let by_ref = &*shared;
        assert_eq!(MorphDictionary::len(&shared), 2);
        assert_eq!(MorphDictionary::word(&by_ref, 1), Some("b"));
        assert_eq!(shared.lookup("a")[0].tag, "DT");
    }
}
