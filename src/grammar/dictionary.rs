//! Word list of a grammar: maps the integer ids used by word arcs to words.

use std::collections::HashMap;

/// Largest word id a dictionary may declare.
pub const MAX_WORD_ID: i64 = 100_000;

#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashMap<u32, String>,
}

impl Dictionary {
    /// Words are stored uppercased; a repeated id keeps the last word.
    pub(crate) fn insert(&mut self, id: u32, word: &str) {
        self.words.insert(id, word.to_uppercase());
    }

    pub fn word(&self, id: u32) -> Option<&str> {
        self.words.get(&id).map(String::as_str)
    }

    /// Reverse lookup, mostly useful for diagnostics.
    pub fn id_of(&self, word: &str) -> Option<u32> {
        let word = word.to_uppercase();
        self.words.iter().filter(|(_, w)| **w == word).map(|(id, _)| *id).min()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
