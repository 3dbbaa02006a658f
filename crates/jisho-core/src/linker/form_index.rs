use std::collections::HashMap;

use tracing::debug_span;

use crate::inflect::inflected_forms;

/// Row id of a loaded word.
pub type WordId = i64;

/// Transient map from normalized surface forms (generated inflections
/// included) to the word that produced them.
///
/// Built once after words are committed, read-only while linking, dropped
/// afterwards. On collision the first word inserted keeps the form.
#[derive(Debug, Default)]
pub struct FormIndex {
    forms: HashMap<String, WordId>,
    max_form_chars: usize,
    collisions: usize,
}

impl FormIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from `(id, surface, reading)` rows, in row order.
    pub fn from_words<'a, I>(words: I) -> Self
    where
        I: IntoIterator<Item = (WordId, Option<&'a str>, Option<&'a str>)>,
    {
        let _span = debug_span!("form_index_build").entered();
        let mut index = Self::new();
        for (id, surface, reading) in words {
            index.insert_word(id, surface, reading);
        }
        tracing::debug!(
            forms = index.len(),
            collisions = index.collisions,
            "form index built"
        );
        index
    }

    /// Register every generated form of a word. Returns how many forms were
    /// newly claimed by it.
    pub fn insert_word(&mut self, id: WordId, surface: Option<&str>, reading: Option<&str>) -> usize {
        inflected_forms(surface, reading)
            .into_iter()
            .filter(|form| self.insert(form, id))
            .count()
    }

    /// Insert an already-normalized form. Returns `false` if another word
    /// already holds it.
    pub fn insert(&mut self, form: &str, id: WordId) -> bool {
        if form.is_empty() {
            return false;
        }
        if self.forms.contains_key(form) {
            self.collisions += 1;
            return false;
        }
        self.max_form_chars = self.max_form_chars.max(form.chars().count());
        self.forms.insert(form.to_string(), id);
        true
    }

    pub fn get(&self, form: &str) -> Option<WordId> {
        self.forms.get(form).copied()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Longest registered form, in characters.
    pub fn max_form_chars(&self) -> usize {
        self.max_form_chars
    }

    /// Forms that were already claimed when another word generated them.
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}
