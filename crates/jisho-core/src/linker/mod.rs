//! Example-to-word cross-referencing.
//!
//! Two strategies feed one deduplicated link set per example:
//!
//! 1. every annotation segment's `ruby` is looked up in the [`FormIndex`];
//! 2. every substring of the normalized sentence that is at least
//!    `min_substring_chars` long is looked up as well.
//!
//! The total number of links per example is capped, which bounds the work
//! done on degenerate sentences. Matching is approximate: short common forms
//! produce false positives and irregular inflections are missed.

mod form_index;


use std::collections::HashSet;

pub use form_index::{FormIndex, WordId};

use crate::annotation::parse_annotation;
use crate::normalize::normalize;
use crate::settings::LinkSettings;

/// Thresholds for the substring strategy and the per-example cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPolicy {
    pub min_substring_chars: usize,
    pub max_links_per_example: usize,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            min_substring_chars: 3,
            max_links_per_example: 20,
        }
    }
}

impl From<&LinkSettings> for LinkPolicy {
    fn from(s: &LinkSettings) -> Self {
        Self {
            min_substring_chars: s.min_substring_chars,
            max_links_per_example: s.max_links_per_example,
        }
    }
}

/// Words linked to one example, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub word_ids: Vec<WordId>,
    pub by_annotation: usize,
    pub by_substring: usize,
    /// The cap was reached and the search stopped there.
    pub capped: bool,
}

impl Links {
    pub fn len(&self) -> usize {
        self.word_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_ids.is_empty()
    }
}

/// Links examples against a borrowed, fully built form index.
pub struct Linker<'a> {
    index: &'a FormIndex,
    policy: LinkPolicy,
}

struct LinkSet {
    seen: HashSet<WordId>,
    links: Links,
    cap: usize,
}

impl LinkSet {
    fn full(&self) -> bool {
        self.links.word_ids.len() >= self.cap
    }

    /// Returns `true` when `id` was new.
    fn add(&mut self, id: WordId) -> bool {
        if self.seen.insert(id) {
            self.links.word_ids.push(id);
            true
        } else {
            false
        }
    }
}

impl<'a> Linker<'a> {
    pub fn new(index: &'a FormIndex, policy: LinkPolicy) -> Self {
        Self { index, policy }
    }

    pub fn link(&self, sentence: &str, breakdown: &str) -> Links {
        let mut set = LinkSet {
            seen: HashSet::new(),
            links: Links::default(),
            cap: self.policy.max_links_per_example,
        };
        if set.cap == 0 {
            return set.links;
        }

        for segment in parse_annotation(breakdown) {
            if set.full() {
                set.links.capped = true;
                return set.links;
            }
            let form = normalize(&segment.ruby);
            if let Some(id) = self.index.get(form.as_str()) {
                if set.add(id) {
                    set.links.by_annotation += 1;
                }
            }
        }

        self.scan_substrings(sentence, &mut set);
        set.links
    }

    fn scan_substrings(&self, sentence: &str, set: &mut LinkSet) {
        let text = normalize(sentence);
        let text = text.as_str();
        let min = self.policy.min_substring_chars.max(1);
        let max = self.index.max_form_chars();
        if max < min {
            return;
        }

        // Byte offset of every char boundary, end included.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let chars = bounds.len() - 1;

        for start in 0..chars {
            let longest = max.min(chars - start);
            for len in min..=longest {
                if set.full() {
                    set.links.capped = true;
                    return;
                }
                let form = &text[bounds[start]..bounds[start + len]];
                if let Some(id) = self.index.get(form) {
                    if set.add(id) {
                        set.links.by_substring += 1;
                    }
                }
            }
        }
    }
}
