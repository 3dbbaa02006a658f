//! Merges word records that collide on identity key across sources.
//!
//! The first record seen for an identity keeps its position; later records
//! only contribute senses that are new by `(normalized gloss, pos)`.

use std::collections::{HashMap, HashSet};

use crate::entry::{Sense, WordEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Merged,
}

#[derive(Default)]
pub struct WordMerger {
    entries: Vec<WordEntry>,
    by_identity: HashMap<String, usize>,
    sense_keys: Vec<HashSet<String>>,
}

impl WordMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut entry: WordEntry) -> MergeOutcome {
        let identity = entry.identity();
        if let Some(&idx) = self.by_identity.get(&identity) {
            let existing = &mut self.entries[idx];
            let keys = &mut self.sense_keys[idx];
            for sense in entry.senses {
                if keys.insert(sense.dedup_key()) {
                    existing.senses.push(sense);
                }
            }
            existing.common |= entry.common;
            if existing.external_id.is_none() {
                existing.external_id = entry.external_id;
            }
            return MergeOutcome::Merged;
        }

        let mut keys = HashSet::new();
        entry.senses = dedup_senses(std::mem::take(&mut entry.senses), &mut keys);
        self.by_identity.insert(identity, self.entries.len());
        self.entries.push(entry);
        self.sense_keys.push(keys);
        MergeOutcome::Inserted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn into_entries(self) -> Vec<WordEntry> {
        self.entries
    }
}

fn dedup_senses(senses: Vec<Sense>, keys: &mut HashSet<String>) -> Vec<Sense> {
    senses
        .into_iter()
        .filter(|s| keys.insert(s.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::WordSource;

    fn sense(gloss: &str, pos: &str) -> Sense {
        Sense {
            glosses: vec![gloss.to_string()],
            parts_of_speech: vec![pos.to_string()],
            ..Default::default()
        }
    }

    fn word(surface: &str, reading: &str, senses: Vec<Sense>) -> WordEntry {
        WordEntry {
            surface: Some(surface.to_string()),
            reading: Some(reading.to_string()),
            senses,
            external_id: None,
            common: false,
            source: WordSource::Edict,
        }
    }

    #[test]
    fn merges_disjoint_senses_in_order() {
        let mut merger = WordMerger::new();
        assert_eq!(
            merger.insert(word("犬", "いぬ", vec![sense("dog", "n")])),
            MergeOutcome::Inserted
        );
        assert_eq!(
            merger.insert(word("犬", "いぬ", vec![sense("spy", "n"), sense("dog", "n")])),
            MergeOutcome::Merged
        );
        let entries = merger.into_entries();
        assert_eq!(entries.len(), 1);
        let glosses: Vec<_> = entries[0].senses.iter().map(|s| s.gloss_text()).collect();
        assert_eq!(glosses, vec!["dog", "spy"]);
    }

    #[test]
    fn same_gloss_different_pos_is_kept() {
        let mut merger = WordMerger::new();
        merger.insert(word("走る", "はしる", vec![sense("to run", "v5r")]));
        merger.insert(word("走る", "はしる", vec![sense("to run", "vi")]));
        assert_eq!(merger.into_entries()[0].senses.len(), 2);
    }

    #[test]
    fn identity_folds_width_and_whitespace() {
        let mut merger = WordMerger::new();
        merger.insert(word("ｶﾒﾗ", "かめら", vec![sense("camera", "n")]));
        let outcome = merger.insert(word("カメラ", "かめら ", vec![sense("Camera ", "n")]));
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(merger.len(), 1);
        // "Camera " normalizes to "Camera", which differs from "camera".
        assert_eq!(merger.into_entries()[0].senses.len(), 2);
    }

    #[test]
    fn duplicate_senses_within_first_record_collapse() {
        let mut merger = WordMerger::new();
        merger.insert(word("猫", "ねこ", vec![sense("cat", "n"), sense("cat", "n")]));
        assert_eq!(merger.into_entries()[0].senses.len(), 1);
    }

    #[test]
    fn common_flag_and_external_id_merge() {
        let mut merger = WordMerger::new();
        merger.insert(word("本", "ほん", vec![sense("book", "n")]));
        let mut second = word("本", "ほん", vec![]);
        second.common = true;
        second.external_id = Some("EntL1522150X".into());
        merger.insert(second);
        let entry = &merger.into_entries()[0];
        assert!(entry.common);
        assert_eq!(entry.external_id.as_deref(), Some("EntL1522150X"));
    }
}
