//! Approximate inflected-form generation.
//!
//! A recall booster for example linking, nothing more. The rules below are a
//! handful of suffix rewrites and do not model conjugation classes, so
//! `しゃべる` yields `しゃべない`. Generated forms live only in the
//! form index and are never written to the store.

use std::collections::BTreeSet;

use crate::normalize::normalize;
use crate::unicode::LONG_VOWEL_MARK;

/// Bases shorter than this (in characters) get no suffix rewrites.
const MIN_INFLECTABLE_CHARS: usize = 3;

const ADJECTIVE_ENDINGS: &[&str] = &["く", "くて"];
const RU_ENDINGS: &[&str] = &["た", "て", "ない", "ます"];
const U_ENDINGS: &[&str] = &["った", "って", "わない"];

/// Candidate surface strings for a word, normalized. Includes the canonical
/// surface and reading themselves.
pub fn inflected_forms(surface: Option<&str>, reading: Option<&str>) -> BTreeSet<String> {
    let mut bases = BTreeSet::new();
    for text in [surface, reading].into_iter().flatten() {
        let canonical = normalize(text).into_string();
        if canonical.is_empty() {
            continue;
        }
        let stripped: String = canonical.chars().filter(|&c| c != LONG_VOWEL_MARK).collect();
        if !stripped.is_empty() {
            bases.insert(stripped);
        }
        bases.insert(canonical);
    }

    let mut forms = bases.clone();
    for base in &bases {
        add_suffix_rewrites(base, &mut forms);
    }
    forms
}

fn add_suffix_rewrites(base: &str, forms: &mut BTreeSet<String>) {
    if let Some(stem) = base.strip_suffix("する") {
        if !stem.is_empty() {
            forms.insert(stem.to_string());
        }
        return;
    }
    if base.chars().count() < MIN_INFLECTABLE_CHARS {
        return;
    }

    let (stem, endings) = if let Some(stem) = base.strip_suffix('い') {
        (stem, ADJECTIVE_ENDINGS)
    } else if let Some(stem) = base.strip_suffix('る') {
        (stem, RU_ENDINGS)
    } else if let Some(stem) = base.strip_suffix('う') {
        (stem, U_ENDINGS)
    } else {
        return;
    };
    for ending in endings {
        forms.insert(format!("{stem}{ending}"));
    }
}
