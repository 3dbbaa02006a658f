//! Closed vocabulary of EDICT tag codes.
//!
//! A leading parenthesized group in an EDICT meaning is tag metadata only when
//! every comma-separated token in it is recognised here; anything else is a
//! parenthetical explanation that belongs to the gloss.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    PartOfSpeech,
    Field,
    Misc,
    Dialect,
    /// `(P)`: the word is common. Not stored as a tag.
    Priority,
}

/// Part-of-speech codes that appear on their own.
const POS_CODES: &[&str] = &[
    "adj", "adv", "aux", "conj", "cop", "ctr", "exp", "int", "n", "num", "pn", "pref", "prt",
    "suf", "unc", "vi", "vt", "vk", "vn", "vr", "vs", "vz",
];

/// Part-of-speech families written as `<prefix>-<variant>` or `<prefix><digit>...`
/// (`adj-i`, `n-adv`, `v5r`, `v1-s`).
const POS_PREFIXES: &[&str] = &["adj", "adv", "aux", "n", "vs", "v"];

const FIELD_CODES: &[&str] = &[
    "Buddh", "MA", "Shinto", "anat", "archit", "astron", "baseb", "biol", "bot", "bus", "chem",
    "comp", "econ", "elec", "engr", "finc", "food", "geol", "geom", "gramm", "law", "ling",
    "mahj", "math", "med", "mil", "music", "physics", "shogi", "sports", "sumo", "zool",
];

const MISC_CODES: &[&str] = &[
    "abbr", "arch", "ateji", "chn", "col", "derog", "eK", "ek", "fam", "fem", "gikun", "hon",
    "hum", "iK", "id", "ik", "io", "joc", "m-sl", "male", "male-sl", "oK", "obs", "obsc", "ok",
    "on-mim", "poet", "pol", "proverb", "rare", "sens", "sl", "uK", "uk", "vulg", "X", "yoji",
];

/// Cross-reference prefixes (`See 思う`, `ant: 上`).
const REFERENCE_PREFIXES: &[&str] = &["See ", "ant: "];

pub fn classify(token: &str) -> Option<TagKind> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token == "P" {
        return Some(TagKind::Priority);
    }
    if is_pos(token) {
        return Some(TagKind::PartOfSpeech);
    }
    if FIELD_CODES.contains(&token) {
        return Some(TagKind::Field);
    }
    if MISC_CODES.contains(&token) || REFERENCE_PREFIXES.iter().any(|p| token.starts_with(p)) {
        return Some(TagKind::Misc);
    }
    if is_dialect(token) {
        return Some(TagKind::Dialect);
    }
    None
}

fn is_pos(token: &str) -> bool {
    if POS_CODES.contains(&token) {
        return true;
    }
    POS_PREFIXES.iter().any(|prefix| {
        let Some(rest) = token.strip_prefix(prefix) else {
            return false;
        };
        let mut chars = rest.chars();
        match chars.next() {
            Some('-') => {
                let tail = chars.as_str();
                !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            }
            Some(c) if c.is_ascii_digit() => {
                // v5r, v5k-s, v2a-s
                rest.len() <= 6 && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            }
            _ => false,
        }
    })
}

/// Dialect codes end with a colon: `ksb:`, `kyb:`, `tsug:`.
fn is_dialect(token: &str) -> bool {
    token
        .strip_suffix(':')
        .is_some_and(|code| (2..=5).contains(&code.len()) && code.chars().all(|c| c.is_ascii_lowercase()))
}

/// Sense number groups such as `(1)`.
pub fn is_sense_number(group: &str) -> bool {
    !group.is_empty() && group.chars().all(|c| c.is_ascii_digit())
}

/// Classify every token of a parenthesized group. Returns `None` unless all
/// tokens are recognised tags.
pub fn classify_group(group: &str) -> Option<Vec<(TagKind, String)>> {
    let mut tags = Vec::new();
    for token in group.split(',') {
        let token = token.trim();
        let kind = classify(token)?;
        tags.push((kind, token.to_string()));
    }
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_codes_and_families() {
        for tag in ["n", "adj-i", "adj-na", "n-adv", "v5r", "v1", "vs-i", "exp", "adv-to", "vi"] {
            assert_eq!(classify(tag), Some(TagKind::PartOfSpeech), "{tag}");
        }
    }

    #[test]
    fn misc_field_dialect_priority() {
        assert_eq!(classify("uk"), Some(TagKind::Misc));
        assert_eq!(classify("See 思う"), Some(TagKind::Misc));
        assert_eq!(classify("food"), Some(TagKind::Field));
        assert_eq!(classify("ksb:"), Some(TagKind::Dialect));
        assert_eq!(classify("P"), Some(TagKind::Priority));
    }

    #[test]
    fn prose_is_not_a_tag() {
        assert_eq!(classify("nice"), None);
        assert_eq!(classify("never"), None);
        assert_eq!(classify("e.g. a dog"), None);
        assert_eq!(classify("vast"), None);
        assert_eq!(classify("n-"), None);
        assert!(classify_group("usu. written in kana").is_none());
        assert!(classify_group("n, for example").is_none());
    }

    #[test]
    fn groups_and_sense_numbers() {
        let tags = classify_group("adj-na,n").unwrap();
        assert_eq!(tags.len(), 2);
        assert!(is_sense_number("1"));
        assert!(is_sense_number("12"));
        assert!(!is_sense_number("n"));
        assert!(!is_sense_number(""));
    }
}
