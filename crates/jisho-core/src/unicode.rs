//! Character-level Unicode classification for Japanese text.

/// Prolonged sound mark ー (U+30FC).
pub const LONG_VOWEL_MARK: char = 'ー';

/// Any codepoint of the Hiragana block (U+3040..U+309F), iteration marks
/// and the voicing combiners included.
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF), which includes ー.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

/// A kanji reading token made only of katakana, allowing the `-` affix marker
/// KANJIDIC uses for prefix/suffix readings (`-ボウ`).
pub fn is_katakana_reading(s: &str) -> bool {
    let mut saw_kana = false;
    for c in s.chars() {
        if is_katakana(c) {
            saw_kana = true;
        } else if c != '-' {
            return false;
        }
    }
    saw_kana
}

/// A kun-reading token: hiragana with an optional `.` okurigana boundary and
/// `-` affix markers (`つ.ぐ`, `-がり`).
pub fn is_kun_reading(s: &str) -> bool {
    let mut saw_hiragana = false;
    for c in s.chars() {
        if is_hiragana(c) || c == LONG_VOWEL_MARK {
            saw_hiragana |= is_hiragana(c);
        } else if c != '.' && c != '-' {
            return false;
        }
    }
    saw_hiragana
}
