//! Fixed-field kanji records, one character per line:
//! `亜 3021 U4e9c G8 S7 F1509 ア つ.ぐ T1 や つぐ {Asia} {rank next}`.

use super::{RecordParser, RejectReason};
use crate::entry::KanjiEntry;
use crate::unicode::{is_katakana_reading, is_kun_reading};

pub struct KanjidicParser;

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Meaning(&'a str),
}

/// Split a line into whitespace-separated words and `{...}` meaning groups.
/// A meaning group may contain spaces.
fn tokenize(line: &str) -> Result<Vec<Token<'_>>, RejectReason> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('{') {
            let close = inner.find('}').ok_or(RejectReason::UnterminatedMeaning)?;
            tokens.push(Token::Meaning(inner[..close].trim()));
            rest = inner[close + 1..].trim_start();
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '{')
                .unwrap_or(rest.len());
            tokens.push(Token::Word(&rest[..end]));
            rest = rest[end..].trim_start();
        }
    }
    Ok(tokens)
}

fn is_jis_code(token: &str) -> bool {
    token.len() == 4 && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// `T1`, `T2`: everything after is a name reading.
fn is_nanori_switch(token: &str) -> bool {
    token
        .strip_prefix('T')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

impl KanjidicParser {
    fn apply_field(entry: &mut KanjiEntry, token: &str) {
        let Some(prefix) = token.chars().next() else {
            return;
        };
        let value = &token[prefix.len_utf8()..];
        match prefix {
            'U' if !value.is_empty() && value.chars().all(|c| c.is_ascii_hexdigit()) => {
                entry.codepoint = Some(value.to_ascii_lowercase());
            }
            'G' => entry.grade = value.parse().ok().or(entry.grade),
            // Later S fields are common miscounts; the first is canonical.
            'S' if entry.stroke_count.is_none() => entry.stroke_count = value.parse().ok(),
            'F' => entry.frequency = value.parse().ok().or(entry.frequency),
            _ => {}
        }
    }
}

impl RecordParser for KanjidicParser {
    type Entry = KanjiEntry;

    fn parse(&self, raw: &str) -> Result<KanjiEntry, RejectReason> {
        if raw.trim().is_empty() {
            return Err(RejectReason::Blank);
        }
        let tokens = tokenize(raw)?;
        let mut iter = tokens.into_iter().peekable();

        let character = match iter.next() {
            Some(Token::Word(c)) if c.chars().count() == 1 && !c.is_ascii() => c,
            _ => return Err(RejectReason::MissingCharacter),
        };

        let mut entry = KanjiEntry {
            character: character.to_string(),
            ..Default::default()
        };

        if let Some(Token::Word(code)) = iter.peek() {
            if is_jis_code(code) {
                entry.legacy_code = Some(code.to_ascii_lowercase());
                iter.next();
            }
        }

        let mut nanori_mode = false;
        for token in iter {
            let word = match token {
                Token::Meaning(m) => {
                    if !m.is_empty() {
                        entry.meanings.push(m.to_string());
                    }
                    continue;
                }
                Token::Word(w) => w,
            };

            if is_nanori_switch(word) {
                nanori_mode = true;
            } else if word.starts_with(|c: char| c.is_ascii_alphabetic()) {
                Self::apply_field(&mut entry, word);
            } else if nanori_mode {
                if is_kun_reading(word) || is_katakana_reading(word) {
                    entry.nanori.push(word.to_string());
                }
            } else if is_katakana_reading(word) {
                entry.on_readings.push(word.to_string());
            } else if is_kun_reading(word) {
                entry.kun_readings.push(word.to_string());
            }
        }

        Ok(entry)
    }

    fn is_comment(&self, line: &str) -> bool {
        line.starts_with('#')
    }
}
