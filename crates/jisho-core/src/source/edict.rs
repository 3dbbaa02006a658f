//! EDICT-style records: `headword [reading] /meaning/meaning/.../EntL...X/`.

use super::tags::{self, TagKind};
use super::{RecordParser, RejectReason};
use crate::entry::{Sense, WordEntry, WordSource};

pub struct EdictParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdictRecord {
    pub headword: String,
    pub reading: Option<String>,
    pub external_id: Option<String>,
    pub common: bool,
    pub senses: Vec<Sense>,
}

impl EdictRecord {
    pub fn into_word(self) -> WordEntry {
        WordEntry {
            surface: Some(self.headword),
            reading: self.reading,
            senses: self.senses,
            external_id: self.external_id,
            common: self.common,
            source: WordSource::Edict,
        }
    }
}

impl RecordParser for EdictParser {
    type Entry = EdictRecord;

    fn parse(&self, raw: &str) -> Result<EdictRecord, RejectReason> {
        let line = raw.trim();
        if line.is_empty() {
            return Err(RejectReason::Blank);
        }

        let slash = line.find('/').ok_or(RejectReason::MissingMeanings)?;
        let (head, block) = line.split_at(slash);
        if block.len() < 2 || !block.ends_with('/') {
            return Err(RejectReason::MissingMeanings);
        }

        let (headword, reading) = split_head(head)?;
        let mut fields = split_meanings(&block[1..block.len() - 1]);

        let external_id = match fields.last() {
            Some(last) if is_external_id(last) => fields.pop(),
            _ => None,
        };

        let mut builder = SenseBuilder::default();
        for field in &fields {
            builder.push_field(field);
        }
        let (senses, common) = builder.finish();
        if senses.is_empty() {
            return Err(RejectReason::NoGlosses);
        }

        Ok(EdictRecord {
            headword,
            reading,
            external_id,
            common,
            senses,
        })
    }

    fn is_comment(&self, line: &str) -> bool {
        line.starts_with(';')
    }
}

fn split_head(head: &str) -> Result<(String, Option<String>), RejectReason> {
    let head = head.trim();
    let (headword, reading) = match head.find('[') {
        Some(open) => {
            let close = head[open..]
                .find(']')
                .map(|i| open + i)
                .ok_or(RejectReason::UnterminatedReading)?;
            let reading = head[open + 1..close].trim();
            (
                head[..open].trim(),
                (!reading.is_empty()).then(|| reading.to_string()),
            )
        }
        None => (head, None),
    };
    if headword.is_empty() {
        return Err(RejectReason::EmptyHeadword);
    }
    Ok((headword.to_string(), reading))
}

/// `Ent` followed by one or more ASCII alphanumerics.
fn is_external_id(field: &str) -> bool {
    field
        .strip_prefix("Ent")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Split the inside of the meaning block on `/`, ignoring slashes nested in
/// parentheses. A backslash escapes the next character, so `\(` never opens a
/// group. If the parentheses never balance, the whole block is re-split on
/// every slash instead of swallowing the rest of the record.
fn split_meanings(block: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut escaped = false;

    for c in block.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '/' if depth == 0 => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    if depth > 0 {
        fields = block.split('/').map(str::to_string).collect();
    }

    fields
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

/// Take a leading `(...)` group off `text`, honouring nesting.
/// Returns the group content and the remainder.
fn take_group(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('(')?;
    let mut depth = 1usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&rest[..i], &rest[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Default)]
struct SenseBuilder {
    senses: Vec<Sense>,
    current: Sense,
    last_pos: Vec<String>,
    common: bool,
}

impl SenseBuilder {
    fn push_field(&mut self, field: &str) {
        let mut text = field.trim();
        let mut numbered = false;
        let mut tags: Vec<(TagKind, String)> = Vec::new();

        while let Some((group, rest)) = take_group(text) {
            if tags::is_sense_number(group) {
                numbered = true;
            } else if let Some(group_tags) = tags::classify_group(group) {
                tags.extend(group_tags);
            } else {
                break;
            }
            text = rest.trim_start();
        }

        let mut gloss = text.trim();
        if let Some(stripped) = gloss.strip_suffix("(P)") {
            gloss = stripped.trim_end();
            self.common = true;
        }

        let has_pos = tags.iter().any(|(k, _)| *k == TagKind::PartOfSpeech);
        if (numbered || has_pos) && !self.current.glosses.is_empty() {
            self.flush();
            // Part of speech carries over to following senses until restated.
            if !has_pos {
                self.current.parts_of_speech = self.last_pos.clone();
            }
        }

        for (kind, tag) in tags {
            let list = match kind {
                TagKind::PartOfSpeech => &mut self.current.parts_of_speech,
                TagKind::Field => &mut self.current.field,
                TagKind::Misc => &mut self.current.misc,
                TagKind::Dialect => &mut self.current.dialect,
                TagKind::Priority => {
                    self.common = true;
                    continue;
                }
            };
            if !list.contains(&tag) {
                list.push(tag);
            }
        }

        if !gloss.is_empty() {
            self.current.glosses.push(gloss.to_string());
        }
    }

    fn flush(&mut self) {
        let sense = std::mem::take(&mut self.current);
        if !sense.glosses.is_empty() {
            self.last_pos.clone_from(&sense.parts_of_speech);
            self.senses.push(sense);
        }
    }

    fn finish(mut self) -> (Vec<Sense>, bool) {
        self.flush();
        (self.senses, self.common)
    }
}
