//! Annotation token parser.
//!
//! Example breakdowns annotate each whitespace-separated token with an
//! optional reading, a sense marker and a normalized form:
//!
//! ```text
//! 彼(かれ)[01] は 会う 事(こと){こと} 走る(はしる){走った}~
//! ```
//!
//! Every token becomes at most one [`Segment`]. The braced form, when present,
//! wins over the bare surface for `ruby`; the parenthesized reading becomes
//! `rt`. Markers and the trailing `~` flag are discarded. Parsing is total:
//! unmatched brackets are kept as literal surface text.

use serde_json::Value;

use crate::entry::Segment;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Surface,
    /// Inside `(...)`, with the current nesting depth.
    Reading(usize),
    /// Inside `[...]`.
    Marker,
    /// Inside `{...}`.
    Normalized,
}

/// Parse a whole breakdown string into segments, in token order.
pub fn parse_annotation(text: &str) -> Vec<Segment> {
    text.split_whitespace().filter_map(parse_token).collect()
}

/// Parse one whitespace-free token. Returns `None` when the token has no
/// visible base text.
pub fn parse_token(token: &str) -> Option<Segment> {
    let token = token.strip_suffix('~').unwrap_or(token);

    let mut mode = Mode::Surface;
    let mut surface = String::new();
    let mut group = String::new();
    let mut group_start = 0;
    let mut reading: Option<String> = None;
    let mut normalized: Option<String> = None;

    for (i, c) in token.char_indices() {
        match mode {
            Mode::Surface => match c {
                '(' => {
                    mode = Mode::Reading(1);
                    group_start = i;
                }
                '[' => {
                    mode = Mode::Marker;
                    group_start = i;
                }
                '{' => {
                    mode = Mode::Normalized;
                    group_start = i;
                }
                _ => surface.push(c),
            },
            Mode::Reading(depth) => match c {
                '(' => {
                    mode = Mode::Reading(depth + 1);
                    group.push(c);
                }
                ')' if depth == 1 => {
                    reading = Some(std::mem::take(&mut group));
                    mode = Mode::Surface;
                }
                ')' => {
                    mode = Mode::Reading(depth - 1);
                    group.push(c);
                }
                _ => group.push(c),
            },
            Mode::Marker => match c {
                ']' => {
                    group.clear();
                    mode = Mode::Surface;
                }
                _ => group.push(c),
            },
            Mode::Normalized => match c {
                '}' => {
                    normalized = Some(std::mem::take(&mut group));
                    mode = Mode::Surface;
                }
                _ => group.push(c),
            },
        }
    }

    // An unclosed group is literal text.
    if mode != Mode::Surface {
        surface.push_str(&token[group_start..]);
    }

    let ruby = normalized
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| surface.trim());
    if ruby.is_empty() {
        return None;
    }
    Some(Segment {
        ruby: ruby.to_string(),
        rt: clean_reading(reading.as_deref()),
    })
}

fn clean_reading(rt: Option<&str>) -> Option<String> {
    rt.map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

/// Validate a pre-segmented `[{ruby, rt?}, ...]` list.
///
/// Returns `None` if `value` is not a list, or if any element lacks a
/// non-empty string `ruby`. A non-string `rt` counts as absent.
pub fn parse_structured(value: &Value) -> Option<Vec<Segment>> {
    let items = value.as_array()?;
    let mut segments = Vec::with_capacity(items.len());
    for item in items {
        let ruby = item.get("ruby")?.as_str()?.trim();
        if ruby.is_empty() {
            return None;
        }
        segments.push(Segment {
            ruby: ruby.to_string(),
            rt: clean_reading(item.get("rt").and_then(Value::as_str)),
        });
    }
    Some(segments)
}

/// Segments from a structured value, falling back to tokenizing `fallback`
/// when the value does not validate.
pub fn segments_or_tokens(value: Option<&Value>, fallback: &str) -> Vec<Segment> {
    match value {
        Some(Value::String(s)) => parse_furigana_str(s),
        Some(v) => parse_structured(v).unwrap_or_else(|| parse_annotation(fallback)),
        None => parse_annotation(fallback),
    }
}

/// Parse stored furigana that may be either a JSON segment list or a raw
/// breakdown string.
pub fn parse_furigana_str(raw: &str) -> Vec<Segment> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| parse_structured(&v))
        .unwrap_or_else(|| parse_annotation(raw))
}

/// Concatenated base text of a segment sequence.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.ruby.as_str()).collect()
}

/// Render segments as HTML ruby markup. Segments without a reading are
/// emitted as escaped text.
pub fn render_html(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match &seg.rt {
            Some(rt) => {
                out.push_str("<ruby>");
                push_escaped(&mut out, &seg.ruby);
                out.push_str("<rt>");
                push_escaped(&mut out, rt);
                out.push_str("</rt></ruby>");
            }
            None => push_escaped(&mut out, &seg.ruby),
        }
    }
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
