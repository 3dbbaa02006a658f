//! Build settings loaded from TOML.
//!
//! Default values are embedded via `include_str!("default_settings.toml")` and
//! validated by `build.rs`. Callers pass a `Settings` value explicitly; there
//! is no global instance.

use std::path::PathBuf;

use encoding_rs::Encoding;
use serde::Deserialize;

use crate::source::SourceKind;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
    pub sources: SourceSettings,
    pub link: LinkSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub path: PathBuf,
    /// Records per savepoint inside a load phase.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub dir: PathBuf,
    pub edict: String,
    pub edict_encoding: String,
    pub jmdict: String,
    pub kanjidic: String,
    pub kanjidic_encoding: String,
    pub examples: String,
    pub furigana: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkSettings {
    /// Shortest form (in characters) the substring strategy may match.
    pub min_substring_chars: usize,
    /// Upper bound on distinct words linked to one example.
    pub max_links_per_example: usize,
}

impl Default for Settings {
    fn default() -> Self {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("default settings TOML must be valid")
    }
}

impl Settings {
    pub fn source_path(&self, kind: SourceKind) -> PathBuf {
        let name = match kind {
            SourceKind::Edict => &self.sources.edict,
            SourceKind::Jmdict => &self.sources.jmdict,
            SourceKind::Kanjidic => &self.sources.kanjidic,
            SourceKind::Examples => &self.sources.examples,
            SourceKind::Furigana => &self.sources.furigana,
        };
        self.sources.dir.join(name)
    }

    /// Text encoding of a source file. JSON sources are always UTF-8.
    pub fn source_encoding(&self, kind: SourceKind) -> &'static Encoding {
        let label = match kind {
            SourceKind::Edict => self.sources.edict_encoding.as_str(),
            SourceKind::Kanjidic => self.sources.kanjidic_encoding.as_str(),
            _ => "utf-8",
        };
        Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::UTF_8)
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }
    macro_rules! check_encoding {
        ($section:ident . $field:ident) => {
            if Encoding::for_label(s.$section.$field.as_bytes()).is_none() {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: format!("unknown encoding label '{}'", s.$section.$field),
                });
            }
        };
    }

    check_positive_usize!(store.batch_size);
    check_positive_usize!(link.min_substring_chars);
    check_positive_usize!(link.max_links_per_example);
    check_encoding!(sources.edict_encoding);
    check_encoding!(sources.kanjidic_encoding);

    if s.store.path.as_os_str().is_empty() {
        return Err(SettingsError::InvalidValue {
            field: "store.path".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let s = parse_settings_toml(DEFAULT_SETTINGS_TOML).unwrap();
        assert_eq!(s.store.path, PathBuf::from("jisho.db"));
        assert_eq!(s.store.batch_size, 1000);
        assert_eq!(s.link.min_substring_chars, 3);
        assert_eq!(s.link.max_links_per_example, 20);
        assert_eq!(
            s.source_path(SourceKind::Examples),
            PathBuf::from("data/examples.utf")
        );
        assert_eq!(s.source_encoding(SourceKind::Edict), encoding_rs::UTF_8);
    }

    #[test]
    fn euc_jp_label_resolves() {
        let toml = DEFAULT_SETTINGS_TOML.replace(
            "edict_encoding = \"utf-8\"",
            "edict_encoding = \"euc-jp\"",
        );
        let s = parse_settings_toml(&toml).unwrap();
        assert_eq!(s.source_encoding(SourceKind::Edict), encoding_rs::EUC_JP);
        assert_eq!(s.source_encoding(SourceKind::Jmdict), encoding_rs::UTF_8);
    }

    #[test]
    fn error_zero_batch_size() {
        let toml = DEFAULT_SETTINGS_TOML.replace("batch_size = 1000", "batch_size = 0");
        let err = parse_settings_toml(&toml).unwrap_err();
        match err {
            SettingsError::InvalidValue { field, .. } => assert_eq!(field, "store.batch_size"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_unknown_encoding() {
        let toml = DEFAULT_SETTINGS_TOML.replace(
            "kanjidic_encoding = \"utf-8\"",
            "kanjidic_encoding = \"klingon\"",
        );
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
    }

    #[test]
    fn error_invalid_toml() {
        let err = parse_settings_toml("not valid toml {{{").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn error_missing_section() {
        let err = parse_settings_toml("[store]\npath = \"x.db\"\nbatch_size = 10\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
