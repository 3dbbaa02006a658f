//! Pure side of the dictionary build: source parsers, annotation parsing,
//! normalization and deduplication, inflected-form generation and
//! example-to-word linking. Nothing in this crate touches the store.

pub mod annotation;
pub mod dedup;
pub mod entry;
pub mod inflect;
pub mod linker;
pub mod normalize;
pub mod settings;
pub mod source;
pub mod unicode;
