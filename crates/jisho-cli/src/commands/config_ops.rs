use std::fs;

pub fn settings_export() {
    print!("{}", jisho_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        jisho_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: store.path={}, store.batch_size={}, link.min_substring_chars={}, link.max_links_per_example={}",
        s.store.path.display(),
        s.store.batch_size,
        s.link.min_substring_chars,
        s.link.max_links_per_example
    );
}
