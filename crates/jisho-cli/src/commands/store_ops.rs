use jisho_engine::Pipeline;

use super::{load_settings, GlobalOptions};

pub fn schema(opts: &GlobalOptions) {
    let pipeline = Pipeline::new(load_settings(opts));
    die!(pipeline.create_schema(), "Error: {}");
    println!("Schema ready: {}", pipeline.settings().store.path.display());
}

pub fn reset(opts: &GlobalOptions) {
    let pipeline = Pipeline::new(load_settings(opts));
    die!(pipeline.reset(), "Error: {}");
    println!("Store emptied: {}", pipeline.settings().store.path.display());
}

pub fn stats(opts: &GlobalOptions) {
    let pipeline = Pipeline::new(load_settings(opts));
    let stats = die!(pipeline.stats(), "Error: {}");

    println!("Store:          {}", pipeline.settings().store.path.display());
    match stats.schema_version {
        Some(v) => println!("Schema version: {v}"),
        None => println!("Schema version: (none)"),
    }
    println!();
    for (table, rows) in &stats.tables {
        println!("  {table:<14} {rows:>10}");
    }
    if stats.imports.is_empty() {
        println!("\nNo imports recorded.");
        return;
    }
    println!(
        "\n  {:<9} {:>9} {:>9} {:>9} {:>9} {:>9}  {:<8}  imported at",
        "source", "processed", "valid", "inserted", "skipped", "errored", "crc32"
    );
    for r in &stats.imports {
        println!(
            "  {:<9} {:>9} {:>9} {:>9} {:>9} {:>9}  {:08x}  {}",
            r.source, r.processed, r.valid, r.inserted, r.skipped, r.errored, r.checksum, r.imported_at
        );
    }
}

pub fn search(opts: &GlobalOptions, query: &str, limit: usize) {
    let pipeline = Pipeline::new(load_settings(opts));
    let words = die!(pipeline.search(query, limit), "Error: {}");
    if words.is_empty() {
        println!("{query}: no matches");
        return;
    }
    for w in &words {
        println!(
            "{:>8}  {}  [{}]",
            w.id,
            w.surface.as_deref().unwrap_or("-"),
            w.reading.as_deref().unwrap_or("-")
        );
    }
}
