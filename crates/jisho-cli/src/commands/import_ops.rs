use std::process;

use jisho_core::source::SourceKind;
use jisho_engine::{Pipeline, RunReport, Selection};

use super::{load_settings, GlobalOptions};

fn run(opts: &GlobalOptions, selection: Selection) {
    let settings = load_settings(opts);
    eprintln!(
        "Importing from {} into {}",
        settings.sources.dir.display(),
        settings.store.path.display()
    );
    let report = die!(Pipeline::new(settings).import(selection), "Error: import aborted: {}");
    print_report(&report);
}

fn print_report(report: &RunReport) {
    println!("{report}");
    let totals = report.totals();
    if totals.skipped > 0 || totals.errored > 0 {
        eprintln!(
            "{} records skipped, {} lost to rolled-back batches (see log)",
            totals.skipped, totals.errored
        );
    }
}

pub fn import_all(opts: &GlobalOptions) {
    run(opts, Selection::All);
}

pub fn import_source(opts: &GlobalOptions, name: &str) {
    let kind = SourceKind::from_name(name).unwrap_or_else(|| {
        let known: Vec<&str> = SourceKind::ALL.iter().map(|k| k.as_str()).collect();
        eprintln!("Error: unknown source '{name}' (available: {})", known.join(", "));
        process::exit(1);
    });
    run(opts, Selection::Only(kind));
}
