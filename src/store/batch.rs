//! Batched inserts with per-batch rollback.
//!
//! A phase runs inside one transaction. Records are inserted in fixed-size
//! batches, each under its own savepoint: a constraint failure rolls back that
//! batch only and the phase moves on. Any other store error is fatal and
//! propagates, which drops the phase transaction uncommitted.

use rusqlite::{Connection, ErrorCode, Transaction};
use tracing::{debug, warn};

/// Totals for one batched load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Rows reported inserted by committed batches.
    pub inserted: usize,
    /// Records that were part of a rolled-back batch.
    pub errored: usize,
    pub batches: usize,
    pub failed_batches: usize,
}

/// Errors confined to the offending batch.
pub fn is_integrity_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => matches!(
            e.code,
            ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch | ErrorCode::TooBig
        ),
        rusqlite::Error::ToSqlConversionFailure(_) => true,
        _ => false,
    }
}

/// Insert `items` into `tx` in batches of `batch_size`.
///
/// `insert` returns how many rows it added for one record. The outer
/// transaction is left open for the caller to commit.
pub fn load_in_batches<T, I, F>(
    tx: &mut Transaction<'_>,
    items: I,
    batch_size: usize,
    label: &str,
    mut insert: F,
) -> rusqlite::Result<BatchOutcome>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&Connection, &T) -> rusqlite::Result<usize>,
{
    let batch_size = batch_size.max(1);
    let mut outcome = BatchOutcome::default();
    let mut batch = Vec::with_capacity(batch_size);
    let mut items = items.into_iter();

    loop {
        batch.clear();
        batch.extend(items.by_ref().take(batch_size));
        if batch.is_empty() {
            break;
        }
        outcome.batches += 1;
        run_batch(tx, &batch, label, outcome.batches, &mut insert, &mut outcome)?;
    }

    debug!(
        label,
        batches = outcome.batches,
        failed = outcome.failed_batches,
        inserted = outcome.inserted,
        "batched load finished"
    );
    Ok(outcome)
}

fn run_batch<T, F>(
    tx: &mut Transaction<'_>,
    batch: &[T],
    label: &str,
    number: usize,
    insert: &mut F,
    outcome: &mut BatchOutcome,
) -> rusqlite::Result<()>
where
    F: FnMut(&Connection, &T) -> rusqlite::Result<usize>,
{
    let sp = tx.savepoint()?;
    let mut inserted = 0;
    for item in batch {
        match insert(&sp, item) {
            Ok(n) => inserted += n,
            Err(e) if is_integrity_violation(&e) => {
                // Dropping the savepoint rolls the batch back.
                drop(sp);
                warn!(label, batch = number, records = batch.len(), error = %e, "batch rolled back");
                outcome.failed_batches += 1;
                outcome.errored += batch.len();
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
    sp.commit()?;
    outcome.inserted += inserted;
    Ok(())
}
