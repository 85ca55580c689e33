//! Bounded-concurrency execution of per-entry transfers.
//!
//! Items run in batches of at most `concurrency`; a batch is fully joined
//! before the next one starts. With a concurrency of 1 everything runs on the
//! calling thread.

use std::thread;

use relay_core::ManifestEntry;

use crate::contract::TransferSummary;
use crate::events::Reporter;

/// Run `work` once for every entry, at most `concurrency` at a time.
///
/// Progress is emitted once per entry, in manifest order, as each batch
/// completes. Failures are collected into the returned summary.
pub fn run_batched<F>(
    entries: &[ManifestEntry],
    concurrency: usize,
    reporter: &Reporter,
    work: F,
) -> TransferSummary
where
    F: Fn(&ManifestEntry) -> Result<(), String> + Sync,
{
    let total = entries.len();
    let mut summary = TransferSummary {
        attempted: total,
        failed: Vec::new(),
    };
    let mut completed = 0;

    for batch in entries.chunks(concurrency.max(1)) {
        let results: Vec<Result<(), String>> = if batch.len() == 1 {
            vec![work(&batch[0])]
        } else {
            thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|entry| {
                        let work = &work;
                        scope.spawn(move || work(entry))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle
                            .join()
                            .unwrap_or_else(|_| Err("transfer worker panicked".to_string()))
                    })
                    .collect()
            })
        };

        for (entry, result) in batch.iter().zip(results) {
            if let Err(reason) = result {
                tracing::warn!("transfer failed for {}: {reason}", entry.relative_path);
                reporter.status(format!(
                    "Failed to transfer {}: {reason}",
                    entry.relative_path
                ));
                summary.record_failure(&entry.relative_path, reason);
            }
            completed += 1;
            reporter.progress(completed, total);
        }
    }

    summary
}
