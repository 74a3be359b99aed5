//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Logs progress information about address enrichment.
///
/// # Arguments
///
/// * `start_time` - The start time of processing
/// * `completed` - Atomic counter of enriched addresses
/// * `total` - Total number of addresses in the batch
pub fn log_progress(start_time: std::time::Instant, completed: &Arc<AtomicUsize>, total: usize) {
    let elapsed = start_time.elapsed();
    let done = completed.load(Ordering::SeqCst);
    let elapsed_secs = elapsed.as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        done as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Enriched {}/{} addresses in {:.2} seconds (~{:.2} addresses/sec)",
        done, total, elapsed_secs, rate
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_does_not_panic_at_zero() {
        let counter = Arc::new(AtomicUsize::new(0));
        log_progress(std::time::Instant::now(), &counter, 0);
    }
}
