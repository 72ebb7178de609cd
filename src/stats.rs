use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Running counters and depth/score records for one solve (§4.11).
///
/// Every counter is a plain atomic rather than behind a lock so that
/// [`crate::algorithm::parallel`]'s independent workers (Mode A) can all
/// report into the same `Statistics` without contending on a mutex for
/// every placement; the donor crate has no equivalent (each `WaveFunction`
/// algorithm ran single-threaded and logged to a `ProgressBar` directly),
/// so the atomics-plus-CAS-record pattern here is new machinery built for
/// this crate's parallel coordinator, reusing indicatif the same way the
/// donor's `algorithm/progress.rs` did for single-threaded runs.
#[derive(Debug)]
pub struct Statistics {
    recursive_calls: AtomicU64,
    placements: AtomicU64,
    backtracks: AtomicU64,
    dead_ends: AtomicU64,
    fit_checks: AtomicU64,
    forward_check_rejects: AtomicU64,
    singletons_found: AtomicU64,
    singletons_placed: AtomicU64,
    best_depth: AtomicUsize,
    best_score: AtomicUsize,
    started: Instant,
}

impl Statistics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            recursive_calls: AtomicU64::new(0),
            placements: AtomicU64::new(0),
            backtracks: AtomicU64::new(0),
            dead_ends: AtomicU64::new(0),
            fit_checks: AtomicU64::new(0),
            forward_check_rejects: AtomicU64::new(0),
            singletons_found: AtomicU64::new(0),
            singletons_placed: AtomicU64::new(0),
            best_depth: AtomicUsize::new(0),
            best_score: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_recursive_call(&self) {
        self.recursive_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_placement(&self) {
        self.placements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backtrack(&self) {
        self.backtracks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dead_end(&self) {
        self.dead_ends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fit_check(&self) {
        self.fit_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forward_check_reject(&self) {
        self.forward_check_rejects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_singleton_found(&self) {
        self.singletons_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_singleton_placed(&self) {
        self.singletons_placed.fetch_add(1, Ordering::Relaxed);
    }

    /// Compare-and-swap `depth` into the depth record if it's a new best.
    /// Returns `true` iff this call was the one that set the new record,
    /// so the caller knows whether to log/save/report it.
    pub fn update_depth_record(&self, depth: usize) -> bool {
        let mut current = self.best_depth.load(Ordering::Relaxed);
        while depth > current {
            match self.best_depth.compare_exchange_weak(current, depth, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
        false
    }

    /// Compare-and-swap `score` into the score record, same contract as
    /// [`Statistics::update_depth_record`].
    pub fn update_score_record(&self, score: usize) -> bool {
        let mut current = self.best_score.load(Ordering::Relaxed);
        while score > current {
            match self.best_score.compare_exchange_weak(current, score, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
        false
    }

    #[must_use]
    pub fn recursive_calls(&self) -> u64 {
        self.recursive_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn placements(&self) -> u64 {
        self.placements.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn backtracks(&self) -> u64 {
        self.backtracks.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dead_ends(&self) -> u64 {
        self.dead_ends.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn fit_checks(&self) -> u64 {
        self.fit_checks.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn forward_check_rejects(&self) -> u64 {
        self.forward_check_rejects.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn singletons_found(&self) -> u64 {
        self.singletons_found.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn singletons_placed(&self) -> u64 {
        self.singletons_placed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn best_depth(&self) -> usize {
        self.best_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn best_score(&self) -> usize {
        self.best_score.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time, plain-data copy of [`Statistics`], returned from a
/// finished solve so callers can inspect counters without holding atomics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub recursive_calls: u64,
    pub placements: u64,
    pub backtracks: u64,
    pub dead_ends: u64,
    pub fit_checks: u64,
    pub forward_check_rejects: u64,
    pub singletons_found: u64,
    pub singletons_placed: u64,
    pub best_depth: usize,
    pub best_score: usize,
    pub elapsed: Duration,
}

impl Statistics {
    /// Capture the current counters as a plain, `Send`-friendly snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            recursive_calls: self.recursive_calls(),
            placements: self.placements(),
            backtracks: self.backtracks(),
            dead_ends: self.dead_ends(),
            fit_checks: self.fit_checks(),
            forward_check_rejects: self.forward_check_rejects(),
            singletons_found: self.singletons_found(),
            singletons_placed: self.singletons_placed(),
            best_depth: self.best_depth(),
            best_score: self.best_score(),
            elapsed: self.elapsed(),
        }
    }
}

/// Estimates overall search progress from the branching decisions made at
/// the first few depths only (§4.11). Tracking every depth would be both
/// expensive and meaningless (the tree's width explodes immediately below
/// the root), so this mirrors the common "first N moves of a game tree"
/// progress trick: once the first `TRACKED_DEPTHS` choices are known, their
/// product of `(chosen rank + 1) / candidate count` approximates what
/// fraction of the whole tree has been ruled out so far.
pub struct ProgressEstimator {
    fractions: Vec<f64>,
}

const TRACKED_DEPTHS: usize = 5;

impl ProgressEstimator {
    #[must_use]
    pub fn new() -> Self {
        Self { fractions: Vec::with_capacity(TRACKED_DEPTHS) }
    }

    /// Record the branch taken at `depth`: `chosen_index` (0-based) out of
    /// `candidate_count` total candidates considered there. Ignored once
    /// past [`TRACKED_DEPTHS`].
    pub fn observe(&mut self, depth: usize, chosen_index: usize, candidate_count: usize) {
        if depth >= TRACKED_DEPTHS || candidate_count == 0 {
            return;
        }
        if depth == self.fractions.len() {
            self.fractions.push((chosen_index as f64 + 1.0) / candidate_count as f64);
        } else if depth < self.fractions.len() {
            self.fractions[depth] = (chosen_index as f64 + 1.0) / candidate_count as f64;
        }
    }

    /// The fraction of the search space estimated to be exhausted so far,
    /// in `[0.0, 1.0]`. `0.0` until at least the first tracked depth has
    /// been observed.
    #[must_use]
    pub fn estimate(&self) -> f64 {
        self.fractions.iter().product::<f64>().clamp(0.0, 1.0)
    }

    /// Reset tracking below `depth` after a backtrack past that point, so a
    /// later re-descent recomputes the fraction at those depths instead of
    /// keeping the abandoned branch's numbers.
    pub fn truncate(&mut self, depth: usize) {
        self.fractions.truncate(depth.min(TRACKED_DEPTHS));
    }
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Thin wrapper over an [`indicatif::ProgressBar`], the same progress
/// display the donor crate drives from `algorithm/progress.rs`, generalized
/// here to report placements/backtracks/records instead of wave-function
/// collapse steps. A `verbose: false` config produces a hidden bar so
/// library callers embedding the solver don't get terminal output by
/// default.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(verbose: bool, total_cells: u64) -> Self {
        let bar = if verbose {
            let bar = ProgressBar::new(total_cells);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub fn set_depth(&self, depth: u64) {
        self.bar.set_position(depth);
    }

    pub fn log_record(&self, message: &str) {
        self.bar.println(message);
    }

    pub fn set_message(&self, message: String) {
        self.bar.set_message(message);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_record_only_updates_on_new_best() {
        let stats = Statistics::new();
        assert!(stats.update_depth_record(3));
        assert!(!stats.update_depth_record(2));
        assert!(stats.update_depth_record(5));
        assert_eq!(stats.best_depth(), 5);
    }

    #[test]
    fn counters_accumulate() {
        let stats = Statistics::new();
        stats.record_placement();
        stats.record_placement();
        stats.record_backtrack();
        assert_eq!(stats.placements(), 2);
        assert_eq!(stats.backtracks(), 1);
    }

    #[test]
    fn progress_estimate_shrinks_as_branches_narrow() {
        let mut estimator = ProgressEstimator::new();
        estimator.observe(0, 0, 4);
        let first = estimator.estimate();
        estimator.observe(1, 0, 4);
        let second = estimator.estimate();
        assert!(second <= first);
    }
}
