//! Advisory progress reporting shared by worker threads.
//!
//! Workers bump an atomic counter after every finished unit of work and
//! advance an `indicatif` bar drawn on stderr as `Progress: P%`. Nothing here
//! feeds back into the computed distances.

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Integer percentage of `completed` out of `total`, clamped to 100.
///
/// An empty workload counts as finished.
pub fn percentage(completed: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    (completed.min(total) * 100) / total
}

/// Completed-unit counter with an optional stderr progress bar.
#[derive(Debug)]
pub struct Progress {
    total: usize,
    completed: AtomicUsize,
    bar: ProgressBar,
}

impl Progress {
    pub fn new(total: usize, visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::with_template("Progress: {percent}%")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Progress { total, completed: AtomicUsize::new(0), bar }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Record one finished unit and return the new completed count.
    pub fn tick(&self) -> usize {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        self.bar.inc(1);
        done
    }

    /// Leave the bar at its final state.
    pub fn finish(&self) {
        self.bar.finish();
        let done = self.completed();
        debug!("{done}/{} units done ({}%)", self.total, percentage(done, self.total));
    }
}
