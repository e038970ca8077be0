use tokio::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Attach,
    Mutation,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub initial_scan: Duration,
    pub mutation_quiet: Duration,
    pub scroll_quiet: Duration,
    pub sync_debounce: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            initial_scan: Duration::from_millis(1500),
            mutation_quiet: Duration::from_millis(500),
            scroll_quiet: Duration::from_millis(1000),
            sync_debounce: Duration::from_millis(2000),
        }
    }
}

/// A single cancellable deadline. Scheduling again replaces the previous
/// deadline, so a steady stream of calls postpones it indefinitely.
#[derive(Debug, Default, Clone)]
pub struct Debouncer {
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn schedule(&mut self, quiet: Duration) {
        self.deadline = Some(Instant::now() + quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(d) if d <= now)
    }

    /// Disarms and reports whether the deadline had passed.
    pub fn fire(&mut self) -> bool {
        if self.is_due(Instant::now()) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

/// Resolves at `deadline`, or never when there is none.
pub async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Coalesces page mutations and scrolls into one rescan after a quiet period.
/// Both triggers share one slot; the latest trigger picks the interval.
#[derive(Debug)]
pub struct ChangeWatcher {
    timings: Timings,
    rescan: Debouncer,
}

impl ChangeWatcher {
    /// Starts watching and schedules the initial scan.
    pub fn attach(timings: Timings) -> Self {
        let mut watcher = ChangeWatcher {
            timings,
            rescan: Debouncer::default(),
        };
        watcher.notify(Trigger::Attach);
        watcher
    }

    pub fn notify(&mut self, trigger: Trigger) {
        let quiet = match trigger {
            Trigger::Attach => self.timings.initial_scan,
            Trigger::Mutation => self.timings.mutation_quiet,
            Trigger::Scroll => self.timings.scroll_quiet,
        };
        debug!("Rescan in {:?} after {:?}", quiet, trigger);
        self.rescan.schedule(quiet);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.rescan.deadline()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.rescan.is_due(now)
    }

    pub fn fire(&mut self) -> bool {
        self.rescan.fire()
    }
}
