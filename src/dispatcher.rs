use crate::watcher::Debouncer;
use crate::{ConnectionRecord, Delivery};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Emitted after every finished delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub count: usize,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Waiting,
    Sending,
}

/// Owns the pending queue. Records wait for a quiet period before they are
/// sent as one batch; a failed batch goes back to the front of the queue.
#[derive(Debug)]
pub struct BatchDispatcher {
    pending: VecDeque<ConnectionRecord>,
    in_flight: Option<Vec<ConnectionRecord>>,
    debounce: Debouncer,
    interval: Duration,
    max_pending: usize,
}

impl BatchDispatcher {
    /// `max_pending == 0` leaves the queue unbounded.
    pub fn new(interval: Duration, max_pending: usize) -> Self {
        BatchDispatcher {
            pending: VecDeque::new(),
            in_flight: None,
            debounce: Debouncer::default(),
            interval,
            max_pending,
        }
    }

    pub fn state(&self) -> DispatchState {
        if self.in_flight.is_some() {
            DispatchState::Sending
        } else if self.debounce.is_armed() {
            DispatchState::Waiting
        } else {
            DispatchState::Idle
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ConnectionRecord> {
        self.pending.iter()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Appends records and restarts the debounce window.
    pub fn enqueue(&mut self, records: Vec<ConnectionRecord>) {
        if records.is_empty() {
            return;
        }
        self.pending.extend(records);
        self.enforce_cap();
        self.debounce.schedule(self.interval);
    }

    /// Restarts the debounce window if anything is waiting.
    pub fn rearm(&mut self) {
        if !self.pending.is_empty() {
            self.debounce.schedule(self.interval);
        }
    }

    /// Disarms the debounce timer and reports whether it had expired.
    pub fn fire(&mut self) -> bool {
        self.debounce.fire()
    }

    /// Snapshots and clears the queue. `None` while a batch is already out or
    /// nothing is pending.
    pub fn begin_send(&mut self) -> Option<Vec<ConnectionRecord>> {
        if self.in_flight.is_some() || self.pending.is_empty() {
            return None;
        }
        self.debounce.cancel();
        let batch: Vec<_> = self.pending.drain(..).collect();
        debug!("Sending batch of {}", batch.len());
        self.in_flight = Some(batch.clone());
        Some(batch)
    }

    /// Closes the in-flight batch. On failure the whole batch is put back in
    /// front of anything collected meanwhile and the debounce is restarted.
    pub fn finish_send(&mut self, delivery: Delivery) -> SyncEvent {
        let batch = self.in_flight.take().unwrap_or_default();
        let success = delivery.succeeded();

        if success {
            info!("Synced {}/{}", delivery.delivered, batch.len());
        } else {
            warn!("Sync of {} records failed, requeueing", batch.len());
            for record in batch.into_iter().rev() {
                self.pending.push_front(record);
            }
            self.enforce_cap();
            self.debounce.schedule(self.interval);
        }

        SyncEvent {
            count: delivery.delivered,
            success,
        }
    }

    fn enforce_cap(&mut self) {
        if self.max_pending == 0 || self.pending.len() <= self.max_pending {
            return;
        }
        let overflow = self.pending.len() - self.max_pending;
        warn!("Pending queue full, dropping {} oldest records", overflow);
        self.pending.drain(..overflow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn person(slug: &str) -> ConnectionRecord {
        ConnectionRecord {
            profile_url: format!("https://www.linkedin.com/in/{}", slug),
            name: slug.to_string(),
            ..Default::default()
        }
    }

    fn slugs(d: &BatchDispatcher) -> Vec<String> {
        d.pending().map(|r| r.name.clone()).collect()
    }

    fn dispatcher() -> BatchDispatcher {
        BatchDispatcher::new(Duration::from_secs(2), 0)
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_restarts_debounce() {
        let mut d = dispatcher();
        assert_eq!(d.state(), DispatchState::Idle);

        let start = Instant::now();
        d.enqueue(vec![person("a")]);
        assert_eq!(d.deadline(), Some(start + Duration::from_secs(2)));
        assert_eq!(d.state(), DispatchState::Waiting);

        tokio::time::advance(Duration::from_millis(1500)).await;
        d.enqueue(vec![person("b")]);
        assert_eq!(
            d.deadline(),
            Some(start + Duration::from_millis(3500))
        );
        assert!(!d.fire());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_enqueue_changes_nothing() {
        let mut d = dispatcher();
        d.enqueue(vec![]);
        assert_eq!(d.state(), DispatchState::Idle);
        assert_eq!(d.begin_send(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_batch_is_requeued_ahead_of_new_records() {
        let mut d = dispatcher();
        d.enqueue(vec![person("a"), person("b")]);

        let batch = d.begin_send().expect("batch");
        assert_eq!(batch.len(), 2);
        assert_eq!(d.pending_len(), 0);
        assert_eq!(d.state(), DispatchState::Sending);

        // extraction keeps going while the batch is out
        d.enqueue(vec![person("c")]);
        assert_eq!(d.begin_send(), None);

        let event = d.finish_send(Delivery::failed(2));
        assert_eq!(
            event,
            SyncEvent {
                count: 0,
                success: false
            }
        );
        assert_eq!(slugs(&d), vec!["a", "b", "c"]);
        assert_eq!(d.state(), DispatchState::Waiting);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_success_counts_as_success() {
        let mut d = dispatcher();
        d.enqueue(vec![person("a"), person("b"), person("c")]);
        d.begin_send().expect("batch");

        let event = d.finish_send(Delivery {
            attempted: 3,
            delivered: 1,
        });
        assert_eq!(
            event,
            SyncEvent {
                count: 1,
                success: true
            }
        );
        assert_eq!(d.pending_len(), 0);
        assert_eq!(d.state(), DispatchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cap_drops_oldest() {
        let mut d = BatchDispatcher::new(Duration::from_secs(2), 3);
        d.enqueue(vec![person("a"), person("b")]);
        d.enqueue(vec![person("c"), person("d"), person("e")]);
        assert_eq!(slugs(&d), vec!["c", "d", "e"]);

        d.begin_send().expect("batch");
        d.enqueue(vec![person("f"), person("g")]);
        d.finish_send(Delivery::failed(3));
        assert_eq!(slugs(&d), vec!["e", "f", "g"]);
    }
}
