use futures::{stream, StreamExt};
use tracing::{debug, warn};

pub mod config;
pub mod dispatcher;
pub mod host;
pub mod ledger;
pub mod linkedin;
pub mod remote;
pub mod session;
pub mod watcher;

mod error;

pub use error::IndexerError;
pub use linkedin::ConnectionRecord;

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub attempted: usize,
    pub delivered: usize,
}

impl Delivery {
    pub fn failed(attempted: usize) -> Self {
        Delivery {
            attempted,
            delivered: 0,
        }
    }

    /// A batch counts as synced when at least one record made it.
    pub fn succeeded(&self) -> bool {
        self.delivered > 0
    }
}

/// The system of record, keyed by `profile_url`.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Never fails as a whole; failures show up as `delivered < attempted`.
    async fn deliver(&self, batch: &[ConnectionRecord]) -> Delivery;

    /// Total records held remotely. Doubles as a configuration check.
    async fn count(&self) -> Result<u64, IndexerError>;
}

/// A backend that can only look up, create and update single records.
#[async_trait::async_trait]
pub trait UpsertStore: Send + Sync {
    async fn find_id(&self, profile_url: &str) -> Result<Option<String>, IndexerError>;
    async fn create(&self, record: &ConnectionRecord) -> Result<(), IndexerError>;
    async fn update(&self, id: &str, record: &ConnectionRecord) -> Result<(), IndexerError>;

    async fn upsert(&self, record: &ConnectionRecord) -> Result<(), IndexerError> {
        match self.find_id(&record.profile_url).await? {
            Some(id) => self.update(&id, record).await,
            None => self.create(record).await,
        }
    }

    /// Upserts one record at a time. A failing record is logged and skipped.
    async fn upsert_batch(&self, batch: &[ConnectionRecord]) -> Delivery {
        let results = stream::iter(batch)
            .then(move |record| async move { (record, self.upsert(record).await) })
            .collect::<Vec<_>>()
            .await;

        let mut delivered = 0;
        for (record, result) in results {
            match result {
                Ok(()) => {
                    debug!("Upserted {}", record.profile_url);
                    delivered += 1;
                }
                Err(e) => warn!("Upsert of {} failed: {}", record.profile_url, e),
            }
        }

        Delivery {
            attempted: batch.len(),
            delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryUpsertStore {
        rows: Mutex<HashMap<String, ConnectionRecord>>,
        broken: Vec<String>,
    }

    #[async_trait::async_trait]
    impl UpsertStore for MemoryUpsertStore {
        async fn find_id(&self, profile_url: &str) -> Result<Option<String>, IndexerError> {
            if self.broken.iter().any(|b| b == profile_url) {
                return Err(IndexerError::ApiError {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .find(|(_, r)| r.profile_url == profile_url)
                .map(|(id, _)| id.clone()))
        }

        async fn create(&self, record: &ConnectionRecord) -> Result<(), IndexerError> {
            let mut rows = self.rows.lock().unwrap();
            let id = format!("id{}", rows.len());
            rows.insert(id, record.clone());
            Ok(())
        }

        async fn update(&self, id: &str, record: &ConnectionRecord) -> Result<(), IndexerError> {
            self.rows
                .lock()
                .unwrap()
                .insert(id.to_string(), record.clone());
            Ok(())
        }
    }

    fn person(slug: &str, headline: &str) -> ConnectionRecord {
        ConnectionRecord {
            profile_url: format!("https://www.linkedin.com/in/{}", slug),
            name: slug.to_string(),
            headline: headline.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn resubmission_updates_instead_of_duplicating() {
        let store = MemoryUpsertStore::default();
        store.upsert_batch(&[person("a", "old")]).await;
        let d = store.upsert_batch(&[person("a", "new"), person("b", "")]).await;

        assert_eq!(
            d,
            Delivery {
                attempted: 2,
                delivered: 2
            }
        );
        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows["id0"].headline, "new");
    }

    #[tokio::test]
    async fn one_failing_record_does_not_abort_the_batch() {
        let store = MemoryUpsertStore {
            broken: vec!["https://www.linkedin.com/in/b".to_string()],
            ..Default::default()
        };
        let d = store
            .upsert_batch(&[person("a", ""), person("b", ""), person("c", "")])
            .await;

        assert_eq!(
            d,
            Delivery {
                attempted: 3,
                delivered: 2
            }
        );
        assert!(d.succeeded());
        assert_eq!(store.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn all_failing_is_not_a_success() {
        let store = MemoryUpsertStore {
            broken: vec!["https://www.linkedin.com/in/a".to_string()],
            ..Default::default()
        };
        let d = store.upsert_batch(&[person("a", "")]).await;
        assert_eq!(d, Delivery::failed(1));
        assert!(!d.succeeded());
    }
}
