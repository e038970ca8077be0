use super::ensure_success;
use crate::{ConnectionRecord, Delivery, IndexerError, RemoteStore};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SubmitReply {
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct CountReply {
    count: u64,
}

/// Connections API that accepts a whole batch in one request and upserts it
/// server side.
pub struct BulkStore {
    client: reqwest::Client,
    base: String,
    api_key: Option<String>,
}

impl BulkStore {
    pub fn new(base: String, api_key: Option<String>) -> Self {
        BulkStore::with_client(reqwest::Client::new(), base, api_key)
    }

    pub fn with_client(client: reqwest::Client, base: String, api_key: Option<String>) -> Self {
        BulkStore {
            client,
            base,
            api_key,
        }
    }

    fn connections_url(&self) -> String {
        format!("{}/api/connections", self.base)
    }

    async fn submit(&self, batch: &[ConnectionRecord]) -> Result<u64, IndexerError> {
        let mut req = self.client.post(self.connections_url()).json(batch);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        let reply: SubmitReply = ensure_success(req.send().await?).await?.json().await?;
        Ok(reply.count)
    }
}

#[async_trait::async_trait]
impl RemoteStore for BulkStore {
    async fn deliver(&self, batch: &[ConnectionRecord]) -> Delivery {
        match self.submit(batch).await {
            Ok(count) => {
                debug!("Server upserted {} of {}", count, batch.len());
                Delivery {
                    attempted: batch.len(),
                    delivered: batch.len(),
                }
            }
            Err(e) => {
                warn!("Bulk submit of {} records failed: {}", batch.len(), e);
                Delivery::failed(batch.len())
            }
        }
    }

    async fn count(&self) -> Result<u64, IndexerError> {
        let resp = self
            .client
            .get(self.connections_url())
            .query(&[("count", "true")])
            .send()
            .await?;
        let reply: CountReply = ensure_success(resp).await?.json().await?;
        Ok(reply.count)
    }
}
