use super::ensure_success;
use crate::{ConnectionRecord, Delivery, IndexerError, RemoteStore, UpsertStore};
use reqwest::{header::AUTHORIZATION, Method, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_COLLECTION: &str = "connections_v2";

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    items: Vec<RecordId>,
    #[serde(rename = "totalItems", default)]
    total_items: u64,
}

#[derive(Debug, Deserialize)]
struct RecordId {
    id: String,
}

/// PocketBase collection addressed through its records API.
pub struct PocketBaseStore {
    client: reqwest::Client,
    base: String,
    collection: String,
    credentials: Option<String>,
}

impl PocketBaseStore {
    pub fn new(base: String, collection: String, credentials: Option<String>) -> Self {
        PocketBaseStore::with_client(reqwest::Client::new(), base, collection, credentials)
    }

    pub fn with_client(
        client: reqwest::Client,
        base: String,
        collection: String,
        credentials: Option<String>,
    ) -> Self {
        PocketBaseStore {
            client,
            base,
            collection,
            credentials,
        }
    }

    fn records_url(&self) -> String {
        format!("{}/api/collections/{}/records", self.base, self.collection)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.credentials {
            Some(token) => req.header(AUTHORIZATION, token),
            None => req,
        }
    }
}

/// Quotes a value for a PocketBase filter expression.
fn filter_eq(field: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("({}='{}')", field, escaped)
}

#[async_trait::async_trait]
impl UpsertStore for PocketBaseStore {
    async fn find_id(&self, profile_url: &str) -> Result<Option<String>, IndexerError> {
        let filter = filter_eq("profile_url", profile_url);
        let resp = self
            .request(Method::GET, &self.records_url())
            .query(&[("filter", filter.as_str()), ("perPage", "1")])
            .send()
            .await?;
        let list: RecordList = ensure_success(resp).await?.json().await?;
        Ok(list.items.into_iter().next().map(|r| r.id))
    }

    async fn create(&self, record: &ConnectionRecord) -> Result<(), IndexerError> {
        let resp = self
            .request(Method::POST, &self.records_url())
            .json(record)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn update(&self, id: &str, record: &ConnectionRecord) -> Result<(), IndexerError> {
        let url = format!("{}/{}", self.records_url(), id);
        let resp = self.request(Method::PATCH, &url).json(record).send().await?;
        ensure_success(resp).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteStore for PocketBaseStore {
    async fn deliver(&self, batch: &[ConnectionRecord]) -> Delivery {
        self.upsert_batch(batch).await
    }

    async fn count(&self) -> Result<u64, IndexerError> {
        let resp = self
            .request(Method::GET, &self.records_url())
            .query(&[("perPage", "1")])
            .send()
            .await?;
        let list: RecordList = ensure_success(resp).await?.json().await?;
        debug!("{} holds {} records", self.collection, list.total_items);
        Ok(list.total_items)
    }
}
