mod bulk;
mod pocketbase;

pub use bulk::BulkStore;
pub use pocketbase::{PocketBaseStore, DEFAULT_COLLECTION};

use crate::{config::Config, IndexerError, RemoteStore};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// PocketBase records API, one lookup plus create/update per record.
    #[default]
    #[value(name = "pocketbase")]
    PocketBase,
    /// A single `POST /api/connections` per batch.
    Bulk,
}

/// Trims whitespace and trailing slashes. `Ok(None)` for an empty endpoint.
pub fn normalize_endpoint(endpoint: Option<&str>) -> Result<Option<String>, IndexerError> {
    let endpoint = match endpoint.map(str::trim) {
        Some(e) if !e.is_empty() => e.trim_end_matches('/'),
        _ => return Ok(None),
    };

    match reqwest::Url::parse(endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Some(endpoint.to_string())),
        _ => Err(IndexerError::InvalidEndpoint(endpoint.to_string())),
    }
}

/// Builds the backend described by `config`, or `None` when no endpoint is set.
pub fn connect(config: &Config) -> Result<Option<Arc<dyn RemoteStore>>, IndexerError> {
    let Some(base) = normalize_endpoint(config.endpoint.as_deref())? else {
        return Ok(None);
    };
    let credentials = config
        .credentials
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string);

    let store: Arc<dyn RemoteStore> = match config.backend {
        Backend::PocketBase => Arc::new(PocketBaseStore::new(
            base,
            config.collection.clone(),
            credentials,
        )),
        Backend::Bulk => Arc::new(BulkStore::new(base, credentials)),
    };
    Ok(Some(store))
}

pub(crate) async fn ensure_success(
    resp: reqwest::Response,
) -> Result<reqwest::Response, IndexerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(IndexerError::ApiError {
        status: status.as_u16(),
        message,
    })
}
