use crate::linkedin::{
    CardLocator, Extractor, Harvester, HeadlineParser, LocatorStrategy, DEFAULT_ORIGIN,
};
use crate::remote::{Backend, DEFAULT_COLLECTION};
use crate::watcher::Timings;
use tokio::time::Duration;

/// Session settings. Every flag can also come from the environment.
#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    /// Base URL of the remote store. Without it records are held locally.
    #[arg(long, env = "INDEXER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// PocketBase auth token or bulk API key.
    #[arg(long, env = "INDEXER_CREDENTIALS", hide_env_values = true)]
    pub credentials: Option<String>,

    #[arg(long, value_enum, env = "INDEXER_BACKEND", default_value_t = Backend::PocketBase)]
    pub backend: Backend,

    /// PocketBase collection holding the records.
    #[arg(long, env = "INDEXER_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    #[arg(long, value_enum, default_value_t = LocatorStrategy::Auto)]
    pub locator: LocatorStrategy,

    /// Origin used to absolutize relative profile links.
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    pub site_origin: String,

    /// Also split headlines on ", " when no stronger separator is present.
    #[arg(long)]
    pub split_on_comma: bool,

    #[arg(long, default_value_t = 1500)]
    pub initial_scan_ms: u64,

    #[arg(long, default_value_t = 500)]
    pub mutation_quiet_ms: u64,

    #[arg(long, default_value_t = 1000)]
    pub scroll_quiet_ms: u64,

    #[arg(long, default_value_t = 2000)]
    pub sync_debounce_ms: u64,

    /// Upper bound on records waiting for delivery, 0 for no bound.
    #[arg(long, env = "INDEXER_MAX_PENDING", default_value_t = 10_000)]
    pub max_pending: usize,
}

impl Default for Config {
    fn default() -> Self {
        let timings = Timings::default();
        Config {
            endpoint: None,
            credentials: None,
            backend: Backend::default(),
            collection: DEFAULT_COLLECTION.to_string(),
            locator: LocatorStrategy::default(),
            site_origin: DEFAULT_ORIGIN.to_string(),
            split_on_comma: false,
            initial_scan_ms: millis(timings.initial_scan),
            mutation_quiet_ms: millis(timings.mutation_quiet),
            scroll_quiet_ms: millis(timings.scroll_quiet),
            sync_debounce_ms: millis(timings.sync_debounce),
            max_pending: 10_000,
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

impl Config {
    pub fn timings(&self) -> Timings {
        Timings {
            initial_scan: Duration::from_millis(self.initial_scan_ms),
            mutation_quiet: Duration::from_millis(self.mutation_quiet_ms),
            scroll_quiet: Duration::from_millis(self.scroll_quiet_ms),
            sync_debounce: Duration::from_millis(self.sync_debounce_ms),
        }
    }

    /// Copy with a new endpoint and credentials. Missing or blank values keep
    /// the current ones, so an update never unconfigures the backend.
    pub fn with_connection(
        &self,
        endpoint: Option<String>,
        credentials: Option<String>,
    ) -> Config {
        fn given(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Config {
            endpoint: given(endpoint).or_else(|| self.endpoint.clone()),
            credentials: given(credentials).or_else(|| self.credentials.clone()),
            ..self.clone()
        }
    }

    pub fn harvester(&self) -> Harvester {
        let headline = if self.split_on_comma {
            HeadlineParser::with_comma()
        } else {
            HeadlineParser::default()
        };
        Harvester::new(
            CardLocator::new(self.locator),
            Extractor::new(self.site_origin.as_str()).with_headline_parser(headline),
        )
    }
}
