use crate::config::Config;
use crate::dispatcher::{BatchDispatcher, SyncEvent};
use crate::ledger::DedupLedger;
use crate::linkedin::Harvester;
use crate::watcher::{wait_for, ChangeWatcher, Trigger};
use crate::{remote, Delivery, IndexerError, RemoteStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub processed: usize,
    pub pending: usize,
    pub configured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigAck {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub found: usize,
}

#[derive(Debug)]
enum Command {
    Document(String),
    Scroll,
    Status(oneshot::Sender<Status>),
    UpdateConfig {
        endpoint: Option<String>,
        credentials: Option<String>,
        reply: oneshot::Sender<ConfigAck>,
    },
    ForceScan(oneshot::Sender<ScanReport>),
}

/// Everything that lives for one page load. Runs as a single task, so the
/// ledger and the pending queue have exactly one owner.
pub struct Session {
    config: Config,
    harvester: Harvester,
    document: Option<String>,
    ledger: DedupLedger,
    watcher: ChangeWatcher,
    dispatcher: BatchDispatcher,
    store: Option<Arc<dyn RemoteStore>>,
    in_flight: Option<JoinHandle<Delivery>>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl Session {
    /// Builds the backend from `config` and starts the session task.
    pub fn attach(
        config: Config,
        events: mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<SessionHandle, IndexerError> {
        let store = remote::connect(&config)?;
        Ok(Session::with_store(config, store, events).spawn())
    }

    pub fn with_store(
        config: Config,
        store: Option<Arc<dyn RemoteStore>>,
        events: mpsc::UnboundedSender<SyncEvent>,
    ) -> Self {
        let timings = config.timings();
        Session {
            harvester: config.harvester(),
            document: None,
            ledger: DedupLedger::new(),
            watcher: ChangeWatcher::attach(timings),
            dispatcher: BatchDispatcher::new(timings.sync_debounce, config.max_pending),
            store,
            in_flight: None,
            events,
            config,
        }
    }

    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(self.run(rx));
        SessionHandle { tx }
    }

    async fn run(mut self, mut inbox: mpsc::Receiver<Command>) {
        debug!("Session attached");
        loop {
            let rescan_at = self.watcher.deadline();
            let flush_at = self.dispatcher.deadline();
            let sending = self.in_flight.is_some();

            tokio::select! {
                cmd = inbox.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                _ = wait_for(rescan_at) => {
                    if self.watcher.fire() {
                        self.scan();
                    }
                }
                _ = wait_for(flush_at), if !sending => {
                    if self.dispatcher.fire() {
                        self.flush();
                    }
                }
                res = join_in_flight(&mut self.in_flight) => self.complete(res),
            }
        }
        debug!("Session closed");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Document(html) => {
                self.document = Some(html);
                self.watcher.notify(Trigger::Mutation);
            }
            Command::Scroll => self.watcher.notify(Trigger::Scroll),
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::UpdateConfig {
                endpoint,
                credentials,
                reply,
            } => {
                let success = self.reconfigure(endpoint, credentials);
                let _ = reply.send(ConfigAck { success });
            }
            Command::ForceScan(reply) => {
                let found = self.scan();
                let _ = reply.send(ScanReport { found });
            }
        }
    }

    fn status(&self) -> Status {
        Status {
            processed: self.ledger.len(),
            pending: self.dispatcher.pending_len(),
            configured: self.store.is_some(),
        }
    }

    fn reconfigure(&mut self, endpoint: Option<String>, credentials: Option<String>) -> bool {
        let config = self.config.with_connection(endpoint, credentials);
        match remote::connect(&config) {
            Ok(store) => {
                info!("Endpoint set to {:?}", config.endpoint);
                self.config = config;
                self.store = store;
                self.dispatcher.rearm();
                true
            }
            Err(e) => {
                warn!("Rejected configuration: {}", e);
                false
            }
        }
    }

    /// One locate + extract pass over the current snapshot. Returns how many
    /// records were new to this session.
    fn scan(&mut self) -> usize {
        let Some(html) = &self.document else {
            return 0;
        };

        let fresh: Vec<_> = self
            .harvester
            .harvest(html)
            .into_iter()
            .filter(|record| self.ledger.insert(&record.profile_url))
            .collect();

        for record in &fresh {
            debug!("Found {} ({})", record.name, record.profile_url);
        }
        let found = fresh.len();
        debug!("Scan found {} new records", found);
        self.dispatcher.enqueue(fresh);
        found
    }

    fn flush(&mut self) {
        let Some(store) = self.store.clone() else {
            debug!(
                "No endpoint configured, holding {} records",
                self.dispatcher.pending_len()
            );
            return;
        };
        if let Some(batch) = self.dispatcher.begin_send() {
            self.in_flight = Some(tokio::spawn(async move { store.deliver(&batch).await }));
        }
    }

    fn complete(&mut self, res: Result<Delivery, JoinError>) {
        self.in_flight = None;
        let delivery = res.unwrap_or_else(|e| {
            warn!("Delivery task failed: {}", e);
            Delivery::failed(0)
        });
        let event = self.dispatcher.finish_send(delivery);
        let _ = self.events.send(event);
    }
}

async fn join_in_flight(
    in_flight: &mut Option<JoinHandle<Delivery>>,
) -> Result<Delivery, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Command side of a running [`Session`]. Dropping every handle ends it.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn send(&self, cmd: Command) -> Result<(), IndexerError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| IndexerError::SessionClosed)
    }

    async fn ask<T>(
        &self,
        cmd: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, IndexerError> {
        let (tx, rx) = oneshot::channel();
        self.send(cmd(tx)).await?;
        rx.await.map_err(|_| IndexerError::SessionClosed)
    }

    /// A new snapshot of the rendered page.
    pub async fn document(&self, html: String) -> Result<(), IndexerError> {
        self.send(Command::Document(html)).await
    }

    pub async fn scroll(&self) -> Result<(), IndexerError> {
        self.send(Command::Scroll).await
    }

    pub async fn status(&self) -> Result<Status, IndexerError> {
        self.ask(Command::Status).await
    }

    pub async fn update_config(
        &self,
        endpoint: Option<String>,
        credentials: Option<String>,
    ) -> Result<ConfigAck, IndexerError> {
        self.ask(|reply| Command::UpdateConfig {
            endpoint,
            credentials,
            reply,
        })
        .await
    }

    /// Scans right away, skipping the watcher's quiet period.
    pub async fn force_scan(&self) -> Result<ScanReport, IndexerError> {
        self.ask(Command::ForceScan).await
    }
}
