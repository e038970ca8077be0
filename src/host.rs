use crate::config::Config;
use crate::dispatcher::SyncEvent;
use crate::session::{ConfigAck, ScanReport, Session, SessionHandle, Status};
use crate::IndexerError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// One line of input from the page host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    Document {
        html: String,
    },
    Scroll,
    Navigate,
    GetStatus,
    UpdateConfig {
        #[serde(default, alias = "pocketbaseUrl")]
        endpoint: Option<String>,
        #[serde(default)]
        credentials: Option<String>,
    },
    ForceScan,
}

/// One line of output to the page host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostReply {
    Status(Status),
    ConfigAck(ConfigAck),
    ScanResult(ScanReport),
    SyncComplete(SyncEvent),
    Error { message: String },
}

impl From<SyncEvent> for HostReply {
    fn from(event: SyncEvent) -> Self {
        HostReply::SyncComplete(event)
    }
}

/// Routes host messages to the session of the current page, replacing the
/// session whenever the page navigates.
pub struct Host {
    config: Config,
    events: mpsc::UnboundedSender<SyncEvent>,
    session: SessionHandle,
}

impl Host {
    pub fn new(
        config: Config,
        events: mpsc::UnboundedSender<SyncEvent>,
    ) -> Result<Self, IndexerError> {
        let session = Session::attach(config.clone(), events.clone())?;
        Ok(Host {
            config,
            events,
            session,
        })
    }

    /// Parses one input line. Malformed input becomes an `ERROR` reply.
    pub async fn handle_line(&mut self, line: &str) -> Option<HostReply> {
        let reply = match serde_json::from_str::<HostMessage>(line) {
            Ok(msg) => self.handle(msg).await,
            Err(e) => Err(e.into()),
        };
        match reply {
            Ok(reply) => reply,
            Err(e) => Some(HostReply::Error {
                message: e.to_string(),
            }),
        }
    }

    pub async fn handle(&mut self, msg: HostMessage) -> Result<Option<HostReply>, IndexerError> {
        let reply = match msg {
            HostMessage::Document { html } => {
                self.session.document(html).await?;
                None
            }
            HostMessage::Scroll => {
                self.session.scroll().await?;
                None
            }
            HostMessage::Navigate => {
                info!("Page navigated, starting a new session");
                self.session = Session::attach(self.config.clone(), self.events.clone())?;
                None
            }
            HostMessage::GetStatus => Some(HostReply::Status(self.session.status().await?)),
            HostMessage::UpdateConfig {
                endpoint,
                credentials,
            } => {
                let ack = self
                    .session
                    .update_config(endpoint.clone(), credentials.clone())
                    .await?;
                if ack.success {
                    self.config = self.config.with_connection(endpoint, credentials);
                }
                Some(HostReply::ConfigAck(ack))
            }
            HostMessage::ForceScan => Some(HostReply::ScanResult(self.session.force_scan().await?)),
        };
        Ok(reply)
    }
}
