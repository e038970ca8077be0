use clap::{Parser, Subcommand};
use connection_indexer::config::Config;
use connection_indexer::host::{Host, HostReply};
use connection_indexer::{remote, IndexerError};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(version, about = "Harvests connection cards from page snapshots and syncs them")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read page events as JSON lines on stdin, answer on stdout (default)
    Serve,
    /// Query the configured backend and print how many records it holds
    Check,
}

async fn write_reply<W>(out: &mut W, reply: &HostReply) -> Result<(), IndexerError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(reply)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}

async fn serve(config: Config) -> Result<(), IndexerError> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut host = Host::new(config, events_tx)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!("Waiting for page events on stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let line = line.trim();
                if !line.is_empty() {
                    if let Some(reply) = host.handle_line(line).await {
                        write_reply(&mut stdout, &reply).await?;
                    }
                }
            }
            Some(event) = events_rx.recv() => {
                debug!("Sync complete: {:?}", event);
                write_reply(&mut stdout, &HostReply::from(event)).await?;
            }
        }
    }

    info!("Input closed");
    Ok(())
}

async fn check(config: Config) -> Result<(), IndexerError> {
    let store = remote::connect(&config)?.ok_or(IndexerError::NotConfigured)?;
    let count = store.count().await?;
    println!("{}", count);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.config).await?,
        Command::Check => check(cli.config).await?,
    }

    Ok(())
}
