//! Runs the topic bridge: the provider webhook plus the topic API.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use topicbridge_pubsub::{Protocol, PubSubClient};
use topicbridge_pubsub_mock::MockPubSubClient;
use topicbridge_pubsub_sns::{SnsClient, SnsClientOptions};
use topicbridge_sns_verification::{
    HttpCertificateSource, InsecureVerifier, SnsVerifier, Verifier,
};
use topicbridge_topic_store::TopicStore;
use topicbridge_topic_store_fs::FsTopicStore;
use topicbridge_topic_store_memory::MemoryTopicStore;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use topicbridge_topics::{
    BroadcastEventSink, InboundEvent, NotificationDispatcher, TopicManager, TopicManagerOptions,
};
use topicbridge_topics_http::{TopicsContext, TopicsHttpServer, WEBHOOK_PATH, router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Certificate client error
    #[error(transparent)]
    Certificates(#[from] topicbridge_sns_verification::Error),

    /// HTTP server error
    #[error(transparent)]
    Http(#[from] topicbridge_topics_http::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// AWS region hosting the topics
    #[arg(long, default_value = "us-east-1", env = "TOPICBRIDGE_AWS_REGION")]
    aws_region: String,

    /// Default protocol for subscriptions that do not name one
    #[arg(long, default_value = "https", env = "TOPICBRIDGE_GENERAL_PROTOCOL")]
    general_protocol: Protocol,

    /// Accept every webhook delivery without checking its signature
    #[arg(long, env = "TOPICBRIDGE_INSECURE_SKIP_VERIFICATION")]
    insecure_skip_verification: bool,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080", env = "TOPICBRIDGE_LISTEN_ADDR")]
    listen_addr: SocketAddr,

    /// Use the in-memory pub/sub client instead of SNS
    #[arg(long, env = "TOPICBRIDGE_MOCK_PUBSUB")]
    mock_pubsub: bool,

    /// Timeout for every call to SNS, in seconds
    #[arg(long, default_value_t = 10, env = "TOPICBRIDGE_REMOTE_TIMEOUT_SECS")]
    remote_timeout_secs: u64,

    /// Overrides the SNS endpoint (e.g. a local emulator)
    #[arg(long, env = "TOPICBRIDGE_SNS_ENDPOINT_URL")]
    sns_endpoint_url: Option<String>,

    /// Directory to keep topic records in (in-memory if unset)
    #[arg(long, env = "TOPICBRIDGE_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Extra host trusted to serve signing certificates
    #[arg(long = "trusted-cert-host", env = "TOPICBRIDGE_TRUSTED_CERT_HOSTS", value_delimiter = ',')]
    trusted_cert_hosts: Vec<String>,

    /// Public URL of this service's webhook
    #[arg(long, env = "TOPICBRIDGE_WEBHOOK_URL")]
    webhook_url: Url,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if !args.webhook_url.path().ends_with(WEBHOOK_PATH) {
        warn!(
            "webhook url {} does not end with {WEBHOOK_PATH}, deliveries must be rewritten to reach it",
            args.webhook_url
        );
    }

    match args.store_dir.clone() {
        Some(dir) => {
            info!("storing topics in {}", dir.display());
            with_store(args, FsTopicStore::new(dir)).await
        }
        None => {
            warn!("no store directory set, topics will not survive a restart");
            with_store(args, MemoryTopicStore::new()).await
        }
    }
}

async fn with_store<S>(args: Args, store: S) -> Result<(), Error>
where
    S: TopicStore,
{
    if args.mock_pubsub {
        info!("using in-memory pub/sub client");
        return with_client(args, store, MockPubSubClient::new()).await;
    }

    let client = SnsClient::new(SnsClientOptions {
        endpoint_url: args.sns_endpoint_url.clone(),
        region: args.aws_region.clone(),
    })
    .await;

    with_client(args, store, client).await
}

async fn with_client<P, S>(args: Args, store: S, client: P) -> Result<(), Error>
where
    P: PubSubClient,
    S: TopicStore,
{
    if args.insecure_skip_verification {
        return serve(args, InsecureVerifier::new(), client, store).await;
    }

    let source = HttpCertificateSource::new(Duration::from_secs(args.remote_timeout_secs))?;
    let extra_hosts: HashSet<String> = args.trusted_cert_hosts.iter().cloned().collect();

    serve(
        args,
        SnsVerifier::with_extra_hosts(source, extra_hosts),
        client,
        store,
    )
    .await
}

async fn serve<V, P, S>(args: Args, verifier: V, client: P, store: S) -> Result<(), Error>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
{
    let manager = TopicManager::new(
        client,
        store,
        TopicManagerOptions {
            general_protocol: args.general_protocol,
            remote_timeout: Duration::from_secs(args.remote_timeout_secs),
            webhook_url: args.webhook_url.to_string(),
        },
    );

    let sink = BroadcastEventSink::new(1024);
    tokio::spawn(log_events(sink.subscribe()));

    let dispatcher = NotificationDispatcher::new(verifier, manager, sink);
    let server = TopicsHttpServer::new(args.listen_addr);
    let handle = server.start(router(TopicsContext { dispatcher })).await?;
    info!("webhook expected at {}", args.webhook_url);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown_token.clone()));

    tokio::select! {
        () = shutdown_token.cancelled() => server.shutdown().await,
        _ = handle => warn!("http server stopped unexpectedly"),
    }

    Ok(())
}

/// Logs forwarded notifications until the sink goes away. Returns how many
/// were logged.
async fn log_events(mut events: broadcast::Receiver<InboundEvent>) -> usize {
    let mut logged = 0;

    loop {
        match events.recv().await {
            Ok(event) => {
                info!(
                    topic_id = %event.topic_id,
                    topic_arn = %event.topic_arn,
                    message_id = ?event.message_id,
                    "{}: {}",
                    event.name,
                    event.payload
                );
                logged += 1;
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }

    logged
}

async fn wait_for_signal(shutdown_token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = sigint.recv() => info!("Received SIGINT"),
                }
            }
            _ => {
                warn!("could not install signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
                info!("Received interrupt signal");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received interrupt signal");
    }

    info!("Shutting down");
    shutdown_token.cancel();
}
