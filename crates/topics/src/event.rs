use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use topicbridge_topic_store::TopicId;

/// Name of events raised for inbound notifications.
pub const NOTIFICATION_EVENT: &str = "topic.notification";

/// Marker trait for `EventSink` errors
pub trait EventSinkError: Debug + StdError + Send + Sync + 'static {}

/// An inbound notification, handed on to the rest of the application.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InboundEvent {
    /// Event name, always `NOTIFICATION_EVENT`.
    pub name: &'static str,

    /// The local topic the notification arrived on.
    pub topic_id: TopicId,

    /// The remote topic the notification arrived on.
    pub topic_arn: String,

    /// Provider message ID.
    pub message_id: Option<String>,

    /// Subject line, if the publisher set one.
    pub subject: Option<String>,

    /// The message body. Parsed as JSON when possible, otherwise the raw
    /// string.
    pub payload: Value,
}

impl InboundEvent {
    /// Builds a notification event, parsing `message` as JSON when it is JSON.
    #[must_use]
    pub fn notification(
        topic_id: TopicId,
        topic_arn: impl Into<String>,
        message_id: Option<String>,
        subject: Option<String>,
        message: &str,
    ) -> Self {
        let payload = serde_json::from_str(message)
            .unwrap_or_else(|_| Value::String(message.to_string()));

        Self {
            name: NOTIFICATION_EVENT,
            topic_id,
            topic_arn: topic_arn.into(),
            message_id,
            subject,
            payload,
        }
    }
}

/// Where forwarded notifications go.
#[async_trait]
pub trait EventSink: Clone + Send + Sync + 'static {
    /// The error type for this sink.
    type Error: EventSinkError;

    /// Hands an event on.
    async fn emit(&self, event: InboundEvent) -> Result<(), Self::Error>;
}

/// Errors from `BroadcastEventSink`.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// Nobody is listening.
    #[error("no receivers for event {0}")]
    NoReceivers(&'static str),
}

impl EventSinkError for BroadcastError {}

/// Fans events out to in-process receivers.
#[derive(Clone, Debug)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<InboundEvent>,
}

impl BroadcastEventSink {
    /// Creates a sink buffering up to `capacity` events per receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self { sender }
    }

    /// Registers a new receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<InboundEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    type Error = BroadcastError;

    async fn emit(&self, event: InboundEvent) -> Result<(), Self::Error> {
        let name = event.name;

        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| BroadcastError::NoReceivers(name))
    }
}
