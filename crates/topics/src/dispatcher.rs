use serde::Deserialize;
use topicbridge_pubsub::PubSubClient;
use topicbridge_sns_verification::Verifier;
use topicbridge_topic_store::TopicStore;
use tracing::{debug, info, warn};

use crate::event::{EventSink, InboundEvent};
use crate::manager::TopicManager;
use crate::reference::TopicRef;

/// What to tell the provider about a delivery.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delivery {
    /// The message was authentic. Downstream failures do not change this.
    Accepted,

    /// The signature did not check out.
    Rejected,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "Type")]
enum InboundMessage {
    SubscriptionConfirmation {
        #[serde(rename = "Token")]
        token: String,

        #[serde(rename = "TopicArn")]
        topic_arn: String,
    },

    Notification {
        #[serde(rename = "TopicArn")]
        topic_arn: String,

        #[serde(rename = "Message")]
        message: String,

        #[serde(rename = "MessageId", default)]
        message_id: Option<String>,

        #[serde(rename = "Subject", default)]
        subject: Option<String>,
    },

    #[serde(other)]
    Other,
}

/// Handles deliveries posted to our webhook.
#[derive(Clone, Debug)]
pub struct NotificationDispatcher<V, P, S, E>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    manager: TopicManager<P, S>,
    sink: E,
    verifier: V,
}

impl<V, P, S, E> NotificationDispatcher<V, P, S, E>
where
    V: Verifier,
    P: PubSubClient,
    S: TopicStore,
    E: EventSink,
{
    /// Creates a new dispatcher.
    pub const fn new(verifier: V, manager: TopicManager<P, S>, sink: E) -> Self {
        Self {
            manager,
            sink,
            verifier,
        }
    }

    /// The manager confirmations are handed to.
    pub const fn manager(&self) -> &TopicManager<P, S> {
        &self.manager
    }

    /// Verifies and acts on a raw delivery body.
    pub async fn handle(&self, raw_body: &[u8]) -> Delivery {
        if !self.verifier.verify(raw_body).await {
            warn!("rejected delivery with invalid signature");
            return Delivery::Rejected;
        }

        match serde_json::from_slice::<InboundMessage>(raw_body) {
            Ok(InboundMessage::SubscriptionConfirmation { token, topic_arn }) => {
                self.confirm(&token, &topic_arn).await;
            }
            Ok(InboundMessage::Notification {
                topic_arn,
                message,
                message_id,
                subject,
            }) => {
                self.forward(topic_arn, &message, message_id, subject).await;
            }
            Ok(InboundMessage::Other) => debug!("ignored delivery"),
            Err(e) => warn!("could not classify delivery: {e}"),
        }

        Delivery::Accepted
    }

    async fn confirm(&self, token: &str, topic_arn: &str) {
        match self.manager.confirm(token, topic_arn).await {
            Ok(persisted) => {
                if let Some(e) = persisted.local_error() {
                    warn!(topic_arn, "{e}");
                }
            }
            Err(e) => warn!(topic_arn, "could not confirm subscription: {e}"),
        }
    }

    async fn forward(
        &self,
        topic_arn: String,
        message: &str,
        message_id: Option<String>,
        subject: Option<String>,
    ) {
        let topic = match self
            .manager
            .resolve(TopicRef::ByArn(topic_arn.clone()), None)
            .await
        {
            Ok(topic) => topic,
            Err(e) => {
                warn!(%topic_arn, "could not look up topic: {e}");
                return;
            }
        };

        let Some(topic_id) = topic.id else {
            debug!(%topic_arn, "dropped notification for unknown topic");
            return;
        };

        if !topic.is_active {
            debug!(%topic_arn, "dropped notification for inactive topic");
            return;
        }

        let event = InboundEvent::notification(topic_id, topic_arn, message_id, subject, message);
        let topic_arn = event.topic_arn.clone();

        match self.sink.emit(event).await {
            Ok(()) => info!(%topic_arn, "forwarded notification"),
            Err(e) => warn!(%topic_arn, "could not forward notification: {e}"),
        }
    }
}
