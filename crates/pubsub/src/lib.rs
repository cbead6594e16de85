//! Abstract interface for a remote pub/sub notification provider.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod protocol;
mod publish;

pub use protocol::{ParseProtocolError, Protocol};
pub use publish::{PublishRequest, PublishTarget};

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for `PubSubClient` errors
pub trait PubSubError: Debug + Error + Send + Sync + 'static {}

/// Result of a subscribe request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubscribeOutcome {
    /// The provider is waiting for the endpoint to confirm ownership.
    Pending,

    /// The subscription is live.
    Confirmed(String),
}

impl SubscribeOutcome {
    /// The subscription ARN, if the subscription is already confirmed.
    #[must_use]
    pub fn subscription_arn(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Confirmed(arn) => Some(arn),
        }
    }
}

/// The remote operations a topic manager needs from a pub/sub provider.
///
/// # Required Methods
/// - `create_topic`: Creates a topic and returns its ARN.
/// - `delete_topic`: Deletes a topic. Deleting an unknown ARN succeeds.
/// - `subscribe`: Subscribes an endpoint to a topic.
/// - `unsubscribe`: Removes a subscription.
/// - `confirm_subscription`: Exchanges a confirmation token for a subscription ARN.
/// - `publish`: Publishes a message and returns the provider's message ID.
#[async_trait]
pub trait PubSubClient: Clone + Send + Sync + 'static {
    /// The error type for this client.
    type Error: PubSubError;

    /// Creates a topic and returns its ARN.
    async fn create_topic(&self, name: &str) -> Result<String, Self::Error>;

    /// Deletes a topic.
    async fn delete_topic(&self, topic_arn: &str) -> Result<(), Self::Error>;

    /// Subscribes `endpoint` to the topic over `protocol`.
    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: Protocol,
        endpoint: &str,
    ) -> Result<SubscribeOutcome, Self::Error>;

    /// Removes a subscription.
    async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), Self::Error>;

    /// Confirms a pending subscription and returns the subscription ARN.
    async fn confirm_subscription(
        &self,
        token: &str,
        topic_arn: &str,
    ) -> Result<String, Self::Error>;

    /// Publishes a message and returns the provider's message ID.
    async fn publish(&self, request: PublishRequest) -> Result<String, Self::Error>;
}
