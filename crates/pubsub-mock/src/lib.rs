//! Mock implementation of the pub/sub client for testing and local
//! development. Records every call and hands out deterministic ARNs.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use topicbridge_pubsub::{PubSubClient, Protocol, PublishRequest, SubscribeOutcome};

/// Remote operations, used to select injected failures.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// `create_topic`
    CreateTopic,
    /// `delete_topic`
    DeleteTopic,
    /// `subscribe`
    Subscribe,
    /// `unsubscribe`
    Unsubscribe,
    /// `confirm_subscription`
    ConfirmSubscription,
    /// `publish`
    Publish,
}

/// A recorded call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    /// `create_topic`
    CreateTopic {
        /// Requested topic name.
        name: String,
    },
    /// `delete_topic`
    DeleteTopic {
        /// Topic being deleted.
        topic_arn: String,
    },
    /// `subscribe`
    Subscribe {
        /// Topic being subscribed to.
        topic_arn: String,
        /// Requested protocol.
        protocol: Protocol,
        /// Requested endpoint.
        endpoint: String,
    },
    /// `unsubscribe`
    Unsubscribe {
        /// Subscription being removed.
        subscription_arn: String,
    },
    /// `confirm_subscription`
    ConfirmSubscription {
        /// Confirmation token.
        token: String,
        /// Topic the token belongs to.
        topic_arn: String,
    },
    /// `publish`
    Publish(PublishRequest),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    confirmation_overrides: HashMap<Protocol, bool>,
    failures: HashSet<Operation>,
    latency: Option<Duration>,
    sequence: u64,
}

/// In-memory pub/sub client.
#[derive(Clone, Debug)]
pub struct MockPubSubClient {
    account_id: String,
    region: String,
    state: Arc<Mutex<State>>,
}

impl Default for MockPubSubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPubSubClient {
    /// Creates a new mock client for region `us-east-1`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_account("us-east-1", "000000000000")
    }

    /// Creates a new mock client minting ARNs for the given region and account.
    #[must_use]
    pub fn with_account(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// The ARN this client assigns to a topic called `name`.
    #[must_use]
    pub fn topic_arn(&self, name: &str) -> String {
        format!("arn:aws:sns:{}:{}:{name}", self.region, self.account_id)
    }

    /// Makes every subsequent call to `operation` fail.
    pub fn fail(&self, operation: Operation) {
        self.state.lock().failures.insert(operation);
    }

    /// Clears an injected failure.
    pub fn recover(&self, operation: Operation) {
        self.state.lock().failures.remove(&operation);
    }

    /// Overrides whether subscriptions over `protocol` wait for confirmation.
    pub fn set_requires_confirmation(&self, protocol: Protocol, requires_confirmation: bool) {
        self.state
            .lock()
            .confirmation_overrides
            .insert(protocol, requires_confirmation);
    }

    fn requires_confirmation(&self, protocol: Protocol) -> bool {
        self.state
            .lock()
            .confirmation_overrides
            .get(&protocol)
            .copied()
            .unwrap_or_else(|| protocol.requires_confirmation())
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = Some(latency);
    }

    /// All calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls to `operation`.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    async fn record(&self, call: Call) -> Result<u64, Error> {
        let latency = self.state.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock();
        let operation = call.operation();
        state.calls.push(call);

        if state.failures.contains(&operation) {
            return Err(Error::Injected(operation));
        }

        state.sequence += 1;
        Ok(state.sequence)
    }
}

impl Call {
    /// The operation this call belongs to.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::CreateTopic { .. } => Operation::CreateTopic,
            Self::DeleteTopic { .. } => Operation::DeleteTopic,
            Self::Subscribe { .. } => Operation::Subscribe,
            Self::Unsubscribe { .. } => Operation::Unsubscribe,
            Self::ConfirmSubscription { .. } => Operation::ConfirmSubscription,
            Self::Publish(_) => Operation::Publish,
        }
    }
}

#[async_trait]
impl PubSubClient for MockPubSubClient {
    type Error = Error;

    async fn create_topic(&self, name: &str) -> Result<String, Self::Error> {
        self.record(Call::CreateTopic {
            name: name.to_string(),
        })
        .await?;

        Ok(self.topic_arn(name))
    }

    async fn delete_topic(&self, topic_arn: &str) -> Result<(), Self::Error> {
        self.record(Call::DeleteTopic {
            topic_arn: topic_arn.to_string(),
        })
        .await?;

        Ok(())
    }

    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: Protocol,
        endpoint: &str,
    ) -> Result<SubscribeOutcome, Self::Error> {
        let sequence = self
            .record(Call::Subscribe {
                topic_arn: topic_arn.to_string(),
                protocol,
                endpoint: endpoint.to_string(),
            })
            .await?;

        if self.requires_confirmation(protocol) {
            Ok(SubscribeOutcome::Pending)
        } else {
            Ok(SubscribeOutcome::Confirmed(format!(
                "{topic_arn}:sub-{sequence}"
            )))
        }
    }

    async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), Self::Error> {
        self.record(Call::Unsubscribe {
            subscription_arn: subscription_arn.to_string(),
        })
        .await?;

        Ok(())
    }

    async fn confirm_subscription(
        &self,
        token: &str,
        topic_arn: &str,
    ) -> Result<String, Self::Error> {
        let sequence = self
            .record(Call::ConfirmSubscription {
                token: token.to_string(),
                topic_arn: topic_arn.to_string(),
            })
            .await?;

        Ok(format!("{topic_arn}:sub-{sequence}"))
    }

    async fn publish(&self, request: PublishRequest) -> Result<String, Self::Error> {
        let sequence = self.record(Call::Publish(request)).await?;

        Ok(format!("msg-{sequence}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let client = MockPubSubClient::new();

        let arn = client.create_topic("orders").await.unwrap();
        assert_eq!(arn, "arn:aws:sns:us-east-1:000000000000:orders");

        client.delete_topic(&arn).await.unwrap();

        assert_eq!(
            client.calls(),
            vec![
                Call::CreateTopic {
                    name: "orders".to_string()
                },
                Call::DeleteTopic { topic_arn: arn },
            ]
        );
    }

    #[tokio::test]
    async fn test_subscribe_outcome_follows_protocol() {
        let client = MockPubSubClient::new();
        let arn = client.topic_arn("orders");

        let https = client
            .subscribe(&arn, Protocol::Https, "https://example.com/hook")
            .await
            .unwrap();
        assert_eq!(https, SubscribeOutcome::Pending);

        let sqs = client
            .subscribe(&arn, Protocol::Sqs, "arn:aws:sqs:us-east-1:000000000000:q")
            .await
            .unwrap();
        assert!(sqs.subscription_arn().unwrap().starts_with(&arn));
    }

    #[tokio::test]
    async fn test_confirmation_override() {
        let client = MockPubSubClient::new();
        let arn = client.topic_arn("orders");
        client.set_requires_confirmation(Protocol::Https, false);

        let https = client
            .subscribe(&arn, Protocol::Https, "https://example.com/hook")
            .await
            .unwrap();

        assert_eq!(https, SubscribeOutcome::Confirmed(format!("{arn}:sub-1")));
    }

    #[tokio::test]
    async fn test_injected_failure_is_still_recorded() {
        let client = MockPubSubClient::new();
        client.fail(Operation::CreateTopic);

        let result = client.create_topic("orders").await;
        assert!(matches!(result, Err(Error::Injected(Operation::CreateTopic))));
        assert_eq!(client.count(Operation::CreateTopic), 1);

        client.recover(Operation::CreateTopic);
        assert!(client.create_topic("orders").await.is_ok());
    }
}
