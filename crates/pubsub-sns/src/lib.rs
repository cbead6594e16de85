//! Implementation of the pub/sub client interface using Amazon SNS.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::result_large_err)]

mod error;

pub use error::Error;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_sns::Client;
use aws_sdk_sns::types::MessageAttributeValue;
use topicbridge_pubsub::{PubSubClient, Protocol, PublishRequest, PublishTarget, SubscribeOutcome};
use tracing::debug;

/// What SNS hands back in place of an ARN while a subscription awaits
/// confirmation.
static PENDING_CONFIRMATION: &str = "pending confirmation";

/// Options for the SNS client.
pub struct SnsClientOptions {
    /// Overrides the service endpoint (e.g. a local emulator).
    pub endpoint_url: Option<String>,

    /// The AWS region hosting the topics.
    pub region: String,
}

/// Pub/sub client backed by Amazon SNS.
#[derive(Clone, Debug)]
pub struct SnsClient {
    client: Client,
}

impl SnsClient {
    /// Creates a new instance of `SnsClient`, loading credentials from the
    /// default provider chain.
    pub async fn new(
        SnsClientOptions {
            endpoint_url,
            region,
        }: SnsClientOptions,
    ) -> Self {
        let mut loader = aws_config::from_env().region(Region::new(region));

        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let config = loader.load().await;

        Self {
            client: Client::new(&config),
        }
    }

    /// Wraps an already configured SDK client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn parse_subscription_arn(arn: Option<&str>) -> Result<SubscribeOutcome, Error> {
    match arn {
        None => Err(Error::MissingField("SubscriptionArn")),
        Some(arn) if is_pending(arn) => Ok(SubscribeOutcome::Pending),
        Some(arn) => Ok(SubscribeOutcome::Confirmed(arn.to_string())),
    }
}

fn is_pending(arn: &str) -> bool {
    let normalized = arn.trim().to_ascii_lowercase().replace(' ', "");
    normalized.is_empty() || normalized == PENDING_CONFIRMATION.replace(' ', "")
}

#[async_trait]
impl PubSubClient for SnsClient {
    type Error = Error;

    async fn create_topic(&self, name: &str) -> Result<String, Self::Error> {
        let response = self
            .client
            .create_topic()
            .name(name)
            .send()
            .await
            .map_err(|e| Error::Sns(e.into()))?;

        response
            .topic_arn()
            .map(ToString::to_string)
            .ok_or(Error::MissingField("TopicArn"))
    }

    async fn delete_topic(&self, topic_arn: &str) -> Result<(), Self::Error> {
        match self.client.delete_topic().topic_arn(topic_arn).send().await {
            Ok(_) => Ok(()),
            Err(e) => match aws_sdk_sns::Error::from(e) {
                aws_sdk_sns::Error::NotFoundException(_) => {
                    debug!(topic_arn, "topic already gone");
                    Ok(())
                }
                e => Err(Error::Sns(e)),
            },
        }
    }

    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: Protocol,
        endpoint: &str,
    ) -> Result<SubscribeOutcome, Self::Error> {
        let response = self
            .client
            .subscribe()
            .topic_arn(topic_arn)
            .protocol(protocol.as_str())
            .endpoint(endpoint)
            .send()
            .await
            .map_err(|e| Error::Sns(e.into()))?;

        parse_subscription_arn(response.subscription_arn())
    }

    async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), Self::Error> {
        self.client
            .unsubscribe()
            .subscription_arn(subscription_arn)
            .send()
            .await
            .map_err(|e| Error::Sns(e.into()))?;

        Ok(())
    }

    async fn confirm_subscription(
        &self,
        token: &str,
        topic_arn: &str,
    ) -> Result<String, Self::Error> {
        let response = self
            .client
            .confirm_subscription()
            .token(token)
            .topic_arn(topic_arn)
            .send()
            .await
            .map_err(|e| Error::Sns(e.into()))?;

        response
            .subscription_arn()
            .map(ToString::to_string)
            .ok_or(Error::MissingField("SubscriptionArn"))
    }

    async fn publish(
        &self,
        PublishRequest {
            message,
            subject,
            target,
            message_structure,
            attributes,
        }: PublishRequest,
    ) -> Result<String, Self::Error> {
        let mut request = self
            .client
            .publish()
            .message(message)
            .set_subject(subject)
            .set_message_structure(message_structure);

        request = match target {
            PublishTarget::Topic(arn) => request.topic_arn(arn),
            PublishTarget::Endpoint(arn) => request.target_arn(arn),
        };

        for (name, value) in attributes {
            let attribute = MessageAttributeValue::builder()
                .data_type("String")
                .string_value(value)
                .build()?;
            request = request.message_attributes(name, attribute);
        }

        let response = request.send().await.map_err(|e| Error::Sns(e.into()))?;

        response
            .message_id()
            .map(ToString::to_string)
            .ok_or(Error::MissingField("MessageId"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_confirmation_maps_to_pending() {
        assert_eq!(
            parse_subscription_arn(Some("pending confirmation")).unwrap(),
            SubscribeOutcome::Pending
        );
        assert_eq!(
            parse_subscription_arn(Some("PendingConfirmation")).unwrap(),
            SubscribeOutcome::Pending
        );
    }

    #[test]
    fn test_real_arn_is_confirmed() {
        let arn = "arn:aws:sns:us-east-1:111:orders:9f0c";
        assert_eq!(
            parse_subscription_arn(Some(arn)).unwrap(),
            SubscribeOutcome::Confirmed(arn.to_string())
        );
    }

    #[test]
    fn test_missing_arn_is_an_error() {
        assert!(matches!(
            parse_subscription_arn(None),
            Err(Error::MissingField("SubscriptionArn"))
        ));
    }
}
