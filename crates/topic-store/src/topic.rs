use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier assigned to a topic by the store.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct TopicId(Uuid);

impl TopicId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for TopicId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for TopicId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for TopicId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Who owns the endpoint a topic is subscribed with.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    /// Our own webhook receives deliveries.
    #[default]
    Standard,

    /// A third-party endpoint receives deliveries.
    External,
}

/// Lifecycle position of a topic, derived from its fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicState {
    /// Not yet created remotely.
    Uncreated,

    /// Created remotely, no subscription.
    Created,

    /// A subscription was requested and awaits confirmation.
    SubscribeRequested,

    /// A subscription is live.
    Confirmed,
}

/// A pub/sub topic tracked both remotely and in the store.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Topic {
    /// `None` until the store has persisted the topic.
    pub id: Option<TopicId>,

    /// Human readable label.
    pub name: String,

    /// Remote topic ARN.
    pub topic_arn: Option<String>,

    /// Remote subscription ARN.
    pub subscription_arn: Option<String>,

    /// Set while a subscribe request awaits confirmation.
    #[serde(default)]
    pub subscription_pending: bool,

    /// The endpoint last requested for subscription.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Whether the subscribed endpoint is ours.
    #[serde(default)]
    pub endpoint_type: EndpointType,

    /// Gates forwarding of inbound notifications.
    pub is_active: bool,
}

impl Default for Topic {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            topic_arn: None,
            subscription_arn: None,
            subscription_pending: false,
            endpoint: None,
            endpoint_type: EndpointType::Standard,
            is_active: true,
        }
    }
}

impl Topic {
    /// A fresh, unpersisted topic.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the topic has a live subscription.
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.subscription_arn.is_some()
    }

    /// Whether the store has persisted the topic.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TopicState {
        if self.topic_arn.is_none() {
            TopicState::Uncreated
        } else if self.subscription_arn.is_some() {
            TopicState::Confirmed
        } else if self.subscription_pending {
            TopicState::SubscribeRequested
        } else {
            TopicState::Created
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_follows_fields() {
        let mut topic = Topic::new("orders");
        assert_eq!(topic.state(), TopicState::Uncreated);

        topic.topic_arn = Some("arn:aws:sns:us-east-1:111:orders".to_string());
        assert_eq!(topic.state(), TopicState::Created);

        topic.subscription_pending = true;
        assert_eq!(topic.state(), TopicState::SubscribeRequested);

        topic.subscription_pending = false;
        topic.subscription_arn = Some("arn:aws:sns:us-east-1:111:orders:1".to_string());
        assert_eq!(topic.state(), TopicState::Confirmed);
        assert!(topic.is_subscribed());
    }

    #[test]
    fn test_new_topic_is_active_and_standard() {
        let topic = Topic::new("orders");
        assert!(topic.is_active);
        assert!(!topic.is_persisted());
        assert_eq!(topic.endpoint_type, EndpointType::Standard);
    }

    #[test]
    fn test_topic_id_round_trips_through_display() {
        let id = TopicId::generate();
        assert_eq!(id.to_string().parse::<TopicId>().unwrap(), id);
        assert!("not-a-uuid".parse::<TopicId>().is_err());
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let topic: Topic = serde_json::from_str(
            r#"{"id":null,"name":"orders","topic_arn":null,"subscription_arn":null,"is_active":false}"#,
        )
        .unwrap();

        assert!(!topic.subscription_pending);
        assert_eq!(topic.endpoint_type, EndpointType::Standard);
        assert!(!topic.is_active);
    }
}
