use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where a published message goes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "arn", rename_all = "snake_case")]
pub enum PublishTarget {
    /// Fan out to every subscriber of a topic.
    Topic(String),

    /// Deliver directly to a single endpoint (e.g. a mobile push endpoint).
    Endpoint(String),
}

impl PublishTarget {
    /// The ARN being published to.
    #[must_use]
    pub fn arn(&self) -> &str {
        match self {
            Self::Topic(arn) | Self::Endpoint(arn) => arn,
        }
    }
}

/// A message to publish.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublishRequest {
    /// The message body.
    pub message: String,

    /// Optional subject, used by email-family protocols.
    #[serde(default)]
    pub subject: Option<String>,

    /// The destination.
    pub target: PublishTarget,

    /// Set to `"json"` to send a different message per protocol.
    #[serde(default)]
    pub message_structure: Option<String>,

    /// String message attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl PublishRequest {
    /// Creates a plain request with no subject, structure or attributes.
    pub fn new(message: impl Into<String>, target: PublishTarget) -> Self {
        Self {
            message: message.into(),
            subject: None,
            target,
            message_structure: None,
            attributes: BTreeMap::new(),
        }
    }
}
