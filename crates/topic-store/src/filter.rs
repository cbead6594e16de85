use serde::Deserialize;

use crate::{EndpointType, Topic};

/// Criteria for listing topics. Unset fields match everything.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct TopicFilter {
    /// Case-insensitive substring of the topic name.
    #[serde(default, rename = "name")]
    pub name_contains: Option<String>,

    /// Match on the active flag.
    #[serde(default, rename = "active")]
    pub is_active: Option<bool>,

    /// Match on whether a subscription ARN is present.
    #[serde(default)]
    pub subscribed: Option<bool>,

    /// Match on endpoint ownership.
    #[serde(default)]
    pub endpoint_type: Option<EndpointType>,
}

impl TopicFilter {
    /// Whether `topic` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, topic: &Topic) -> bool {
        if let Some(needle) = &self.name_contains {
            if !topic
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }

        self.is_active.is_none_or(|active| topic.is_active == active)
            && self
                .subscribed
                .is_none_or(|subscribed| topic.is_subscribed() == subscribed)
            && self
                .endpoint_type
                .is_none_or(|endpoint_type| topic.endpoint_type == endpoint_type)
    }
}
