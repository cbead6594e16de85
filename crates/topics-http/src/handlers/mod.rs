mod bulk;
mod publish;
mod topics;
mod webhook;

pub(crate) use bulk::bulk_handler;
pub(crate) use publish::publish_handler;
pub(crate) use topics::{
    create_topic_handler, delete_topic_handler, disable_topic_handler, enable_topic_handler,
    get_topic_handler, list_topics_handler, subscribe_topic_handler, unsubscribe_topic_handler,
};
pub(crate) use webhook::webhook_handler;

use serde::Serialize;
use topicbridge_topic_store::{Topic, TopicState};
use topicbridge_topics::Persisted;

/// A topic as returned by the API.
#[derive(Debug, Serialize)]
pub(crate) struct TopicView {
    #[serde(flatten)]
    topic: Topic,

    state: TopicState,

    /// Set when the provider accepted a change the store did not record.
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

impl From<Topic> for TopicView {
    fn from(topic: Topic) -> Self {
        Self {
            state: topic.state(),
            topic,
            warning: None,
        }
    }
}

impl From<Persisted<Topic>> for TopicView {
    fn from(persisted: Persisted<Topic>) -> Self {
        let (topic, local_error) = persisted.into_parts();

        Self {
            warning: local_error.map(|e| e.to_string()),
            ..Self::from(topic)
        }
    }
}
