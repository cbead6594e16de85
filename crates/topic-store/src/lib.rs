//! Abstract interface for persisting topic records.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod filter;
mod topic;

pub use filter::TopicFilter;
pub use topic::{EndpointType, Topic, TopicId, TopicState};

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for `TopicStore` errors
pub trait TopicStoreError: Debug + Error + Send + Sync + 'static {}

/// A store of topic records.
///
/// # Required Methods
/// - `save`: Inserts or replaces a topic, assigning an ID if it has none.
/// - `get`: Loads a topic by ID.
/// - `delete`: Removes a topic. Removing an unknown ID is not an error.
/// - `list`: Lists topics matching a filter, ordered by name.
///
/// # Provided Methods
/// - `find_by_arn`: Loads the topic with the given topic ARN.
#[async_trait]
pub trait TopicStore: Clone + Send + Sync + 'static {
    /// The error type for this store.
    type Error: TopicStoreError;

    /// Inserts or replaces a topic and returns it as stored.
    async fn save(&self, topic: Topic) -> Result<Topic, Self::Error>;

    /// Loads a topic by ID.
    async fn get(&self, id: TopicId) -> Result<Option<Topic>, Self::Error>;

    /// Removes a topic.
    async fn delete(&self, id: TopicId) -> Result<(), Self::Error>;

    /// Lists topics matching `filter`, ordered by name.
    async fn list(&self, filter: &TopicFilter) -> Result<Vec<Topic>, Self::Error>;

    /// Loads the topic with the given topic ARN.
    async fn find_by_arn(&self, topic_arn: &str) -> Result<Option<Topic>, Self::Error> {
        Ok(self
            .list(&TopicFilter::default())
            .await?
            .into_iter()
            .find(|topic| topic.topic_arn.as_deref() == Some(topic_arn)))
    }
}

/// Orders topics the way `TopicStore::list` promises.
pub fn sort_topics(topics: &mut [Topic]) {
    topics.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}
