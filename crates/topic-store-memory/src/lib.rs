//! In-memory (single node) implementation of topic storage for local
//! development and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use topicbridge_topic_store::{Topic, TopicFilter, TopicId, TopicStore, sort_topics};

/// In-memory topic store.
#[derive(Clone, Debug, Default)]
pub struct MemoryTopicStore {
    map: Arc<Mutex<HashMap<TopicId, Topic>>>,
    read_only: Arc<AtomicBool>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryTopicStore {
    /// Creates a new `MemoryTopicStore`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with `Error::ReadOnly`. Reads keep
    /// working.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Makes every subsequent read fail with `Error::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_readable(&self) -> Result<(), Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(Error::Unavailable)
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<(), Error> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(Error::ReadOnly)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TopicStore for MemoryTopicStore {
    type Error = Error;

    async fn save(&self, mut topic: Topic) -> Result<Topic, Self::Error> {
        self.check_writable()?;

        let id = *topic.id.get_or_insert_with(TopicId::generate);
        self.map.lock().await.insert(id, topic.clone());

        Ok(topic)
    }

    async fn get(&self, id: TopicId) -> Result<Option<Topic>, Self::Error> {
        self.check_readable()?;

        Ok(self.map.lock().await.get(&id).cloned())
    }

    async fn delete(&self, id: TopicId) -> Result<(), Self::Error> {
        self.check_writable()?;

        self.map.lock().await.remove(&id);
        Ok(())
    }

    async fn list(&self, filter: &TopicFilter) -> Result<Vec<Topic>, Self::Error> {
        self.check_readable()?;

        let mut topics: Vec<Topic> = self
            .map
            .lock()
            .await
            .values()
            .filter(|topic| filter.matches(topic))
            .cloned()
            .collect();

        sort_topics(&mut topics);
        Ok(topics)
    }
}
