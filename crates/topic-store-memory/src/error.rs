use thiserror::Error;
use topicbridge_topic_store::TopicStoreError;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Writes were switched off with `MemoryTopicStore::set_read_only`.
    #[error("store is read-only")]
    ReadOnly,

    /// Reads were switched off with `MemoryTopicStore::set_unavailable`.
    #[error("store is unavailable")]
    Unavailable,
}

impl TopicStoreError for Error {}
