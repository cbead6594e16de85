use thiserror::Error;
use topicbridge_topic_store::TopicStoreError;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// A topic file could not be (de)serialized.
    #[error("{0}: {1}")]
    Json(&'static str, #[source] serde_json::Error),
}

impl TopicStoreError for Error {}
