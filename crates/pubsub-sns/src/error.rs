use thiserror::Error;
use topicbridge_pubsub::PubSubError;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A request could not be assembled.
    #[error(transparent)]
    Build(#[from] aws_sdk_sns::error::BuildError),

    /// The service answered without a field it always sends.
    #[error("response missing {0}")]
    MissingField(&'static str),

    /// SNS error.
    #[error(transparent)]
    Sns(#[from] aws_sdk_sns::Error),
}

impl PubSubError for Error {}
