use thiserror::Error;
use topicbridge_pubsub::PubSubError;

use crate::Operation;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A failure was injected for this operation.
    #[error("injected failure for {0:?}")]
    Injected(Operation),
}

impl PubSubError for Error {}
